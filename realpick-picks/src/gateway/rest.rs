//! PostgREST vote gateway.
//!
//! Votes live in one table, one row per (user, mission, episode). Tallies are
//! computed client-side from the fetched rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use realpick_model::{AggregateTally, MatchVote, Pair, VoteSubmission};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{GatewayError, GatewayResult, VoteGateway};

const CONFLICT_COLUMNS: &str = "f_user_id,f_mission_id,f_episode_no";

/// Connection settings for [`RestGateway`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestGatewayConfig {
    /// Project URL; requests go to `{base_url}/rest/v1/{table}`
    pub base_url: String,
    /// Sent as the `apikey` header
    pub api_key: Option<String>,
    /// Bearer token of the signed-in user; falls back to `api_key`
    pub access_token: Option<String>,
    pub table: String,
    /// HTTP timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for RestGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: None,
            access_token: None,
            table: "t_pickresult2".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Stored row shape.
#[derive(Debug, Deserialize)]
struct VoteRow {
    f_user_id: String,
    f_mission_id: String,
    f_episode_no: u32,
    #[serde(default)]
    f_connections: Value,
    #[serde(default)]
    f_submitted: Option<bool>,
    #[serde(default)]
    f_submitted_at: Option<DateTime<Utc>>,
}

impl VoteRow {
    fn into_vote(self) -> GatewayResult<MatchVote> {
        let pairs = parse_connections(&self.f_connections)?;
        Ok(self.with_pairs(pairs))
    }

    /// Like `into_vote`, but unreadable picks become an empty list.
    fn into_vote_lossy(self) -> MatchVote {
        let pairs = parse_connections(&self.f_connections).unwrap_or_else(|e| {
            warn!(
                user_id = %self.f_user_id,
                episode_no = self.f_episode_no,
                error = %e,
                "Unreadable stored picks"
            );
            Vec::new()
        });
        self.with_pairs(pairs)
    }

    fn with_pairs(self, pairs: Vec<Pair>) -> MatchVote {
        MatchVote {
            pairs,
            user_id: self.f_user_id,
            mission_id: self.f_mission_id,
            episode_no: self.f_episode_no,
            submitted: self.f_submitted.unwrap_or(true),
            submitted_at: self.f_submitted_at,
        }
    }
}

/// Columns needed for a tally.
#[derive(Debug, Deserialize)]
struct TallyRow {
    f_user_id: String,
    #[serde(default)]
    f_connections: Value,
}

#[derive(Debug, Serialize)]
struct UpsertRow<'a> {
    f_user_id: &'a str,
    f_mission_id: &'a str,
    f_episode_no: u32,
    f_connections: &'a [Pair],
    f_submitted: bool,
    f_submitted_at: DateTime<Utc>,
}

/// `f_connections` is either a JSON array or a JSON-encoded string of one.
fn parse_connections(value: &Value) -> GatewayResult<Vec<Pair>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(raw) => Ok(serde_json::from_str(raw)?),
        Value::Array(_) => Ok(serde_json::from_value(value.clone())?),
        other => Err(GatewayError::InvalidResponse(format!(
            "unexpected f_connections: {}",
            other
        ))),
    }
}

fn episode_filter(episodes: &[u32]) -> String {
    let list: Vec<String> = episodes.iter().map(|ep| ep.to_string()).collect();
    format!("in.({})", list.join(","))
}

/// Vote gateway over a PostgREST endpoint.
pub struct RestGateway {
    config: RestGatewayConfig,
    client: Client,
}

impl RestGateway {
    pub fn new(config: RestGatewayConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RestGatewayConfig {
        &self.config
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let mut request = self.client.request(method, self.table_url());
        if let Some(ref api_key) = self.config.api_key {
            request = request.header("apikey", api_key);
        }
        if let Some(token) = self.config.access_token.as_ref().or(self.config.api_key.as_ref()) {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> GatewayResult<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server {
                status,
                message: body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }

    async fn fetch_tally(&self, query: Vec<(&str, String)>) -> GatewayResult<AggregateTally> {
        let response = self.request(Method::GET).query(&query).send().await?;
        let rows: Vec<TallyRow> = self.handle_response(response).await?;

        // Users whose picks cannot be parsed still count as participants
        let parsed: Vec<(String, Vec<Pair>)> = rows
            .into_iter()
            .map(|row| {
                let pairs = parse_connections(&row.f_connections).unwrap_or_else(|e| {
                    warn!(user_id = %row.f_user_id, error = %e, "Skipping unreadable picks in tally");
                    Vec::new()
                });
                (row.f_user_id, pairs)
            })
            .collect();

        Ok(AggregateTally::from_votes(
            parsed.iter().map(|(user, pairs)| (user.as_str(), pairs.as_slice())),
        ))
    }
}

#[async_trait]
impl VoteGateway for RestGateway {
    async fn get_vote(
        &self,
        user_id: &str,
        mission_id: &str,
        episode_no: u32,
    ) -> GatewayResult<Option<MatchVote>> {
        let response = self
            .request(Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("f_user_id", format!("eq.{}", user_id)),
                ("f_mission_id", format!("eq.{}", mission_id)),
                ("f_episode_no", format!("eq.{}", episode_no)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<VoteRow> = self.handle_response(response).await?;

        rows.into_iter().next().map(VoteRow::into_vote).transpose()
    }

    async fn get_all_votes(&self, user_id: &str, mission_id: &str) -> GatewayResult<Vec<MatchVote>> {
        let response = self
            .request(Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("f_user_id", format!("eq.{}", user_id)),
                ("f_mission_id", format!("eq.{}", mission_id)),
                ("order", "f_episode_no.asc".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<VoteRow> = self.handle_response(response).await?;

        // One bad row must not hide the episodes that did parse
        Ok(rows.into_iter().map(VoteRow::into_vote_lossy).collect())
    }

    async fn submit_vote(&self, submission: &VoteSubmission) -> GatewayResult<bool> {
        if let Err(e) = submission.validate() {
            warn!(mission_id = %submission.mission_id, error = %e, "Refusing invalid submission");
            return Ok(false);
        }

        let row = UpsertRow {
            f_user_id: &submission.user_id,
            f_mission_id: &submission.mission_id,
            f_episode_no: submission.episode_no,
            f_connections: &submission.pairs,
            f_submitted: true,
            f_submitted_at: submission.submitted_at,
        };

        let response = self
            .request(Method::POST)
            .query(&[("on_conflict", CONFLICT_COLUMNS)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(
                mission_id = %submission.mission_id,
                episode_no = submission.episode_no,
                "Vote upserted"
            );
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            warn!(status = status.as_u16(), body = %body, "Backend refused vote");
            return Ok(false);
        }
        Err(GatewayError::Server {
            status: status.as_u16(),
            message: body,
        })
    }

    async fn get_aggregated_votes(
        &self,
        mission_id: &str,
        episode_no: Option<u32>,
    ) -> GatewayResult<AggregateTally> {
        let mut query = vec![
            ("select", "f_user_id,f_connections".to_string()),
            ("f_mission_id", format!("eq.{}", mission_id)),
        ];
        if let Some(ep) = episode_no {
            query.push(("f_episode_no", format!("eq.{}", ep)));
        }
        self.fetch_tally(query).await
    }

    async fn get_aggregated_votes_for_episodes(
        &self,
        mission_id: &str,
        episodes: &[u32],
    ) -> GatewayResult<AggregateTally> {
        if episodes.is_empty() {
            return Ok(AggregateTally::empty());
        }
        self.fetch_tally(vec![
            ("select", "f_user_id,f_connections".to_string()),
            ("f_mission_id", format!("eq.{}", mission_id)),
            ("f_episode_no", episode_filter(episodes)),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn gateway(server: &MockServer) -> RestGateway {
        RestGateway::new(RestGatewayConfig {
            base_url: server.uri(),
            api_key: Some("anon-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_connections_shapes() {
        let as_array = json!([{"left": "A", "right": "X"}]);
        let as_string = json!(r#"[{"left":"A","right":"X"}]"#);
        assert_eq!(parse_connections(&as_array).unwrap(), vec![Pair::new("A", "X")]);
        assert_eq!(parse_connections(&as_string).unwrap(), vec![Pair::new("A", "X")]);
        assert!(parse_connections(&Value::Null).unwrap().is_empty());
        assert!(parse_connections(&json!(5)).is_err());
    }

    #[test]
    fn test_episode_filter() {
        assert_eq!(episode_filter(&[1, 3]), "in.(1,3)");
    }

    #[tokio::test]
    async fn test_get_vote_reads_string_connections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/t_pickresult2"))
            .and(query_param("f_user_id", "eq.u1"))
            .and(query_param("f_episode_no", "eq.2"))
            .and(header("apikey", "anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "f_user_id": "u1",
                "f_mission_id": "m1",
                "f_episode_no": 2,
                "f_connections": "[{\"left\":\"A\",\"right\":\"X\"}]",
                "f_submitted": true,
                "f_submitted_at": "2026-01-10T12:00:00Z"
            }])))
            .mount(&server)
            .await;

        let vote = gateway(&server).await.get_vote("u1", "m1", 2).await.unwrap().unwrap();
        assert_eq!(vote.episode_no, 2);
        assert_eq!(vote.pairs, vec![Pair::new("A", "X")]);
        assert!(vote.submitted);
        assert!(vote.submitted_at.is_some());
    }

    #[tokio::test]
    async fn test_get_vote_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/t_pickresult2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let vote = gateway(&server).await.get_vote("u1", "m1", 1).await.unwrap();
        assert!(vote.is_none());
    }

    #[tokio::test]
    async fn test_submit_upserts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/t_pickresult2"))
            .and(query_param("on_conflict", CONFLICT_COLUMNS))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let submission = VoteSubmission::new("m1", "u1", 1, vec![Pair::new("A", "X")]);
        assert!(gateway(&server).await.submit_vote(&submission).await.unwrap());
    }

    #[tokio::test]
    async fn test_submit_refused_and_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/t_pickresult2"))
            .respond_with(ResponseTemplate::new(403).set_body_string("row-level security"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/t_pickresult2"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let gateway = gateway(&server).await;
        let submission = VoteSubmission::new("m1", "u1", 1, vec![Pair::new("A", "X")]);
        assert!(!gateway.submit_vote(&submission).await.unwrap());
        assert!(matches!(
            gateway.submit_vote(&submission).await,
            Err(GatewayError::Server { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_submission_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let submission = VoteSubmission::new("m1", "u1", 0, vec![Pair::new("A", "X")]);
        assert!(!gateway(&server).await.submit_vote(&submission).await.unwrap());
    }

    #[tokio::test]
    async fn test_aggregate_for_episodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/t_pickresult2"))
            .and(query_param("f_mission_id", "eq.m1"))
            .and(query_param("f_episode_no", "in.(1,2)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"f_user_id": "u1", "f_connections": [{"left": "A", "right": "X"}]},
                {"f_user_id": "u1", "f_connections": [{"left": "A", "right": "X"}]},
                {"f_user_id": "u2", "f_connections": "[{\"left\":\"B\",\"right\":\"Y\"}]"},
                {"f_user_id": "u3", "f_connections": 42}
            ])))
            .mount(&server)
            .await;

        let tally = gateway(&server)
            .await
            .get_aggregated_votes_for_episodes("m1", &[1, 2])
            .await
            .unwrap();
        assert_eq!(tally.total_participants, 3);
        assert_eq!(tally.pair_counts["A-X"], 2);
        assert_eq!(tally.pair_counts["B-Y"], 1);
    }

    #[tokio::test]
    async fn test_get_all_votes_keeps_readable_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/t_pickresult2"))
            .and(query_param("f_user_id", "eq.u1"))
            .and(query_param("order", "f_episode_no.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "f_user_id": "u1",
                    "f_mission_id": "m1",
                    "f_episode_no": 1,
                    "f_connections": [{"left": "A", "right": "X"}],
                    "f_submitted": true
                },
                {
                    "f_user_id": "u1",
                    "f_mission_id": "m1",
                    "f_episode_no": 2,
                    "f_connections": "not json",
                    "f_submitted": true
                }
            ])))
            .mount(&server)
            .await;

        let votes = gateway(&server).await.get_all_votes("u1", "m1").await.unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].episode_no, 1);
        assert_eq!(votes[0].pairs, vec![Pair::new("A", "X")]);
        assert!(votes[0].submitted);
        assert_eq!(votes[1].episode_no, 2);
        assert!(votes[1].pairs.is_empty());
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = gateway(&server).await.get_all_votes("u1", "m1").await;
        assert!(matches!(result, Err(GatewayError::Server { status: 500, .. })));
    }
}
