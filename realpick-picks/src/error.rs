//! Errors raised by pick session operations.
//!
//! Every error is scoped to the operation that raised it; none of them leave
//! the session unusable.

use realpick_model::{EpisodeStatus, Side};

use crate::gateway::GatewayError;

/// Broad class of a [`PickError`], used to decide how the UI reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally; the user corrects the input
    Validation,
    /// No signed-in identity; prompt sign-in, then resume
    Authentication,
    /// Network, timeout or backend failure; retry with the same picks
    Network,
    /// Write reported success but the read-back did not match
    Verification,
}

/// Error types for pick session operations.
#[derive(Debug, thiserror::Error)]
pub enum PickError {
    /// No episode is selected
    #[error("Select an episode first")]
    NoEpisodeSelected,

    /// More than one episode is selected for an edit or submit
    #[error("Only one episode can be edited or submitted at a time")]
    MultipleEpisodesSelected,

    /// Episode number outside the mission
    #[error("Episode {episode} is outside 1..={total}")]
    EpisodeOutOfRange { episode: u32, total: u32 },

    /// Episode is locked or settled
    #[error("Episode {episode} is {status}; picks cannot change")]
    EpisodeNotOpen { episode: u32, status: EpisodeStatus },

    /// Episode already submitted
    #[error("Episode {0} has already been submitted")]
    EpisodeSubmitted(u32),

    /// Nothing to submit
    #[error("Match at least one couple before submitting")]
    EmptyPicks,

    /// Name is not on the mission's candidate list
    #[error("Unknown {side:?} candidate: {name}")]
    UnknownCandidate { side: Side, name: String },

    /// Both endpoints are in the same column
    #[error("A couple needs one candidate from each column")]
    SameColumn,

    /// Mission has no candidate lists
    #[error("Mission {0} is not a couple-matching mission")]
    NotMatchMission(String),

    /// No signed-in user at submit time
    #[error("Sign in to submit picks")]
    NotSignedIn,

    /// Client-side timeout elapsed before the backend answered
    #[error("Submission for episode {episode} timed out after {after_ms}ms")]
    Timeout { episode: u32, after_ms: u64 },

    /// Another submission for this episode has not finished
    #[error("Submission for episode {0} is already in progress")]
    SubmissionInFlight(u32),

    /// Backend refused the write
    #[error("Backend rejected the submission for episode {0}")]
    Rejected(u32),

    /// Gateway call failed
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Read-back after a successful write did not match
    #[error("Episode {0} was not stored as submitted")]
    VerificationFailed(u32),
}

impl PickError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PickError::NotSignedIn => ErrorKind::Authentication,
            PickError::Timeout { .. }
            | PickError::SubmissionInFlight(_)
            | PickError::Rejected(_)
            | PickError::Gateway(_) => ErrorKind::Network,
            PickError::VerificationFailed(_) => ErrorKind::Verification,
            _ => ErrorKind::Validation,
        }
    }

    /// Whether retrying the same operation with unchanged picks may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(PickError::EmptyPicks.kind(), ErrorKind::Validation);
        assert_eq!(PickError::NotSignedIn.kind(), ErrorKind::Authentication);
        assert_eq!(
            PickError::Timeout { episode: 1, after_ms: 15_000 }.kind(),
            ErrorKind::Network
        );
        assert_eq!(PickError::VerificationFailed(2).kind(), ErrorKind::Verification);
    }

    #[test]
    fn test_retryable() {
        assert!(PickError::Rejected(1).is_retryable());
        assert!(PickError::VerificationFailed(1).is_retryable());
        assert!(!PickError::NoEpisodeSelected.is_retryable());
        assert!(!PickError::NotSignedIn.is_retryable());
    }
}
