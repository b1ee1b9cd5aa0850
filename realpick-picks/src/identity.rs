//! Signed-in user lookup.

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Source of the current user id.
#[async_trait]
pub trait Identity: Send + Sync {
    /// The signed-in user, or `None` for a guest.
    async fn current_user_id(&self) -> Option<String>;
}

/// Identity held in memory, switched by sign-in and sign-out.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    user_id: RwLock<Option<String>>,
}

impl SessionIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    pub async fn sign_in(&self, user_id: impl Into<String>) {
        *self.user_id.write().await = Some(user_id.into());
    }

    pub async fn sign_out(&self) {
        *self.user_id.write().await = None;
    }
}

#[async_trait]
impl Identity for SessionIdentity {
    async fn current_user_id(&self) -> Option<String> {
        self.user_id.read().await.clone()
    }
}
