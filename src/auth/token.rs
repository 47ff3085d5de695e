//! Security token collaborator.

use std::sync::{PoisonError, RwLock};

/// Source of the opaque token identifying the viewer, owner and gadget.
pub trait SecurityTokenSource: Send + Sync {
    fn current_security_token(&self) -> String;

    /// Replace the token process-wide.
    fn update_security_token(&self, token: &str);
}

/// In-memory token shared by every request of a context.
#[derive(Debug, Default)]
pub struct SharedSecurityToken {
    token: RwLock<String>,
}

impl SharedSecurityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(token.into()),
        }
    }
}

impl SecurityTokenSource for SharedSecurityToken {
    fn current_security_token(&self) -> String {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_security_token(&self, token: &str) {
        tracing::debug!("Security token refreshed by server");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token.to_string();
    }
}
