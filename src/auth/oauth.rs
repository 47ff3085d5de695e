//! OAuth session state.

use std::sync::{Mutex, PoisonError};

/// Transient OAuth state the server wants back on the next request, plus the
/// callback URL received at the end of an approval round-trip.
#[derive(Debug, Default)]
pub struct OAuthSession {
    state: Mutex<Option<String>>,
    received_callback: Mutex<Option<String>>,
}

impl OAuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<String> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Overwrite the state. No merge with the previous value.
    pub fn set_state(&self, state: impl Into<String>) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.into());
    }

    pub fn clear_state(&self) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Record the URL the service provider redirected back to.
    pub fn set_received_callback(&self, url: impl Into<String>) {
        *self
            .received_callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(url.into());
    }

    /// Consume the pending callback URL, if any.
    pub fn take_received_callback(&self) -> Option<String> {
        self.received_callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
