//! One-shot store of server-preloaded responses.
//!
//! The container renders the gadget with the responses it expects the gadget
//! to request. A GET for a preloaded URL is answered locally once; later
//! requests for the same URL go to the network.

use std::collections::VecDeque;

use dashmap::DashMap;
use serde::Deserialize;

use crate::auth::OAuthSession;
use crate::io::builder::RequestDescriptor;
use crate::io::response::{NormalizedResponse, ResponseRecord};
use crate::io::transform::transform_response;
use crate::io::types::MethodType;

/// A preloaded response keyed by the URL it answers.
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadEntry {
    pub id: String,
    #[serde(flatten)]
    pub record: ResponseRecord,
}

impl PreloadEntry {
    pub fn new(id: impl Into<String>, record: ResponseRecord) -> Self {
        Self {
            id: id.into(),
            record,
        }
    }
}

/// Pending preloads, one FIFO queue per URL.
#[derive(Debug, Default)]
pub struct PreloadStore {
    pending: DashMap<String, VecDeque<ResponseRecord>>,
}

impl PreloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the preload array a container embeds in the page.
    ///
    /// Entries that do not look like a preloaded response are skipped.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let store = Self::new();
        for value in raw {
            match serde_json::from_value::<PreloadEntry>(value) {
                Ok(entry) => store.push(entry),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed preload entry"),
            }
        }
        tracing::debug!(count = store.len(), "Preloads loaded");
        Ok(store)
    }

    pub fn push(&self, entry: PreloadEntry) {
        self.pending.entry(entry.id).or_default().push_back(entry.record);
    }

    pub fn extend(&self, entries: impl IntoIterator<Item = PreloadEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    /// Remove and return the oldest pending preload for `url`.
    pub fn take(&self, url: &str) -> Option<ResponseRecord> {
        let record = {
            let mut queue = self.pending.get_mut(url)?;
            queue.pop_front()
        };
        self.pending.remove_if(url, |_, queue| queue.is_empty());
        record
    }

    /// Whether a preload is pending for `url`.
    pub fn contains(&self, url: &str) -> bool {
        self.pending.contains_key(url)
    }

    /// Number of pending preloads.
    pub fn len(&self) -> usize {
        self.pending.iter().map(|queue| queue.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Answer `descriptor` from a preload if one is pending.
    ///
    /// Only GET requests are eligible. A preload that failed upstream yields
    /// an error response without data.
    pub fn try_satisfy(
        &self,
        descriptor: &RequestDescriptor,
        session: &OAuthSession,
    ) -> Option<NormalizedResponse> {
        if descriptor.http_method != MethodType::Get {
            return None;
        }
        let record = self.take(&descriptor.target_url)?;

        // Only an explicit 200 counts as success; a missing status is reported as 0.
        if record.rc != Some(200) {
            let rc = record.rc.unwrap_or(0);
            return Some(NormalizedResponse::failure(
                rc,
                vec![format!("{rc} Error")],
                None,
            ));
        }
        if let Some(state) = record.fresh_oauth_state() {
            session.set_state(state);
        }
        Some(transform_response(descriptor.content_type, record))
    }
}
