//! Persisted session records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::state::SessionState;

/// A session state plus bookkeeping timestamps, stored as one flat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The full session state.
    #[serde(flatten)]
    pub state: SessionState,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// When the session was last written.
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Wrap a freshly created state.
    pub fn new(state: SessionState) -> Self {
        let now = Utc::now();
        Self {
            state,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the state and bump `updated_at`.
    pub fn update(mut self, state: SessionState) -> Self {
        self.state = state;
        self.updated_at = Utc::now();
        self
    }

    /// Whether the record has not been touched within `ttl` as of `now`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.updated_at > ttl
    }
}
