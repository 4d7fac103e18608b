//! Per-customer agent state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customers::CustomerProfile;

use super::stage::Stage;
use super::transcript::Transcript;

/// Lifecycle of one customer's conversation.
///
/// `Seeded → Active → Ended`; seeding again resets to `Seeded` from any
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Seeded,
    Active,
    Ended,
}

impl SessionStatus {
    /// Whether user messages and agent turns are accepted.
    pub fn accepts_turns(&self) -> bool {
        matches!(self, Self::Seeded | Self::Active)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Seeded => "seeded",
            Self::Active => "active",
            Self::Ended => "ended",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    pub customer: CustomerProfile,
    pub transcript: Transcript,
    pub stage: Stage,
    pub status: SessionStatus,
    pub seeded_at: DateTime<Utc>,
}

impl AgentSession {
    pub fn seeded(customer: CustomerProfile) -> Self {
        Self {
            customer,
            transcript: Transcript::new(),
            stage: Stage::Introduction,
            status: SessionStatus::Seeded,
            seeded_at: Utc::now(),
        }
    }
}
