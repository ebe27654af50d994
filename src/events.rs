//! Observable records of successful state transitions.

use crate::models::{Identity, PollId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the manager's append-only event log. An event is recorded
/// only when the corresponding operation succeeded; rejected calls leave no
/// trace here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionEvent {
    PollCreated {
        poll_id: PollId,
        title: String,
        created_by: Identity,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
    VoteCast {
        poll_id: PollId,
        candidate: usize,
        voter: Identity,
    },
    PollDeactivated {
        poll_id: PollId,
        by: Identity,
    },
    AdministratorChanged {
        previous: Identity,
        current: Identity,
    },
}

impl ElectionEvent {
    /// The poll an event belongs to, if any. Administration changes are not
    /// tied to a poll.
    pub fn poll_id(&self) -> Option<PollId> {
        match self {
            ElectionEvent::PollCreated { poll_id, .. }
            | ElectionEvent::VoteCast { poll_id, .. }
            | ElectionEvent::PollDeactivated { poll_id, .. } => Some(*poll_id),
            ElectionEvent::AdministratorChanged { .. } => None,
        }
    }
}
