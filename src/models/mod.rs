use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque caller identity (an account reference in the host environment).
/// Used for the administrator check and one-vote-per-poll enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Poll identifier. Ids are dense, start at 0 and are never reused, so a
/// poll's id doubles as its index in the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PollId(pub u64);

impl PollId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PollId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// One voting round: a fixed candidate list, a voting window and the running
/// tally. `vote_counts` stays parallel to `candidates`; candidate order is
/// creation order and is the order results are reported in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    pub candidates: Vec<String>,
    pub vote_counts: Vec<u64>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub voters: HashSet<Identity>,
    pub created_by: Identity,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    pub(crate) fn new(
        id: PollId,
        title: String,
        candidates: Vec<String>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        created_by: Identity,
        created_at: DateTime<Utc>,
    ) -> Self {
        let vote_counts = vec![0; candidates.len()];
        Self {
            id,
            title,
            candidates,
            vote_counts,
            starts_at,
            ends_at,
            is_active: true,
            voters: HashSet::new(),
            created_by,
            created_at,
        }
    }

    /// Whether a vote cast at `now` would be accepted: the poll must still be
    /// administratively active and `now` must fall inside the inclusive
    /// voting window.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }

    pub fn total_votes(&self) -> u64 {
        self.vote_counts.iter().sum()
    }

    pub fn phase_at(&self, now: DateTime<Utc>) -> PollPhase {
        if !self.is_active {
            PollPhase::Deactivated
        } else if now < self.starts_at {
            PollPhase::Upcoming
        } else if now > self.ends_at {
            PollPhase::Ended
        } else {
            PollPhase::Open
        }
    }

    pub fn summary_at(&self, now: DateTime<Utc>) -> PollSummary {
        PollSummary {
            id: self.id,
            title: self.title.clone(),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
            total_votes: self.total_votes(),
            phase: self.phase_at(now),
        }
    }
}

/// Derived poll state at a given instant. Purely informational; voting is
/// gated by the manager's own clock, not by whatever timestamp a listing was
/// computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollPhase {
    Upcoming,
    Open,
    Ended,
    Deactivated,
}

impl fmt::Display for PollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PollPhase::Upcoming => "upcoming",
            PollPhase::Open => "open",
            PollPhase::Ended => "ended",
            PollPhase::Deactivated => "deactivated",
        };
        f.write_str(label)
    }
}

/// Listing row for one poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSummary {
    pub id: PollId,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub total_votes: u64,
    pub phase: PollPhase,
}

/// Tally for one poll: candidate names and their vote counts as two parallel
/// sequences, both in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResults {
    pub candidates: Vec<String>,
    pub counts: Vec<u64>,
}

impl PollResults {
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.candidates
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }

    pub fn total_votes(&self) -> u64 {
        self.counts.iter().sum()
    }
}
