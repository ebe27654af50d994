//! The election manager: a single aggregate owning the administrator, the
//! poll registry and the event log.
//!
//! Every mutating operation validates completely before it writes anything,
//! so a rejected call is always a no-op. Operations take `&mut self`; callers
//! that share a manager across threads wrap it in a lock.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::{ElectionError, Result};
use crate::events::ElectionEvent;
use crate::models::{Identity, Poll, PollId, PollResults, PollSummary};

pub struct ElectionManager {
    administrator: Identity,
    polls: Vec<Poll>,
    events: Vec<ElectionEvent>,
    clock: Box<dyn Clock>,
}

impl ElectionManager {
    /// Initialize a fresh manager. The deployer becomes the administrator;
    /// no polls exist yet.
    pub fn new(deployer: Identity) -> Self {
        Self::with_clock(deployer, SystemClock)
    }

    /// Like [`ElectionManager::new`] but with an injected clock, for
    /// deterministic tests and simulations.
    pub fn with_clock(deployer: Identity, clock: impl Clock + 'static) -> Self {
        info!("Election manager initialized; administrator is {}", deployer);
        Self {
            administrator: deployer,
            polls: Vec::new(),
            events: Vec::new(),
            clock: Box::new(clock),
        }
    }

    pub fn administrator(&self) -> &Identity {
        &self.administrator
    }

    /// Hand administration to another identity. Administrator-only; existing
    /// polls are unaffected.
    pub fn change_administrator(&mut self, caller: &Identity, new_admin: Identity) -> Result<()> {
        self.require_administrator(caller)?;
        let previous = std::mem::replace(&mut self.administrator, new_admin);
        info!(
            "Administrator changed from {} to {}",
            previous, self.administrator
        );
        self.events.push(ElectionEvent::AdministratorChanged {
            previous,
            current: self.administrator.clone(),
        });
        Ok(())
    }

    /// Open a new poll. Any caller may create one; the candidate list must be
    /// non-empty and the window must end after it starts. Returns the new
    /// poll's id — ids are dense and assigned in creation order.
    pub fn create_poll(
        &mut self,
        caller: &Identity,
        title: impl Into<String>,
        candidates: Vec<String>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<PollId> {
        if candidates.is_empty() {
            return Err(ElectionError::InvalidInput(
                "poll needs at least one candidate".to_string(),
            ));
        }
        if candidates.iter().any(|name| name.trim().is_empty()) {
            return Err(ElectionError::InvalidInput(
                "candidate names must not be blank".to_string(),
            ));
        }
        if ends_at <= starts_at {
            return Err(ElectionError::InvalidTimeWindow { starts_at, ends_at });
        }

        let id = PollId(self.polls.len() as u64);
        let poll = Poll::new(
            id,
            title.into(),
            candidates,
            starts_at,
            ends_at,
            caller.clone(),
            self.clock.now(),
        );
        info!(
            "Created poll {} (\"{}\") with {} candidates, open {} to {}",
            id,
            poll.title,
            poll.candidates.len(),
            poll.starts_at.to_rfc3339(),
            poll.ends_at.to_rfc3339()
        );
        self.events.push(ElectionEvent::PollCreated {
            poll_id: id,
            title: poll.title.clone(),
            created_by: poll.created_by.clone(),
            starts_at,
            ends_at,
        });
        self.polls.push(poll);
        Ok(id)
    }

    /// Cast the caller's vote for one candidate. Preconditions are checked in
    /// a fixed order, each with its own error kind: the poll must exist, must
    /// be active and inside its window by the manager's clock, the candidate
    /// index must be in range, and the caller must not have voted here before.
    pub fn cast_vote(&mut self, caller: &Identity, poll_id: PollId, candidate: usize) -> Result<()> {
        let now = self.clock.now();
        let poll = self
            .polls
            .get_mut(poll_id.index())
            .ok_or(ElectionError::PollNotFound(poll_id))?;
        if !poll.is_open_at(now) {
            warn!("Rejected vote by {} on poll {}: not currently active", caller, poll_id);
            return Err(ElectionError::PollNotActive);
        }
        if candidate >= poll.candidates.len() {
            return Err(ElectionError::InvalidCandidate {
                index: candidate,
                count: poll.candidates.len(),
            });
        }
        if poll.voters.contains(caller) {
            return Err(ElectionError::AlreadyVoted(caller.clone()));
        }

        poll.voters.insert(caller.clone());
        poll.vote_counts[candidate] += 1;
        info!("Vote cast on poll {} for candidate {} by {}", poll_id, candidate, caller);
        self.events.push(ElectionEvent::VoteCast {
            poll_id,
            candidate,
            voter: caller.clone(),
        });
        Ok(())
    }

    /// Take a poll out of service. Administrator-only. The record is kept —
    /// counts and voter history stay queryable — and deactivating an already
    /// inactive poll is a quiet no-op.
    pub fn deactivate_poll(&mut self, caller: &Identity, poll_id: PollId) -> Result<()> {
        self.require_administrator(caller)?;
        let poll = self
            .polls
            .get_mut(poll_id.index())
            .ok_or(ElectionError::PollNotFound(poll_id))?;
        if !poll.is_active {
            return Ok(());
        }
        poll.is_active = false;
        info!("Poll {} deactivated by {}", poll_id, caller);
        self.events.push(ElectionEvent::PollDeactivated {
            poll_id,
            by: caller.clone(),
        });
        Ok(())
    }

    /// Candidate names and vote counts for one poll, in creation order. Not
    /// time-gated: results stay readable before, during and after the window
    /// and for deactivated polls.
    pub fn poll_results(&self, poll_id: PollId) -> Result<PollResults> {
        let poll = self.poll(poll_id)?;
        Ok(PollResults {
            candidates: poll.candidates.clone(),
            counts: poll.vote_counts.clone(),
        })
    }

    pub fn poll(&self, poll_id: PollId) -> Result<&Poll> {
        self.polls
            .get(poll_id.index())
            .ok_or(ElectionError::PollNotFound(poll_id))
    }

    /// Number of polls ever created. Deactivation never lowers this.
    pub fn poll_count(&self) -> u64 {
        self.polls.len() as u64
    }

    pub fn polls(&self) -> impl Iterator<Item = &Poll> {
        self.polls.iter()
    }

    /// Listing rows for every poll, with phases derived against the supplied
    /// timestamp. This is display filtering only — `cast_vote` ignores it.
    pub fn summaries_at(&self, now: DateTime<Utc>) -> Vec<PollSummary> {
        self.polls.iter().map(|poll| poll.summary_at(now)).collect()
    }

    pub fn has_voted(&self, poll_id: PollId, voter: &Identity) -> Result<bool> {
        Ok(self.poll(poll_id)?.voters.contains(voter))
    }

    /// The append-only log of successful operations, oldest first.
    pub fn events(&self) -> &[ElectionEvent] {
        &self.events
    }

    /// Serializable copy of the full state (administrator, polls, events).
    pub fn snapshot(&self) -> ElectionSnapshot {
        ElectionSnapshot {
            administrator: self.administrator.clone(),
            polls: self.polls.clone(),
            events: self.events.clone(),
        }
    }

    /// Rebuild a manager from a snapshot, using the system clock.
    pub fn restore(snapshot: ElectionSnapshot) -> Self {
        Self::restore_with_clock(snapshot, SystemClock)
    }

    pub fn restore_with_clock(snapshot: ElectionSnapshot, clock: impl Clock + 'static) -> Self {
        Self {
            administrator: snapshot.administrator,
            polls: snapshot.polls,
            events: snapshot.events,
            clock: Box::new(clock),
        }
    }

    fn require_administrator(&self, caller: &Identity) -> Result<()> {
        if *caller != self.administrator {
            warn!(
                "Unauthorized call by {}; administrator is {}",
                caller, self.administrator
            );
            return Err(ElectionError::Unauthorized(caller.clone()));
        }
        Ok(())
    }
}

/// The manager's full state in storable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSnapshot {
    pub administrator: Identity,
    pub polls: Vec<Poll>,
    pub events: Vec<ElectionEvent>,
}
