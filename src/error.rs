//! Error taxonomy for the election core.

use crate::models::{Identity, PollId};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Every way an election operation can be refused. Failures are terminal for
/// the call and leave all state untouched; retrying is the caller's business.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElectionError {
    #[error("caller {0} is not the administrator")]
    Unauthorized(Identity),

    #[error("poll {0} does not exist")]
    PollNotFound(PollId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid voting window: end {ends_at} is not after start {starts_at}")]
    InvalidTimeWindow {
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },

    // The exact message below is part of the public contract; front ends
    // match on it verbatim.
    #[error("Poll is not currently active")]
    PollNotActive,

    #[error("candidate index {index} is out of range for {count} candidates")]
    InvalidCandidate { index: usize, count: usize },

    #[error("{0} has already voted in this poll")]
    AlreadyVoted(Identity),
}

pub type Result<T> = std::result::Result<T, ElectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_not_active_message_is_fixed() {
        assert_eq!(
            ElectionError::PollNotActive.to_string(),
            "Poll is not currently active"
        );
    }

    #[test]
    fn messages_name_the_offender() {
        let err = ElectionError::Unauthorized(Identity::from("mallory"));
        assert!(err.to_string().contains("mallory"));

        let err = ElectionError::InvalidCandidate { index: 7, count: 2 };
        assert!(err.to_string().contains('7'));
    }
}
