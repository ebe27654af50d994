//! Poll and election management: create polls with fixed candidate lists and
//! voting windows, collect one vote per identity, and read tallies at any
//! time. A single administrator can retire polls and hand the role on.
//!
//! Timestamps come from an injected [`Clock`], so tests drive time by hand
//! while the binary runs on the system clock.
//!
//! ```
//! use chrono::{Duration, Utc};
//! use election_manager::{ElectionManager, Identity};
//!
//! # fn main() -> election_manager::Result<()> {
//! let deployer = Identity::from("deployer");
//! let mut manager = ElectionManager::new(deployer.clone());
//!
//! let now = Utc::now();
//! let poll = manager.create_poll(
//!     &deployer,
//!     "Lunch spot",
//!     vec!["Ramen".into(), "Tacos".into()],
//!     now - Duration::minutes(5),
//!     now + Duration::hours(1),
//! )?;
//!
//! manager.cast_vote(&Identity::from("casey"), poll, 0)?;
//! assert_eq!(manager.poll_results(poll)?.counts, vec![1, 0]);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod clock;
pub mod error;
pub mod events;
pub mod manager;
pub mod models;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ElectionError, Result};
pub use events::ElectionEvent;
pub use manager::{ElectionManager, ElectionSnapshot};
pub use models::{Identity, Poll, PollId, PollPhase, PollResults, PollSummary};
pub use store::{SnapshotStore, StoreError};
