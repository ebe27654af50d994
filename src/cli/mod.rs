//! Command-line front end over the election manager.
//!
//! State lives in a single JSON file; each mutating command loads it, applies
//! one operation and writes it back. The caller identity comes from `--as`,
//! the `ELECTION_IDENTITY` environment variable, or a generated identity file,
//! in that order.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use log::info;
use uuid::Uuid;

use crate::manager::ElectionManager;
use crate::models::{Identity, PollId};
use crate::store::SnapshotStore;

const DEFAULT_STATE_FILE: &str = "election-state.json";
const DEFAULT_IDENTITY_FILE: &str = ".election-identity";

#[derive(Parser)]
#[command(name = "election-manager")]
#[command(about = "Create polls, cast votes and read results", version)]
pub struct Cli {
    /// Path of the state file (falls back to ELECTION_STATE, then
    /// election-state.json)
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Act as this identity (falls back to ELECTION_IDENTITY, then a
    /// generated identity file)
    #[arg(long = "as", value_name = "IDENTITY")]
    caller: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new state file with the caller as administrator
    Init,

    /// Create a poll
    Create {
        /// Poll title
        title: String,
        /// Comma-separated candidate names
        candidates: String,
        /// Opening time as unix seconds (defaults to now)
        #[arg(long)]
        starts: Option<i64>,
        /// Closing time as unix seconds, inclusive (defaults to one hour
        /// after opening)
        #[arg(long)]
        ends: Option<i64>,
    },

    /// Cast a vote on a poll
    Vote {
        /// Poll id
        poll: u64,
        /// Zero-based candidate index
        candidate: usize,
    },

    /// Print a poll's tally
    Results {
        /// Poll id
        poll: u64,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one poll in full
    Show {
        /// Poll id
        poll: u64,
    },

    /// List all polls
    List,

    /// Take a poll out of service (administrator only)
    Deactivate {
        /// Poll id
        poll: u64,
    },

    /// Administrator queries and transfer
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Print the event log
    Events,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Print the current administrator
    Get,
    /// Hand administration to another identity (administrator only)
    Transfer {
        /// Identity of the new administrator
        new_admin: String,
    },
}

pub fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let store = SnapshotStore::new(state_path(cli.state));

    match cli.command {
        Command::Init => {
            if store.exists() {
                return Err(format!(
                    "state file already exists at {}",
                    store.path().display()
                )
                .into());
            }
            let caller = resolve_identity(cli.caller)?;
            let manager = ElectionManager::new(caller.clone());
            store.save(&manager.snapshot())?;
            println!(
                "Initialized election state at {}; administrator is {}",
                store.path().display(),
                caller
            );
        }

        Command::Create {
            title,
            candidates,
            starts,
            ends,
        } => {
            let caller = resolve_identity(cli.caller)?;
            let mut manager = open(&store)?;
            let starts_at = match starts {
                Some(secs) => parse_timestamp(secs)?,
                None => Utc::now(),
            };
            let ends_at = match ends {
                Some(secs) => parse_timestamp(secs)?,
                None => starts_at + Duration::hours(1),
            };
            let id = manager.create_poll(
                &caller,
                title,
                split_candidates(&candidates),
                starts_at,
                ends_at,
            )?;
            store.save(&manager.snapshot())?;
            let poll = manager.poll(id)?;
            println!(
                "Created poll {} (\"{}\"), open {} to {}",
                id,
                poll.title,
                poll.starts_at.to_rfc3339(),
                poll.ends_at.to_rfc3339()
            );
        }

        Command::Vote { poll, candidate } => {
            let caller = resolve_identity(cli.caller)?;
            let mut manager = open(&store)?;
            let id = PollId(poll);
            manager.cast_vote(&caller, id, candidate)?;
            store.save(&manager.snapshot())?;
            let name = manager.poll(id)?.candidates[candidate].clone();
            println!("Recorded vote on poll {} for {} by {}", id, name, caller);
        }

        Command::Results { poll, json } => {
            let manager = open(&store)?;
            let results = manager.poll_results(PollId(poll))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for (name, count) in results.iter() {
                    println!("{:<24} {:>6}", name, count);
                }
                println!("{:<24} {:>6}", "total", results.total_votes());
            }
        }

        Command::Show { poll } => {
            let manager = open(&store)?;
            let poll = manager.poll(PollId(poll))?;
            let now = Utc::now();
            println!("Poll:        {} (\"{}\")", poll.id, poll.title);
            println!("Phase:       {}", poll.phase_at(now));
            println!("Opens:       {}", poll.starts_at.to_rfc3339());
            println!("Closes:      {} (inclusive)", poll.ends_at.to_rfc3339());
            println!("Created by:  {} at {}", poll.created_by, poll.created_at.to_rfc3339());
            println!("Voters:      {}", poll.voters.len());
            println!("Candidates:");
            for (index, (name, count)) in
                poll.candidates.iter().zip(poll.vote_counts.iter()).enumerate()
            {
                println!("  [{}] {:<24} {:>6}", index, name, count);
            }
        }

        Command::List => {
            let manager = open(&store)?;
            let summaries = manager.summaries_at(Utc::now());
            if summaries.is_empty() {
                println!("No polls yet.");
            }
            for row in summaries {
                println!(
                    "#{:<4} {:<12} {:>5} votes  \"{}\"",
                    row.id, row.phase, row.total_votes, row.title
                );
            }
        }

        Command::Deactivate { poll } => {
            let caller = resolve_identity(cli.caller)?;
            let mut manager = open(&store)?;
            let id = PollId(poll);
            manager.deactivate_poll(&caller, id)?;
            store.save(&manager.snapshot())?;
            println!("Poll {} is deactivated", id);
        }

        Command::Admin { command } => match command {
            AdminCommand::Get => {
                let manager = open(&store)?;
                println!("{}", manager.administrator());
            }
            AdminCommand::Transfer { new_admin } => {
                let caller = resolve_identity(cli.caller)?;
                let mut manager = open(&store)?;
                let new_admin = Identity::from(new_admin.trim());
                manager.change_administrator(&caller, new_admin.clone())?;
                store.save(&manager.snapshot())?;
                println!("Administrator is now {}", new_admin);
            }
        },

        Command::Events => {
            let manager = open(&store)?;
            let events = manager.events();
            if events.is_empty() {
                println!("No events yet.");
            }
            for (seq, event) in events.iter().enumerate() {
                println!("{:>4}  {}", seq, describe(event));
            }
        }
    }

    Ok(())
}

fn describe(event: &crate::events::ElectionEvent) -> String {
    use crate::events::ElectionEvent::*;
    match event {
        PollCreated {
            poll_id,
            title,
            created_by,
            starts_at,
            ends_at,
        } => format!(
            "poll {} created (\"{}\") by {}, open {} to {}",
            poll_id,
            title,
            created_by,
            starts_at.to_rfc3339(),
            ends_at.to_rfc3339()
        ),
        VoteCast {
            poll_id,
            candidate,
            voter,
        } => format!("vote on poll {} for candidate {} by {}", poll_id, candidate, voter),
        PollDeactivated { poll_id, by } => format!("poll {} deactivated by {}", poll_id, by),
        AdministratorChanged { previous, current } => {
            format!("administrator changed from {} to {}", previous, current)
        }
    }
}

fn open(store: &SnapshotStore) -> Result<ElectionManager, Box<dyn Error>> {
    if !store.exists() {
        return Err(format!(
            "no election state at {}; run `init` first",
            store.path().display()
        )
        .into());
    }
    Ok(ElectionManager::restore(store.load()?))
}

fn state_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("ELECTION_STATE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
}

/// Resolve who is acting: the `--as` flag wins, then `ELECTION_IDENTITY`,
/// then an identity file. A missing identity file is created with a fresh
/// generated identity so repeat invocations stay the same caller.
fn resolve_identity(flag: Option<String>) -> Result<Identity, Box<dyn Error>> {
    if let Some(name) = flag {
        let name = name.trim();
        if name.is_empty() {
            return Err("--as must not be blank".into());
        }
        return Ok(Identity::from(name));
    }
    if let Ok(name) = std::env::var("ELECTION_IDENTITY") {
        let name = name.trim();
        if !name.is_empty() {
            return Ok(Identity::from(name));
        }
    }

    let path = std::env::var("ELECTION_IDENTITY_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_IDENTITY_FILE));
    if path.exists() {
        let existing = fs::read_to_string(&path)?;
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(Identity::from(existing));
        }
    }
    let generated = format!("caller-{}", Uuid::new_v4());
    fs::write(&path, &generated)?;
    info!("Generated identity {}, saved to {}", generated, path.display());
    Ok(Identity::from(generated))
}

fn split_candidates(raw: &str) -> Vec<String> {
    raw.split(',').map(|name| name.trim().to_string()).collect()
}

fn parse_timestamp(secs: i64) -> Result<DateTime<Utc>, Box<dyn Error>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| format!("timestamp {} is out of range", secs).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_vote_command() {
        let cli = Cli::try_parse_from(["election-manager", "--as", "alice", "vote", "1", "0"])
            .unwrap();
        assert_eq!(cli.caller.as_deref(), Some("alice"));
        match cli.command {
            Command::Vote { poll, candidate } => {
                assert_eq!(poll, 1);
                assert_eq!(candidate, 0);
            }
            _ => panic!("expected a vote command"),
        }
    }

    #[test]
    fn parses_create_with_window_flags() {
        let cli = Cli::try_parse_from([
            "election-manager",
            "create",
            "Lunch spot",
            "Ramen,Tacos",
            "--starts",
            "1714564800",
            "--ends",
            "1714568400",
        ])
        .unwrap();
        match cli.command {
            Command::Create {
                title,
                candidates,
                starts,
                ends,
            } => {
                assert_eq!(title, "Lunch spot");
                assert_eq!(candidates, "Ramen,Tacos");
                assert_eq!(starts, Some(1714564800));
                assert_eq!(ends, Some(1714568400));
            }
            _ => panic!("expected a create command"),
        }
    }

    #[test]
    fn split_candidates_trims_but_keeps_blanks() {
        assert_eq!(
            split_candidates(" Alice , Bob "),
            vec!["Alice".to_string(), "Bob".to_string()]
        );
        // Blank entries survive so poll creation can reject them loudly.
        assert_eq!(
            split_candidates("Alice,,Bob"),
            vec!["Alice".to_string(), String::new(), "Bob".to_string()]
        );
    }

    #[test]
    fn rejects_out_of_range_timestamps() {
        assert!(parse_timestamp(i64::MAX).is_err());
        assert!(parse_timestamp(0).is_ok());
    }
}
