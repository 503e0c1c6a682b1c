//! Command implementations.
//!
//! Each command returns the text to print so it can be exercised without a terminal.

pub mod question;
pub mod stats;
pub mod study;

use crate::cli::Command;
use crate::db::SqliteRepository;
use chrono::{DateTime, Utc};

/// Run one CLI command against the store.
pub fn execute(
    repo: &mut SqliteRepository,
    user: &str,
    command: Command,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    match command {
        Command::Add {
            question,
            answer,
            tags,
            favorite,
        } => question::add(repo, user, question, answer, tags, favorite, now),
        Command::Show { id, json } => question::show(repo, id, json, now),
        Command::Delete { id } => question::delete(repo, id),
        Command::Favorite { id, off } => question::favorite(repo, id, !off),
        Command::Skip { id } => question::skip(repo, id, now),
        Command::History { id } => question::history(repo, id),
        Command::Due { tag, limit } => study::due(repo, user, tag.as_deref(), limit, now),
        Command::Study { tag } => study::study(repo, user, tag.as_deref(), now),
        Command::Review { id, rating } => study::review(repo, id, rating, now),
        Command::Stats { json } => stats::stats(repo, user, json, now),
        Command::Tags => stats::tags(repo, user),
        Command::Pin { tag } => stats::pin(repo, user, &tag),
        Command::Unpin { tag } => stats::unpin(repo, user, &tag),
        Command::Pinned => stats::pinned(repo, user, now),
        Command::RandomTag => stats::random_tag(repo, user, now),
    }
}
