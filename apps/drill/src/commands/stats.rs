//! Statistics and tag commands.

use crate::db::{Progress, SqliteRepository, StatsRepository, TagInfo, TagRepository};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Overall statistics for one user.
#[derive(Debug, serde::Serialize)]
pub struct Overview {
    pub total: Progress,
    pub favorites: Progress,
    pub states: Vec<crate::db::StateCount>,
    pub pinned: Vec<TagInfo>,
}

pub fn stats(repo: &SqliteRepository, user: &str, json: bool, now: DateTime<Utc>) -> anyhow::Result<String> {
    let overview = Overview {
        total: repo.total_progress(user, now)?,
        favorites: repo.favorite_progress(user, now)?,
        states: repo.state_counts(user, None)?,
        pinned: repo.pinned_tags(user, now)?,
    };

    if json {
        return Ok(serde_json::to_string_pretty(&overview)?);
    }

    let mut out = String::new();
    writeln!(out, "Questions: {}", progress_line(&overview.total))?;
    writeln!(out, "Favorites: {}", progress_line(&overview.favorites))?;
    for state in &overview.states {
        writeln!(out, "  {:<10} {}", state.name, state.count)?;
    }
    for tag in &overview.pinned {
        writeln!(out, "{}", tag_line(tag))?;
    }
    Ok(out.trim_end().to_string())
}

pub fn tags(repo: &SqliteRepository, user: &str) -> anyhow::Result<String> {
    let learning = repo.tags_still_learning(user)?;
    let needing_review = repo.tags_needing_review(user)?;

    let mut out = String::new();
    writeln!(out, "Still learning:")?;
    if learning.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for tag in &learning {
        writeln!(out, "  {} ({})", tag.name, tag.count)?;
    }

    writeln!(out, "Needing review:")?;
    if needing_review.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for tag in &needing_review {
        let last = tag
            .last_reviewed
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string());
        writeln!(out, "  {} (last reviewed {last})", tag.name)?;
    }
    Ok(out.trim_end().to_string())
}

pub fn pin(repo: &SqliteRepository, user: &str, tag: &str) -> anyhow::Result<String> {
    repo.pin_tag(user, tag)?;
    Ok(format!("Pinned {tag}."))
}

pub fn unpin(repo: &SqliteRepository, user: &str, tag: &str) -> anyhow::Result<String> {
    repo.unpin_tag(user, tag)?;
    Ok(format!("Unpinned {tag}."))
}

pub fn pinned(repo: &SqliteRepository, user: &str, now: DateTime<Utc>) -> anyhow::Result<String> {
    let tags = repo.pinned_tags(user, now)?;
    if tags.is_empty() {
        return Ok("No pinned tags.".to_string());
    }
    Ok(tags.iter().map(tag_line).collect::<Vec<_>>().join("\n"))
}

pub fn random_tag(repo: &SqliteRepository, user: &str, now: DateTime<Utc>) -> anyhow::Result<String> {
    match repo.random_tag(user, now)? {
        Some(tag) => Ok(tag_line(&tag)),
        None => Ok("No tagged questions.".to_string()),
    }
}

fn progress_line(progress: &Progress) -> String {
    format!(
        "{} total, {} to review, {:.0}% done",
        progress.count, progress.todo, progress.percentage
    )
}

fn tag_line(tag: &TagInfo) -> String {
    let last = tag
        .last_reviewed
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "{}: {} questions, {:.0}% done, last reviewed {last}",
        tag.name, tag.question_count, tag.progress.percentage
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewQuestion, QuestionRepository, ReviewRepository};
    use chrono::TimeZone;
    use drill_core::Rating;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
    }

    fn seeded() -> SqliteRepository {
        let mut repo = SqliteRepository::open_in_memory().unwrap();
        for (text, tags) in [("One?", vec!["rust"]), ("Two?", vec!["rust", "sql"])] {
            repo.create_question(
                &NewQuestion {
                    user: "alice".to_string(),
                    question: text.to_string(),
                    answer: "yes".to_string(),
                    tags: tags.into_iter().map(String::from).collect(),
                    is_favorite: false,
                },
                now(),
            )
            .unwrap();
        }
        repo.record_response(1, Rating::Easy, now()).unwrap();
        repo.record_response(2, Rating::Good, now()).unwrap();
        repo
    }

    #[test]
    fn test_stats_text() {
        let repo = seeded();
        repo.pin_tag("alice", "rust").unwrap();

        let out = stats(&repo, "alice", false, now()).unwrap();
        assert!(out.contains("Questions: 2 total, 1 to review, 50% done"));
        assert!(out.contains("Favorites: 0 total, 0 to review, 0% done"));
        assert!(out.contains("Learning"));
        assert!(out.contains("rust: 2 questions, 50% done, last reviewed 2024-06-01"));
    }

    #[test]
    fn test_stats_json() {
        let repo = seeded();
        let out = stats(&repo, "alice", true, now()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["total"]["count"], 2);
        assert_eq!(value["total"]["percentage"], 50.0);
        assert_eq!(value["states"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_tags_text() {
        let repo = seeded();
        let out = tags(&repo, "alice").unwrap();
        assert!(out.contains("Still learning:\n  rust (1)\n  sql (1)"));
        assert!(out.contains("Needing review:"));
    }

    #[test]
    fn test_pin_unknown_tag() {
        let repo = seeded();
        let err = pin(&repo, "alice", "cooking").unwrap_err();
        assert_eq!(err.to_string(), "tag not found: cooking");
    }

    #[test]
    fn test_pinned_and_random() {
        let repo = seeded();
        assert_eq!(pinned(&repo, "alice", now()).unwrap(), "No pinned tags.");
        pin(&repo, "alice", "sql").unwrap();
        assert!(pinned(&repo, "alice", now()).unwrap().starts_with("sql: 1 questions"));
        assert_eq!(random_tag(&repo, "bob", now()).unwrap(), "No tagged questions.");
    }
}
