//! Question management commands.

use crate::db::date_utils::format_interval;
use crate::db::{DbError, NewQuestion, Question, QuestionRepository, ReviewRepository, SqliteRepository};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use std::fmt::Write;

pub fn add(
    repo: &SqliteRepository,
    user: &str,
    question: String,
    answer: String,
    tags: Vec<String>,
    is_favorite: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let new = NewQuestion {
        user: user.to_string(),
        question,
        answer,
        tags,
        is_favorite,
    };
    let id = repo.create_question(&new, now).context("failed to add question")?;
    tracing::info!(id, "Added question");
    Ok(format!("Added question {id}."))
}

pub fn show(repo: &SqliteRepository, id: i64, json: bool, now: DateTime<Utc>) -> anyhow::Result<String> {
    let question = fetch(repo, id)?;
    if json {
        return Ok(serde_json::to_string_pretty(&question)?);
    }
    Ok(describe(&question, true, now))
}

pub fn delete(repo: &SqliteRepository, id: i64) -> anyhow::Result<String> {
    repo.delete_question(id)?;
    tracing::info!(id, "Deleted question");
    Ok(format!("Deleted question {id}."))
}

pub fn favorite(repo: &SqliteRepository, id: i64, is_favorite: bool) -> anyhow::Result<String> {
    repo.set_favorite(id, is_favorite)?;
    Ok(if is_favorite {
        format!("Question {id} marked as favorite.")
    } else {
        format!("Question {id} is no longer a favorite.")
    })
}

pub fn skip(repo: &SqliteRepository, id: i64, now: DateTime<Utc>) -> anyhow::Result<String> {
    repo.skip_question(id, now)?;
    Ok(format!("Skipped question {id}."))
}

pub fn history(repo: &SqliteRepository, id: i64) -> anyhow::Result<String> {
    fetch(repo, id)?;
    let responses = repo.responses_for(id)?;
    if responses.is_empty() {
        return Ok(format!("Question {id} has not been reviewed."));
    }

    let mut out = String::new();
    for response in responses {
        writeln!(
            out,
            "{}  {:<5}  {} -> {}  interval {} -> {}  efactor {:.3} -> {:.3}",
            response.reviewed_at.format("%Y-%m-%d %H:%M"),
            response.rating,
            response.state_before,
            response.state_after,
            format_interval(Duration::milliseconds(response.interval_before_ms)),
            format_interval(Duration::milliseconds(response.interval_after_ms)),
            response.efactor_before,
            response.efactor_after,
        )?;
    }
    Ok(out.trim_end().to_string())
}

pub(crate) fn fetch(repo: &SqliteRepository, id: i64) -> anyhow::Result<Question> {
    repo.get_question(id)?
        .ok_or_else(|| DbError::QuestionNotFound(id).into())
}

/// Text rendering of a question. The answer is only included when asked for.
pub(crate) fn describe(question: &Question, with_answer: bool, now: DateTime<Utc>) -> String {
    let schedule = &question.schedule;
    let mut out = format!("#{} {}", question.id, question.question);
    if with_answer {
        out.push_str(&format!("\n  answer: {}", question.answer));
    }
    if !question.tags.is_empty() {
        out.push_str(&format!("\n  tags: {}", question.tags.join(", ")));
    }

    let step = if schedule.state == drill_core::QuestionState::Learning {
        format!(
            " (step {} of {})",
            schedule.learning_step,
            schedule.learning_step_count()
        )
    } else {
        String::new()
    };
    out.push_str(&format!(
        "\n  state: {}{step}, interval {}, efactor {:.3}, failed {} times",
        schedule.state,
        format_interval(schedule.interval),
        schedule.efactor,
        schedule.times_failed,
    ));

    let due = match schedule.due_at() {
        None => "never reviewed".to_string(),
        Some(due) if due <= now => "due now".to_string(),
        Some(due) => format!("due {}", due.format("%Y-%m-%d %H:%M")),
    };
    out.push_str(&format!("\n  {due}"));
    if question.is_favorite {
        out.push_str(", favorite");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_add_then_show() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let out = add(
            &repo,
            "alice",
            "Capital of Peru?".to_string(),
            "Lima".to_string(),
            vec!["geography".to_string()],
            true,
            now(),
        )
        .unwrap();
        assert_eq!(out, "Added question 1.");

        let out = show(&repo, 1, false, now()).unwrap();
        assert!(out.starts_with("#1 Capital of Peru?"));
        assert!(out.contains("answer: Lima"));
        assert!(out.contains("tags: geography"));
        assert!(out.contains("state: New, interval 1d"));
        assert!(out.contains("never reviewed, favorite"));
    }

    #[test]
    fn test_show_json() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        add(&repo, "alice", "Q".to_string(), "A".to_string(), vec![], false, now()).unwrap();

        let out = show(&repo, 1, true, now()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["state"], "new");
        assert_eq!(value["interval_ms"], 86_400_000);
    }

    #[test]
    fn test_show_missing() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let err = show(&repo, 9, false, now()).unwrap_err();
        assert_eq!(err.to_string(), "question not found: 9");
    }

    #[test]
    fn test_history_empty() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        add(&repo, "alice", "Q".to_string(), "A".to_string(), vec![], false, now()).unwrap();
        assert_eq!(history(&repo, 1).unwrap(), "Question 1 has not been reviewed.");
    }
}
