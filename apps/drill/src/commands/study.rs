//! Study session commands.

use super::question::{describe, fetch};
use crate::db::date_utils::format_interval;
use crate::db::{QuestionRepository, ReviewRepository, SqliteRepository};
use chrono::{DateTime, Utc};
use drill_core::Rating;

pub fn due(
    repo: &SqliteRepository,
    user: &str,
    tag: Option<&str>,
    limit: usize,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let questions = repo.questions_due(user, now, tag, limit)?;
    if questions.is_empty() {
        return Ok("Nothing is due.".to_string());
    }

    let lines: Vec<String> = questions
        .iter()
        .map(|q| format!("#{} [{}] {}", q.id, q.schedule.state, q.question))
        .collect();
    Ok(lines.join("\n"))
}

pub fn study(
    repo: &SqliteRepository,
    user: &str,
    tag: Option<&str>,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    match repo.next_question(user, now, tag)? {
        Some(question) => Ok(format!(
            "{}\n\nAnswer with: drill review {} <again|hard|good|easy>",
            describe(&question, false, now),
            question.id
        )),
        None => Ok("Nothing to drill.".to_string()),
    }
}

pub fn review(
    repo: &mut SqliteRepository,
    id: i64,
    rating: Rating,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let question = fetch(repo, id)?;
    let result = repo.record_response(id, rating, now)?;
    tracing::info!(id, %rating, state = %result.item.state, "Reviewed question");

    Ok(format!(
        "Answer: {}\n{} -> {}, next review in {} ({})",
        question.answer,
        question.schedule.state,
        result.item.state,
        format_interval(result.item.interval),
        result.next_due.format("%Y-%m-%d %H:%M"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewQuestion;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
    }

    fn seeded() -> SqliteRepository {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.create_question(
            &NewQuestion {
                user: "alice".to_string(),
                question: "Largest planet?".to_string(),
                answer: "Jupiter".to_string(),
                tags: vec!["astronomy".to_string()],
                is_favorite: false,
            },
            now(),
        )
        .unwrap();
        repo
    }

    #[test]
    fn test_due_lists_new_questions() {
        let repo = seeded();
        assert_eq!(
            due(&repo, "alice", None, 10, now()).unwrap(),
            "#1 [New] Largest planet?"
        );
        assert_eq!(due(&repo, "bob", None, 10, now()).unwrap(), "Nothing is due.");
    }

    #[test]
    fn test_study_hides_answer() {
        let repo = seeded();
        let out = study(&repo, "alice", Some("astronomy"), now()).unwrap();
        assert!(out.starts_with("#1 Largest planet?"));
        assert!(!out.contains("Jupiter"));
        assert!(out.contains("drill review 1"));
    }

    #[test]
    fn test_review_reports_transition() {
        let mut repo = seeded();
        let out = review(&mut repo, 1, Rating::Good, now()).unwrap();
        assert_eq!(
            out,
            "Answer: Jupiter\nNew -> Learning, next review in 1d (2024-06-02 18:00)"
        );

        let out = review(&mut repo, 1, Rating::Good, now()).unwrap();
        assert!(out.contains("Learning -> Reviewing, next review in 2d 12h"));
    }

    #[test]
    fn test_review_missing_question() {
        let mut repo = seeded();
        assert!(review(&mut repo, 5, Rating::Easy, now()).is_err());
    }
}
