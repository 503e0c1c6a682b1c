//! Shared helpers for drill integration tests.

use chrono::{DateTime, TimeZone, Utc};
use drill::db::{NewQuestion, QuestionRepository, SqliteRepository};

pub const USER: &str = "alice";

/// Fixed clock for reproducible schedules.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

/// Fresh in-memory store.
pub fn repository() -> SqliteRepository {
    SqliteRepository::open_in_memory().expect("in-memory database")
}

/// Create a question for `USER` with the given tags.
pub fn add_question(repo: &SqliteRepository, question: &str, tags: &[&str]) -> i64 {
    repo.create_question(
        &NewQuestion {
            user: USER.to_string(),
            question: question.to_string(),
            answer: format!("answer to {question}"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_favorite: false,
        },
        start(),
    )
    .expect("create question")
}
