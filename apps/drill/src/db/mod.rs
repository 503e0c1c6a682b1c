//! Local SQLite question store.

pub mod date_utils;
pub mod error;
pub mod repository;
pub mod schema;

pub use error::DbError;
pub use repository::{
    NewQuestion, Progress, Question, QuestionRepository, ResponseRecord, ReviewRepository,
    SqliteRepository, StateCount, StatsRepository, TagCount, TagInfo, TagRepository, TagReview,
};
