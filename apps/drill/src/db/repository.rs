//! Repository pattern for database access.

use crate::db::date_utils::{from_millis, interval_from_millis, to_millis};
use crate::db::error::DbError;
use chrono::{DateTime, Utc};
use drill_core::scheduler::{advance, SchedulingResult};
use drill_core::types::{QuestionState, Rating, ReviewItem};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;

type Result<T> = std::result::Result<T, DbError>;

/// A question to be created.
#[derive(Debug, Clone, Default)]
pub struct NewQuestion {
    pub user: String,
    pub question: String,
    pub answer: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
}

/// A stored question with its scheduling state.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Question {
    pub id: i64,
    pub user: String,
    pub question: String,
    pub answer: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub created: DateTime<Utc>,
    #[serde(flatten)]
    pub schedule: ReviewItem,
}

/// One entry of the review log.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResponseRecord {
    pub id: i64,
    pub question_id: i64,
    pub reviewed_at: DateTime<Utc>,
    pub rating: Rating,
    pub state_before: QuestionState,
    pub state_after: QuestionState,
    pub interval_before_ms: i64,
    pub interval_after_ms: i64,
    pub efactor_before: f64,
    pub efactor_after: f64,
}

/// Share of questions that do not need review right now.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Progress {
    /// Questions considered.
    pub count: usize,
    /// Questions due, never reviewed, or still learning.
    pub todo: usize,
    pub percentage: f64,
}

impl Progress {
    fn new(count: usize, todo: usize) -> Self {
        let percentage = if count > 0 {
            100.0 - (todo as f64 / count as f64 * 100.0)
        } else {
            0.0
        };
        Self {
            count,
            todo,
            percentage,
        }
    }
}

/// Number of questions in one state.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StateCount {
    pub state: QuestionState,
    pub name: &'static str,
    pub count: usize,
}

/// Tag with a question count.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Tag with the oldest review among its questions.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TagReview {
    pub name: String,
    pub last_reviewed: Option<DateTime<Utc>>,
}

/// Summary of one tag.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TagInfo {
    pub name: String,
    pub question_count: usize,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub progress: Progress,
}

/// Repository for question operations.
pub trait QuestionRepository {
    fn create_question(&self, new: &NewQuestion, now: DateTime<Utc>) -> Result<i64>;
    fn get_question(&self, id: i64) -> Result<Option<Question>>;
    fn delete_question(&self, id: i64) -> Result<()>;
    fn set_favorite(&self, id: i64, is_favorite: bool) -> Result<()>;
    fn questions_due(
        &self,
        user: &str,
        now: DateTime<Utc>,
        tag: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Question>>;
    fn next_question(&self, user: &str, now: DateTime<Utc>, tag: Option<&str>) -> Result<Option<Question>>;
    fn skip_question(&self, id: i64, now: DateTime<Utc>) -> Result<()>;
}

/// Repository for review operations.
pub trait ReviewRepository {
    fn record_response(&mut self, id: i64, rating: Rating, now: DateTime<Utc>) -> Result<SchedulingResult>;
    fn responses_for(&self, id: i64) -> Result<Vec<ResponseRecord>>;
}

/// Repository for drill statistics.
pub trait StatsRepository {
    fn total_progress(&self, user: &str, now: DateTime<Utc>) -> Result<Progress>;
    fn favorite_progress(&self, user: &str, now: DateTime<Utc>) -> Result<Progress>;
    fn state_counts(&self, user: &str, tag: Option<&str>) -> Result<Vec<StateCount>>;
    fn tags_still_learning(&self, user: &str) -> Result<Vec<TagCount>>;
    fn tags_needing_review(&self, user: &str) -> Result<Vec<TagReview>>;
    fn tag_info(&self, user: &str, tag: &str, now: DateTime<Utc>) -> Result<TagInfo>;
    fn random_tag(&self, user: &str, now: DateTime<Utc>) -> Result<Option<TagInfo>>;
}

/// Repository for pinned tags.
pub trait TagRepository {
    fn pin_tag(&self, user: &str, tag: &str) -> Result<()>;
    fn unpin_tag(&self, user: &str, tag: &str) -> Result<()>;
    fn pinned_tags(&self, user: &str, now: DateTime<Utc>) -> Result<Vec<TagInfo>>;
}

/// SQL condition for a question that needs attention: due, never reviewed,
/// or still learning. Expects the current time bound as `:now`.
const TODO_CONDITION: &str = "(q.last_reviewed_ms IS NULL OR q.last_reviewed_ms + q.interval_ms <= :now OR q.state = 'L')";

/// SQL condition for a question whose interval has elapsed.
const DUE_CONDITION: &str = "(q.last_reviewed_ms IS NULL OR q.last_reviewed_ms + q.interval_ms <= :now)";

const QUESTION_COLUMNS: &str = "q.id, q.user_id, q.question, q.answer, q.state, q.learning_step, q.interval_ms, \
     q.efactor, q.times_failed, q.last_reviewed_ms, q.is_favorite, q.created_ms";

/// SQLite implementation of repositories.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::info!(path = %path.as_ref().display(), "Opening drill database");
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        self.conn.execute_batch(super::schema::INIT_SCHEMA_VERSION)?;
        tracing::debug!(version = super::schema::SCHEMA_VERSION, "Schema initialized");
        Ok(())
    }

    fn tag_id(&self, user: &str, tag: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT id FROM tags WHERE user_id = ?1 AND name = ?2",
                params![user, tag],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| DbError::TagNotFound(tag.to_string()))
    }

    fn progress_where(&self, filter: &str, args: &[(&str, &dyn rusqlite::ToSql)]) -> Result<Progress> {
        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN {TODO_CONDITION} THEN 1 ELSE 0 END), 0)
             FROM questions q WHERE {filter}"
        );
        let (count, todo): (i64, i64) = self
            .conn
            .query_row(&sql, args, |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(Progress::new(count as usize, todo as usize))
    }
}

impl QuestionRepository for SqliteRepository {
    fn create_question(&self, new: &NewQuestion, now: DateTime<Utc>) -> Result<i64> {
        if new.question.trim().is_empty() {
            return Err(DbError::InvalidData("question text is empty".to_string()));
        }
        if new.answer.trim().is_empty() {
            return Err(DbError::InvalidData("answer text is empty".to_string()));
        }

        let item = ReviewItem::default();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO questions (user_id, question, answer, state, learning_step, interval_ms,
                efactor, times_failed, last_reviewed_ms, is_favorite, created_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9, ?10)",
            params![
                new.user,
                new.question,
                new.answer,
                item.state.code().to_string(),
                item.learning_step,
                item.interval.num_milliseconds(),
                item.efactor,
                item.times_failed,
                new.is_favorite,
                to_millis(now),
            ],
        )?;
        let id = tx.last_insert_rowid();

        for tag in &new.tags {
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            tx.execute(
                "INSERT OR IGNORE INTO tags (user_id, name) VALUES (?1, ?2)",
                params![new.user, tag],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO question_tags (question_id, tag_id)
                 SELECT ?1, id FROM tags WHERE user_id = ?2 AND name = ?3",
                params![id, new.user, tag],
            )?;
        }
        tx.commit()?;

        tracing::debug!(id, user = %new.user, "Created question");
        Ok(id)
    }

    fn get_question(&self, id: i64) -> Result<Option<Question>> {
        load_question(&self.conn, id)
    }

    fn delete_question(&self, id: i64) -> Result<()> {
        let count = self
            .conn
            .execute("DELETE FROM questions WHERE id = ?1", params![id])?;
        if count == 0 {
            return Err(DbError::QuestionNotFound(id));
        }
        Ok(())
    }

    fn set_favorite(&self, id: i64, is_favorite: bool) -> Result<()> {
        let count = self.conn.execute(
            "UPDATE questions SET is_favorite = ?1 WHERE id = ?2",
            params![is_favorite, id],
        )?;
        if count == 0 {
            return Err(DbError::QuestionNotFound(id));
        }
        Ok(())
    }

    fn questions_due(
        &self,
        user: &str,
        now: DateTime<Utc>,
        tag: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Question>> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions q
             WHERE q.user_id = :user AND {DUE_CONDITION} AND {}
             ORDER BY COALESCE(q.last_reviewed_ms + q.interval_ms, 0), q.id
             LIMIT :limit",
            tag_filter(tag)
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::named_params! {
                    ":user": user,
                    ":now": to_millis(now),
                    ":tag": tag,
                    ":limit": limit,
                },
                row_to_question,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        with_tags(&self.conn, rows)
    }

    fn next_question(&self, user: &str, now: DateTime<Utc>, tag: Option<&str>) -> Result<Option<Question>> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions q
             WHERE q.user_id = :user AND {TODO_CONDITION} AND {}
             ORDER BY RANDOM()
             LIMIT 1",
            tag_filter(tag)
        );
        let question = self
            .conn
            .query_row(
                &sql,
                rusqlite::named_params! {
                    ":user": user,
                    ":now": to_millis(now),
                    ":tag": tag,
                },
                row_to_question,
            )
            .optional()?;

        match question {
            Some(question) => Ok(with_tags(&self.conn, vec![question])?.pop()),
            None => Ok(None),
        }
    }

    fn skip_question(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        let count = self.conn.execute(
            "UPDATE questions SET last_reviewed_ms = ?1 WHERE id = ?2",
            params![to_millis(now), id],
        )?;
        if count == 0 {
            return Err(DbError::QuestionNotFound(id));
        }
        Ok(())
    }
}

impl ReviewRepository for SqliteRepository {
    fn record_response(&mut self, id: i64, rating: Rating, now: DateTime<Utc>) -> Result<SchedulingResult> {
        // Immediate transaction: one writer per question from load to save.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let before = load_question(&tx, id)?
            .ok_or(DbError::QuestionNotFound(id))?
            .schedule;
        let result = advance(&before, rating, now);
        let after = &result.item;

        tx.execute(
            "UPDATE questions SET state = ?1, learning_step = ?2, interval_ms = ?3, efactor = ?4,
                times_failed = ?5, last_reviewed_ms = ?6
             WHERE id = ?7",
            params![
                after.state.code().to_string(),
                after.learning_step,
                after.interval.num_milliseconds(),
                after.efactor,
                after.times_failed,
                after.last_reviewed.map(to_millis),
                id,
            ],
        )?;
        tx.execute(
            "INSERT INTO responses (question_id, reviewed_ms, rating, state_before, state_after,
                interval_before_ms, interval_after_ms, efactor_before, efactor_after)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                to_millis(now),
                rating.as_str(),
                before.state.code().to_string(),
                after.state.code().to_string(),
                before.interval.num_milliseconds(),
                after.interval.num_milliseconds(),
                before.efactor,
                after.efactor,
            ],
        )?;
        tx.commit()?;

        tracing::debug!(
            id,
            %rating,
            from = %before.state,
            to = %after.state,
            efactor = after.efactor,
            "Recorded response"
        );
        Ok(result)
    }

    fn responses_for(&self, id: i64) -> Result<Vec<ResponseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question_id, reviewed_ms, rating, state_before, state_after,
                interval_before_ms, interval_after_ms, efactor_before, efactor_after
             FROM responses WHERE question_id = ?1 ORDER BY reviewed_ms, id",
        )?;

        let responses = stmt
            .query_map(params![id], |row| {
                Ok(ResponseRecord {
                    id: row.get(0)?,
                    question_id: row.get(1)?,
                    reviewed_at: millis_column(row, 2)?,
                    rating: parsed_column(row, 3)?,
                    state_before: parsed_column(row, 4)?,
                    state_after: parsed_column(row, 5)?,
                    interval_before_ms: row.get(6)?,
                    interval_after_ms: row.get(7)?,
                    efactor_before: row.get(8)?,
                    efactor_after: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(responses)
    }
}

impl StatsRepository for SqliteRepository {
    fn total_progress(&self, user: &str, now: DateTime<Utc>) -> Result<Progress> {
        self.progress_where(
            "q.user_id = :user",
            rusqlite::named_params! { ":user": user, ":now": to_millis(now) },
        )
    }

    fn favorite_progress(&self, user: &str, now: DateTime<Utc>) -> Result<Progress> {
        self.progress_where(
            "q.user_id = :user AND q.is_favorite = 1",
            rusqlite::named_params! { ":user": user, ":now": to_millis(now) },
        )
    }

    fn state_counts(&self, user: &str, tag: Option<&str>) -> Result<Vec<StateCount>> {
        let sql = format!(
            "SELECT q.state, COUNT(*) AS state_count FROM questions q
             WHERE q.user_id = :user AND {}
             GROUP BY q.state
             ORDER BY state_count, q.state",
            tag_filter(tag)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let counts = stmt
            .query_map(rusqlite::named_params! { ":user": user, ":tag": tag }, |row| {
                let state: QuestionState = parsed_column(row, 0)?;
                Ok(StateCount {
                    state,
                    name: state.name(),
                    count: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn tags_still_learning(&self, user: &str) -> Result<Vec<TagCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name, COUNT(DISTINCT q.id) AS learning
             FROM tags t
             JOIN question_tags qt ON qt.tag_id = t.id
             JOIN questions q ON q.id = qt.question_id
             WHERE t.user_id = ?1 AND q.state = 'L'
             GROUP BY t.id
             ORDER BY learning DESC, t.name",
        )?;

        let tags = stmt
            .query_map(params![user], |row| {
                Ok(TagCount {
                    name: row.get(0)?,
                    count: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    fn tags_needing_review(&self, user: &str) -> Result<Vec<TagReview>> {
        // MIN over a group ignores NULLs, so count them separately: a tag with
        // any never-reviewed question sorts first.
        let mut stmt = self.conn.prepare(
            "SELECT t.name,
                    MIN(q.last_reviewed_ms) AS oldest,
                    SUM(CASE WHEN q.last_reviewed_ms IS NULL THEN 1 ELSE 0 END) AS unreviewed
             FROM tags t
             JOIN question_tags qt ON qt.tag_id = t.id
             JOIN questions q ON q.id = qt.question_id
             WHERE t.user_id = ?1
             GROUP BY t.id
             ORDER BY unreviewed > 0 DESC, oldest, t.name",
        )?;

        let tags = stmt
            .query_map(params![user], |row| {
                let unreviewed: i64 = row.get(2)?;
                let last_reviewed = if unreviewed > 0 {
                    None
                } else {
                    optional_millis_column(row, 1)?
                };
                Ok(TagReview {
                    name: row.get(0)?,
                    last_reviewed,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    fn tag_info(&self, user: &str, tag: &str, now: DateTime<Utc>) -> Result<TagInfo> {
        let tag_id = self.tag_id(user, tag)?;

        let last_reviewed: Option<i64> = self.conn.query_row(
            "SELECT MAX(q.last_reviewed_ms) FROM questions q
             JOIN question_tags qt ON qt.question_id = q.id
             WHERE qt.tag_id = ?1",
            params![tag_id],
            |row| row.get(0),
        )?;
        let progress = self.progress_where(
            "q.id IN (SELECT question_id FROM question_tags WHERE tag_id = :tag_id)",
            rusqlite::named_params! { ":tag_id": tag_id, ":now": to_millis(now) },
        )?;

        Ok(TagInfo {
            name: tag.to_string(),
            question_count: progress.count,
            last_reviewed: last_reviewed.and_then(from_millis),
            progress,
        })
    }

    fn random_tag(&self, user: &str, now: DateTime<Utc>) -> Result<Option<TagInfo>> {
        // Pick among distinct tags so heavily used tags are not favored.
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM (
                    SELECT DISTINCT t.name AS name FROM tags t
                    JOIN question_tags qt ON qt.tag_id = t.id
                    WHERE t.user_id = ?1
                 ) ORDER BY RANDOM() LIMIT 1",
                params![user],
                |row| row.get(0),
            )
            .optional()?;

        name.map(|name| self.tag_info(user, &name, now)).transpose()
    }
}

impl TagRepository for SqliteRepository {
    fn pin_tag(&self, user: &str, tag: &str) -> Result<()> {
        let tag_id = self.tag_id(user, tag)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO pinned_tags (user_id, tag_id, sort_order)
             SELECT ?1, ?2, COALESCE(MAX(sort_order), 0) + 1 FROM pinned_tags WHERE user_id = ?1",
            params![user, tag_id],
        )?;
        Ok(())
    }

    fn unpin_tag(&self, user: &str, tag: &str) -> Result<()> {
        let tag_id = self.tag_id(user, tag)?;
        self.conn.execute(
            "DELETE FROM pinned_tags WHERE user_id = ?1 AND tag_id = ?2",
            params![user, tag_id],
        )?;
        Ok(())
    }

    fn pinned_tags(&self, user: &str, now: DateTime<Utc>) -> Result<Vec<TagInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name FROM pinned_tags p
             JOIN tags t ON t.id = p.tag_id
             WHERE p.user_id = ?1
             ORDER BY p.sort_order",
        )?;
        let names = stmt
            .query_map(params![user], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        names
            .iter()
            .map(|name| self.tag_info(user, name, now))
            .collect()
    }
}

/// Filter on an optional `:tag` parameter.
fn tag_filter(tag: Option<&str>) -> &'static str {
    match tag {
        Some(_) => {
            "q.id IN (SELECT qt.question_id FROM question_tags qt
                      JOIN tags t ON t.id = qt.tag_id
                      WHERE t.name = :tag AND t.user_id = q.user_id)"
        }
        None => "(:tag IS NULL)",
    }
}

fn load_question(conn: &Connection, id: i64) -> Result<Option<Question>> {
    let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions q WHERE q.id = ?1");
    let question = conn.query_row(&sql, params![id], row_to_question).optional()?;

    match question {
        Some(question) => Ok(with_tags(conn, vec![question])?.pop()),
        None => Ok(None),
    }
}

fn with_tags(conn: &Connection, mut questions: Vec<Question>) -> Result<Vec<Question>> {
    let mut stmt = conn.prepare(
        "SELECT t.name FROM tags t
         JOIN question_tags qt ON qt.tag_id = t.id
         WHERE qt.question_id = ?1
         ORDER BY t.name",
    )?;

    for question in &mut questions {
        question.tags = stmt
            .query_map(params![question.id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
    }

    Ok(questions)
}

fn row_to_question(row: &rusqlite::Row) -> rusqlite::Result<Question> {
    let interval_ms: i64 = row.get(6)?;
    let interval = interval_from_millis(interval_ms).ok_or_else(|| {
        conversion_error(6, Type::Integer, format!("interval out of range: {interval_ms}"))
    })?;

    Ok(Question {
        id: row.get(0)?,
        user: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        tags: Vec::new(),
        is_favorite: row.get(10)?,
        created: millis_column(row, 11)?,
        schedule: ReviewItem {
            state: parsed_column(row, 4)?,
            learning_step: row.get(5)?,
            interval,
            efactor: row.get(7)?,
            times_failed: row.get(8)?,
            last_reviewed: optional_millis_column(row, 9)?,
        },
    })
}

fn parsed_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = drill_core::DrillError>,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn millis_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    from_millis(ms)
        .ok_or_else(|| conversion_error(idx, Type::Integer, format!("timestamp out of range: {ms}")))
}

fn optional_millis_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(ms) => from_millis(ms).map(Some).ok_or_else(|| {
            conversion_error(idx, Type::Integer, format!("timestamp out of range: {ms}"))
        }),
        None => Ok(None),
    }
}

fn conversion_error(idx: usize, ty: Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, message.into())
}
