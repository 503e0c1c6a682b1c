//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema for the local SQLite database.
///
/// Timestamps and intervals are stored as Unix milliseconds.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- Questions and their scheduling state
CREATE TABLE IF NOT EXISTS questions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    state TEXT NOT NULL DEFAULT 'N' CHECK (state IN ('N', 'L', 'R')),
    learning_step INTEGER NOT NULL DEFAULT 1,
    interval_ms INTEGER NOT NULL DEFAULT 86400000,
    efactor REAL NOT NULL DEFAULT 2.5,
    times_failed INTEGER NOT NULL DEFAULT 0,
    last_reviewed_ms INTEGER,
    is_favorite INTEGER NOT NULL DEFAULT 0,
    created_ms INTEGER NOT NULL
);

-- Per-user tags
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    UNIQUE (user_id, name)
);

CREATE TABLE IF NOT EXISTS question_tags (
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (question_id, tag_id)
);

-- Review log
CREATE TABLE IF NOT EXISTS responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    reviewed_ms INTEGER NOT NULL,
    rating TEXT NOT NULL,
    state_before TEXT NOT NULL,
    state_after TEXT NOT NULL,
    interval_before_ms INTEGER NOT NULL,
    interval_after_ms INTEGER NOT NULL,
    efactor_before REAL NOT NULL,
    efactor_after REAL NOT NULL
);

-- Tags pinned to the drill overview
CREATE TABLE IF NOT EXISTS pinned_tags (
    user_id TEXT NOT NULL,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    sort_order INTEGER NOT NULL,
    PRIMARY KEY (user_id, tag_id)
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_questions_user ON questions(user_id);
CREATE INDEX IF NOT EXISTS idx_questions_due ON questions(user_id, last_reviewed_ms);
CREATE INDEX IF NOT EXISTS idx_question_tags_tag ON question_tags(tag_id);
CREATE INDEX IF NOT EXISTS idx_responses_question ON responses(question_id);
"#;

/// Record the schema version if not already present.
pub const INIT_SCHEMA_VERSION: &str = r#"
INSERT OR IGNORE INTO schema_version (version) VALUES (1);
"#;
