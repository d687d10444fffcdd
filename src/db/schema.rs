//! SQL DDL for all quizrec tables.
//!
//! Defines the `quiz_sessions`, `quiz_questions`, `quiz_answers`, and
//! `schema_meta` tables. All DDL uses `IF NOT EXISTS` for idempotent
//! initialization. Embeddings are never persisted — they are derived from
//! question text per recommendation request.

use rusqlite::Connection;

/// All schema DDL statements for quizrec's core tables.
const SCHEMA_SQL: &str = r#"
-- Quiz sessions: one per fetched question batch
CREATE TABLE IF NOT EXISTS quiz_sessions (
    id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    question_count INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'in_progress' CHECK(status IN ('in_progress','completed')),
    score INTEGER,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_sessions_started ON quiz_sessions(started_at);

-- Question bank: immutable once created
CREATE TABLE IF NOT EXISTS quiz_questions (
    question_id INTEGER PRIMARY KEY,
    question_text TEXT NOT NULL,
    description TEXT,
    category TEXT NOT NULL DEFAULT '',
    difficulty TEXT NOT NULL DEFAULT '',
    answers TEXT NOT NULL,
    correct_answers TEXT NOT NULL,
    multiple_correct_answers INTEGER NOT NULL DEFAULT 0,
    correct_answer TEXT,
    explanation TEXT,
    tip TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_questions_created ON quiz_questions(created_at);
CREATE INDEX IF NOT EXISTS idx_questions_category ON quiz_questions(category);

-- Answer records: append-only, one per user response
CREATE TABLE IF NOT EXISTS quiz_answers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES quiz_sessions(id),
    question_id INTEGER NOT NULL,
    selected_answer TEXT NOT NULL,
    is_correct INTEGER NOT NULL,
    answered_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_answers_session ON quiz_answers(session_id);
CREATE INDEX IF NOT EXISTS idx_answers_time ON quiz_answers(answered_at);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
