//! SQLite persistence for sessions, questions, and answers.
//!
//! Free functions over a [`Connection`], one per operation the routes and the
//! recommendation engine need. Questions are immutable — re-ingesting a known
//! id is a no-op. Answers are append-only. The [`HistoryStore`] impl at the
//! bottom is the seam the recommendation engine consumes.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::quiz::types::{
    AnswerOptions, AnswerRecord, CorrectAnswers, Question, QuestionId, Session, SessionStatus, Tag,
};
use crate::recommend::{HistoryStore, RecommendScope};

/// One answer row joined with its question text, for the session-detail view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnswerDetail {
    pub id: i64,
    pub session_id: String,
    pub question_id: QuestionId,
    pub selected_answer: String,
    pub is_correct: bool,
    pub answered_at: String,
    /// `None` when the question row no longer resolves.
    pub question_text: Option<String>,
}

// ── Sessions ──────────────────────────────────────────────────────────────────

/// Create a new in-progress session sized to a fetched question batch.
pub fn create_session(
    conn: &Connection,
    user_id: Option<&str>,
    question_count: u32,
) -> Result<Session> {
    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO quiz_sessions (id, user_id, started_at, question_count, status) \
         VALUES (?1, ?2, ?3, ?4, 'in_progress')",
        params![id, user_id, now, question_count],
    )?;

    Ok(Session {
        id,
        user_id: user_id.map(str::to_string),
        started_at: now,
        question_count,
        status: SessionStatus::InProgress,
        score: None,
        completed_at: None,
    })
}

/// Fetch a session by id. `None` when it does not exist.
pub fn session_by_id(conn: &Connection, session_id: &str) -> Result<Option<Session>> {
    let session = conn
        .query_row(
            "SELECT id, user_id, started_at, question_count, status, score, completed_at \
             FROM quiz_sessions WHERE id = ?1",
            params![session_id],
            session_from_row,
        )
        .optional()?;
    Ok(session)
}

/// Update a session's score and/or completion status. Sessions are never
/// deleted; this is the only mutation they see. Returns the updated session,
/// or `None` when the id does not exist.
pub fn update_session(
    conn: &Connection,
    session_id: &str,
    score: Option<i64>,
    completed: bool,
) -> Result<Option<Session>> {
    let rows = if completed {
        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE quiz_sessions SET status = 'completed', completed_at = ?1, \
             score = COALESCE(?2, score) WHERE id = ?3",
            params![now, score, session_id],
        )?
    } else {
        conn.execute(
            "UPDATE quiz_sessions SET status = 'in_progress', \
             score = COALESCE(?1, score) WHERE id = ?2",
            params![score, session_id],
        )?
    };

    if rows == 0 {
        return Ok(None);
    }
    session_by_id(conn, session_id)
}

/// All sessions for a user, newest first.
pub fn sessions_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Session>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, started_at, question_count, status, score, completed_at \
         FROM quiz_sessions WHERE user_id = ?1 ORDER BY started_at DESC",
    )?;
    let sessions = stmt
        .query_map(params![user_id], session_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sessions)
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let status_str: String = row.get(4)?;
    let status = SessionStatus::from_str(&status_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        started_at: row.get(2)?,
        question_count: row.get(3)?,
        status,
        score: row.get(5)?,
        completed_at: row.get(6)?,
    })
}

// ── Questions ─────────────────────────────────────────────────────────────────

/// Ingest a question batch. Questions are immutable once created, so known
/// ids are skipped (`INSERT OR IGNORE`). Runs in one transaction. Returns the
/// number of newly inserted rows.
pub fn ingest_questions(conn: &mut Connection, questions: &[Question]) -> Result<usize> {
    let tx = conn.transaction()?;
    let now = chrono::Utc::now().to_rfc3339();
    let mut inserted = 0usize;

    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO quiz_questions \
             (question_id, question_text, description, category, difficulty, answers, \
              correct_answers, multiple_correct_answers, correct_answer, explanation, tip, \
              tags, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;

        for q in questions {
            inserted += stmt.execute(params![
                q.id,
                q.question,
                q.description,
                q.category,
                q.difficulty,
                serde_json::to_string(&q.answers)?,
                serde_json::to_string(&q.correct_answers)?,
                q.multiple_correct_answers,
                q.correct_answer,
                q.explanation,
                q.tip,
                serde_json::to_string(&q.tags)?,
                now,
            ])?;
        }
    }

    tx.commit()?;
    Ok(inserted)
}

const QUESTION_COLUMNS: &str = "question_id, question_text, description, category, difficulty, \
     answers, correct_answers, multiple_correct_answers, correct_answer, explanation, tip, tags";

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<Question> {
    let answers_json: String = row.get(5)?;
    let correct_json: String = row.get(6)?;
    let tags_json: String = row.get(11)?;
    Ok(Question {
        id: row.get(0)?,
        question: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        difficulty: row.get(4)?,
        answers: serde_json::from_str::<AnswerOptions>(&answers_json).unwrap_or_default(),
        correct_answers: serde_json::from_str::<CorrectAnswers>(&correct_json).unwrap_or_default(),
        multiple_correct_answers: row.get(7)?,
        correct_answer: row.get(8)?,
        explanation: row.get(9)?,
        tip: row.get(10)?,
        tags: serde_json::from_str::<Vec<Tag>>(&tags_json).unwrap_or_default(),
    })
}

/// Batch-fetch questions by id, keyed for lookup. Missing ids are simply
/// absent from the result (fail-soft resolution).
pub fn questions_by_ids(
    conn: &Connection,
    ids: &[QuestionId],
) -> Result<HashMap<QuestionId, Question>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    // Build a parameterized IN clause
    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT {QUESTION_COLUMNS} FROM quiz_questions WHERE question_id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let sql_params: Vec<&dyn rusqlite::types::ToSql> =
        ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

    let rows = stmt
        .query_map(sql_params.as_slice(), question_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut map = HashMap::new();
    for q in rows {
        map.insert(q.id, q);
    }
    Ok(map)
}

/// The most recently ingested questions, newest first. This is the candidate
/// page for recommendations; `cap` is a pagination control.
pub fn recent_questions(conn: &Connection, cap: usize) -> Result<Vec<Question>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {QUESTION_COLUMNS} FROM quiz_questions \
         ORDER BY created_at DESC, question_id DESC LIMIT ?1"
    ))?;
    let questions = stmt
        .query_map(params![cap as i64], question_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(questions)
}

// ── Answers ───────────────────────────────────────────────────────────────────

/// Append one answer record. Returns the rowid. The session must exist
/// (enforced by the foreign key); the question is deliberately not checked —
/// a dangling reference degrades to fail-soft exclusion at read time.
pub fn save_answer(conn: &Connection, answer: &AnswerRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO quiz_answers (session_id, question_id, selected_answer, is_correct, answered_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            answer.session_id,
            answer.question_id,
            answer.selected_answer,
            answer.is_correct,
            answer.answered_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn answer_from_row(row: &Row<'_>) -> rusqlite::Result<AnswerRecord> {
    Ok(AnswerRecord {
        session_id: row.get(0)?,
        question_id: row.get(1)?,
        selected_answer: row.get(2)?,
        is_correct: row.get(3)?,
        answered_at: row.get(4)?,
    })
}

/// The most recent answers of one session, newest first, capped at `window`.
pub fn answers_for_session(
    conn: &Connection,
    session_id: &str,
    window: usize,
) -> Result<Vec<AnswerRecord>> {
    let mut stmt = conn.prepare(
        "SELECT session_id, question_id, selected_answer, is_correct, answered_at \
         FROM quiz_answers WHERE session_id = ?1 \
         ORDER BY answered_at DESC, id DESC LIMIT ?2",
    )?;
    let answers = stmt
        .query_map(params![session_id, window as i64], answer_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(answers)
}

/// The most recent answers across all of one user's sessions, newest first,
/// capped at `window`.
pub fn answers_for_user(
    conn: &Connection,
    user_id: &str,
    window: usize,
) -> Result<Vec<AnswerRecord>> {
    let mut stmt = conn.prepare(
        "SELECT a.session_id, a.question_id, a.selected_answer, a.is_correct, a.answered_at \
         FROM quiz_answers a JOIN quiz_sessions s ON a.session_id = s.id \
         WHERE s.user_id = ?1 \
         ORDER BY a.answered_at DESC, a.id DESC LIMIT ?2",
    )?;
    let answers = stmt
        .query_map(params![user_id, window as i64], answer_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(answers)
}

/// All answers of a session joined with their question text, oldest first.
pub fn session_answers_with_text(
    conn: &Connection,
    session_id: &str,
) -> Result<Vec<AnswerDetail>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.session_id, a.question_id, a.selected_answer, a.is_correct, \
                a.answered_at, q.question_text \
         FROM quiz_answers a \
         LEFT JOIN quiz_questions q ON a.question_id = q.question_id \
         WHERE a.session_id = ?1 ORDER BY a.answered_at, a.id",
    )?;
    let details = stmt
        .query_map(params![session_id], |row| {
            Ok(AnswerDetail {
                id: row.get(0)?,
                session_id: row.get(1)?,
                question_id: row.get(2)?,
                selected_answer: row.get(3)?,
                is_correct: row.get(4)?,
                answered_at: row.get(5)?,
                question_text: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(details)
}

// ── Recommendation engine seam ────────────────────────────────────────────────

impl HistoryStore for Connection {
    fn answers_for_scope(
        &self,
        scope: &RecommendScope,
        window: usize,
    ) -> Result<Vec<AnswerRecord>> {
        match scope {
            RecommendScope::Session(id) => answers_for_session(self, id, window),
            RecommendScope::User(id) => answers_for_user(self, id, window),
        }
    }

    fn recent_questions(&self, cap: usize) -> Result<Vec<Question>> {
        recent_questions(self, cap)
    }

    fn questions_by_ids(&self, ids: &[QuestionId]) -> Result<HashMap<QuestionId, Question>> {
        questions_by_ids(self, ids)
    }
}
