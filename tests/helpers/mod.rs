#![allow(dead_code)]

use anyhow::Result;
use rusqlite::Connection;

use quizrec::embedding::EmbeddingProvider;
use quizrec::quiz::types::{
    AnswerOptions, AnswerRecord, CorrectAnswers, Question, QuestionId, Tag,
};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    quizrec::db::schema::init_schema(&conn).unwrap();
    quizrec::db::migrations::run_migrations(&conn).unwrap();
    conn
}

pub const TEST_DIM: usize = 16;

/// Deterministic embedding provider: reads `axis:N` out of the canonical
/// embedding text and returns the unit vector along axis N. Texts containing
/// `poison` fail, for exercising the fail-soft path.
pub struct AxisProvider;

impl EmbeddingProvider for AxisProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("poison") {
            anyhow::bail!("inference failed");
        }
        let axis = text
            .split("axis:")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|token| token.parse::<usize>().ok())
            .unwrap_or(0);
        let mut v = vec![0.0f32; TEST_DIM];
        v[axis % TEST_DIM] = 1.0;
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }
}

/// A question whose embedding (under [`AxisProvider`]) is the unit vector
/// along `axis`.
pub fn axis_question(id: QuestionId, axis: usize) -> Question {
    Question {
        id,
        question: format!("axis:{axis}"),
        description: None,
        answers: AnswerOptions {
            answer_a: Some("yes".into()),
            answer_b: Some("no".into()),
            ..Default::default()
        },
        multiple_correct_answers: false,
        correct_answers: CorrectAnswers {
            answer_a_correct: "true".into(),
            ..Default::default()
        },
        correct_answer: Some("answer_a".into()),
        explanation: None,
        tip: None,
        tags: vec![Tag { name: "test".into() }],
        category: "Linux".into(),
        difficulty: "Easy".into(),
    }
}

/// Build an answer record for a session.
pub fn answer(session_id: &str, question_id: QuestionId, correct: bool, at: &str) -> AnswerRecord {
    AnswerRecord {
        session_id: session_id.to_string(),
        question_id,
        selected_answer: "answer_a".into(),
        is_correct: correct,
        answered_at: at.to_string(),
    }
}
