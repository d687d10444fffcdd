//! Core quiz domain types.
//!
//! Defines [`Question`] (an immutable quiz question with its options and
//! answer key), [`Session`]/[`SessionStatus`] (one answering session), and
//! [`AnswerRecord`] (one user response, append-only).

use serde::{Deserialize, Serialize};

/// Stable question identifier, assigned by the external quiz API.
pub type QuestionId = i64;

/// Lifecycle status of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Batch fetched, answers still coming in.
    InProgress,
    /// Score submitted, session closed.
    Completed,
}

impl SessionStatus {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("unknown session status: {s}")),
        }
    }
}

/// The up-to-six answer options of a question. Options past the first four
/// are frequently absent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOptions {
    pub answer_a: Option<String>,
    pub answer_b: Option<String>,
    pub answer_c: Option<String>,
    pub answer_d: Option<String>,
    pub answer_e: Option<String>,
    pub answer_f: Option<String>,
}

/// Per-option correctness flags. The external API encodes these as the
/// strings `"true"`/`"false"`; they are carried verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectAnswers {
    pub answer_a_correct: String,
    pub answer_b_correct: String,
    pub answer_c_correct: String,
    pub answer_d_correct: String,
    pub answer_e_correct: String,
    pub answer_f_correct: String,
}

/// A topical tag attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// A quiz question. Immutable once created — re-ingesting the same id is a
/// no-op, and embeddings are always derived from the stored text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier from the external quiz API.
    pub id: QuestionId,
    /// The question text itself.
    pub question: String,
    pub description: Option<String>,
    pub answers: AnswerOptions,
    /// Whether more than one option is correct. Threaded through to every
    /// output shape rather than assumed.
    pub multiple_correct_answers: bool,
    pub correct_answers: CorrectAnswers,
    /// Single correct-answer key, when the source provides one.
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub tip: Option<String>,
    pub tags: Vec<Tag>,
    pub category: String,
    pub difficulty: String,
}

impl Question {
    /// Canonical string the embedding is derived from. Includes category and
    /// difficulty so semantically close questions in different tracks still
    /// separate in vector space.
    pub fn embedding_text(&self) -> String {
        format!(
            "question: {} category: {} difficulty: {}",
            self.question, self.category, self.difficulty
        )
    }
}

/// A quiz session, created when a question batch is fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    /// Owning user, when known. Scopes history reads.
    pub user_id: Option<String>,
    /// ISO 8601 creation timestamp.
    pub started_at: String,
    /// Number of questions fetched for this session.
    pub question_count: u32,
    pub status: SessionStatus,
    /// Final score, set on completion.
    pub score: Option<i64>,
    /// ISO 8601 completion timestamp.
    pub completed_at: Option<String>,
}

/// One user response. Created exactly once, never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub session_id: String,
    pub question_id: QuestionId,
    pub selected_answer: String,
    pub is_correct: bool,
    /// ISO 8601 timestamp of the response.
    pub answered_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    pub(crate) fn sample_question(id: QuestionId, text: &str) -> Question {
        Question {
            id,
            question: text.to_string(),
            description: None,
            answers: AnswerOptions {
                answer_a: Some("A".into()),
                answer_b: Some("B".into()),
                ..Default::default()
            },
            multiple_correct_answers: false,
            correct_answers: CorrectAnswers {
                answer_a_correct: "true".into(),
                answer_b_correct: "false".into(),
                ..Default::default()
            },
            correct_answer: Some("answer_a".into()),
            explanation: None,
            tip: None,
            tags: vec![Tag { name: "linux".into() }],
            category: "Linux".into(),
            difficulty: "Easy".into(),
        }
    }

    #[test]
    fn embedding_text_is_canonical() {
        let q = sample_question(7, "What does chmod do?");
        assert_eq!(
            q.embedding_text(),
            "question: What does chmod do? category: Linux difficulty: Easy"
        );
    }

    #[test]
    fn session_status_round_trips() {
        for status in [SessionStatus::InProgress, SessionStatus::Completed] {
            assert_eq!(SessionStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(SessionStatus::from_str("bogus").is_err());
    }

    #[test]
    fn question_serializes_wire_shape() {
        let q = sample_question(1, "Q?");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["multiple_correct_answers"], false);
        assert_eq!(json["answers"]["answer_a"], "A");
        assert_eq!(json["correct_answers"]["answer_a_correct"], "true");
        assert_eq!(json["tags"][0]["name"], "linux");
    }
}
