//! Client for the external quiz question provider (quizapi.io shape).
//!
//! The wire format encodes several booleans as the strings `"true"`/`"false"`;
//! they are parsed here once so the rest of the crate works with real types.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::QuizApiConfig;
use crate::quiz::types::{AnswerOptions, CorrectAnswers, Question, QuestionId, Tag};

/// HTTP client for the question provider.
#[derive(Debug, Clone)]
pub struct QuizApiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    batch_size: usize,
}

/// One question as the provider serializes it.
#[derive(Debug, Deserialize)]
struct WireQuestion {
    id: QuestionId,
    question: String,
    description: Option<String>,
    answers: AnswerOptions,
    multiple_correct_answers: String,
    correct_answers: CorrectAnswers,
    correct_answer: Option<String>,
    explanation: Option<String>,
    tip: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    difficulty: String,
}

impl From<WireQuestion> for Question {
    fn from(w: WireQuestion) -> Self {
        Question {
            id: w.id,
            question: w.question,
            description: w.description,
            answers: w.answers,
            multiple_correct_answers: parse_wire_bool(&w.multiple_correct_answers),
            correct_answers: w.correct_answers,
            correct_answer: w.correct_answer,
            explanation: w.explanation,
            tip: w.tip,
            tags: w.tags,
            category: w.category,
            difficulty: w.difficulty,
        }
    }
}

/// The provider encodes booleans as `"true"`/`"false"` strings.
fn parse_wire_bool(s: &str) -> bool {
    s.eq_ignore_ascii_case("true")
}

impl QuizApiClient {
    pub fn new(config: &QuizApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            batch_size: config.batch_size,
        }
    }

    /// Fetch one question batch from the provider.
    pub async fn fetch_questions(&self) -> Result<Vec<Question>> {
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("limit", &self.batch_size.to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("quiz API request failed for {}", self.url))?;

        anyhow::ensure!(
            response.status().is_success(),
            "quiz API responded with HTTP {}",
            response.status()
        );

        let wire: Vec<WireQuestion> = response
            .json()
            .await
            .context("failed to decode quiz API response")?;

        tracing::info!(count = wire.len(), "fetched question batch");
        Ok(wire.into_iter().map(Question::from).collect())
    }
}
