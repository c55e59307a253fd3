use crate::error::PortalError;
use crate::models::{percentage, score_answers, Quiz, QuizResult};
use crate::store::AssessmentStore;
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    InProgress,
    Submitted,
}

/// One user's pass through a quiz. Owned exclusively by the engine; the
/// answer map lives only here and is never persisted.
pub struct QuizAttempt {
    quiz: Quiz,
    user_id: String,
    answers: HashMap<String, String>,
    state: AttemptState,
}

impl QuizAttempt {
    fn new(quiz: Quiz, user_id: &str) -> Self {
        Self {
            quiz,
            user_id: user_id.to_string(),
            answers: HashMap::new(),
            state: AttemptState::InProgress,
        }
    }

    /// Records a selection, overwriting any prior one for that question.
    /// Whether the option actually belongs to the question is not checked
    /// here; a mismatched pair scores as "not correct" at submission.
    fn select_answer(&mut self, question_id: &str, option_id: &str) -> Result<(), PortalError> {
        if self.state == AttemptState::Submitted {
            return Err(PortalError::validation("attempt already submitted"));
        }
        self.answers.insert(question_id.to_string(), option_id.to_string());
        Ok(())
    }

    fn submit(&mut self) -> Result<Scorecard, PortalError> {
        if self.state == AttemptState::Submitted {
            return Err(PortalError::validation("attempt already submitted"));
        }
        let unanswered = self
            .quiz
            .questions
            .iter()
            .filter(|q| !self.answers.contains_key(&q.id))
            .count();
        if unanswered > 0 {
            return Err(PortalError::validation(format!(
                "{unanswered} question(s) still unanswered"
            )));
        }
        let score = score_answers(&self.quiz.questions, &self.answers);
        let total = self.quiz.questions.len() as u32;
        self.state = AttemptState::Submitted;
        Ok(Scorecard { score, total_questions: total, percentage: percentage(score, total) })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Scorecard {
    pub score: u32,
    #[serde(rename = "totalQuestions")]
    pub total_questions: u32,
    pub percentage: u32,
}

/// Owns all in-flight attempts, keyed by an opaque attempt id.
pub struct SessionEngine {
    store: Arc<dyn AssessmentStore>,
    attempts: DashMap<String, QuizAttempt>,
}

impl SessionEngine {
    pub fn new(store: Arc<dyn AssessmentStore>) -> Self {
        Self { store, attempts: DashMap::new() }
    }

    /// Loads the quiz with full knowledge of the correct answers and opens
    /// an attempt in progress for it.
    pub async fn start_attempt(&self, quiz_id: &str, user_id: &str) -> Result<(String, Quiz), PortalError> {
        let quiz = self
            .store
            .get_quiz(quiz_id)
            .await?
            .ok_or(PortalError::NotFound("quiz"))?;
        let attempt_id = uuid::Uuid::new_v4().to_string();
        self.attempts.insert(attempt_id.clone(), QuizAttempt::new(quiz.clone(), user_id));
        Ok((attempt_id, quiz))
    }

    pub fn select_answer(&self, attempt_id: &str, question_id: &str, option_id: &str) -> Result<(), PortalError> {
        let mut attempt = self
            .attempts
            .get_mut(attempt_id)
            .ok_or(PortalError::NotFound("attempt"))?;
        attempt.select_answer(question_id, option_id)
    }

    /// Scores the attempt and moves it to its terminal state. The result row
    /// is written best-effort after scoring: the scorecard is returned even
    /// when the write fails, and only the failure is logged.
    pub async fn submit(&self, attempt_id: &str) -> Result<Scorecard, PortalError> {
        let (card, result) = {
            let mut attempt = self
                .attempts
                .get_mut(attempt_id)
                .ok_or(PortalError::NotFound("attempt"))?;
            let card = attempt.submit()?;
            let result = QuizResult {
                quiz_id: attempt.quiz.id.clone(),
                user_id: attempt.user_id.clone(),
                score: card.score,
                total_questions: card.total_questions,
                created_at: Utc::now(),
            };
            (card, result)
            // Guard dropped here; the map lock must not be held across the
            // store round trip below.
        };

        if let Err(err) = self.store.insert_result(&result).await {
            warn!(
                "failed to persist result for quiz {} (user {}): {}",
                result.quiz_id, result.user_id, err
            );
        }
        Ok(card)
    }
}
