use crate::error::PortalError;
use crate::models::{validate_draft, OptionDraft, QuizDraft};
use crate::store::AssessmentStore;
use tracing::{info, warn};

/// Validates a draft and persists it as quiz, questions and option batches,
/// in that order. Validation runs before any write, so a rejected draft
/// leaves no rows behind. If a write fails after the quiz row exists, the
/// partially written quiz is deleted again; the original error is what the
/// caller sees either way.
pub async fn create_quiz(store: &dyn AssessmentStore, draft: &QuizDraft) -> Result<String, PortalError> {
    validate_draft(draft)?;

    let description = draft
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let quiz_id = store.insert_quiz(draft.title.trim(), description).await?;

    if let Err(err) = persist_questions(store, &quiz_id, draft).await {
        if let Err(cleanup) = store.delete_quiz(&quiz_id).await {
            warn!("cleanup of partially written quiz {} failed: {}", quiz_id, cleanup);
        }
        return Err(err);
    }

    info!("quiz {} created with {} questions", quiz_id, draft.questions.len());
    Ok(quiz_id)
}

async fn persist_questions(
    store: &dyn AssessmentStore,
    quiz_id: &str,
    draft: &QuizDraft,
) -> Result<(), PortalError> {
    for q in &draft.questions {
        let question_id = store.insert_question(quiz_id, q.prompt.trim()).await?;
        let options: Vec<OptionDraft> = q
            .options
            .iter()
            .map(|o| OptionDraft { text: o.text.trim().to_string(), is_correct: o.is_correct })
            .collect();
        store.insert_options(&question_id, &options).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionDraft, Quiz, QuizResult, QuizSummary};
    use crate::store::MemoryAssessmentStore;
    use anyhow::anyhow;
    use async_trait::async_trait;

    fn draft() -> QuizDraft {
        QuizDraft {
            title: "  Safety 101  ".into(),
            description: Some("Induction quiz".into()),
            questions: vec![
                QuestionDraft {
                    prompt: "Fire exit color".into(),
                    options: vec![
                        OptionDraft { text: "Green".into(), is_correct: true },
                        OptionDraft { text: "Red".into(), is_correct: false },
                    ],
                },
                QuestionDraft {
                    prompt: "Report incidents to".into(),
                    options: vec![
                        OptionDraft { text: "Nobody".into(), is_correct: false },
                        OptionDraft { text: "A colleague".into(), is_correct: false },
                        OptionDraft { text: "Your supervisor ".into(), is_correct: true },
                    ],
                },
            ],
        }
    }

    #[tokio::test]
    async fn round_trip_preserves_structure() {
        let store = MemoryAssessmentStore::new();
        let quiz_id = create_quiz(&store, &draft()).await.unwrap();

        let quiz = store.get_quiz(&quiz_id).await.unwrap().unwrap();
        assert_eq!(quiz.title, "Safety 101");
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].options.len(), 2);
        assert_eq!(quiz.questions[1].options.len(), 3);
        let correct: Vec<&str> = quiz
            .questions
            .iter()
            .flat_map(|q| q.options.iter())
            .filter(|o| o.is_correct)
            .map(|o| o.text.as_str())
            .collect();
        assert_eq!(correct, vec!["Green", "Your supervisor"]);
    }

    #[tokio::test]
    async fn invalid_draft_writes_nothing() {
        let store = MemoryAssessmentStore::new();
        let mut bad = draft();
        bad.questions[0].options[1].is_correct = true;
        let err = create_quiz(&store, &bad).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));
        assert!(store.list_quizzes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_draft_fails_on_title_first() {
        let store = MemoryAssessmentStore::new();
        let bad = QuizDraft { title: "".into(), description: Some("".into()), questions: vec![] };
        let err = create_quiz(&store, &bad).await.unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    struct BrokenOptionWrites {
        inner: MemoryAssessmentStore,
    }

    #[async_trait]
    impl AssessmentStore for BrokenOptionWrites {
        async fn insert_quiz(&self, title: &str, description: Option<&str>) -> Result<String, PortalError> {
            self.inner.insert_quiz(title, description).await
        }
        async fn insert_question(&self, quiz_id: &str, prompt: &str) -> Result<String, PortalError> {
            self.inner.insert_question(quiz_id, prompt).await
        }
        async fn insert_options(&self, _question_id: &str, _options: &[OptionDraft]) -> Result<(), PortalError> {
            Err(PortalError::storage(anyhow!("connection reset")))
        }
        async fn delete_quiz(&self, quiz_id: &str) -> Result<(), PortalError> {
            self.inner.delete_quiz(quiz_id).await
        }
        async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, PortalError> {
            self.inner.list_quizzes().await
        }
        async fn get_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>, PortalError> {
            self.inner.get_quiz(quiz_id).await
        }
        async fn insert_result(&self, result: &QuizResult) -> Result<(), PortalError> {
            self.inner.insert_result(result).await
        }
    }

    #[tokio::test]
    async fn partial_write_is_compensated() {
        let store = BrokenOptionWrites { inner: MemoryAssessmentStore::new() };
        let err = create_quiz(&store, &draft()).await.unwrap_err();
        assert!(matches!(err, PortalError::Storage(_)));
        assert!(store.inner.list_quizzes().await.unwrap().is_empty());
    }
}
