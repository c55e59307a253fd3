use crate::error::PortalError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub category: Option<String>,
    pub instructor: Option<String>,
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[sqlx(skip)]
    pub lessons: Option<Vec<Lesson>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LessonProgress {
    pub lesson_id: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub options: Vec<AnswerOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

/// Authoring input: a quiz as submitted by the caller, before ids exist.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<OptionDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionDraft {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResult {
    pub quiz_id: String,
    pub user_id: String,
    pub score: u32,
    pub total_questions: u32,
    pub created_at: DateTime<Utc>,
}

/// Checks a draft against the authoring rules and fails fast with the first
/// violated rule. The precedence is user-visible: missing title, empty
/// question list, then per question in order blank prompt, fewer than two
/// options, correct-option count other than one, blank option text.
pub fn validate_draft(draft: &QuizDraft) -> Result<(), PortalError> {
    if draft.title.trim().is_empty() {
        return Err(PortalError::validation("quiz title must not be blank"));
    }
    if draft.questions.is_empty() {
        return Err(PortalError::validation("quiz must contain at least one question"));
    }
    for q in &draft.questions {
        if q.prompt.trim().is_empty() {
            return Err(PortalError::validation("every question needs a prompt"));
        }
        if q.options.len() < 2 {
            return Err(PortalError::validation("every question needs at least 2 options"));
        }
        let correct = q.options.iter().filter(|o| o.is_correct).count();
        if correct != 1 {
            return Err(PortalError::validation(
                "every question needs exactly one option marked correct",
            ));
        }
        if q.options.iter().any(|o| o.text.trim().is_empty()) {
            return Err(PortalError::validation("option text must not be blank"));
        }
    }
    Ok(())
}

/// Counts the questions whose selected option carries the correct flag.
/// A selection that does not match any option of its question simply does
/// not count; it is never an error.
pub fn score_answers(questions: &[Question], answers: &HashMap<String, String>) -> u32 {
    questions
        .iter()
        .filter(|q| {
            answers
                .get(&q.id)
                .map_or(false, |picked| q.options.iter().any(|o| o.id == *picked && o.is_correct))
        })
        .count() as u32
}

/// Score as a whole percentage, rounded half away from zero.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        ((score as f64) * 100.0 / (total as f64)).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(text: &str, is_correct: bool) -> OptionDraft {
        OptionDraft { text: text.into(), is_correct }
    }

    fn sample_draft() -> QuizDraft {
        QuizDraft {
            title: "Safety 101".into(),
            description: Some("Workplace basics".into()),
            questions: vec![
                QuestionDraft {
                    prompt: "Fire exit color".into(),
                    options: vec![option("Green", true), option("Red", false)],
                },
                QuestionDraft {
                    prompt: "Report incidents to".into(),
                    options: vec![
                        option("Nobody", false),
                        option("A colleague", false),
                        option("Your supervisor", true),
                    ],
                },
            ],
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(validate_draft(&sample_draft()).is_ok());
    }

    #[test]
    fn blank_title_reported_before_empty_questions() {
        let draft = QuizDraft { title: "  ".into(), description: None, questions: vec![] };
        let err = validate_draft(&draft).unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn empty_question_list_rejected() {
        let mut draft = sample_draft();
        draft.questions.clear();
        let err = validate_draft(&draft).unwrap_err();
        assert!(err.to_string().contains("at least one question"));
    }

    #[test]
    fn blank_prompt_rejected_before_option_rules() {
        let mut draft = sample_draft();
        draft.questions[0].prompt = " ".into();
        draft.questions[0].options.clear();
        let err = validate_draft(&draft).unwrap_err();
        assert!(err.to_string().contains("prompt"));
    }

    #[test]
    fn single_option_rejected() {
        let mut draft = sample_draft();
        draft.questions[0].options.truncate(1);
        let err = validate_draft(&draft).unwrap_err();
        assert!(err.to_string().contains("at least 2 options"));
    }

    #[test]
    fn two_correct_options_rejected() {
        let mut draft = sample_draft();
        draft.questions[1].options[0].is_correct = true;
        let err = validate_draft(&draft).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn no_correct_option_rejected() {
        let mut draft = sample_draft();
        draft.questions[0].options[0].is_correct = false;
        let err = validate_draft(&draft).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn blank_option_text_rejected() {
        let mut draft = sample_draft();
        draft.questions[1].options[1].text = "   ".into();
        let err = validate_draft(&draft).unwrap_err();
        assert!(err.to_string().contains("option text"));
    }

    fn question(id: &str, correct: &str, wrong: &[&str]) -> Question {
        let mut options = vec![AnswerOption { id: correct.into(), text: "right".into(), is_correct: true }];
        for w in wrong {
            options.push(AnswerOption { id: (*w).into(), text: "wrong".into(), is_correct: false });
        }
        Question { id: id.into(), prompt: "p".into(), options }
    }

    #[test]
    fn scoring_counts_correct_selections() {
        let questions = vec![question("q1", "a", &["b"]), question("q2", "c", &["d", "e"])];
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), "a".to_string());
        answers.insert("q2".to_string(), "d".to_string());
        assert_eq!(score_answers(&questions, &answers), 1);
    }

    #[test]
    fn mismatched_option_id_scores_as_wrong() {
        let questions = vec![question("q1", "a", &["b"])];
        let mut answers = HashMap::new();
        // "c" belongs to no option of q1; scored as not correct, no error.
        answers.insert("q1".to_string(), "c".to_string());
        assert_eq!(score_answers(&questions, &answers), 0);
    }

    #[test]
    fn single_question_boundaries() {
        let questions = vec![question("q1", "a", &["b"])];
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), "a".to_string());
        assert_eq!(score_answers(&questions, &answers), 1);
        assert_eq!(percentage(1, 1), 100);
        answers.insert("q1".to_string(), "b".to_string());
        assert_eq!(score_answers(&questions, &answers), 0);
        assert_eq!(percentage(0, 1), 0);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
    }
}
