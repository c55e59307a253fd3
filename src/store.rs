use crate::error::PortalError;
use crate::models::{
    AnswerOption, Course, Lesson, LessonProgress, OptionDraft, Question, Quiz, QuizResult,
    QuizSummary,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::RwLock;

/// Embedded store behind the course catalog and lesson progress.
#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn list_courses(&self) -> Result<Vec<Course>, PortalError>;
    async fn get_course(&self, id: i64) -> Result<Option<Course>, PortalError>;
    async fn progress_for_user(&self, user_id: &str) -> Result<Vec<LessonProgress>, PortalError>;
    async fn upsert_progress(
        &self,
        user_id: &str,
        lesson_id: i64,
        completed: bool,
    ) -> Result<(), PortalError>;
}

/// Remote store behind quizzes, questions, options and results. Callers hold
/// this as `Arc<dyn AssessmentStore>` and never see which adapter backs it.
/// No operation is retried here; retry policy belongs to the caller.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn insert_quiz(&self, title: &str, description: Option<&str>) -> Result<String, PortalError>;
    async fn insert_question(&self, quiz_id: &str, prompt: &str) -> Result<String, PortalError>;
    async fn insert_options(&self, question_id: &str, options: &[OptionDraft]) -> Result<(), PortalError>;
    async fn delete_quiz(&self, quiz_id: &str) -> Result<(), PortalError>;
    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, PortalError>;
    async fn get_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>, PortalError>;
    async fn insert_result(&self, result: &QuizResult) -> Result<(), PortalError>;
}

pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseStore for SqliteCatalog {
    async fn list_courses(&self) -> Result<Vec<Course>, PortalError> {
        sqlx::query_as::<_, Course>(
            "SELECT id, title, description, thumbnail, category, instructor, duration FROM courses",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(PortalError::storage)
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>, PortalError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, title, description, thumbnail, category, instructor, duration FROM courses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(PortalError::storage)?;

        let Some(mut course) = course else {
            return Ok(None);
        };
        let lessons = sqlx::query_as::<_, Lesson>(
            "SELECT id, course_id, title, content, video_url, order_index FROM lessons WHERE course_id = ? ORDER BY order_index",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(PortalError::storage)?;
        course.lessons = Some(lessons);
        Ok(Some(course))
    }

    async fn progress_for_user(&self, user_id: &str) -> Result<Vec<LessonProgress>, PortalError> {
        sqlx::query_as::<_, LessonProgress>(
            "SELECT lesson_id, completed FROM progress WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(PortalError::storage)
    }

    async fn upsert_progress(
        &self,
        user_id: &str,
        lesson_id: i64,
        completed: bool,
    ) -> Result<(), PortalError> {
        sqlx::query("INSERT OR REPLACE INTO progress (user_id, lesson_id, completed) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(lesson_id)
            .bind(completed)
            .execute(&self.pool)
            .await
            .map_err(PortalError::storage)?;
        Ok(())
    }
}

/// Adapter for a hosted relational API speaking the PostgREST conventions:
/// one route per table, `?column=eq.value` filters, `Prefer:
/// return=representation` to read back generated ids.
pub struct RestAssessmentStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: String,
}

#[derive(Debug, Deserialize)]
struct QuestionRow {
    id: String,
    prompt: String,
    #[serde(default)]
    options: Vec<AnswerOption>,
}

impl RestAssessmentStore {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("QUIZ_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        let api_key = std::env::var("QUIZ_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        Some(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn insert_returning_id(
        &self,
        table: &str,
        body: serde_json::Value,
    ) -> Result<String, PortalError> {
        let rows: Vec<InsertedRow> = self
            .request(self.http.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(PortalError::storage)?
            .error_for_status()
            .map_err(PortalError::storage)?
            .json()
            .await
            .map_err(PortalError::storage)?;
        rows.into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| PortalError::storage(anyhow!("{table} insert returned no row")))
    }
}

#[async_trait]
impl AssessmentStore for RestAssessmentStore {
    async fn insert_quiz(&self, title: &str, description: Option<&str>) -> Result<String, PortalError> {
        self.insert_returning_id("assessments", json!({ "title": title, "description": description }))
            .await
    }

    async fn insert_question(&self, quiz_id: &str, prompt: &str) -> Result<String, PortalError> {
        self.insert_returning_id("questions", json!({ "assessment_id": quiz_id, "prompt": prompt }))
            .await
    }

    async fn insert_options(&self, question_id: &str, options: &[OptionDraft]) -> Result<(), PortalError> {
        let rows: Vec<_> = options
            .iter()
            .map(|o| json!({ "question_id": question_id, "text": o.text, "is_correct": o.is_correct }))
            .collect();
        self.request(self.http.post(self.table_url("options")))
            .json(&rows)
            .send()
            .await
            .map_err(PortalError::storage)?
            .error_for_status()
            .map_err(PortalError::storage)?;
        Ok(())
    }

    async fn delete_quiz(&self, quiz_id: &str) -> Result<(), PortalError> {
        // Child rows go with it via ON DELETE CASCADE on the remote schema.
        self.request(self.http.delete(self.table_url("assessments")))
            .query(&[("id", format!("eq.{quiz_id}"))])
            .send()
            .await
            .map_err(PortalError::storage)?
            .error_for_status()
            .map_err(PortalError::storage)?;
        Ok(())
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, PortalError> {
        self.request(self.http.get(self.table_url("assessments")))
            .query(&[("select", "id,title,description,created_at"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(PortalError::storage)?
            .error_for_status()
            .map_err(PortalError::storage)?
            .json()
            .await
            .map_err(PortalError::storage)
    }

    async fn get_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>, PortalError> {
        let summaries: Vec<QuizSummary> = self
            .request(self.http.get(self.table_url("assessments")))
            .query(&[
                ("select", "id,title,description,created_at".to_string()),
                ("id", format!("eq.{quiz_id}")),
            ])
            .send()
            .await
            .map_err(PortalError::storage)?
            .error_for_status()
            .map_err(PortalError::storage)?
            .json()
            .await
            .map_err(PortalError::storage)?;
        let Some(summary) = summaries.into_iter().next() else {
            return Ok(None);
        };

        let questions: Vec<QuestionRow> = self
            .request(self.http.get(self.table_url("questions")))
            .query(&[
                ("select", "id,prompt,options(id,text,is_correct)".to_string()),
                ("assessment_id", format!("eq.{quiz_id}")),
            ])
            .send()
            .await
            .map_err(PortalError::storage)?
            .error_for_status()
            .map_err(PortalError::storage)?
            .json()
            .await
            .map_err(PortalError::storage)?;

        Ok(Some(Quiz {
            id: summary.id,
            title: summary.title,
            description: summary.description,
            created_at: summary.created_at,
            questions: questions
                .into_iter()
                .map(|q| Question { id: q.id, prompt: q.prompt, options: q.options })
                .collect(),
        }))
    }

    async fn insert_result(&self, result: &QuizResult) -> Result<(), PortalError> {
        self.request(self.http.post(self.table_url("results")))
            .json(&json!({
                "assessment_id": result.quiz_id,
                "user_id": result.user_id,
                "score": result.score,
                "total_questions": result.total_questions,
            }))
            .send()
            .await
            .map_err(PortalError::storage)?
            .error_for_status()
            .map_err(PortalError::storage)?;
        Ok(())
    }
}

/// In-memory fallback used when the remote API is not configured, so the
/// binary runs standalone. Also the store the test suite drives.
#[derive(Default)]
pub struct MemoryAssessmentStore {
    quizzes: RwLock<Vec<Quiz>>,
    results: RwLock<Vec<QuizResult>>,
}

impl MemoryAssessmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn results(&self) -> Vec<QuizResult> {
        self.results.read().await.clone()
    }
}

#[async_trait]
impl AssessmentStore for MemoryAssessmentStore {
    async fn insert_quiz(&self, title: &str, description: Option<&str>) -> Result<String, PortalError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.quizzes.write().await.push(Quiz {
            id: id.clone(),
            title: title.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
            questions: Vec::new(),
        });
        Ok(id)
    }

    async fn insert_question(&self, quiz_id: &str, prompt: &str) -> Result<String, PortalError> {
        let mut quizzes = self.quizzes.write().await;
        let quiz = quizzes
            .iter_mut()
            .find(|q| q.id == quiz_id)
            .ok_or_else(|| PortalError::storage(anyhow!("question references unknown quiz {quiz_id}")))?;
        let id = uuid::Uuid::new_v4().to_string();
        quiz.questions.push(Question { id: id.clone(), prompt: prompt.to_string(), options: Vec::new() });
        Ok(id)
    }

    async fn insert_options(&self, question_id: &str, options: &[OptionDraft]) -> Result<(), PortalError> {
        let mut quizzes = self.quizzes.write().await;
        let question = quizzes
            .iter_mut()
            .flat_map(|q| q.questions.iter_mut())
            .find(|q| q.id == question_id)
            .ok_or_else(|| PortalError::storage(anyhow!("options reference unknown question {question_id}")))?;
        question.options.extend(options.iter().map(|o| AnswerOption {
            id: uuid::Uuid::new_v4().to_string(),
            text: o.text.clone(),
            is_correct: o.is_correct,
        }));
        Ok(())
    }

    async fn delete_quiz(&self, quiz_id: &str) -> Result<(), PortalError> {
        self.quizzes.write().await.retain(|q| q.id != quiz_id);
        Ok(())
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, PortalError> {
        // Insertion order is creation order; newest first.
        Ok(self
            .quizzes
            .read()
            .await
            .iter()
            .rev()
            .map(|q| QuizSummary {
                id: q.id.clone(),
                title: q.title.clone(),
                description: q.description.clone(),
                created_at: q.created_at,
            })
            .collect())
    }

    async fn get_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>, PortalError> {
        Ok(self.quizzes.read().await.iter().find(|q| q.id == quiz_id).cloned())
    }

    async fn insert_result(&self, result: &QuizResult) -> Result<(), PortalError> {
        self.results.write().await.push(result.clone());
        Ok(())
    }
}
