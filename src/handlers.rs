use crate::authoring;
use crate::error::{AppError, PortalError};
use crate::models::{Course, LessonProgress, Quiz, QuizDraft, QuizSummary};
use crate::session::Scorecard;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub async fn list_courses(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Course>>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let courses = state
        .catalog
        .list_courses()
        .await
        .map_err(|e| AppError::from_portal(e, req_id))?;
    Ok(Json(courses))
}

pub async fn get_course(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Course>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let course = state
        .catalog
        .get_course(id)
        .await
        .map_err(|e| AppError::from_portal(e, req_id.clone()))?
        .ok_or_else(|| AppError::from_portal(PortalError::NotFound("course"), req_id))?;
    Ok(Json(course))
}

pub async fn progress_for_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<LessonProgress>>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let progress = state
        .catalog
        .progress_for_user(&user_id)
        .await
        .map_err(|e| AppError::from_portal(e, req_id))?;
    Ok(Json(progress))
}

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "lessonId")]
    pub lesson_id: i64,
    pub completed: bool,
}

pub async fn update_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ProgressUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let req_id = request_id_from_headers(&headers);
    state
        .catalog
        .upsert_progress(&payload.user_id, payload.lesson_id, payload.completed)
        .await
        .map_err(|e| AppError::from_portal(e, req_id))?;
    Ok(Json(json!({ "success": true })))
}

pub async fn create_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<QuizDraft>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let req_id = request_id_from_headers(&headers);
    let quiz_id = authoring::create_quiz(state.assessments.as_ref(), &draft)
        .await
        .map_err(|e| AppError::from_portal(e, req_id))?;
    Ok((StatusCode::CREATED, Json(json!({ "quizId": quiz_id }))))
}

pub async fn list_quizzes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<QuizSummary>>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let quizzes = state
        .assessments
        .list_quizzes()
        .await
        .map_err(|e| AppError::from_portal(e, req_id))?;
    Ok(Json(quizzes))
}

pub async fn get_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Quiz>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let quiz = state
        .assessments
        .get_quiz(&id)
        .await
        .map_err(|e| AppError::from_portal(e, req_id.clone()))?
        .ok_or_else(|| AppError::from_portal(PortalError::NotFound("quiz"), req_id))?;
    Ok(Json(quiz))
}

#[derive(Debug, Deserialize)]
pub struct StartAttemptPayload {
    #[serde(rename = "userId")]
    pub user_id: String,
}

pub async fn start_attempt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(quiz_id): Path<String>,
    Json(payload): Json<StartAttemptPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let req_id = request_id_from_headers(&headers);
    let (attempt_id, quiz) = state
        .sessions
        .start_attempt(&quiz_id, &payload.user_id)
        .await
        .map_err(|e| AppError::from_portal(e, req_id))?;
    Ok((StatusCode::CREATED, Json(json!({ "attemptId": attempt_id, "quiz": quiz }))))
}

#[derive(Debug, Deserialize)]
pub struct AnswerPayload {
    #[serde(rename = "questionId")]
    pub question_id: String,
    #[serde(rename = "optionId")]
    pub option_id: String,
}

pub async fn record_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(attempt_id): Path<String>,
    Json(payload): Json<AnswerPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let req_id = request_id_from_headers(&headers);
    state
        .sessions
        .select_answer(&attempt_id, &payload.question_id, &payload.option_id)
        .map_err(|e| AppError::from_portal(e, req_id))?;
    Ok(Json(json!({ "recorded": true })))
}

pub async fn submit_attempt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(attempt_id): Path<String>,
) -> Result<Json<Scorecard>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let card = state
        .sessions
        .submit(&attempt_id)
        .await
        .map_err(|e| AppError::from_portal(e, req_id))?;
    Ok(Json(card))
}
