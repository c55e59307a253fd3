use crate::handlers;
use crate::state::AppState;
use axum::http::{header, HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/courses", get(handlers::list_courses))
        .route("/api/courses/:id", get(handlers::get_course))
        .route("/api/progress/:user_id", get(handlers::progress_for_user))
        .route("/api/progress", post(handlers::update_progress))
        .route("/api/quizzes", post(handlers::create_quiz).get(handlers::list_quizzes))
        .route("/api/quizzes/:id", get(handlers::get_quiz))
        .route("/api/quizzes/:id/attempts", post(handlers::start_attempt))
        .route("/api/attempts/:id/answers", post(handlers::record_answer))
        .route("/api/attempts/:id/submit", post(handlers::submit_attempt))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
