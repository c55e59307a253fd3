pub mod authoring;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

use sqlx::SqlitePool;
use std::sync::Arc;

/// Wires the two storage adapters into shared state. The course catalog
/// always lives in the embedded store; assessments go to the remote API when
/// it is configured and to the in-memory store otherwise.
pub fn build_state(pool: SqlitePool) -> state::AppState {
    let assessments: Arc<dyn store::AssessmentStore> = match store::RestAssessmentStore::from_env() {
        Some(remote) => Arc::new(remote),
        None => {
            tracing::warn!("QUIZ_API_URL is not set, assessments use the in-memory store");
            Arc::new(store::MemoryAssessmentStore::new())
        }
    };
    state::AppState::new(Arc::new(store::SqliteCatalog::new(pool)), assessments)
}
