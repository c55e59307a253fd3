use crate::session::SessionEngine;
use crate::store::{AssessmentStore, CourseStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CourseStore>,
    pub assessments: Arc<dyn AssessmentStore>,
    pub sessions: Arc<SessionEngine>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CourseStore>, assessments: Arc<dyn AssessmentStore>) -> Self {
        let sessions = Arc::new(SessionEngine::new(assessments.clone()));
        Self { catalog, assessments, sessions }
    }
}
