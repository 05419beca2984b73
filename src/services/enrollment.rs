use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::error::AppError;
use crate::models::enrollment::{ENROLLED_COURSES_FIELD, USERS_COLLECTION};
use crate::models::{Course, Enrollment, Entity};
use crate::store::DocumentStore;

/// Student enrollments, kept on the user's profile document.
pub struct EnrollmentService {
    store: Arc<dyn DocumentStore>,
}

impl EnrollmentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// A user without a profile has no enrollments.
    pub async fn enrollments(&self, user_id: &str) -> Result<Enrollment, AppError> {
        let enrollment = self
            .store
            .get(USERS_COLLECTION, user_id)
            .await?
            .map(|doc| Enrollment::from_document(&doc))
            .unwrap_or_else(|| Enrollment::empty(user_id));
        Ok(enrollment)
    }

    /// Adds `course_id` to the user's enrollments. Enrolling twice is a no-op.
    pub async fn enroll(&self, user_id: &str, course_id: &str) -> Result<Enrollment, AppError> {
        if self.store.get(Course::COLLECTION, course_id).await?.is_none() {
            return Err(AppError::NotFound(Course::NAME));
        }

        let doc = self
            .store
            .array_union(
                USERS_COLLECTION,
                user_id,
                ENROLLED_COURSES_FIELD,
                Value::String(course_id.to_string()),
            )
            .await?;

        info!("User {} enrolled in course {}", user_id, course_id);
        Ok(Enrollment::from_document(&doc))
    }
}
