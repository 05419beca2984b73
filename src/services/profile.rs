use std::sync::Arc;

use tracing::info;

use crate::error::AppError;
use crate::models::enrollment::USERS_COLLECTION;
use crate::models::{Profile, ProfileUpdate};
use crate::store::DocumentStore;

/// Contact details on the user's profile document. Enrollments on the same document
/// are left alone.
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn profile(&self, user_id: &str) -> Result<Profile, AppError> {
        self.store
            .get(USERS_COLLECTION, user_id)
            .await?
            .map(|doc| Profile::from_document(&doc))
            .ok_or(AppError::NotFound("Profile"))
    }

    /// Creates the profile on first save.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Profile, AppError> {
        let doc = self
            .store
            .merge(USERS_COLLECTION, user_id, update.into_fields())
            .await?;

        info!("Updated profile of user {}", user_id);
        Ok(Profile::from_document(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::EnrollmentService;
    use crate::store::SqliteStore;

    async fn store() -> Arc<dyn DocumentStore> {
        Arc::new(
            SqliteStore::in_memory()
                .await
                .expect("Failed to create store"),
        )
    }

    fn update(email: &str, name: &str) -> ProfileUpdate {
        ProfileUpdate {
            email: email.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let service = ProfileService::new(store().await);
        assert!(matches!(
            service.profile("nobody").await,
            Err(AppError::NotFound("Profile"))
        ));
    }

    #[tokio::test]
    async fn test_update_creates_then_overwrites() {
        let service = ProfileService::new(store().await);

        let created = service
            .update_profile("u1", update("ada@example.com", "Ada"))
            .await
            .expect("Failed to create profile");
        assert_eq!(created.email, "ada@example.com");
        assert!(created.enrolled_courses.is_empty());

        service
            .update_profile("u1", update("ada@lovelace.dev", ""))
            .await
            .expect("Failed to update profile");
        let fetched = service.profile("u1").await.expect("Failed to get profile");
        assert_eq!(fetched.email, "ada@lovelace.dev");
        assert_eq!(fetched.name, "");
    }

    #[tokio::test]
    async fn test_update_keeps_enrollments() {
        let store = store().await;
        store
            .array_union(
                USERS_COLLECTION,
                "u1",
                "enrolledCourses",
                serde_json::Value::String("c1".to_string()),
            )
            .await
            .expect("Failed to seed enrollment");

        let profile = ProfileService::new(store.clone())
            .update_profile("u1", update("ada@example.com", "Ada"))
            .await
            .expect("Failed to update profile");
        assert_eq!(profile.enrolled_courses, vec!["c1".to_string()]);

        let enrollment = EnrollmentService::new(store)
            .enrollments("u1")
            .await
            .expect("Failed to list enrollments");
        assert_eq!(enrollment.enrolled_courses, vec!["c1".to_string()]);
    }
}
