use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::models::{Assignment, Course, CourseScoped, Entity, Lesson};
use crate::store::{DocRef, Document, DocumentStore};

/// Deletes a course together with every lesson and assignment that points at it.
pub struct CourseCascade {
    store: Arc<dyn DocumentStore>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct CascadeStats {
    pub lessons_deleted: usize,
    pub assignments_deleted: usize,
}

impl CourseCascade {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Looks up the dependents of `course_id` concurrently, then removes them and the
    /// course in one transaction. Nothing is deleted if the transaction fails or the
    /// course is already gone.
    pub async fn delete_course(&self, course_id: &str) -> Result<CascadeStats, AppError> {
        if self.store.get(Course::COLLECTION, course_id).await?.is_none() {
            return Err(AppError::NotFound(Course::NAME));
        }

        let (lessons, assignments) = tokio::try_join!(
            self.dependents::<Lesson>(course_id),
            self.dependents::<Assignment>(course_id),
        )?;

        let stats = CascadeStats {
            lessons_deleted: lessons.len(),
            assignments_deleted: assignments.len(),
        };

        let dependents: Vec<DocRef> = lessons
            .into_iter()
            .map(|doc| DocRef::new(Lesson::COLLECTION, doc.id))
            .chain(
                assignments
                    .into_iter()
                    .map(|doc| DocRef::new(Assignment::COLLECTION, doc.id)),
            )
            .collect();
        let parent = DocRef::new(Course::COLLECTION, course_id);

        // A concurrent delete may have removed the course since the lookup above.
        if self
            .store
            .delete_with_dependents(&parent, &dependents)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(Course::NAME));
        }

        info!(
            "Deleted course {} with {} lessons, {} assignments",
            course_id, stats.lessons_deleted, stats.assignments_deleted
        );
        Ok(stats)
    }

    async fn dependents<E: CourseScoped>(&self, course_id: &str) -> Result<Vec<Document>, AppError> {
        Ok(self
            .store
            .find_by_field(E::COLLECTION, E::COURSE_FIELD, course_id)
            .await?)
    }
}
