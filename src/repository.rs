use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AppError;
use crate::models::{CourseScoped, Entity, Record, to_payload};
use crate::store::DocumentStore;

/// CRUD over one entity collection. Every operation is a single pass-through to the store.
pub struct Repository<E> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// All records, newest first.
    pub async fn list(&self) -> Result<Vec<Record<E>>, AppError> {
        let docs = self.store.list(E::COLLECTION).await?;
        let records = docs
            .into_iter()
            .map(Record::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<Record<E>, AppError> {
        let doc = self
            .store
            .get(E::COLLECTION, id)
            .await?
            .ok_or(AppError::NotFound(E::NAME))?;
        Ok(Record::from_document(doc)?)
    }

    pub async fn create(&self, input: &Map<String, Value>) -> Result<Record<E>, AppError> {
        let fields = E::from_input(input)?;
        let doc = self.store.insert(E::COLLECTION, to_payload(&fields)?).await?;
        debug!("created {} {}", E::NAME, doc.id);

        Ok(Record {
            id: doc.id,
            fields,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    /// Rewrites every editable field. Validation runs before the existence check.
    pub async fn update(&self, id: &str, input: &Map<String, Value>) -> Result<Record<E>, AppError> {
        let fields = E::from_input(input)?;
        let doc = self
            .store
            .update(E::COLLECTION, id, to_payload(&fields)?)
            .await?
            .ok_or(AppError::NotFound(E::NAME))?;
        debug!("updated {} {}", E::NAME, id);

        Ok(Record {
            id: doc.id,
            fields,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.store.delete(E::COLLECTION, id).await? {
            debug!("deleted {} {}", E::NAME, id);
            Ok(())
        } else {
            Err(AppError::NotFound(E::NAME))
        }
    }
}

impl<E: CourseScoped> Repository<E> {
    /// Records whose `courseId` equals `course_id`, newest first.
    pub async fn list_by_course(&self, course_id: &str) -> Result<Vec<Record<E>>, AppError> {
        let docs = self
            .store
            .find_by_field(E::COLLECTION, E::COURSE_FIELD, course_id)
            .await?;
        let records = docs
            .into_iter()
            .map(Record::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Course, Lesson};
    use crate::store::SqliteStore;
    use serde_json::json;

    async fn setup_test_store() -> Arc<dyn DocumentStore> {
        Arc::new(
            SqliteStore::in_memory()
                .await
                .expect("Failed to create test store"),
        )
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn course_input(title: &str) -> Map<String, Value> {
        object(json!({
            "title": title,
            "description": "intro",
            "category": "Programming",
            "instructor": "A",
            "price": 10,
        }))
    }

    #[tokio::test]
    async fn test_create_and_get_course() {
        let courses = Repository::<Course>::new(setup_test_store().await);

        let created = courses
            .create(&course_input("  Go Basics "))
            .await
            .expect("Failed to create course");
        assert_eq!(created.fields.title, "Go Basics");

        let fetched = courses.get(&created.id).await.expect("Failed to get course");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let courses = Repository::<Course>::new(setup_test_store().await);

        let first = courses.create(&course_input("first")).await.expect("create");
        let second = courses.create(&course_input("second")).await.expect("create");

        let listed = courses.list().await.expect("Failed to list");
        let ids: Vec<_> = listed.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn test_update_rewrites_fields() {
        let courses = Repository::<Course>::new(setup_test_store().await);

        let created = courses.create(&course_input("old")).await.expect("create");
        let mut input = course_input("new");
        input.insert("price".into(), json!("25.5"));

        let updated = courses
            .update(&created.id, &input)
            .await
            .expect("Failed to update");
        assert_eq!(updated.fields.title, "new");
        assert_eq!(updated.fields.price, 25.5);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let courses = Repository::<Course>::new(setup_test_store().await);

        let err = courses
            .update("never-created", &course_input("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Course")));
    }

    #[tokio::test]
    async fn test_update_validates_before_lookup() {
        let courses = Repository::<Course>::new(setup_test_store().await);

        let mut input = course_input("x");
        input.remove("category");
        let err = courses.update("never-created", &input).await.unwrap_err();
        match err {
            AppError::Validation(e) => assert_eq!(e.fields, vec!["category"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_and_not_found() {
        let lessons = Repository::<Lesson>::new(setup_test_store().await);

        let lesson = lessons
            .create(&object(json!({
                "courseId": "c1",
                "title": "L1",
                "description": "d",
                "duration": "5m",
                "content": "c",
            })))
            .await
            .expect("Failed to create lesson");

        lessons.delete(&lesson.id).await.expect("Failed to delete");
        assert!(matches!(
            lessons.get(&lesson.id).await.unwrap_err(),
            AppError::NotFound("Lesson")
        ));
        assert!(matches!(
            lessons.delete(&lesson.id).await.unwrap_err(),
            AppError::NotFound("Lesson")
        ));
    }

    #[tokio::test]
    async fn test_list_by_course() {
        let store = setup_test_store().await;
        let assignments = Repository::<Assignment>::new(store);

        for course_id in ["c1", "c2", "c1"] {
            assignments
                .create(&object(json!({
                    "courseId": course_id,
                    "title": "Homework",
                    "description": "d",
                    "dueDate": "2026-01-10",
                    "maxPoints": 10,
                    "instructions": "i",
                })))
                .await
                .expect("Failed to create assignment");
        }

        let found = assignments.list_by_course("c1").await.expect("Failed to list");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|a| a.fields.course_id == "c1"));
    }
}
