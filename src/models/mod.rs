pub mod assignment;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod profile;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{Document, StoreError};
use crate::validation::ValidationError;

pub use assignment::Assignment;
pub use course::Course;
pub use enrollment::Enrollment;
pub use lesson::Lesson;
pub use profile::{Profile, ProfileUpdate};

/// Editable fields of a catalog record, stored as one document per record.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name, also the key of list responses.
    const COLLECTION: &'static str;
    /// Singular name used in messages.
    const NAME: &'static str;
    /// Fields a create or update must carry, in wire spelling.
    const REQUIRED_FIELDS: &'static [&'static str];

    /// Validates a request payload and returns the normalized fields.
    fn from_input(input: &Map<String, Value>) -> Result<Self, ValidationError>;
}

/// Entities that belong to a course through a `courseId` field.
pub trait CourseScoped: Entity {
    const COURSE_FIELD: &'static str = "courseId";

    fn course_id(&self) -> &str;
}

/// A stored entity: the store-assigned id and timestamps around the editable fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record<E> {
    pub id: String,
    #[serde(flatten)]
    pub fields: E,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<E: Entity> Record<E> {
    pub fn from_document(doc: Document) -> Result<Self, StoreError> {
        Ok(Self {
            id: doc.id,
            fields: serde_json::from_value(Value::Object(doc.data))?,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

/// Serializes editable fields into a document payload.
pub fn to_payload<E: Entity>(fields: &E) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(<serde_json::Error as serde::ser::Error>::custom(format!(
            "{} did not serialize to an object: {}",
            E::NAME,
            other
        )))),
    }
}
