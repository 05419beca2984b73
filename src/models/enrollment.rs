use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Document;
use crate::validation::{FieldReader, ValidationError};

pub const USERS_COLLECTION: &str = "users";
pub const ENROLLED_COURSES_FIELD: &str = "enrolledCourses";

/// Courses a user is enrolled in, read from the user's profile document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub user_id: String,
    pub enrolled_courses: Vec<String>,
}

impl Enrollment {
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            enrolled_courses: Vec::new(),
        }
    }

    /// Profiles may carry other fields (email, ...). Non-string entries are skipped.
    pub fn from_document(doc: &Document) -> Self {
        let enrolled_courses = doc
            .data
            .get(ENROLLED_COURSES_FIELD)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            user_id: doc.id.clone(),
            enrolled_courses,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrollRequest {
    pub course_id: String,
}

impl EnrollRequest {
    pub fn from_input(input: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(input);
        let course_id = r.text("courseId");
        r.finish()?;
        Ok(Self { course_id })
    }
}
