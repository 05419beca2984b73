use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Enrollment;
use crate::store::Document;
use crate::validation::{FieldReader, ValidationError};

pub const EMAIL_FIELD: &str = "email";
pub const NAME_FIELD: &str = "name";

/// A user's profile document: contact details plus enrollments.
///
/// Profiles first created by an enrollment carry no email or name yet; those read
/// as empty strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub enrolled_courses: Vec<String>,
}

impl Profile {
    pub fn from_document(doc: &Document) -> Self {
        let text = |field: &str| {
            doc.data
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let Enrollment {
            user_id,
            enrolled_courses,
        } = Enrollment::from_document(doc);

        Self {
            user_id,
            email: text(EMAIL_FIELD),
            name: text(NAME_FIELD),
            enrolled_courses,
        }
    }
}

/// Editable profile fields. `email` is required, `name` may be omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub email: String,
    pub name: String,
}

impl ProfileUpdate {
    pub fn from_input(input: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(input);
        let update = Self {
            email: r.email(EMAIL_FIELD),
            name: r.optional_text(NAME_FIELD),
        };
        r.finish()?;
        Ok(update)
    }

    /// The fields written to the profile document.
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(EMAIL_FIELD.to_string(), Value::String(self.email));
        fields.insert(NAME_FIELD.to_string(), Value::String(self.name));
        fields
    }
}
