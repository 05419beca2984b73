use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CourseScoped, Entity};
use crate::validation::{FieldReader, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub course_id: String,
    pub title: String,
    pub description: String,
    /// Free-form label such as "5m" or "1h 20m".
    pub duration: String,
    #[serde(default)]
    pub video_url: String,
    pub content: String,
}

impl Entity for Lesson {
    const COLLECTION: &'static str = "lessons";
    const NAME: &'static str = "Lesson";
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["courseId", "title", "description", "duration", "content"];

    fn from_input(input: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(input);
        let lesson = Lesson {
            course_id: r.text("courseId"),
            title: r.text("title"),
            description: r.text("description"),
            duration: r.text("duration"),
            video_url: r.optional_text("videoUrl"),
            content: r.text("content"),
        };
        r.finish()?;
        Ok(lesson)
    }
}

impl CourseScoped for Lesson {
    fn course_id(&self) -> &str {
        &self.course_id
    }
}
