use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CourseScoped, Entity};
use crate::validation::{FieldReader, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub max_points: u32,
    pub instructions: String,
}

impl Entity for Assignment {
    const COLLECTION: &'static str = "assignments";
    const NAME: &'static str = "Assignment";
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "courseId",
        "title",
        "description",
        "dueDate",
        "maxPoints",
        "instructions",
    ];

    fn from_input(input: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(input);
        let assignment = Assignment {
            course_id: r.text("courseId"),
            title: r.text("title"),
            description: r.text("description"),
            due_date: r.text("dueDate"),
            max_points: r.positive_integer("maxPoints"),
            instructions: r.text("instructions"),
        };
        r.finish()?;
        Ok(assignment)
    }
}

impl CourseScoped for Assignment {
    fn course_id(&self) -> &str {
        &self.course_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Map<String, Value> {
        match json!({
            "courseId": "c1",
            "title": "Homework 1",
            "description": "first",
            "dueDate": "2026-01-10",
            "maxPoints": "100",
            "instructions": "do it",
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_max_points_is_coerced() {
        let assignment = Assignment::from_input(&valid()).expect("valid assignment");
        assert_eq!(assignment.max_points, 100);
    }

    #[test]
    fn test_each_required_field_is_reported() {
        for field in Assignment::REQUIRED_FIELDS {
            let mut input = valid();
            input.remove(*field);
            let err = Assignment::from_input(&input).unwrap_err();
            assert_eq!(err.fields, vec![*field]);
        }
    }

    #[test]
    fn test_zero_points_is_rejected() {
        let mut input = valid();
        input.insert("maxPoints".into(), json!(0));
        let err = Assignment::from_input(&input).unwrap_err();
        assert_eq!(err.fields, vec!["maxPoints"]);
    }
}
