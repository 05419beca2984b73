use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::Entity;
use crate::validation::{FieldReader, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub title: String,
    pub description: String,
    pub category: String,
    pub instructor: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(serialize_with = "serialize_price")]
    pub price: f64,
}

/// Largest magnitude at which every whole f64 is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole prices go out as JSON integers (`10`, not `10.0`).
fn serialize_price<S: Serializer>(price: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if price.fract() == 0.0 && price.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*price as i64)
    } else {
        serializer.serialize_f64(*price)
    }
}

impl Entity for Course {
    const COLLECTION: &'static str = "courses";
    const NAME: &'static str = "Course";
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["title", "description", "category", "instructor", "price"];

    fn from_input(input: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut r = FieldReader::new(input);
        let course = Course {
            title: r.text("title"),
            description: r.text("description"),
            category: r.text("category"),
            instructor: r.text("instructor"),
            image_url: r.optional_text("imageUrl"),
            price: r.non_negative_number("price"),
        };
        r.finish()?;
        Ok(course)
    }
}
