use mongodb::bson::oid::ObjectId;
use serde_json::Value;

use crate::error::EngineError;

pub fn parse_object_id(value: &str, field: &str) -> Result<ObjectId, EngineError> {
    ObjectId::parse_str(value.trim())
        .map_err(|_| EngineError::validation(format!("Invalid {}", field)))
}

/// Ratings are whole stars; anything outside 1..=5, including 0, is refused.
pub fn validate_rating(rating: Option<&Value>) -> Result<i32, EngineError> {
    let stars = match rating {
        None | Some(Value::Null) => return Err(EngineError::validation("Rating is required")),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(_) => None,
    }
    .ok_or_else(|| EngineError::validation("Rating must be a whole number"))?;

    if (1..=5).contains(&stars) {
        Ok(stars as i32)
    } else {
        Err(EngineError::validation("Rating must be between 1 and 5"))
    }
}

/// A mandatory id field: missing or blank is a validation error.
pub fn required_object_id(value: Option<&str>, field: &str) -> Result<ObjectId, EngineError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_object_id(v, field),
        None => Err(EngineError::validation(format!("{} is required", field))),
    }
}

/// Lowercased, trimmed search term; blank terms disable filtering.
pub fn normalize_search(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn zero_and_missing_ratings_are_rejected() {
        assert_eq!(validate_rating(None), Err(EngineError::validation("Rating is required")));
        assert_eq!(
            validate_rating(Some(&Value::Null)),
            Err(EngineError::validation("Rating is required"))
        );
        assert!(validate_rating(Some(&json!(0))).is_err());
        assert!(validate_rating(Some(&json!(6))).is_err());
        assert!(validate_rating(Some(&json!(-3))).is_err());
        assert_eq!(validate_rating(Some(&json!(1))), Ok(1));
        assert_eq!(validate_rating(Some(&json!(5))), Ok(5));
        assert_eq!(validate_rating(Some(&json!(4.0))), Ok(4));
    }

    #[test]
    fn fractional_and_textual_ratings_are_rejected() {
        let whole = Err(EngineError::validation("Rating must be a whole number"));
        assert_eq!(validate_rating(Some(&json!(4.5))), whole);
        assert_eq!(validate_rating(Some(&json!("5"))), whole);
        assert_eq!(validate_rating(Some(&json!([5]))), whole);
    }

    #[test]
    fn required_ids_must_be_present() {
        let id = ObjectId::new();
        assert_eq!(required_object_id(Some(&id.to_hex()), "projectId"), Ok(id));
        assert_eq!(
            required_object_id(None, "projectId"),
            Err(EngineError::validation("projectId is required"))
        );
        assert!(required_object_id(Some("  "), "projectId").is_err());
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(normalize_search(None), None);
        assert_eq!(normalize_search(Some("   ")), None);
        assert_eq!(normalize_search(Some(" Logo Design ")), Some("logo design".to_string()));
    }

    #[test]
    fn object_ids_are_parsed_or_rejected() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "user ID"), Ok(id));
        assert_eq!(
            parse_object_id("nope", "user ID"),
            Err(EngineError::validation("Invalid user ID"))
        );
    }
}
