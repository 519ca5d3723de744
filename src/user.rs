//! User record
//!
//! The record every demo validates: an integer identifier, a free-text name
//! and a date of birth.

use crate::error::Result;
use crate::schema::error::quoted;
use crate::schema::{Field, FieldType, Model, Schema, ValidatedFields, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Definition of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub dob: NaiveDate,
}

impl User {
    /// Serialize to JSON text
    pub fn model_dump_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Model for User {
    fn schema() -> Schema {
        Schema::new("User")
            .with_description("Definition of a user")
            .field(Field::new("id", FieldType::Integer))
            .field(Field::new("name", FieldType::String))
            .field(Field::new("dob", FieldType::Date))
    }

    fn from_fields(mut fields: ValidatedFields) -> std::result::Result<Self, ValidationError> {
        Ok(Self {
            id: fields.integer("id")?,
            name: fields.string("name")?,
            dob: fields.date("dob")?,
        })
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id={} name={} dob={}", self.id, quoted(&self.name), self.dob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use proptest::prelude::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_literal_coerces() {
        let user =
            User::model_validate(&json!({"id": "1", "name": "John Doe", "dob": "1987-01-28"}))
                .unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "John Doe".to_string(),
                dob: date(1987, 1, 28),
            }
        );
        assert_eq!(user.to_string(), "id=1 name='John Doe' dob=1987-01-28");
    }

    #[test]
    fn test_three_digit_year_fails() {
        let err = User::model_validate(
            &json!({"id": "123", "name": "Samuel Colvin", "dob": "198-1-28"}),
        )
        .unwrap_err();
        assert_eq!(err.error_count(), 1);
        assert_eq!(
            err.for_field("dob").map(|e| e.kind.code()),
            Some("date_from_datetime_parsing")
        );
    }

    #[test]
    fn test_dob_as_list_fails() {
        let err = User::model_validate(&json!({"id": "1", "name": "John Doe", "dob": [1, 2]}))
            .unwrap_err();
        assert_eq!(err.codes(), vec!["date_type"]);
        assert!(err.to_string().starts_with("1 validation error for User\ndob\n"));
    }

    #[test]
    fn test_non_numeric_id_fails() {
        let err = User::model_validate(&json!({"id": "one", "name": "x", "dob": "1987-01-28"}))
            .unwrap_err();
        assert_eq!(err.codes(), vec!["int_parsing"]);
    }

    #[test]
    fn test_validate_json() {
        let user =
            User::model_validate_json(r#"{"id": 123, "name": "Samuel", "dob": "1987-01-28"}"#)
                .unwrap();
        assert_eq!(user.id, 123);
        assert_eq!(user.name, "Samuel");

        let err = User::model_validate_json("not json").unwrap_err();
        assert_eq!(err.codes(), vec!["json_invalid"]);
    }

    #[test]
    fn test_round_trip_through_json() {
        let user = User {
            id: 42,
            name: "Ada".to_string(),
            dob: date(1815, 12, 10),
        };
        let text = user.model_dump_json().unwrap();
        assert_eq!(text, r#"{"id":42,"name":"Ada","dob":"1815-12-10"}"#);
        assert_eq!(User::model_validate_json(&text).unwrap(), user);
    }

    #[test]
    fn test_display_quotes_name_unambiguously() {
        let user = User {
            id: 1,
            name: "O'Brien".to_string(),
            dob: date(2000, 1, 1),
        };
        assert_eq!(user.to_string(), r#"id=1 name="O'Brien" dob=2000-01-01"#);
    }

    #[test]
    fn test_json_schema_names_the_model() {
        let schema = User::model_json_schema();
        assert_eq!(schema["title"], "User");
        assert_eq!(schema["description"], "Definition of a user");
        assert_eq!(schema["properties"]["dob"]["format"], "date");
    }

    proptest! {
        #[test]
        fn prop_dump_then_validate_reproduces_user(
            id in any::<i64>(),
            name in any::<String>(),
            days in 0i64..3_652_059,
        ) {
            let dob = date(1, 1, 1) + chrono::Duration::days(days);
            prop_assume!((1..=9999).contains(&dob.year()));
            let user = User { id, name, dob };
            let text = user.model_dump_json().unwrap();
            prop_assert_eq!(User::model_validate_json(&text).unwrap(), user);
        }

        #[test]
        fn prop_digit_string_id_coerces(id: i64) {
            let input = json!({"id": id.to_string(), "name": "x", "dob": "1987-01-28"});
            prop_assert_eq!(User::model_validate(&input).unwrap().id, id);
        }
    }
}
