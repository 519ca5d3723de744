//! Schema module
//!
//! A [`Schema`] declares field names and semantic types. It validates raw
//! JSON input into typed values and exports itself as JSON Schema, which is
//! how the expected output shape is described to a completion service.

pub mod coerce;
pub mod error;

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub use error::{ErrorDetail, ErrorKind, ValidationError};

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    String,
    Date,
}

impl FieldType {
    /// JSON Schema fragment for this type
    fn json_schema(&self) -> Map<String, Value> {
        let mut schema = Map::new();
        match self {
            FieldType::Integer => {
                schema.insert("type".to_string(), json!("integer"));
            }
            FieldType::String => {
                schema.insert("type".to_string(), json!("string"));
            }
            FieldType::Date => {
                schema.insert("type".to_string(), json!("string"));
                schema.insert("format".to_string(), json!("date"));
            }
        }
        schema
    }

    fn coerce(&self, value: &Value) -> Result<FieldValue, ErrorDetail> {
        match self {
            FieldType::Integer => coerce::integer(value).map(FieldValue::Integer),
            FieldType::String => coerce::string(value).map(FieldValue::String),
            FieldType::Date => coerce::date(value).map(FieldValue::Date),
        }
    }

    /// Short name used in tables
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Date => "date",
        }
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Display title: `_`-separated words, each capitalised
    pub fn title(&self) -> String {
        self.name
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A typed value produced by validation
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    String(String),
    Date(NaiveDate),
}

/// Declared shape of a record
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    title: String,
    description: Option<String>,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a field
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Export as JSON Schema.
    ///
    /// Every declared field is required.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut property = field.field_type.json_schema();
            property.insert("title".to_string(), json!(field.title()));
            if let Some(description) = &field.description {
                property.insert("description".to_string(), json!(description));
            }
            properties.insert(field.name.clone(), Value::Object(property));
        }

        let required: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();

        let mut schema = Map::new();
        schema.insert("title".to_string(), json!(self.title));
        if let Some(description) = &self.description {
            schema.insert("description".to_string(), json!(description));
        }
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), json!(required));
        Value::Object(schema)
    }

    /// Validate raw input against every field.
    ///
    /// All failing fields are reported together; nothing is returned unless
    /// every field coerced. Undeclared keys are ignored.
    pub fn validate(&self, input: &Value) -> Result<ValidatedFields, ValidationError> {
        let object = input.as_object().ok_or_else(|| {
            ValidationError::single(
                &self.title,
                ErrorDetail::at_root(ErrorKind::ModelType(self.title.clone()), input.clone()),
            )
        })?;

        let mut values = HashMap::with_capacity(self.fields.len());
        let mut errors = Vec::new();

        for field in &self.fields {
            match object.get(&field.name) {
                Some(raw) => match field.field_type.coerce(raw) {
                    Ok(value) => {
                        values.insert(field.name.clone(), value);
                    }
                    Err(detail) => errors.push(detail.in_field(&field.name)),
                },
                None => errors.push(
                    ErrorDetail::at_root(ErrorKind::Missing, input.clone()).in_field(&field.name),
                ),
            }
        }

        if errors.is_empty() {
            Ok(ValidatedFields {
                title: self.title.clone(),
                values,
            })
        } else {
            Err(ValidationError::new(&self.title, errors))
        }
    }

    /// Parse JSON text, reporting malformed text as a validation error
    pub fn parse_json(&self, text: &str) -> Result<Value, ValidationError> {
        serde_json::from_str(text).map_err(|e| {
            ValidationError::single(
                &self.title,
                ErrorDetail::at_root(ErrorKind::JsonInvalid(e.to_string()), json!(text)),
            )
        })
    }
}

/// Typed values keyed by field name, handed to [`Model::from_fields`]
#[derive(Debug, Clone)]
pub struct ValidatedFields {
    title: String,
    values: HashMap<String, FieldValue>,
}

impl ValidatedFields {
    pub fn integer(&mut self, name: &str) -> Result<i64, ValidationError> {
        match self.values.remove(name) {
            Some(FieldValue::Integer(i)) => Ok(i),
            other => Err(self.undeclared(name, other)),
        }
    }

    pub fn string(&mut self, name: &str) -> Result<String, ValidationError> {
        match self.values.remove(name) {
            Some(FieldValue::String(s)) => Ok(s),
            other => Err(self.undeclared(name, other)),
        }
    }

    pub fn date(&mut self, name: &str) -> Result<NaiveDate, ValidationError> {
        match self.values.remove(name) {
            Some(FieldValue::Date(d)) => Ok(d),
            other => Err(self.undeclared(name, other)),
        }
    }

    /// A model asked for a field its schema did not declare with that type
    fn undeclared(&self, name: &str, found: Option<FieldValue>) -> ValidationError {
        let input = match found {
            Some(FieldValue::Integer(i)) => json!(i),
            Some(FieldValue::String(s)) => json!(s),
            Some(FieldValue::Date(d)) => json!(d.to_string()),
            None => Value::Null,
        };
        ValidationError::single(
            &self.title,
            ErrorDetail::at_root(ErrorKind::Missing, input).in_field(name),
        )
    }
}

/// A record type validated through a [`Schema`]
pub trait Model: Sized {
    /// The record's declared shape
    fn schema() -> Schema;

    /// Build the record from validated values
    fn from_fields(fields: ValidatedFields) -> Result<Self, ValidationError>;

    /// Validate a JSON value into a record
    fn model_validate(input: &Value) -> Result<Self, ValidationError> {
        let fields = Self::schema().validate(input)?;
        Self::from_fields(fields)
    }

    /// Validate JSON text into a record
    fn model_validate_json(text: &str) -> Result<Self, ValidationError> {
        let value = Self::schema().parse_json(text)?;
        Self::model_validate(&value)
    }

    /// JSON Schema for this record
    fn model_json_schema() -> Value {
        Self::schema().json_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_schema() -> Schema {
        Schema::new("User")
            .with_description("Definition of a user")
            .field(Field::new("id", FieldType::Integer))
            .field(Field::new("name", FieldType::String))
            .field(Field::new("dob", FieldType::Date))
    }

    #[test]
    fn test_field_title() {
        assert_eq!(Field::new("dob", FieldType::Date).title(), "Dob");
        assert_eq!(
            Field::new("date_of_birth", FieldType::Date).title(),
            "Date Of Birth"
        );
    }

    #[test]
    fn test_json_schema_export() {
        let schema = user_schema().json_schema();
        assert_eq!(
            schema,
            json!({
                "title": "User",
                "description": "Definition of a user",
                "type": "object",
                "properties": {
                    "id": {"title": "Id", "type": "integer"},
                    "name": {"title": "Name", "type": "string"},
                    "dob": {"title": "Dob", "type": "string", "format": "date"}
                },
                "required": ["id", "name", "dob"]
            })
        );
    }

    #[test]
    fn test_json_schema_field_description() {
        let schema = Schema::new("Thing")
            .field(Field::new("label", FieldType::String).with_description("Shown to users"))
            .json_schema();
        assert_eq!(schema["properties"]["label"]["description"], "Shown to users");
        assert!(schema.get("description").is_none());
    }

    #[test]
    fn test_validate_success() {
        let mut fields = user_schema()
            .validate(&json!({"id": "1", "name": "John Doe", "dob": "1987-01-28"}))
            .unwrap();
        assert_eq!(fields.integer("id").unwrap(), 1);
        assert_eq!(fields.string("name").unwrap(), "John Doe");
        assert_eq!(
            fields.date("dob").unwrap(),
            NaiveDate::from_ymd_opt(1987, 1, 28).unwrap()
        );
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let err = user_schema()
            .validate(&json!({"id": "abc", "dob": [1, 2]}))
            .unwrap_err();
        assert_eq!(err.codes(), vec!["int_parsing", "missing", "date_type"]);
        assert_eq!(err.errors()[1].location(), "name");
    }

    #[test]
    fn test_validate_ignores_extra_keys() {
        let result = user_schema().validate(&json!({
            "id": 5, "name": "x", "dob": "2000-01-01", "email": "x@example.com"
        }));
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let err = user_schema().validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.codes(), vec!["model_type"]);
        assert!(err.errors()[0].loc.is_empty());
    }

    #[test]
    fn test_parse_json_invalid() {
        let err = user_schema().parse_json("{not json").unwrap_err();
        assert_eq!(err.codes(), vec!["json_invalid"]);
    }

    #[test]
    fn test_validated_fields_type_mismatch() {
        let mut fields = user_schema()
            .validate(&json!({"id": 1, "name": "a", "dob": "2000-01-01"}))
            .unwrap();
        assert!(fields.string("id").is_err());
        assert!(fields.integer("unknown").is_err());
    }
}
