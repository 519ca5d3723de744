//! Structured validation errors
//!
//! A [`ValidationError`] collects one [`ErrorDetail`] per failing field so a
//! caller sees every problem with an input at once.

use serde_json::Value;
use std::fmt;

/// Why a single value was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Value is not something an integer can be built from
    IntType,
    /// String could not be parsed as an integer
    IntParsing,
    /// Number has a fractional part
    IntFromFloat,
    /// Number does not fit in a signed 64-bit integer
    IntRange,
    /// Value is not a string
    StringType,
    /// Value is not a date representation at all
    DateType,
    /// String could not be parsed as a date; carries the reason
    DateParsing(String),
    /// Required field is absent
    Missing,
    /// Top-level input is not an object; carries the model title
    ModelType(String),
    /// Input text is not valid JSON; carries the parser message
    JsonInvalid(String),
}

impl ErrorKind {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::IntType => "int_type",
            ErrorKind::IntParsing => "int_parsing",
            ErrorKind::IntFromFloat => "int_from_float",
            ErrorKind::IntRange => "int_range",
            ErrorKind::StringType => "string_type",
            ErrorKind::DateType => "date_type",
            ErrorKind::DateParsing(_) => "date_from_datetime_parsing",
            ErrorKind::Missing => "missing",
            ErrorKind::ModelType(_) => "model_type",
            ErrorKind::JsonInvalid(_) => "json_invalid",
        }
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            ErrorKind::IntType => "Input should be a valid integer".to_string(),
            ErrorKind::IntParsing => {
                "Input should be a valid integer, unable to parse string as an integer".to_string()
            }
            ErrorKind::IntFromFloat => {
                "Input should be a valid integer, got a number with a fractional part".to_string()
            }
            ErrorKind::IntRange => {
                "Input should be a valid integer, number is outside the 64-bit range".to_string()
            }
            ErrorKind::StringType => "Input should be a valid string".to_string(),
            ErrorKind::DateType => "Input should be a valid date".to_string(),
            ErrorKind::DateParsing(reason) => {
                format!("Input should be a valid date or datetime, {}", reason)
            }
            ErrorKind::Missing => "Field required".to_string(),
            ErrorKind::ModelType(title) => {
                format!("Input should be a valid dictionary or instance of {}", title)
            }
            ErrorKind::JsonInvalid(detail) => format!("Invalid JSON: {}", detail),
        }
    }
}

/// One rejected value
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDetail {
    /// Path to the value; empty for the input as a whole
    pub loc: Vec<String>,
    /// Reason for rejection
    pub kind: ErrorKind,
    /// The offending input
    pub input: Value,
}

impl ErrorDetail {
    pub fn new(loc: Vec<String>, kind: ErrorKind, input: Value) -> Self {
        Self { loc, kind, input }
    }

    /// Detail for a value that has not been placed in a field yet
    pub fn at_root(kind: ErrorKind, input: Value) -> Self {
        Self::new(Vec::new(), kind, input)
    }

    /// Prefix the location with a field name
    pub fn in_field(mut self, field: &str) -> Self {
        self.loc.insert(0, field.to_string());
        self
    }

    /// Dotted location, e.g. `dob`
    pub fn location(&self) -> String {
        self.loc.join(".")
    }
}

/// All field errors raised while validating one input against one schema
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    title: String,
    errors: Vec<ErrorDetail>,
}

impl ValidationError {
    pub fn new(title: impl Into<String>, errors: Vec<ErrorDetail>) -> Self {
        Self {
            title: title.into(),
            errors,
        }
    }

    pub fn single(title: impl Into<String>, error: ErrorDetail) -> Self {
        Self::new(title, vec![error])
    }

    /// Schema title the input was validated against
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn errors(&self) -> &[ErrorDetail] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Error codes in field order
    pub fn codes(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.kind.code()).collect()
    }

    /// First error raised for the named field
    pub fn for_field(&self, field: &str) -> Option<&ErrorDetail> {
        self.errors
            .iter()
            .find(|e| e.loc.first().map(String::as_str) == Some(field))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.errors.len();
        write!(
            f,
            "{} validation error{} for {}",
            count,
            if count == 1 { "" } else { "s" },
            self.title
        )?;
        for error in &self.errors {
            writeln!(f)?;
            if !error.loc.is_empty() {
                writeln!(f, "{}", error.location())?;
            }
            write!(
                f,
                "  {} [type={}, input_value={}, input_type={}]",
                error.kind.message(),
                error.kind.code(),
                render_input(&error.input),
                input_type(&error.input)
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn render_input(input: &Value) -> String {
    match input {
        Value::String(s) => quoted(s),
        other => other.to_string(),
    }
}

/// Quote text the way it is echoed back to the user: single quotes, or
/// double quotes when the text holds a `'` and no `"`. Backslashes, control
/// characters and a clashing quote are escaped.
pub(crate) fn quoted(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn input_type(input: &Value) -> &'static str {
    match input {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_single_error() {
        let err = ValidationError::single(
            "User",
            ErrorDetail::at_root(ErrorKind::DateType, json!([1, 2])).in_field("dob"),
        );
        assert_eq!(
            err.to_string(),
            "1 validation error for User\ndob\n  Input should be a valid date \
             [type=date_type, input_value=[1,2], input_type=list]"
        );
    }

    #[test]
    fn test_display_pluralises() {
        let err = ValidationError::new(
            "User",
            vec![
                ErrorDetail::at_root(ErrorKind::IntParsing, json!("abc")).in_field("id"),
                ErrorDetail::at_root(ErrorKind::StringType, json!(5)).in_field("name"),
            ],
        );
        let text = err.to_string();
        assert!(text.starts_with("2 validation errors for User"));
        assert!(text.contains("input_value='abc', input_type=str"));
        assert!(text.contains("input_value=5, input_type=int"));
    }

    #[test]
    fn test_root_error_has_no_location_line() {
        let err = ValidationError::single(
            "User",
            ErrorDetail::at_root(ErrorKind::ModelType("User".to_string()), json!(3.5)),
        );
        assert_eq!(
            err.to_string(),
            "1 validation error for User\n  Input should be a valid dictionary or instance of User \
             [type=model_type, input_value=3.5, input_type=float]"
        );
    }

    #[test]
    fn test_quoted_escapes_clashing_quotes() {
        assert_eq!(quoted("John Doe"), "'John Doe'");
        assert_eq!(quoted("O'Brien"), "\"O'Brien\"");
        assert_eq!(quoted(r#"it's "x""#), r#"'it\'s "x"'"#);
        assert_eq!(quoted("a\\b\nc"), r"'a\\b\nc'");
    }

    #[test]
    fn test_out_of_range_message_names_number() {
        let message = ErrorKind::IntRange.message();
        assert!(message.contains("64-bit range"));
        assert!(!message.contains("string"));
    }

    #[test]
    fn test_for_field() {
        let err = ValidationError::single(
            "User",
            ErrorDetail::at_root(ErrorKind::Missing, json!({})).in_field("name"),
        );
        assert_eq!(err.for_field("name").map(|e| e.kind.code()), Some("missing"));
        assert!(err.for_field("id").is_none());
        assert_eq!(err.codes(), vec!["missing"]);
    }
}
