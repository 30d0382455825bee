use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number, Value};

/// Metadata collected for one resource: one `data` entry per prompt, in prompt order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub resource: String,
    pub version: String,
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ResourceRecord {
    pub fn new(resource: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            version: version.into(),
            data: Map::new(),
            file_name: None,
        }
    }

    /// Sets `key` to `value`, replacing any earlier answer.
    pub fn set(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// String answer for `key`, if present and a string.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        pretty_json(self)
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json_pretty().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Serializes `value` as JSON indented with four spaces.
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Error produced when an answer does not pass validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

impl fmt::Display for AnswerParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message)?;
        if let Some(debug) = &self.debug_message {
            write!(f, " ({})", debug)?;
        }
        Ok(())
    }
}

impl std::error::Error for AnswerParseError {}

/// Converts a `y`/`n` response.
pub fn parse_bool(raw: &str) -> Result<Value, AnswerParseError> {
    match raw {
        "y" => Ok(Value::Bool(true)),
        "n" => Ok(Value::Bool(false)),
        _ => Err(AnswerParseError::new(
            "Please specify `y` for yes or `n` for no!",
            Some("expected `y` or `n`".to_string()),
        )),
    }
}

/// Converts a response to a number, preferring an integer over a float.
pub fn to_number(raw: &str) -> Result<Number, AnswerParseError> {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(Number::from(int));
    }
    if let Ok(int) = trimmed.parse::<u64>() {
        return Ok(Number::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| {
            AnswerParseError::new(
                "Invalid numeric input. Please re-enter value",
                Some(format!("`{}` is not an integer or finite float", trimmed)),
            )
        })
}

/// [`to_number`] wrapped as an answer value.
pub fn parse_number(raw: &str) -> Result<Value, AnswerParseError> {
    to_number(raw).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_number_prefers_integers() {
        let n = to_number("5").unwrap();
        assert_eq!(n.as_i64(), Some(5));

        let n = to_number("5.0").unwrap();
        assert!(n.is_f64());
        assert_eq!(n.as_f64(), Some(5.0));
    }

    #[test]
    fn to_number_accepts_signs() {
        assert_eq!(to_number("+5.0").unwrap().as_f64(), Some(5.0));
        assert_eq!(to_number("-5.0").unwrap().as_f64(), Some(-5.0));
        assert_eq!(to_number("-7").unwrap().as_i64(), Some(-7));
    }

    #[test]
    fn to_number_keeps_integers_beyond_i64_exact() {
        let n = to_number("18446744073709551615").unwrap();
        assert_eq!(n.as_u64(), Some(u64::MAX));
        assert!(!n.is_f64());
    }

    #[test]
    fn to_number_rejects_text_and_non_finite() {
        assert!(to_number("foo").is_err());
        assert!(to_number("inf").is_err());
        assert!(to_number("").is_err());
    }

    #[test]
    fn parse_bool_is_strict() {
        assert_eq!(parse_bool("y").unwrap(), Value::Bool(true));
        assert_eq!(parse_bool("n").unwrap(), Value::Bool(false));
        assert!(parse_bool("yes").is_err());
        assert!(parse_bool("Y").is_err());
    }

    #[test]
    fn record_keeps_prompt_order_and_indents_four_spaces() {
        let mut record = ResourceRecord::new("study", "0.0.1");
        record.set("name", json!("pig-chewing-study"));
        record.set("data_public", json!(false));
        let keys: Vec<_> = record.data.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "data_public"]);

        let pretty = record.to_string();
        assert!(pretty.contains("\n    \"resource\": \"study\""));
        assert!(!pretty.contains("file_name"));
    }
}
