use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PromptError;

/// Fields every prompt definition must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 7] = ["key", "text", "info", "example", "require", "type", "store"];

/// Kind of answer a prompt collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    /// `y`/`n` answer.
    Bool,
    /// ISO `YYYY-MM-DD` date; blank means today.
    Date,
    /// Free text, optionally checked against a regex.
    Text,
    /// One of the configured options or a user supplied value.
    List,
    /// Integer or float.
    Number,
}

impl PromptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptType::Bool => "bool",
            PromptType::Date => "date",
            PromptType::Text => "text",
            PromptType::List => "list",
            PromptType::Number => "number",
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptType {
    type Err = PromptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bool" => Ok(PromptType::Bool),
            "date" => Ok(PromptType::Date),
            "text" => Ok(PromptType::Text),
            "list" => Ok(PromptType::List),
            "number" => Ok(PromptType::Number),
            other => Err(PromptError::InvalidType {
                value: other.to_string(),
            }),
        }
    }
}

/// Backend datastore an answer is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTarget {
    Xromm,
    RossDb,
    Hatabase,
}

impl StoreTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreTarget::Xromm => "xromm",
            StoreTarget::RossDb => "ross_db",
            StoreTarget::Hatabase => "hatabase",
        }
    }
}

impl FromStr for StoreTarget {
    type Err = PromptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "xromm" => Ok(StoreTarget::Xromm),
            "ross_db" => Ok(StoreTarget::RossDb),
            "hatabase" => Ok(StoreTarget::Hatabase),
            other => Err(PromptError::InvalidStore {
                value: other.to_string(),
            }),
        }
    }
}

/// Declarative description of one question, as loaded from a resource config.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptSpec {
    pub key: String,
    pub text: String,
    pub info: String,
    #[serde(rename = "type")]
    pub kind: PromptType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub example: Value,
    pub require: bool,
    pub store: Vec<StoreTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl PromptSpec {
    /// Builds a `PromptSpec` from a raw JSON value, which must be an object.
    pub fn from_value(value: &Value) -> Result<Self, PromptError> {
        let map = value.as_object().ok_or(PromptError::NotAnObject)?;
        Self::from_map(map)
    }

    /// Builds the definition field by field, validating presence, `type` and `store`.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, PromptError> {
        if let Some(missing) = REQUIRED_FIELDS.iter().find(|field| !map.contains_key(**field)) {
            return Err(PromptError::MissingField((*missing).to_string()));
        }

        let kind = field::<String>(map, "type")?.parse::<PromptType>()?;
        let store = field::<Vec<String>>(map, "store")?
            .iter()
            .map(|target| target.parse::<StoreTarget>())
            .collect::<Result<Vec<_>, _>>()?;
        let options = optional_field::<Vec<String>>(map, "options")?.unwrap_or_default();
        let regex = optional_field::<String>(map, "regex")?.filter(|pattern| !pattern.is_empty());

        Ok(Self {
            key: field(map, "key")?,
            text: field(map, "text")?,
            info: field(map, "info")?,
            kind,
            options,
            example: map["example"].clone(),
            require: field(map, "require")?,
            store,
            regex,
        })
    }
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, name: &str) -> Result<T, PromptError> {
    let value = map
        .get(name)
        .ok_or_else(|| PromptError::MissingField(name.to_string()))?;
    serde_json::from_value(value.clone()).map_err(|source| PromptError::InvalidField {
        field: name.to_string(),
        source,
    })
}

fn optional_field<T: DeserializeOwned>(
    map: &Map<String, Value>,
    name: &str,
) -> Result<Option<T>, PromptError> {
    match map.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => field(map, name).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn store_targets_use_config_spelling() {
        for label in ["xromm", "ross_db", "hatabase"] {
            let target: StoreTarget = label.parse().unwrap();
            assert_eq!(target.as_str(), label);
            assert_eq!(serde_json::to_value(target).unwrap(), json!(label));
        }
    }

    #[test]
    fn empty_regex_is_treated_as_absent() {
        let value = json!({
            "key": "k", "text": "t", "info": "", "example": "x",
            "require": true, "type": "text", "store": [], "regex": ""
        });
        let spec = PromptSpec::from_value(&value).unwrap();
        assert!(spec.regex.is_none());
        assert!(spec.options.is_empty());
    }

    #[test]
    fn malformed_require_is_reported_by_name() {
        let value = json!({
            "key": "k", "text": "t", "info": "", "example": "x",
            "require": "yes", "type": "text", "store": []
        });
        let err = PromptSpec::from_value(&value).unwrap_err();
        assert!(matches!(err, PromptError::InvalidField { ref field, .. } if field == "require"));
    }

    #[test]
    fn non_object_prompt_is_rejected() {
        let err = PromptSpec::from_value(&json!(["key"])).unwrap_err();
        assert!(matches!(err, PromptError::NotAnObject));
    }
}
