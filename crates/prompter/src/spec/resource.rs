use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resource configuration: the ordered prompts for one kind of record.
///
/// Prompt entries are kept as raw JSON objects so that the file can be
/// written back without losing fields this crate does not interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub key: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub prompts: Vec<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Options currently configured for the prompt entry at `index`.
    pub fn options(&self, index: usize) -> Vec<String> {
        self.prompts
            .get(index)
            .and_then(|entry| entry.get("options"))
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replaces the options of the prompt entry at `index`.
    pub fn set_options(&mut self, index: usize, options: Vec<String>) {
        if let Some(entry) = self.prompts.get_mut(index) {
            let values = options.into_iter().map(Value::String).collect();
            entry.insert("options".into(), Value::Array(values));
        }
    }

    /// Appends one option to the prompt entry at `index`.
    pub fn push_option(&mut self, index: usize, option: &str) {
        let Some(entry) = self.prompts.get_mut(index) else {
            return;
        };
        let value = Value::String(option.to_string());
        match entry
            .entry("options")
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(options) => options.push(value),
            other => *other = Value::Array(vec![value]),
        }
    }

    /// True when this config was last updated before `timestamp`.
    ///
    /// Both sides are ISO-8601 strings, so lexical order is time order. A
    /// config without `updated_at` is always considered stale.
    pub fn is_older_than(&self, timestamp: &str) -> bool {
        self.updated_at
            .as_deref()
            .is_none_or(|updated_at| updated_at < timestamp)
    }
}
