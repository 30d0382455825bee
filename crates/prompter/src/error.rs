use thiserror::Error;

/// Failures that abort prompt construction or execution.
///
/// Rejected answers are not errors at this level: they are reported to the
/// user and the prompt is asked again (see [`crate::AnswerParseError`]).
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt is missing `{0}` field")]
    MissingField(String),
    #[error("type={value} | `type` should be one of the following: bool, date, text, list, number")]
    InvalidType { value: String },
    #[error(
        "store={value} | `store` should only contain the following values: xromm, ross_db, hatabase"
    )]
    InvalidStore { value: String },
    #[error("prompt field `{field}` is malformed: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("prompt definitions must be JSON objects")]
    NotAnObject,
    #[error("prompt `{key}` has an invalid regex: {source}")]
    InvalidRegex {
        key: String,
        #[source]
        source: regex::Error,
    },
    #[error("console i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("input ended while waiting for an answer to `{0}`")]
    InputClosed(String),
}

impl PromptError {
    /// True for errors caused by a malformed prompt definition.
    pub fn is_config_error(&self) -> bool {
        !matches!(self, PromptError::Io(_) | PromptError::InputClosed(_))
    }
}
