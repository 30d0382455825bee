use chrono::{Local, NaiveDate};
use regex::Regex;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::answers::{self, AnswerParseError};
use crate::console::{Console, INPUT_MARKER};
use crate::error::PromptError;
use crate::spec::{PromptSpec, PromptType};

/// Trailing choice offered for list prompts unless they run fixed.
pub const SPECIFY_OTHER: &str = "Specify other";

const DATE_PATTERN: &str = r"^20\d\d-[0-2]\d-[0-3]\d$";

/// Flags for a single prompt execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Print the prompt's `info` text before asking.
    pub verbose: bool,
    /// Return the configured example without touching the console.
    pub testing: bool,
    /// Do not offer the `Specify other` choice for list prompts.
    pub fixed: bool,
}

type Attempt = Result<Value, AnswerParseError>;

/// A validated question that can be asked until it gets an acceptable answer.
#[derive(Debug, Clone)]
pub struct Prompt {
    spec: PromptSpec,
    pattern: Option<Regex>,
    date_format: Regex,
}

impl Prompt {
    /// Builds a prompt from a raw prompt definition.
    pub fn new(value: &Value) -> Result<Self, PromptError> {
        Self::from_spec(PromptSpec::from_value(value)?)
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self, PromptError> {
        Self::from_spec(PromptSpec::from_map(map)?)
    }

    pub fn from_spec(spec: PromptSpec) -> Result<Self, PromptError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| PromptError::InvalidRegex {
                key: spec.key.clone(),
                source,
            })
        };
        let pattern = spec.regex.as_deref().map(compile).transpose()?;
        let date_format = compile(DATE_PATTERN)?;
        Ok(Self {
            spec,
            pattern,
            date_format,
        })
    }

    pub fn spec(&self) -> &PromptSpec {
        &self.spec
    }

    pub fn key(&self) -> &str {
        &self.spec.key
    }

    pub fn kind(&self) -> PromptType {
        self.spec.kind
    }

    pub fn options(&self) -> &[String] {
        &self.spec.options
    }

    pub fn require(&self) -> bool {
        self.spec.require
    }

    pub fn example(&self) -> &Value {
        &self.spec.example
    }

    pub(crate) fn push_option(&mut self, option: String) {
        self.spec.options.push(option);
    }

    /// Asks the question until the answer validates.
    ///
    /// In testing mode the example is returned without any console I/O.
    /// Rejected answers are reported on the console and the whole prompt is
    /// rendered again; there is no retry limit.
    pub fn run<C: Console + ?Sized>(
        &self,
        console: &mut C,
        options: RunOptions,
    ) -> Result<Value, PromptError> {
        if options.testing {
            return Ok(self.spec.example.clone());
        }

        let mut attempts = 0usize;
        loop {
            attempts += 1;
            debug!(key = %self.spec.key, attempts, "asking prompt");
            match self.attempt(console, options)? {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!(key = %self.spec.key, error = %err, "answer rejected");
                    console.say(&format!("\n{}", err.user_message))?;
                    if options.verbose
                        && let Some(expected) = &err.debug_message
                    {
                        console.say(&format!("  Expected: {}", expected))?;
                    }
                }
            }
        }
    }

    /// Converts `raw` to an integer, or a float when that fails.
    pub fn to_number(&self, raw: &str) -> Result<Number, AnswerParseError> {
        answers::to_number(raw)
    }

    /// True when `raw` is a real calendar date written as `20YY-MM-DD`.
    pub fn valid_date(&self, raw: &str) -> bool {
        self.date_format.is_match(raw) && NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
    }

    /// Today's local date as `YYYY-MM-DD`.
    pub fn today() -> String {
        Local::now().date_naive().format("%Y-%m-%d").to_string()
    }

    /// Question text plus the type hint shown to the user.
    pub fn display_text(&self) -> String {
        match self.spec.kind {
            PromptType::Bool => format!("{} (`y` or `n`)", self.spec.text),
            PromptType::Date => format!("{} (hit return for `{}`)", self.spec.text, Self::today()),
            _ => self.spec.text.clone(),
        }
    }

    fn attempt<C: Console + ?Sized>(
        &self,
        console: &mut C,
        options: RunOptions,
    ) -> Result<Attempt, PromptError> {
        if options.verbose {
            console.say(&format!("\n{}", self.spec.info))?;
        }
        console.say(&format!("\n{}\n", self.display_text()))?;

        if !self.spec.options.is_empty() {
            return self.choose_option(console, options.fixed);
        }

        let response = self.read(console)?;
        if response.is_empty() && !self.spec.require {
            return Ok(Ok(Value::Null));
        }

        Ok(match self.spec.kind {
            PromptType::Bool => answers::parse_bool(&response),
            PromptType::Number => answers::parse_number(&response),
            PromptType::Date => self.parse_date(&response),
            PromptType::Text | PromptType::List => self.check_pattern(response),
        })
    }

    fn choose_option<C: Console + ?Sized>(
        &self,
        console: &mut C,
        fixed: bool,
    ) -> Result<Attempt, PromptError> {
        let mut choices: Vec<&str> = self.spec.options.iter().map(String::as_str).collect();
        if !fixed {
            choices.push(SPECIFY_OTHER);
        }
        for (index, choice) in choices.iter().enumerate() {
            console.say(&format!("\t{} - {}", index, choice))?;
        }
        console.say("")?;

        let response = self.read(console)?;
        let Ok(choice) = response.trim().parse::<i64>() else {
            // anything that is not an index, blank included, is the user's own value
            return Ok(Ok(Value::String(response)));
        };

        match usize::try_from(choice).ok().filter(|index| *index < choices.len()) {
            None => Ok(Err(AnswerParseError::new(
                "Please specify the number of one of the listed options!",
                Some(format!("expected 0 to {}", choices.len() - 1)),
            ))),
            Some(index) if index == self.spec.options.len() => {
                console.say(&format!("\n{}\n", self.spec.text))?;
                let other = self.read(console)?;
                if other.is_empty() {
                    Ok(self.blank_answer())
                } else {
                    Ok(Ok(Value::String(other)))
                }
            }
            Some(index) => Ok(Ok(Value::String(self.spec.options[index].clone()))),
        }
    }

    fn parse_date(&self, raw: &str) -> Attempt {
        if raw.is_empty() {
            return Ok(Value::String(Self::today()));
        }
        if self.valid_date(raw) {
            Ok(Value::String(raw.to_string()))
        } else {
            Err(AnswerParseError::new(
                "Invalid date input. Please use `YYYY-MM-DD` format.",
                Some(format!("`{}` is not a date like 2014-04-28", raw)),
            ))
        }
    }

    fn check_pattern(&self, response: String) -> Attempt {
        match &self.pattern {
            Some(pattern) if !matches_at_start(pattern, &response) => Err(AnswerParseError::new(
                "Invalid input",
                Some(format!("answer must match `{}`", pattern.as_str())),
            )),
            _ => Ok(Value::String(response)),
        }
    }

    fn blank_answer(&self) -> Attempt {
        if self.spec.require {
            Err(AnswerParseError::new("Response required!", None))
        } else {
            Ok(Value::Null)
        }
    }

    fn read<C: Console + ?Sized>(&self, console: &mut C) -> Result<String, PromptError> {
        console
            .read_line(INPUT_MARKER)?
            .ok_or_else(|| PromptError::InputClosed(self.spec.key.clone()))
    }
}

/// Leftmost match starting at byte 0, the way an unanchored pattern is
/// applied to answers.
fn matches_at_start(pattern: &Regex, text: &str) -> bool {
    pattern.find(text).is_some_and(|found| found.start() == 0)
}
