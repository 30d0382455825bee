use serde_json::{Map, Value};
use tracing::{error, info};

use crate::answers::ResourceRecord;
use crate::console::Console;
use crate::error::PromptError;
use crate::prompt::{Prompt, RunOptions};
use crate::spec::{PromptType, ResourceConfig};

/// Flags for a whole resource run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrompterOptions {
    /// Show each prompt's extended help text.
    pub verbose: bool,
    /// Answer every prompt with its example.
    pub testing: bool,
    /// Only ask prompts marked `require: true`.
    pub required: bool,
}

/// Runs the prompts of one resource config and collects the answers.
///
/// List answers that are not yet among a prompt's options are appended to
/// the held config and flag it as revised, so the caller can persist it.
#[derive(Debug)]
pub struct Prompter {
    config: ResourceConfig,
    // (index into `config.prompts`, prompt built from that entry)
    prompts: Vec<(usize, Prompt)>,
    record: ResourceRecord,
    options: PrompterOptions,
    revised: bool,
}

impl Prompter {
    pub fn new(config: ResourceConfig, options: PrompterOptions) -> Result<Self, PromptError> {
        let record = ResourceRecord::new(config.key.clone(), config.version.clone());
        let prompts = config
            .prompts
            .iter()
            .enumerate()
            .filter(|(_, entry)| !options.required || is_required(entry))
            .map(|(index, entry)| Prompt::from_map(entry).map(|prompt| (index, prompt)))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|err| {
                error!(resource = %config.key, error = %err, "error initializing prompts");
            })?;

        Ok(Self {
            config,
            prompts,
            record,
            options,
            revised: false,
        })
    }

    /// Runs every prompt once, in config order, and returns the record.
    pub fn run<C: Console + ?Sized>(
        &mut self,
        console: &mut C,
    ) -> Result<&ResourceRecord, PromptError> {
        let run_options = RunOptions {
            verbose: self.options.verbose,
            testing: self.options.testing,
            fixed: false,
        };

        for (index, prompt) in &mut self.prompts {
            let answer = prompt.run(console, run_options)?;

            if prompt.kind() == PromptType::List
                && let Some(option) = option_text(&answer)
                && !prompt.options().iter().any(|known| *known == option)
            {
                info!(
                    resource = %self.config.key,
                    key = prompt.key(),
                    option = %option,
                    "caching new option"
                );
                self.config.push_option(*index, &option);
                prompt.push_option(option);
                self.revised = true;
            }

            self.record.set(prompt.key(), answer);
        }

        info!(
            resource = %self.record.resource,
            answers = self.record.data.len(),
            "collected resource metadata"
        );
        Ok(&self.record)
    }

    pub fn record(&self) -> &ResourceRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut ResourceRecord {
        &mut self.record
    }

    /// True once any run has added a new option to the config.
    pub fn revised(&self) -> bool {
        self.revised
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn prompts(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.iter().map(|(_, prompt)| prompt)
    }

    /// Consumes the prompter, returning the record, the revised flag and the config.
    pub fn into_parts(self) -> (ResourceRecord, bool, ResourceConfig) {
        (self.record, self.revised, self.config)
    }
}

// Options are strings, so other answers are cached by their JSON text.
// Empty, zero, false and null answers are never cached.
fn option_text(answer: &Value) -> Option<String> {
    match answer {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

// Entries without a usable `require` are kept so construction reports them.
fn is_required(entry: &Map<String, Value>) -> bool {
    entry.get("require").and_then(Value::as_bool) != Some(false)
}
