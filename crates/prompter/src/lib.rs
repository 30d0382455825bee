#![allow(missing_docs)]

pub mod answers;
pub mod console;
pub mod error;
pub mod prompt;
pub mod prompter;
pub mod spec;

pub use answers::{AnswerParseError, ResourceRecord, parse_bool, parse_number, pretty_json, to_number};
pub use console::{Console, INPUT_MARKER, ScriptedConsole, StdConsole};
pub use error::PromptError;
pub use prompt::{Prompt, RunOptions, SPECIFY_OTHER};
pub use prompter::{Prompter, PrompterOptions};
pub use spec::{PromptSpec, PromptType, ResourceConfig, StoreTarget};
