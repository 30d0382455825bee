use std::path::PathBuf;

use serde_json::{Value, json};
use tracing::debug;
use xpub_prompter::{Console, Prompt, ResourceRecord, RunOptions};

use crate::CliResult;
use crate::api::ApiClient;
use crate::resource::{first_word, save_json};

/// What happens after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Ask for another action.
    Again,
    /// Continue with persisting config and cache.
    Done,
    /// Stop right away, discarding the record.
    Quit,
}

pub type ActionFn = Box<dyn Fn(&ResourceRecord, &mut dyn Console) -> CliResult<Flow>>;

pub struct Action {
    pub name: &'static str,
    /// Shown next to the name in the option list.
    pub label: &'static str,
    pub run: ActionFn,
}

/// Actions offered once metadata has been collected, keyed by name.
pub struct ActionTable {
    actions: Vec<Action>,
}

impl ActionTable {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// `view`, `save` (into `save_dir/input.json`), `send` and `quit`.
    pub fn standard(api: ApiClient, save_dir: PathBuf) -> Self {
        Self::new(vec![
            Action {
                name: "view",
                label: "look it over before doing anything else",
                run: Box::new(view),
            },
            Action {
                name: "save",
                label: "save it to a file",
                run: Box::new(
                    move |record: &ResourceRecord, console: &mut dyn Console| -> CliResult<Flow> {
                        let path = save_dir.join("input.json");
                        save_json(record, &path)?;
                        console.say(&format!("input saved to {}", path.display()))?;
                        Ok(Flow::Done)
                    },
                ),
            },
            Action {
                name: "send",
                label: "send it off to the `xromm` server",
                run: Box::new(move |record: &ResourceRecord, console: &mut dyn Console| {
                    send(&api, record, console)
                }),
            },
            Action {
                name: "quit",
                label: "just discard it",
                run: Box::new(quit),
            },
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|action| action.name == name)
    }

    fn prompt_config(&self) -> Value {
        let options: Vec<String> = self
            .actions
            .iter()
            .map(|action| format!("{} ({})", action.name, action.label))
            .collect();
        let example = options.last().cloned().unwrap_or_default();
        json!({
            "key": "action",
            "text": "What to do with the collected metadata?",
            "info": "What do you want to do with these inputs?",
            "type": "list",
            "options": options,
            "example": example,
            "require": true,
            "store": [],
            "regex": ""
        })
    }
}

/// Asks what to do with `record` and runs the chosen action until one of
/// them finishes the session.
pub fn prompt_for_action(
    record: &ResourceRecord,
    table: &ActionTable,
    console: &mut dyn Console,
) -> CliResult<Flow> {
    let prompt = Prompt::new(&table.prompt_config())?;
    let options = RunOptions {
        fixed: true,
        ..RunOptions::default()
    };

    loop {
        let answer = prompt.run(console, options)?;
        let choice = first_word(&answer);
        let Some(action) = table.get(&choice) else {
            console.say(&format!("\nUnknown action `{}`!", choice))?;
            continue;
        };

        debug!(action = action.name, "running action");
        match (action.run)(record, console)? {
            Flow::Again => continue,
            flow => return Ok(flow),
        }
    }
}

fn view(record: &ResourceRecord, console: &mut dyn Console) -> CliResult<Flow> {
    console.say(&record.to_json_pretty()?)?;
    console.say("<<< COLLECTED METADATA")?;
    Ok(Flow::Again)
}

fn quit(_: &ResourceRecord, _: &mut dyn Console) -> CliResult<Flow> {
    Ok(Flow::Quit)
}

fn send(api: &ApiClient, record: &ResourceRecord, console: &mut dyn Console) -> CliResult<Flow> {
    console.say(&format!("sending to {}", api.resource_url(record)))?;
    match api.send(record) {
        Ok(body) => console.say(&body)?,
        Err(err) => console.say(&format!("failed: {}", err))?,
    }
    Ok(Flow::Done)
}
