use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, warn};
use xpub_prompter::{Console, Prompt, ResourceConfig, ResourceRecord, RunOptions, pretty_json};

use crate::CliResult;

pub const CONFIG_ENV: &str = "XROMM_CONFIG";
pub const CACHE_FILE: &str = "cache.json";
const DEFAULT_FILE_CONFIG: &str = "file.json";

/// The kind of record the user asked to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Study,
    Trial,
    HealthRecord,
    /// Metadata for a file being transferred.
    File(PathBuf),
}

impl Resource {
    fn config_file(&self) -> &'static str {
        match self {
            Resource::Study => "study.json",
            Resource::Trial => "trial.json",
            Resource::HealthRecord => "macaque_health_record.json",
            Resource::File(_) => DEFAULT_FILE_CONFIG,
        }
    }

    /// Base name of the transferred file, for file resources.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Resource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            _ => None,
        }
    }
}

/// Config directory: explicit flag, then `XROMM_CONFIG`, then `./config`.
pub fn resolve_config_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.filter(|path| !path.as_os_str().is_empty())
        .or_else(|| {
            env::var_os(CONFIG_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("config"))
}

/// Config file for `resource`. File transfers first ask for the media type
/// and use `mediatypes/<type>.json` when one exists.
pub fn config_path(
    dir: &Path,
    resource: &Resource,
    console: &mut dyn Console,
    testing: bool,
) -> CliResult<PathBuf> {
    if !matches!(resource, Resource::File(_)) {
        return Ok(dir.join(resource.config_file()));
    }

    let mediatype = prompt_for_mediatype(console, testing)?;
    if is_plain_name(&mediatype) {
        let candidate = dir.join("mediatypes").join(format!("{}.json", mediatype));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    info!(mediatype = %mediatype, "no mediatype config, using default file prompts");
    Ok(dir.join(DEFAULT_FILE_CONFIG))
}

fn mediatype_prompt() -> Value {
    json!({
        "key": "mediatype",
        "text": "What type of file is this?",
        "info": "Specify the mediatype of the file being transferred.",
        "type": "list",
        "options": [
            "vol   (3D volume)",
            "emg   (electromyography recording)",
            "proc  (processed file: `UNDTFORM`, `MDLT`, `MayaCam`)",
            "xray  (xray video)",
            "grid  (xray undistortion grid)",
            "calib (xray calibration object)",
            "video (standard video)",
            "NEV   (neural spiking data)",
            "NSx   (neural continuous data)",
            "other (none of the above)"
        ],
        "example": "video (standard video)",
        "require": true,
        "store": [],
        "regex": ""
    })
}

/// Asks which kind of file is being transferred; returns the short name.
/// When testing, the example (`video`) is used without asking.
pub fn prompt_for_mediatype(console: &mut dyn Console, testing: bool) -> CliResult<String> {
    let prompt = Prompt::new(&mediatype_prompt())?;
    let options = RunOptions {
        fixed: true,
        testing,
        ..RunOptions::default()
    };
    let answer = prompt.run(console, options)?;
    Ok(first_word(&answer))
}

/// First word of a list answer: `"view (look it over)"` becomes `"view"`.
pub fn first_word(answer: &Value) -> String {
    answer
        .as_str()
        .and_then(|text| text.split_whitespace().next())
        .unwrap_or_default()
        .to_string()
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Cached study and trial names, used to offer existing names as options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameCache {
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub studies: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NameCache {
    /// Loads the cache, treating a missing file as empty.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "name cache not found, starting empty");
            return Ok(Self::default());
        }
        load_json(path)
    }

    pub fn study_names(&self) -> Vec<String> {
        self.studies.keys().cloned().collect()
    }

    /// Every study followed by its `study/trial` names.
    pub fn study_and_trial_names(&self) -> Vec<String> {
        self.studies
            .iter()
            .flat_map(|(study, trials)| {
                std::iter::once(study.clone())
                    .chain(trials.iter().map(move |trial| format!("{}/{}", study, trial)))
            })
            .collect()
    }

    /// Returns true when the study was not cached yet.
    pub fn add_study(&mut self, study: &str) -> bool {
        if self.studies.contains_key(study) {
            return false;
        }
        self.studies.insert(study.to_string(), Vec::new());
        true
    }

    /// Returns true when the trial was not cached yet.
    pub fn add_trial(&mut self, study: &str, trial: &str) -> bool {
        let trials = self.studies.entry(study.to_string()).or_default();
        if trials.iter().any(|known| known == trial) {
            return false;
        }
        trials.push(trial.to_string());
        true
    }

    /// Records names created by `record`; returns true when the cache changed.
    pub fn remember(&mut self, resource: &Resource, record: &ResourceRecord) -> bool {
        match resource {
            Resource::Study => record
                .text("name")
                .is_some_and(|name| self.add_study(name)),
            Resource::Trial => match (record.text("study"), record.text("name")) {
                (Some(study), Some(trial)) => self.add_trial(study, trial),
                _ => false,
            },
            _ => false,
        }
    }
}

/// Replaces the first prompt's options with cached names when the cache is
/// newer than the config.
pub fn merge_cache(config: &mut ResourceConfig, cache: &NameCache, resource: &Resource) {
    if cache.updated_at.is_empty() || !config.is_older_than(&cache.updated_at) {
        return;
    }
    let names = match resource {
        Resource::Trial => cache.study_names(),
        Resource::File(_) => cache.study_and_trial_names(),
        _ => return,
    };
    info!(resource = %config.key, names = names.len(), "offering cached names");
    config.set_options(0, names);
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let value = serde_json::from_str(&contents)
        .map_err(|err| format!("failed to parse {}: {}", path.display(), err))?;
    Ok(value)
}

/// Writes `value` to `path` with a fresh `updated_at` stamp.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> CliResult<Value> {
    let mut json = serde_json::to_value(value)?;
    if let Some(map) = json.as_object_mut() {
        map.insert("updated_at".into(), Value::String(timestamp()));
    }
    let mut contents = pretty_json(&json)?;
    contents.push('\n');
    fs::write(path, contents).map_err(|err| format!("failed to write {}: {}", path.display(), err))?;
    info!(path = %path.display(), "saved json");
    Ok(json)
}

pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
