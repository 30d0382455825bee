mod action;
mod api;
mod logging;
mod resource;

use std::env;
use std::path::PathBuf;

use action::{ActionTable, Flow, prompt_for_action};
use api::ApiClient;
use clap::{ArgGroup, CommandFactory, Parser};
use resource::{
    CACHE_FILE, NameCache, Resource, config_path, load_json, merge_cache, resolve_config_dir,
    save_json,
};
use tracing::info;
use xpub_prompter::{Console, Prompter, PrompterOptions, ResourceConfig, StdConsole};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "A CLI for the `xromm.uchicago.edu` data portal",
    long_about = "Prompts for study, trial, file or health record metadata, then views, saves or sends it to the xromm portal.\n\nExamples:\n  xpub --study\n  xpub --trial --required\n  xpub path/to/video.avi"
)]
#[command(group(
    ArgGroup::new("resource")
        .args(["study", "trial", "healthrecord", "file"])
        .multiple(false)
))]
struct Cli {
    /// Only prompt for required input.
    #[arg(long)]
    required: bool,
    /// Provide additional info when prompting.
    #[arg(long)]
    verbose: bool,
    /// Answer every prompt with its example instead of asking.
    #[arg(long)]
    testing: bool,
    /// Directory holding the prompt configs and name cache (defaults to XROMM_CONFIG or ./config).
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
    /// Create a new study.
    #[arg(long)]
    study: bool,
    /// Create a new trial.
    #[arg(long)]
    trial: bool,
    /// Create a health record in the Hatabase.
    #[arg(long)]
    healthrecord: bool,
    /// File to transfer.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

impl Cli {
    fn resource(&self) -> Option<Resource> {
        if self.study {
            Some(Resource::Study)
        } else if self.trial {
            Some(Resource::Trial)
        } else if self.healthrecord {
            Some(Resource::HealthRecord)
        } else {
            self.file.clone().map(Resource::File)
        }
    }

    fn prompter_options(&self) -> PrompterOptions {
        PrompterOptions {
            verbose: self.verbose,
            testing: self.testing,
            required: self.required,
        }
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    let Some(resource) = cli.resource() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };
    run(&cli, resource, &mut StdConsole)
}

fn run(cli: &Cli, resource: Resource, console: &mut dyn Console) -> CliResult<()> {
    let config_dir = resolve_config_dir(cli.config_dir.clone());
    let config_path = config_path(&config_dir, &resource, console, cli.testing)?;
    let cache_path = config_dir.join(CACHE_FILE);
    info!(config = %config_path.display(), "loading prompt config");

    let mut config: ResourceConfig = load_json(&config_path)?;
    let mut cache = NameCache::load(&cache_path)?;
    merge_cache(&mut config, &cache, &resource);

    let mut prompter = Prompter::new(config, cli.prompter_options()).map_err(|err| {
        format!(
            "error initializing prompts in {}: {}",
            config_path.display(),
            err
        )
    })?;
    prompter.run(console)?;
    prompter.record_mut().file_name = resource.file_name();

    let actions = ActionTable::standard(ApiClient::from_env()?, env::current_dir()?);
    if prompt_for_action(prompter.record(), &actions, console)? == Flow::Quit {
        info!("discarding collected metadata");
        return Ok(());
    }

    let (record, revised, config) = prompter.into_parts();
    if revised {
        save_json(&config, &config_path)?;
    }
    if cache.remember(&resource, &record) {
        save_json(&cache, &cache_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use serde_json::{Value, json};
    use std::fs;
    use std::path::Path;

    const STUDY: &str = include_str!("../../../config/study.json");
    const TRIAL: &str = include_str!("../../../config/trial.json");
    const FILE: &str = include_str!("../../../config/file.json");
    const XRAY: &str = include_str!("../../../config/mediatypes/xray.json");

    fn config_dir(cache: Value) -> TempDir {
        let dir = TempDir::new().unwrap();
        dir.child("config/study.json").write_str(STUDY).unwrap();
        dir.child("config/trial.json").write_str(TRIAL).unwrap();
        dir.child("config/file.json").write_str(FILE).unwrap();
        dir.child("config/mediatypes/xray.json")
            .write_str(XRAY)
            .unwrap();
        dir.child("config/cache.json")
            .write_str(&cache.to_string())
            .unwrap();
        dir
    }

    fn xpub(dir: &TempDir) -> Command {
        let mut cmd = Command::cargo_bin("xpub").unwrap();
        cmd.current_dir(dir.path())
            .env_remove("XROMM_CONFIG")
            .env_remove("XPUB_LOG")
            .env("XROMM_API_URL", "http://127.0.0.1:9/api")
            .arg("--config-dir")
            .arg(dir.path().join("config"))
            .arg("--testing");
        cmd
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn empty_cache() -> Value {
        json!({ "updated_at": "2014-05-07T09:30:00.000000Z", "studies": {} })
    }

    #[test]
    fn no_resource_prints_help() -> Result<(), Box<dyn std::error::Error>> {
        let output = Command::cargo_bin("xpub")?.output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("--study"));
        assert!(stdout.contains("--healthrecord"));
        Ok(())
    }

    #[test]
    fn resources_are_mutually_exclusive() {
        Command::cargo_bin("xpub")
            .unwrap()
            .args(["--study", "--trial"])
            .assert()
            .failure();
    }

    #[test]
    fn quit_leaves_config_and_cache_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let dir = config_dir(empty_cache());
        let output = xpub(&dir).arg("--study").write_stdin("3\n").output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("What to do with the collected metadata?"));

        assert_eq!(fs::read_to_string(dir.path().join("config/study.json"))?, STUDY);
        assert_eq!(read_json(&dir.path().join("config/cache.json")), empty_cache());
        assert!(!dir.path().join("input.json").exists());
        Ok(())
    }

    #[test]
    fn view_then_save_writes_input_and_caches_study() -> Result<(), Box<dyn std::error::Error>> {
        let dir = config_dir(empty_cache());
        let output = xpub(&dir).arg("--study").write_stdin("0\n1\n").output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("<<< COLLECTED METADATA"));
        assert!(stdout.contains("input saved to"));

        let input = read_json(&dir.path().join("input.json"));
        assert_eq!(input["resource"], json!("study"));
        assert_eq!(input["data"]["name"], json!("pig-chewing-study"));
        assert!(input["updated_at"].is_string());
        assert!(input.get("file_name").is_none());

        let cache = read_json(&dir.path().join("config/cache.json"));
        assert_eq!(cache["studies"]["pig-chewing-study"], json!([]));
        assert_ne!(cache["updated_at"], empty_cache()["updated_at"]);
        assert_eq!(fs::read_to_string(dir.path().join("config/study.json"))?, STUDY);
        Ok(())
    }

    #[test]
    fn trial_offers_cached_studies_and_persists_new_ones() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = config_dir(json!({
            "updated_at": "2014-05-07T09:30:00.000000Z",
            "studies": { "rat-study": ["r1"] }
        }));
        let output = xpub(&dir).arg("--trial").write_stdin("1\n").output()?;
        assert!(output.status.success());

        let config = read_json(&dir.path().join("config/trial.json"));
        assert_eq!(
            config["prompts"][0]["options"],
            json!(["rat-study", "pig-chewing-study"])
        );
        assert_ne!(config["updated_at"], json!("2014-05-06T12:00:00.000000Z"));

        let cache = read_json(&dir.path().join("config/cache.json"));
        assert_eq!(cache["studies"]["rat-study"], json!(["r1"]));
        assert_eq!(cache["studies"]["pig-chewing-study"], json!(["trial-01"]));
        Ok(())
    }

    #[test]
    fn file_transfer_uses_mediatype_prompts() -> Result<(), Box<dyn std::error::Error>> {
        let dir = config_dir(empty_cache());
        let output = xpub(&dir)
            .arg("clips/run-1.avi")
            .write_stdin("1\n")
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(!stdout.contains("What type of file is this?"));

        let input = read_json(&dir.path().join("input.json"));
        assert_eq!(input["resource"], json!("file"));
        assert_eq!(input["file_name"], json!("run-1.avi"));

        dir.child("config/mediatypes/video.json")
            .write_str(&XRAY.replace("file/xray", "file/video"))?;
        let output = xpub(&dir)
            .arg("clips/run-2.avi")
            .write_stdin("1\n")
            .output()?;
        assert!(output.status.success());
        let input = read_json(&dir.path().join("input.json"));
        assert_eq!(input["resource"], json!("file/video"));
        assert_eq!(input["file_name"], json!("run-2.avi"));
        Ok(())
    }

    #[test]
    fn interactive_mediatype_selects_xray_prompts() -> Result<(), Box<dyn std::error::Error>> {
        let dir = config_dir(empty_cache());
        let mut cmd = Command::cargo_bin("xpub")?;
        let inputs = ["3", "0", "0", "0", "250", "1"];
        let output = cmd
            .current_dir(dir.path())
            .env_remove("XROMM_CONFIG")
            .env_remove("XPUB_LOG")
            .arg("--config-dir")
            .arg(dir.path().join("config"))
            .arg("run-3.avi")
            .write_stdin(format!("{}\n", inputs.join("\n")))
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("What type of file is this?"));

        let input = read_json(&dir.path().join("input.json"));
        assert_eq!(input["resource"], json!("file/xray"));
        assert_eq!(input["data"]["frame_rate"], json!(250));
        Ok(())
    }

    #[test]
    fn unknown_action_asks_again() -> Result<(), Box<dyn std::error::Error>> {
        let dir = config_dir(empty_cache());
        let output = xpub(&dir)
            .arg("--study")
            .write_stdin("launch\nquit\n")
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("Unknown action `launch`!"));
        Ok(())
    }

    #[test]
    fn broken_config_is_reported() {
        let dir = config_dir(empty_cache());
        dir.child("config/study.json")
            .write_str(r#"{"key": "study", "version": "0.0.1", "prompts": [{"key": "name"}]}"#)
            .unwrap();
        let output = xpub(&dir).arg("--study").output().unwrap();
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("error initializing prompts"));
    }

    #[test]
    fn closed_stdin_fails_instead_of_looping() {
        let dir = config_dir(empty_cache());
        let output = xpub(&dir).arg("--study").write_stdin("").output().unwrap();
        assert!(!output.status.success());
    }
}
