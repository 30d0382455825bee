use reqwest::blocking::Client;
use tracing::{info, warn};
use xpub_prompter::ResourceRecord;

use crate::CliResult;

pub const API_URL_ENV: &str = "XROMM_API_URL";
pub const DEFAULT_API_URL: &str = "http://xromm.rcc.uchicago/api";

/// Blocking client for the portal's REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Base URL from `XROMM_API_URL`, falling back to the public portal.
    pub fn from_env() -> CliResult<Self> {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> CliResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| format!("failed to build HTTP client: {}", err))?;
        Ok(ApiClient {
            client,
            base_url: base_url.into(),
        })
    }

    /// Endpoint a record is posted to.
    ///
    /// Studies go to `studies/`, trials under their study and files under the
    /// study or `study/trial` they were attached to.
    pub fn resource_url(&self, record: &ResourceRecord) -> String {
        let mut path = String::from("studies/");
        if record.resource.starts_with("file") {
            if let Some(target) = record.text("study_trial") {
                match target.split_once('/') {
                    Some((study, trial)) => path.push_str(&format!("{}/trials/{}/", study, trial)),
                    None => path.push_str(&format!("{}/", target)),
                }
            }
        } else if record.resource == "trial"
            && let Some(study) = record.text("study")
        {
            path.push_str(&format!("{}/trials/", study));
        }
        format!(
            "{}/v{}/{}",
            self.base_url.trim_end_matches('/'),
            record.version,
            path
        )
    }

    /// Posts the record as JSON and returns the response body.
    pub fn send(&self, record: &ResourceRecord) -> CliResult<String> {
        let url = self.resource_url(record);
        info!(url = %url, resource = %record.resource, "sending record");
        let res = self
            .client
            .post(&url)
            .json(record)
            .send()
            .map_err(|err| format!("request to {} failed: {}", url, err))?;
        let status = res.status();
        let body = res.text().unwrap_or_default();
        if !status.is_success() {
            warn!(url = %url, %status, "portal rejected record");
            return Err(format!("{} - {}", status, body).into());
        }
        Ok(body)
    }
}
