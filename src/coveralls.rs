//! Delivery of a finished payload to the Coveralls jobs API.
//!
//! The resolution engine never touches the network; only the CLI assembles
//! a `Job` around the payload it produced and submits it here.

use anyhow::{bail, Context as _, Result};
use serde::Serialize;

use crate::model::CoveragePayload;

const JOBS_URL: &str = "https://coveralls.io/api/v1/jobs";

/// A complete Coveralls job: the coverage payload plus build metadata.
#[derive(Debug, Serialize)]
pub struct Job {
    pub repo_token: String,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_pull_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    pub run_at: String,
    pub source_files: CoveragePayload,
}

impl Job {
    /// Assemble a job around a payload, stamped with the current time.
    #[must_use]
    pub fn new(repo_token: String, payload: CoveragePayload) -> Self {
        Self {
            repo_token,
            service_name: "evergreen".to_string(),
            service_number: None,
            service_pull_request: None,
            commit_sha: None,
            run_at: chrono::Utc::now().to_rfc3339(),
            source_files: payload,
        }
    }

    /// Serialize the job document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize Coveralls job")
    }
}

/// POST the job to Coveralls. The API takes the whole JSON document as the
/// `json` form field. Returns the response body.
pub fn submit(job: &Job) -> Result<String> {
    let json = job.to_json()?;
    let resp = ureq::post(JOBS_URL).send_form(&[("json", json.as_str())]);

    match resp {
        Ok(resp) => resp
            .into_string()
            .context("Failed to read Coveralls response body"),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            bail!("Coveralls API error (HTTP {}): {}", code, body);
        }
        Err(e) => bail!("Failed to submit coverage job: {}", e),
    }
}
