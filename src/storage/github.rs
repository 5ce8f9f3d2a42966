//! GitHub-repository backend.
//!
//! Persists the snapshot as a JSON file committed to a GitHub repository
//! through the contents API. Each save is one commit; the previous blob's
//! `sha` is fetched first so updates replace rather than conflict.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use tracing::debug;

use crate::models::StateSnapshot;
use crate::storage::StateBackend;
use crate::{Error, Result};

/// GitHub API base URL
const GITHUB_API_BASE: &str = "https://api.github.com";

/// User-Agent header required by GitHub API
const USER_AGENT: &str = "weekbank-cli";

/// Commit message used for every state save
const COMMIT_MESSAGE: &str = "Auto-save: weekbank state updated";

/// Connection settings for one repository file.
#[derive(Debug, Clone)]
pub struct GitHubBackendConfig {
    pub owner: String,
    pub repo: String,
    /// Path of the state file within the repository
    pub path: String,
    pub token: String,
}

pub struct GitHubBackend {
    config: GitHubBackendConfig,
}

/// Response from the contents API (only fields we care about).
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    /// File body, base64 with embedded newlines
    content: String,
    /// Blob SHA, required when updating an existing file
    sha: String,
}

impl GitHubBackend {
    pub fn new(config: GitHubBackendConfig) -> Self {
        Self { config }
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            GITHUB_API_BASE, self.config.owner, self.config.repo, self.config.path
        )
    }

    fn get(&self, url: &str) -> std::result::Result<ureq::Response, ureq::Error> {
        ureq::get(url)
            .set("Authorization", &format!("Bearer {}", self.config.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", USER_AGENT)
            .set("X-GitHub-Api-Version", "2022-11-28")
            .call()
    }

    /// Fetch the current file, or `None` when it has never been created.
    fn fetch_contents(&self) -> Result<Option<ContentsResponse>> {
        match self.get(&self.contents_url()) {
            Ok(resp) => {
                let contents: ContentsResponse = resp
                    .into_json()
                    .map_err(|e| Error::StoreUnavailable(format!("contents response: {}", e)))?;
                Ok(Some(contents))
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(Error::StoreUnavailable(format!("GitHub GET failed: {}", e))),
        }
    }
}

impl StateBackend for GitHubBackend {
    fn load(&self) -> Result<Option<StateSnapshot>> {
        let Some(contents) = self.fetch_contents()? else {
            debug!("state file not found in repository");
            return Ok(None);
        };

        // The contents API wraps base64 at 60 columns; strip whitespace
        // before decoding.
        let cleaned: String = contents
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let raw = BASE64
            .decode(cleaned)
            .map_err(|e| Error::StoreUnavailable(format!("base64 decode: {}", e)))?;
        let snapshot = serde_json::from_slice(&raw)
            .map_err(|e| Error::StoreUnavailable(format!("parse state file: {}", e)))?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        // Existing blob sha is required for updates; absent on first save.
        let sha = self
            .fetch_contents()
            .map_err(|e| Error::StoreWriteFailure(e.to_string()))?
            .map(|c| c.sha);

        let content = serde_json::to_string_pretty(snapshot)?;
        let mut body = serde_json::json!({
            "message": COMMIT_MESSAGE,
            "content": BASE64.encode(content),
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha);
        }

        ureq::put(&self.contents_url())
            .set("Authorization", &format!("Bearer {}", self.config.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", USER_AGENT)
            .set("X-GitHub-Api-Version", "2022-11-28")
            .send_json(body)
            .map_err(|e| Error::StoreWriteFailure(format!("GitHub PUT failed: {}", e)))?;

        debug!(path = %self.config.path, "state saved to GitHub");
        Ok(())
    }

    fn location(&self) -> String {
        format!(
            "github:{}/{}/{}",
            self.config.owner, self.config.repo, self.config.path
        )
    }

    fn backend_type(&self) -> &'static str {
        "github"
    }
}
