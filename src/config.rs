pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::error::ScavengerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GitHubConfig,
    pub bot: BotConfig,
    /// Compute and log decisions without posting comments or closing PRs.
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Alternative REST endpoint, e.g. a GitHub Enterprise host.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// File holding the API token. Falls back to `GITHUB_TOKEN` when unset.
    #[serde(default)]
    pub token_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Either `org/repo` or a bare `org` that expands to every repository of the org.
    pub repos: Vec<String>,

    /// Fully-qualified `org/repo` names that are never scanned.
    #[serde(default)]
    pub excluded_repos: Vec<String>,

    /// Days of inactivity before a merge reminder is posted. Also the minimum
    /// number of days between two reminders on the same PR.
    pub merge_remind_intervals: i64,

    /// Days of inactivity after which a PR is closed.
    pub maximum_open_time: i64,

    /// Number of PR evaluations allowed to run at the same time.
    pub concurrent_size: usize,

    /// Former or secondary logins of the bot whose comments count as its own.
    #[serde(default)]
    pub bot_aliases: Vec<String>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ScavengerError> {
        self.bot.validate()
    }
}

impl BotConfig {
    pub fn validate(&self) -> Result<(), ScavengerError> {
        if self.concurrent_size == 0 {
            return Err(ScavengerError::ConfigError(
                "concurrent_size must be bigger than 0".to_string(),
            ));
        }

        if self.merge_remind_intervals <= 0 {
            return Err(ScavengerError::ConfigError(
                "merge_remind_intervals must be bigger than 0".to_string(),
            ));
        }

        if self.maximum_open_time <= 0 {
            return Err(ScavengerError::ConfigError(
                "maximum_open_time must be bigger than 0".to_string(),
            ));
        }

        if self.merge_remind_intervals >= self.maximum_open_time {
            warn!(
                "merge_remind_intervals ({}) >= maximum_open_time ({}): PRs will be closed before any reminder",
                self.merge_remind_intervals, self.maximum_open_time
            );
        }

        self.validate_repo_filter()
    }

    fn validate_repo_filter(&self) -> Result<(), ScavengerError> {
        if self.repos.is_empty() {
            return Err(ScavengerError::ConfigError(
                "repos must not be empty".to_string(),
            ));
        }

        for token in &self.repos {
            if !is_valid_token(token) {
                return Err(ScavengerError::ConfigError(format!(
                    "invalid repository token in repos: {:?}",
                    token
                )));
            }
        }

        for token in &self.excluded_repos {
            if !is_valid_token(token) || !token.contains('/') {
                return Err(ScavengerError::ConfigError(format!(
                    "excluded_repos entries must be org/repo, got {:?}",
                    token
                )));
            }
        }

        Ok(())
    }
}

fn is_valid_token(token: &str) -> bool {
    if token.trim() != token || token.is_empty() {
        return false;
    }

    let parts: Vec<&str> = token.split('/').collect();
    parts.len() <= 2 && parts.iter().all(|p| !p.is_empty())
}
