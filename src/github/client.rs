//! GitHub REST client
//!
//! `octocrab`-backed implementation of [`RepositoryHost`]. Routes are called
//! through octocrab's raw HTTP helpers with local DTOs so only the fields the
//! scanner needs are deserialized.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::GitHubConfig;
use crate::error::ScavengerError;
use crate::github::host::RepositoryHost;
use crate::github::types::{Comment, CommitMeta, OperationLogEntry, PullRequest, RepositoryRef};

const PER_PAGE: u8 = 100;

pub struct GitHubClient {
    client: Octocrab,
}

#[derive(Debug, Serialize)]
struct PageParams<'a> {
    per_page: u8,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoDto {
    name: String,
    owner: UserDto,
}

#[derive(Debug, Deserialize)]
struct PullDto {
    number: u64,
    user: Option<UserDto>,
    created_at: DateTime<Utc>,
    state: String,
}

#[derive(Debug, Deserialize)]
struct CommentDto {
    user: Option<UserDto>,
    body: Option<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct EventDto {
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CommitDto {
    commit: CommitDetailDto,
}

#[derive(Debug, Deserialize)]
struct CommitDetailDto {
    committer: Option<SignatureDto>,
}

#[derive(Debug, Deserialize)]
struct SignatureDto {
    date: Option<DateTime<Utc>>,
}

impl GitHubClient {
    /// Create a client from configuration. The token is read from
    /// `token_path` when set, otherwise from the `GITHUB_TOKEN` variable.
    pub fn new(config: &GitHubConfig) -> Result<Self, ScavengerError> {
        let token = match &config.token_path {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| {
                    ScavengerError::ConfigError(format!("Failed to read token {:?}: {}", path, e))
                })?
                .trim()
                .to_string(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                ScavengerError::ConfigError(
                    "No token_path configured and GITHUB_TOKEN is not set".to_string(),
                )
            })?,
        };

        if token.is_empty() {
            return Err(ScavengerError::ConfigError("GitHub token is empty".to_string()));
        }

        Self::with_token(token, config.api_base_url.as_deref())
    }

    pub fn with_token(token: String, api_base_url: Option<&str>) -> Result<Self, ScavengerError> {
        let mut builder = Octocrab::builder().personal_token(token);

        if let Some(url) = api_base_url {
            builder = builder.base_uri(url).map_err(|e| {
                ScavengerError::ConfigError(format!("Invalid GitHub API URL {}: {}", url, e))
            })?;
        }

        let client = builder.build().map_err(|e| {
            ScavengerError::ConfigError(format!("Failed to create GitHub client: {}", e))
        })?;

        Ok(Self { client })
    }

    /// Fetch every page of a list endpoint.
    async fn get_all<T>(
        &self,
        operation: &'static str,
        route: &str,
        state: Option<&str>,
    ) -> Result<Vec<T>, ScavengerError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let params = PageParams {
                per_page: PER_PAGE,
                page,
                state,
            };

            let batch: Vec<T> = self
                .client
                .get(route, Some(&params))
                .await
                .map_err(|e| ScavengerError::remote_read(operation, route, e))?;

            let len = batch.len();
            items.extend(batch);

            if len < PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        debug!("{} {} returned {} items", operation, route, items.len());
        Ok(items)
    }
}

fn issue_route(repo: &RepositoryRef, number: u64, suffix: &str) -> String {
    format!("/repos/{}/{}/issues/{}/{}", repo.org, repo.name, number, suffix)
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn bot_identity(&self) -> Result<String, ScavengerError> {
        let me: UserDto = self
            .client
            .get("/user", None::<&()>)
            .await
            .map_err(|e| ScavengerError::remote_read("get_user", "/user", e))?;
        Ok(me.login)
    }

    async fn list_org_repositories(
        &self,
        org: &str,
    ) -> Result<Vec<RepositoryRef>, ScavengerError> {
        let route = format!("/orgs/{}/repos", org);
        let repos: Vec<RepoDto> = self.get_all("list_org_repositories", &route, None).await?;

        Ok(repos
            .into_iter()
            .map(|r| RepositoryRef::new(r.owner.login, r.name))
            .collect())
    }

    async fn list_open_pull_requests(
        &self,
        repo: &RepositoryRef,
    ) -> Result<Vec<PullRequest>, ScavengerError> {
        let route = format!("/repos/{}/{}/pulls", repo.org, repo.name);
        let pulls: Vec<PullDto> = self
            .get_all("list_open_pull_requests", &route, Some("open"))
            .await?;

        Ok(pulls
            .into_iter()
            .map(|p| PullRequest {
                number: p.number,
                author: p.user.map(|u| u.login).unwrap_or_default(),
                created_at: p.created_at,
                state: p.state,
            })
            .collect())
    }

    async fn list_pr_comments(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<Comment>, ScavengerError> {
        let route = issue_route(repo, number, "comments");
        let comments: Vec<CommentDto> = self.get_all("list_pr_comments", &route, None).await?;

        Ok(comments
            .into_iter()
            .map(|c| Comment {
                author: c.user.map(|u| u.login).unwrap_or_default(),
                body: c.body.unwrap_or_default(),
                updated_at: c.updated_at,
            })
            .collect())
    }

    async fn list_pr_operation_log(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<OperationLogEntry>, ScavengerError> {
        let route = issue_route(repo, number, "events");
        let events: Vec<EventDto> = self.get_all("list_pr_operation_log", &route, None).await?;

        Ok(events
            .into_iter()
            .map(|e| OperationLogEntry {
                created_at: e.created_at,
            })
            .collect())
    }

    async fn list_pr_commits(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<CommitMeta>, ScavengerError> {
        let route = format!("/repos/{}/{}/pulls/{}/commits", repo.org, repo.name, number);
        let commits: Vec<CommitDto> = self.get_all("list_pr_commits", &route, None).await?;

        Ok(commits
            .into_iter()
            .filter_map(|c| c.commit.committer.and_then(|s| s.date))
            .map(|committer_date| CommitMeta { committer_date })
            .collect())
    }

    async fn post_pr_comment(
        &self,
        repo: &RepositoryRef,
        number: u64,
        body: &str,
    ) -> Result<(), ScavengerError> {
        let route = issue_route(repo, number, "comments");
        let _: serde_json::Value = self
            .client
            .post(&route, Some(&json!({ "body": body })))
            .await
            .map_err(|e| ScavengerError::remote_write("post_pr_comment", &route, e))?;
        Ok(())
    }

    async fn close_pr(&self, repo: &RepositoryRef, number: u64) -> Result<(), ScavengerError> {
        let route = format!("/repos/{}/{}/pulls/{}", repo.org, repo.name, number);
        let _: serde_json::Value = self
            .client
            .patch(&route, Some(&json!({ "state": "closed" })))
            .await
            .map_err(|e| ScavengerError::remote_write("close_pr", &route, e))?;
        Ok(())
    }
}
