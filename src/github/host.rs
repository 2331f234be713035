use async_trait::async_trait;

use crate::error::ScavengerError;
use crate::github::types::{Comment, CommitMeta, OperationLogEntry, PullRequest, RepositoryRef};

/// Remote repository hosting capabilities the scanner depends on.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Login of the account the bot posts as.
    async fn bot_identity(&self) -> Result<String, ScavengerError>;

    async fn list_org_repositories(&self, org: &str)
        -> Result<Vec<RepositoryRef>, ScavengerError>;

    async fn list_open_pull_requests(
        &self,
        repo: &RepositoryRef,
    ) -> Result<Vec<PullRequest>, ScavengerError>;

    async fn list_pr_comments(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<Comment>, ScavengerError>;

    async fn list_pr_operation_log(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<OperationLogEntry>, ScavengerError>;

    async fn list_pr_commits(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<CommitMeta>, ScavengerError>;

    async fn post_pr_comment(
        &self,
        repo: &RepositoryRef,
        number: u64,
        body: &str,
    ) -> Result<(), ScavengerError>;

    async fn close_pr(&self, repo: &RepositoryRef, number: u64) -> Result<(), ScavengerError>;
}
