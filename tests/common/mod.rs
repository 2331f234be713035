#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use pr_scavenger::config::{AppConfig, BotConfig, GitHubConfig};
use pr_scavenger::github::{
    Comment, CommitMeta, OperationLogEntry, PullRequest, RepositoryHost, RepositoryRef,
};
use pr_scavenger::ScavengerError;

pub const BOT_LOGIN: &str = "scavenger-bot";

/// Fixed "now" shared by every test.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    test_now() - Duration::days(days)
}

pub fn create_test_config(repos: &[&str], excluded: &[&str], concurrent_size: usize) -> AppConfig {
    AppConfig {
        github: GitHubConfig::default(),
        bot: BotConfig {
            repos: repos.iter().map(|s| s.to_string()).collect(),
            excluded_repos: excluded.iter().map(|s| s.to_string()).collect(),
            merge_remind_intervals: 7,
            maximum_open_time: 30,
            concurrent_size,
            bot_aliases: vec![],
        },
        dry_run: false,
    }
}

pub fn create_test_pull_request(number: u64, author: &str, created_days_ago: i64) -> PullRequest {
    PullRequest {
        number,
        author: author.to_string(),
        created_at: days_ago(created_days_ago),
        state: "open".to_string(),
    }
}

pub fn comment(author: &str, body: &str, at: DateTime<Utc>) -> Comment {
    Comment {
        author: author.to_string(),
        body: body.to_string(),
        updated_at: at,
    }
}

#[derive(Default)]
struct MockState {
    org_repos: HashMap<String, Vec<RepositoryRef>>,
    pulls: HashMap<String, Vec<PullRequest>>,
    comments: HashMap<(String, u64), Vec<Comment>>,
    operation_logs: HashMap<(String, u64), Vec<OperationLogEntry>>,
    commits: HashMap<(String, u64), Vec<CommitMeta>>,
    failing: HashSet<String>,
    posted: Vec<(String, u64, String)>,
    closed: Vec<(String, u64)>,
    listed_repos: Vec<String>,
}

/// In-memory [`RepositoryHost`]. Posted comments are appended to the PR's
/// comment list as bot comments stamped with [`test_now`], so a second scan
/// sees the first scan's effects.
#[derive(Default)]
pub struct MockHost {
    state: Mutex<MockState>,
    comment_delay_ms: u64,
    list_delay_ms: u64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    cancel_on_list: Mutex<Option<CancellationToken>>,
    observed_cancel: Mutex<Option<CancellationToken>>,
    listed_after_cancel: AtomicUsize,
}

fn key(repo: &RepositoryRef, number: u64) -> (String, u64) {
    (repo.full_name(), number)
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make comment reads take `ms` milliseconds so PR tasks overlap.
    pub fn with_comment_delay(mut self, ms: u64) -> Self {
        self.comment_delay_ms = ms;
        self
    }

    /// Make PR listings take `ms` milliseconds after being recorded.
    pub fn with_list_delay(mut self, ms: u64) -> Self {
        self.list_delay_ms = ms;
        self
    }

    pub fn add_org(&self, org: &str, names: &[&str]) {
        let repos = names.iter().map(|n| RepositoryRef::new(org, *n)).collect();
        self.state.lock().unwrap().org_repos.insert(org.to_string(), repos);
    }

    pub fn add_pull(&self, repo: &str, pr: PullRequest) {
        self.state
            .lock()
            .unwrap()
            .pulls
            .entry(repo.to_string())
            .or_default()
            .push(pr);
    }

    pub fn add_comment(&self, repo: &str, number: u64, comment: Comment) {
        self.state
            .lock()
            .unwrap()
            .comments
            .entry((repo.to_string(), number))
            .or_default()
            .push(comment);
    }

    pub fn add_operation(&self, repo: &str, number: u64, at: DateTime<Utc>) {
        self.state
            .lock()
            .unwrap()
            .operation_logs
            .entry((repo.to_string(), number))
            .or_default()
            .push(OperationLogEntry { created_at: at });
    }

    pub fn add_commit(&self, repo: &str, number: u64, at: DateTime<Utc>) {
        self.state
            .lock()
            .unwrap()
            .commits
            .entry((repo.to_string(), number))
            .or_default()
            .push(CommitMeta { committer_date: at });
    }

    /// Make an operation fail. `op` is the trait method name, `target` the org,
    /// repository full name, or `org/repo#number`.
    pub fn fail(&self, op: &str, target: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(format!("{}:{}", op, target));
    }

    /// Cancel `token` as soon as the first repository's PRs are listed.
    pub fn cancel_on_first_listing(&self, token: CancellationToken) {
        *self.cancel_on_list.lock().unwrap() = Some(token);
    }

    /// Count PR listings that start after `token` is cancelled.
    pub fn observe_cancellation(&self, token: CancellationToken) {
        *self.observed_cancel.lock().unwrap() = Some(token);
    }

    pub fn listed_after_cancel(&self) -> usize {
        self.listed_after_cancel.load(Ordering::SeqCst)
    }

    pub fn posted(&self) -> Vec<(String, u64, String)> {
        self.state.lock().unwrap().posted.clone()
    }

    pub fn closed(&self) -> Vec<(String, u64)> {
        self.state.lock().unwrap().closed.clone()
    }

    pub fn listed_repos(&self) -> Vec<String> {
        self.state.lock().unwrap().listed_repos.clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn check(&self, op: &'static str, target: &str) -> Result<(), ScavengerError> {
        if self
            .state
            .lock()
            .unwrap()
            .failing
            .contains(&format!("{}:{}", op, target))
        {
            return Err(ScavengerError::remote_read(op, target, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryHost for MockHost {
    async fn bot_identity(&self) -> Result<String, ScavengerError> {
        Ok(BOT_LOGIN.to_string())
    }

    async fn list_org_repositories(
        &self,
        org: &str,
    ) -> Result<Vec<RepositoryRef>, ScavengerError> {
        self.check("list_org_repositories", org)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .org_repos
            .get(org)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_open_pull_requests(
        &self,
        repo: &RepositoryRef,
    ) -> Result<Vec<PullRequest>, ScavengerError> {
        let name = repo.full_name();
        self.state.lock().unwrap().listed_repos.push(name.clone());

        let cancelled = self
            .observed_cancel
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|token| token.is_cancelled());
        if cancelled {
            self.listed_after_cancel.fetch_add(1, Ordering::SeqCst);
        }

        if let Some(token) = self.cancel_on_list.lock().unwrap().take() {
            token.cancel();
        }

        if self.list_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.list_delay_ms)).await;
        }

        self.check("list_open_pull_requests", &name)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .pulls
            .get(&name)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_pr_comments(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<Comment>, ScavengerError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if self.comment_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.comment_delay_ms)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.check("list_pr_comments", &format!("{}#{}", repo, number))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .comments
            .get(&key(repo, number))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_pr_operation_log(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<OperationLogEntry>, ScavengerError> {
        self.check("list_pr_operation_log", &format!("{}#{}", repo, number))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .operation_logs
            .get(&key(repo, number))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_pr_commits(
        &self,
        repo: &RepositoryRef,
        number: u64,
    ) -> Result<Vec<CommitMeta>, ScavengerError> {
        self.check("list_pr_commits", &format!("{}#{}", repo, number))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .commits
            .get(&key(repo, number))
            .cloned()
            .unwrap_or_default())
    }

    async fn post_pr_comment(
        &self,
        repo: &RepositoryRef,
        number: u64,
        body: &str,
    ) -> Result<(), ScavengerError> {
        let target = format!("{}#{}", repo, number);
        if self.check("post_pr_comment", &target).is_err() {
            return Err(ScavengerError::remote_write(
                "post_pr_comment",
                target,
                "injected failure",
            ));
        }

        let mut state = self.state.lock().unwrap();
        state
            .posted
            .push((repo.full_name(), number, body.to_string()));
        state
            .comments
            .entry(key(repo, number))
            .or_default()
            .push(comment(BOT_LOGIN, body, test_now()));
        Ok(())
    }

    async fn close_pr(&self, repo: &RepositoryRef, number: u64) -> Result<(), ScavengerError> {
        let target = format!("{}#{}", repo, number);
        if self.check("close_pr", &target).is_err() {
            return Err(ScavengerError::remote_write("close_pr", target, "injected failure"));
        }

        self.state
            .lock()
            .unwrap()
            .closed
            .push((repo.full_name(), number));
        Ok(())
    }
}
