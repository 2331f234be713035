//! Staleness decision engine
//!
//! One [`PrTask`] evaluates one open pull request: it gathers the activity
//! signals, derives the last-active time and applies the remind/close policy.
//! Nothing is stored between runs. Earlier reminders are rediscovered from the
//! bot's own comments through the reminder prefix.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::BotConfig;
use crate::github::{Comment, PullRequest, RepositoryHost, RepositoryRef};
use crate::scavenger::clock::Clock;
use crate::scavenger::report::RunReport;
use crate::scavenger::templates;

const HOURS_PER_DAY: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    NoAction,
    Remind {
        days_inactive: i64,
        days_until_close: i64,
    },
    Close {
        days_inactive: i64,
    },
}

/// The two inactivity thresholds, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    pub merge_remind_intervals: i64,
    pub maximum_open_time: i64,
}

impl From<&BotConfig> for StalenessPolicy {
    fn from(config: &BotConfig) -> Self {
        Self {
            merge_remind_intervals: config.merge_remind_intervals,
            maximum_open_time: config.maximum_open_time,
        }
    }
}

/// Logins whose comments are treated as the bot's own.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    logins: HashSet<String>,
}

impl BotIdentity {
    pub fn new(login: impl Into<String>) -> Self {
        Self::with_aliases(login, std::iter::empty::<String>())
    }

    pub fn with_aliases<I, S>(login: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut logins: HashSet<String> = aliases.into_iter().map(Into::into).collect();
        logins.insert(login.into());
        Self { logins }
    }

    pub fn is_bot(&self, login: &str) -> bool {
        self.logins.contains(login)
    }
}

/// Whole days between `from` and `now`, truncated.
pub fn days_since(from: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - from).num_hours() / HOURS_PER_DAY
}

/// Split comments into (bot, others), each ordered most recent first. Comments
/// with equal timestamps end up in reverse of their listed order.
pub fn partition_comments(
    comments: Vec<Comment>,
    bot: &BotIdentity,
) -> (Vec<Comment>, Vec<Comment>) {
    let (mut bot_comments, mut other_comments): (Vec<_>, Vec<_>) =
        comments.into_iter().partition(|c| bot.is_bot(&c.author));

    for list in [&mut bot_comments, &mut other_comments] {
        list.reverse();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }

    (bot_comments, other_comments)
}

/// Latest of the creation time and whichever activity signals are available.
pub fn last_active_time(
    created_at: DateTime<Utc>,
    latest_comment: Option<DateTime<Utc>>,
    latest_operation: Option<DateTime<Utc>>,
    latest_commit: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    [latest_comment, latest_operation, latest_commit]
        .into_iter()
        .flatten()
        .fold(created_at, |acc, t| acc.max(t))
}

/// Apply the policy to a last-active time. `bot_comments` must be ordered most
/// recent first.
pub fn decide(
    policy: &StalenessPolicy,
    last_active: DateTime<Utc>,
    bot_comments: &[Comment],
    now: DateTime<Utc>,
) -> Decision {
    let days_inactive = days_since(last_active, now);

    if days_inactive > policy.maximum_open_time {
        return Decision::Close { days_inactive };
    }

    if days_inactive < policy.merge_remind_intervals {
        return Decision::NoAction;
    }

    let days_until_close = policy.maximum_open_time - days_inactive;

    // After an earlier reminder, the reported inactivity counts from that reminder.
    match bot_comments
        .iter()
        .find(|c| templates::is_merge_reminder(&c.body))
    {
        None => Decision::Remind {
            days_inactive,
            days_until_close,
        },
        Some(prior) => {
            let since_reminder = days_since(prior.updated_at, now);
            if since_reminder > policy.merge_remind_intervals {
                Decision::Remind {
                    days_inactive: since_reminder,
                    days_until_close,
                }
            } else {
                Decision::NoAction
            }
        }
    }
}

/// State shared by every PR task of a run.
pub struct EngineContext {
    pub host: Arc<dyn RepositoryHost>,
    pub clock: Arc<dyn Clock>,
    pub policy: StalenessPolicy,
    pub bot: BotIdentity,
    pub dry_run: bool,
    pub report: Arc<RunReport>,
}

pub struct PrTask {
    ctx: Arc<EngineContext>,
    repo: RepositoryRef,
    pr: PullRequest,
}

impl PrTask {
    pub fn new(ctx: Arc<EngineContext>, repo: RepositoryRef, pr: PullRequest) -> Self {
        Self { ctx, repo, pr }
    }

    /// Evaluate the PR and perform the resulting action. Returns `None` when the
    /// comments could not be read and nothing was done.
    pub async fn exec(self) -> Option<Decision> {
        let comments = match self
            .ctx
            .host
            .list_pr_comments(&self.repo, self.pr.number)
            .await
        {
            Ok(comments) => comments,
            Err(e) => {
                error!("{}#{}: skip evaluation: {}", self.repo, self.pr.number, e);
                self.ctx.report.evaluation_aborted();
                return None;
            }
        };

        let (bot_comments, other_comments) = partition_comments(comments, &self.ctx.bot);

        let last_active = last_active_time(
            self.pr.created_at,
            other_comments.first().map(|c| c.updated_at),
            self.latest_operation_time().await,
            self.latest_commit_time().await,
        );

        let now = self.ctx.clock.now();
        let decision = decide(&self.ctx.policy, last_active, &bot_comments, now);
        self.ctx.report.pr_evaluated();

        info!(
            repo = %self.repo,
            pr = self.pr.number,
            last_active = %last_active.to_rfc3339(),
            decision = ?decision,
            "PR evaluated"
        );

        match decision {
            Decision::Close { .. } => self.close().await,
            Decision::Remind {
                days_inactive,
                days_until_close,
            } => self.remind(days_inactive, days_until_close).await,
            Decision::NoAction => {
                if days_since(last_active, now) >= self.ctx.policy.merge_remind_intervals {
                    debug!("{}#{}: reminder cooldown active", self.repo, self.pr.number);
                    self.ctx.report.reminder_suppressed();
                }
            }
        }

        Some(decision)
    }

    async fn latest_operation_time(&self) -> Option<DateTime<Utc>> {
        match self
            .ctx
            .host
            .list_pr_operation_log(&self.repo, self.pr.number)
            .await
        {
            Ok(entries) => entries.iter().map(|e| e.created_at).max(),
            Err(e) => {
                warn!("{}#{}: operation log omitted: {}", self.repo, self.pr.number, e);
                None
            }
        }
    }

    async fn latest_commit_time(&self) -> Option<DateTime<Utc>> {
        match self
            .ctx
            .host
            .list_pr_commits(&self.repo, self.pr.number)
            .await
        {
            Ok(commits) => commits.iter().map(|c| c.committer_date).max(),
            Err(e) => {
                warn!("{}#{}: commit times omitted: {}", self.repo, self.pr.number, e);
                None
            }
        }
    }

    async fn close(&self) {
        let body = templates::closure_notice(&self.pr.author, self.ctx.policy.maximum_open_time);

        if self.ctx.dry_run {
            info!("[dry-run] would close {}#{}", self.repo, self.pr.number);
            return;
        }

        // The notice and the close are independent: one failing does not undo the other.
        if let Err(e) = self
            .ctx
            .host
            .post_pr_comment(&self.repo, self.pr.number, &body)
            .await
        {
            error!("{}", e);
            self.ctx.report.write_failed();
        }

        match self.ctx.host.close_pr(&self.repo, self.pr.number).await {
            Ok(()) => {
                info!("Closed {}#{}", self.repo, self.pr.number);
                self.ctx.report.pr_closed();
            }
            Err(e) => {
                error!("{}", e);
                self.ctx.report.write_failed();
            }
        }
    }

    async fn remind(&self, days_inactive: i64, days_until_close: i64) {
        let body = templates::merge_reminder(days_inactive, days_until_close);

        if self.ctx.dry_run {
            info!("[dry-run] would remind {}#{}", self.repo, self.pr.number);
            return;
        }

        match self
            .ctx
            .host
            .post_pr_comment(&self.repo, self.pr.number, &body)
            .await
        {
            Ok(()) => self.ctx.report.reminder_posted(),
            Err(e) => {
                error!("{}", e);
                self.ctx.report.write_failed();
            }
        }
    }
}
