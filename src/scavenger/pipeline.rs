//! Scan pipeline
//!
//! A single resolver task feeds repository names into a bounded channel that a
//! fixed set of repository workers drains. Each worker lists the open PRs of a
//! repository and submits one [`PrTask`] per PR into the [`TaskPool`]. The
//! resolver, the workers and every submitted task are tracked by one
//! [`TaskTracker`]; [`Scanner::run`] returns once all of them are done.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::error::ScavengerError;
use crate::github::{RepositoryHost, RepositoryRef};
use crate::scavenger::clock::{Clock, SystemClock};
use crate::scavenger::engine::{BotIdentity, EngineContext, PrTask, StalenessPolicy};
use crate::scavenger::pool::TaskPool;
use crate::scavenger::report::{RunReport, RunSummary};
use crate::scavenger::resolver::RepoResolver;

type RepoReceiver = Arc<Mutex<mpsc::Receiver<RepositoryRef>>>;

pub struct Scanner {
    host: Arc<dyn RepositoryHost>,
    clock: Arc<dyn Clock>,
    policy: StalenessPolicy,
    bot: BotIdentity,
    repos: Vec<String>,
    excluded_repos: Vec<String>,
    concurrent_size: usize,
    dry_run: bool,
}

impl Scanner {
    pub fn new(host: Arc<dyn RepositoryHost>, config: &AppConfig, bot: BotIdentity) -> Self {
        Self {
            host,
            clock: Arc::new(SystemClock),
            policy: StalenessPolicy::from(&config.bot),
            bot,
            repos: config.bot.repos.clone(),
            excluded_repos: config.bot.excluded_repos.clone(),
            concurrent_size: config.bot.concurrent_size,
            dry_run: config.dry_run,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Capacity of the repository channel, which is also the number of
    /// repository workers.
    pub fn channel_capacity(&self) -> usize {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        parallelism.max(self.repos.len()).max(1)
    }

    /// Scan every configured repository once. Cancelling `cancel` stops new
    /// repositories and PRs from being started; submitted tasks still finish.
    pub async fn run(&self, cancel: CancellationToken) -> RunSummary {
        let report = Arc::new(RunReport::default());
        let ctx = Arc::new(EngineContext {
            host: Arc::clone(&self.host),
            clock: Arc::clone(&self.clock),
            policy: self.policy,
            bot: self.bot.clone(),
            dry_run: self.dry_run,
            report: Arc::clone(&report),
        });

        let tracker = TaskTracker::new();
        let pool = TaskPool::new(self.concurrent_size, tracker.clone());
        let capacity = self.channel_capacity();
        let (tx, rx) = mpsc::channel(capacity);
        let rx: RepoReceiver = Arc::new(Mutex::new(rx));

        info!(
            "Starting scan: {} tokens, {} repository workers, {} concurrent PR tasks",
            self.repos.len(),
            capacity,
            pool.size()
        );

        let resolver = RepoResolver::new(self.excluded_repos.iter().cloned());
        let host = Arc::clone(&self.host);
        let tokens = self.repos.clone();
        let resolver_cancel = cancel.clone();
        tracker.spawn(async move {
            let sent = resolver.run(host, tokens, tx, resolver_cancel).await;
            debug!("Resolver finished after sending {} repositories", sent);
        });

        for worker in 0..capacity {
            tracker.spawn(repo_worker(
                worker,
                Arc::clone(&rx),
                pool.clone(),
                Arc::clone(&ctx),
                cancel.clone(),
            ));
        }

        // Close PR admission as soon as cancellation fires so submitters parked
        // on a full pool stop waiting for permits.
        let admission = {
            let pool = pool.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                cancel.cancelled().await;
                pool.shutdown();
            })
        };

        tracker.close();
        tracker.wait().await;
        admission.abort();

        if cancel.is_cancelled() {
            info!("Scan stopped early after cancellation");
        }

        let summary = report.summary();
        info!(
            repos_scanned = summary.repos_scanned,
            repos_failed = summary.repos_failed,
            tasks_submitted = summary.tasks_submitted,
            prs_evaluated = summary.prs_evaluated,
            reminders_posted = summary.reminders_posted,
            prs_closed = summary.prs_closed,
            reminders_suppressed = summary.reminders_suppressed,
            evaluations_aborted = summary.evaluations_aborted,
            write_failures = summary.write_failures,
            "Scan finished"
        );
        summary
    }
}

async fn repo_worker(
    worker: usize,
    rx: RepoReceiver,
    pool: TaskPool,
    ctx: Arc<EngineContext>,
    cancel: CancellationToken,
) {
    loop {
        let next = rx.lock().await.recv().await;
        let Some(repo) = next else {
            break;
        };

        // Keep draining after cancellation so the resolver never blocks on a full channel.
        if cancel.is_cancelled() {
            continue;
        }

        if let Err(e) = submit_repo(&repo, &pool, &ctx, &cancel).await {
            error!("Worker {}: failed to scan {}: {}", worker, repo, e);
            ctx.report.repo_failed();
        }
    }

    debug!("Repository worker {} exiting", worker);
}

async fn submit_repo(
    repo: &RepositoryRef,
    pool: &TaskPool,
    ctx: &Arc<EngineContext>,
    cancel: &CancellationToken,
) -> Result<(), ScavengerError> {
    let prs = ctx.host.list_open_pull_requests(repo).await?;
    ctx.report.repo_scanned();
    debug!("{} has {} open PRs", repo, prs.len());

    for pr in prs {
        if cancel.is_cancelled() {
            info!("Cancellation observed, stop submitting PRs of {}", repo);
            break;
        }

        let number = pr.number;
        let task = PrTask::new(Arc::clone(ctx), repo.clone(), pr);
        match pool
            .submit(async move {
                task.exec().await;
            })
            .await
        {
            Ok(()) => ctx.report.task_submitted(),
            Err(ScavengerError::PoolClosed) if cancel.is_cancelled() => {
                info!("PR admission closed, stop submitting PRs of {}", repo);
                break;
            }
            Err(e) => error!("Failed to submit {}#{}: {}", repo, number, e),
        }
    }

    Ok(())
}
