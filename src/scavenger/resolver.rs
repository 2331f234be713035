//! Repository resolver
//!
//! Expands configured repository tokens into a deduplicated stream of
//! [`RepositoryRef`]s. The dedup and exclusion sets live inside the resolver
//! and are only touched by the single producer task that owns it.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::github::{RepositoryHost, RepositoryRef};

pub struct RepoResolver {
    emitted: HashSet<String>,
    blocked: HashSet<String>,
}

impl RepoResolver {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emitted: HashSet::new(),
            blocked: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true the first time a non-excluded canonical name is seen.
    pub fn admit(&mut self, repo: &RepositoryRef) -> bool {
        let name = repo.full_name();
        if self.blocked.contains(&name) || self.emitted.contains(&name) {
            return false;
        }
        self.emitted.insert(name)
    }

    /// Resolve `tokens` onto `out`, returning the number of repositories sent.
    /// The channel closes when this returns, whether or not the run was cancelled.
    pub async fn run(
        mut self,
        host: Arc<dyn RepositoryHost>,
        tokens: Vec<String>,
        out: mpsc::Sender<RepositoryRef>,
        cancel: CancellationToken,
    ) -> usize {
        let mut sent = 0;

        for token in tokens {
            if cancel.is_cancelled() {
                info!("Cancellation observed, stop resolving repositories");
                break;
            }

            let candidates = if token.contains('/') {
                match token.parse::<RepositoryRef>() {
                    Ok(repo) => vec![repo],
                    Err(e) => {
                        warn!("Skipping repository token {}: {}", token, e);
                        continue;
                    }
                }
            } else {
                info!("Loading all repositories of {}", token);
                match host.list_org_repositories(&token).await {
                    Ok(repos) => repos,
                    Err(e) => {
                        error!("Failed to list repositories of {}: {}", token, e);
                        continue;
                    }
                }
            };

            for repo in candidates {
                if !self.admit(&repo) {
                    continue;
                }
                if cancel.is_cancelled() {
                    info!("Cancellation observed, stop resolving repositories");
                    return sent;
                }
                if out.send(repo).await.is_err() {
                    warn!("Repository channel closed, stop resolving");
                    return sent;
                }
                sent += 1;
            }
        }

        sent
    }
}
