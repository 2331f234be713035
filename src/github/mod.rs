pub mod client;
pub mod host;
pub mod types;

pub use client::GitHubClient;
pub use host::RepositoryHost;
pub use types::{Comment, CommitMeta, OperationLogEntry, PullRequest, RepositoryRef};
