use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pr_scavenger::config::AppConfig;
use pr_scavenger::github::{GitHubClient, RepositoryHost};
use pr_scavenger::scavenger::{BotIdentity, Scanner};

/// Remind and close inactive pull requests across the configured repositories.
#[derive(Debug, Parser)]
#[command(name = "pr-scavenger", version)]
struct Cli {
    /// Path to the configuration file (YAML or TOML)
    #[arg(long)]
    config_file: PathBuf,

    /// File holding the GitHub token, overrides `github.token_path`
    #[arg(long)]
    token_path: Option<PathBuf>,

    /// Log decisions without commenting on or closing PRs
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_scavenger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("Starting PR scavenger");

    let mut config = AppConfig::load(&cli.config_file).context("Invalid configuration")?;
    if let Some(path) = cli.token_path {
        config.github.token_path = Some(path);
    }
    config.dry_run |= cli.dry_run;

    let client = GitHubClient::new(&config.github).context("Error generating client")?;
    let host: Arc<dyn RepositoryHost> = Arc::new(client);

    let login = host
        .bot_identity()
        .await
        .context("Error getting bot identity")?;
    info!("Running as {}", login);

    let bot = BotIdentity::with_aliases(login, config.bot.bot_aliases.iter().cloned());
    let scanner = Scanner::new(host, &config, bot);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    scanner.run(cancel).await;

    Ok(())
}

async fn cancel_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received interrupt, cancelling scan");
                    cancel.cancel();
                }
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received interrupt, cancelling scan"),
            _ = terminate.recv() => info!("Received SIGTERM, cancelling scan"),
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("Received interrupt, cancelling scan");
    }

    cancel.cancel();
}
