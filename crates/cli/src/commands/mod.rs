use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use triage_client::{
    ApiClient, ClientConfig, ClientError, ErrorKind, FileTokenStore, MemoryTokenStore, TokenStore,
};
use triage_importer::PollerConfig;

use crate::app::{Cli, Command};
use crate::session::CliSessionHandler;

mod analysis;
mod assignees;
mod imports;
mod system;

/// Everything a command needs, built once per invocation.
pub struct Context {
    pub client: ApiClient,
    pub config: ClientConfig,
    pub poller: PollerConfig,
}

impl Context {
    fn from_env(base_url: Option<&str>) -> anyhow::Result<Self> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = base_url {
            config = config.with_base_url(url);
        }
        let poller = PollerConfig::from_env()?;

        let tokens: Arc<dyn TokenStore> = match &config.token_file {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => {
                tracing::warn!("No home directory found, the auth token will not be persisted");
                Arc::new(MemoryTokenStore::new())
            }
        };

        let client = ApiClient::new(&config, tokens, Arc::new(CliSessionHandler))?;
        tracing::debug!(base_url = %client.base_url(), "API client ready");

        Ok(Self {
            client,
            config,
            poller,
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::from_env(cli.base_url.as_deref())?;

    match cli.command {
        Command::Login { token } => {
            ctx.client.login(&token)?;
            println!("Token stored.");
            Ok(())
        }
        Command::Logout => {
            ctx.client.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Dashboard { days } => analysis::dashboard(&ctx, days).await,
        Command::Workload { days } => analysis::workload(&ctx, days).await,
        Command::Ranking {
            rank_by,
            limit,
            days,
        } => analysis::ranking(&ctx, &rank_by, limit, days).await,
        Command::Bottlenecks { days } => analysis::bottlenecks(&ctx, days).await,
        Command::Trend { range, group_by } => analysis::trend(&ctx, &range, group_by).await,
        Command::AssigneeMetrics { id, range } => analysis::assignee_metrics(&ctx, id, &range).await,
        Command::AiAnalysis { range } => analysis::ai_analysis(&ctx, &range).await,
        Command::Compare(args) => analysis::compare(&ctx, &args).await,
        Command::Export {
            compare,
            format,
            output,
        } => analysis::export(&ctx, &compare, format, output).await,
        Command::Import {
            file,
            import_type,
            yes,
            no_wait,
        } => imports::import(&ctx, &file, import_type, yes, no_wait).await,
        Command::Logs { page, size } => imports::logs(&ctx, page, size).await,
        Command::Status { id } => imports::status(&ctx, id).await,
        Command::Retry { id, wait } => imports::retry(&ctx, id, wait).await,
        Command::Delete { id, delete_data } => imports::delete(&ctx, id, delete_data).await,
        Command::Template {
            template_type,
            format,
            output,
        } => imports::template(&ctx, template_type, format, output).await,
        Command::Stats { days } => imports::stats(&ctx, days).await,
        Command::Assignees { command } => assignees::run(&ctx, command).await,
        Command::Filters { command } => system::filters(&ctx, command).await,
        Command::Health => system::health(&ctx).await,
        Command::Info => system::info(&ctx).await,
        Command::Watch => system::watch(&ctx).await,
    }
}

/// One-line failure notice, with a hint when the cause is a backend call.
pub fn describe_error(err: &anyhow::Error) -> String {
    let hint = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ClientError>())
        .and_then(|e| match e.kind() {
            ErrorKind::Server => Some("the backend failed to handle the request; try again shortly"),
            ErrorKind::Transport => {
                Some("check that the backend is reachable (TRIAGE_API_BASE_URL)")
            }
            ErrorKind::Authentication | ErrorKind::Rejected | ErrorKind::Local => None,
        });

    match hint {
        Some(hint) => format!("Error: {err:#} ({hint})"),
        None => format!("Error: {err:#}"),
    }
}

async fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
