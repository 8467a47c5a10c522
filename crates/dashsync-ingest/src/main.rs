//! Dashsync Ingest - ETL runner for platform integrations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dashsync_common::logging::{init_logging, LogConfig, LogLevel};
use dashsync_common::types::TenantId;
use dashsync_ingest::config::{IngestConfig, StoreKind};
use dashsync_ingest::loader::connect_store;
use dashsync_ingest::sources::{SourceKind, SourceRegistry};
use dashsync_ingest::trigger::{Dispatcher, SyncRequest};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "dashsync-ingest")]
#[command(author, version, about = "Dashsync ETL runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run ETL for one or more sources
    Run {
        /// Source to run (repeatable)
        #[arg(short, long = "source", conflicts_with_all = ["all", "request"])]
        sources: Vec<SourceKind>,

        /// Run every implemented source
        #[arg(long, conflicts_with = "request")]
        all: bool,

        /// Tenant to sync (defaults to DASHSYNC_TENANT_ID)
        #[arg(short, long)]
        tenant: Option<TenantId>,

        /// JSON sync request file, `-` for stdin
        #[arg(long)]
        request: Option<PathBuf>,

        /// Load into an in-memory store instead of the configured one
        #[arg(long, conflicts_with = "store")]
        dry_run: bool,

        /// Destination store (overrides DASHSYNC_STORE)
        #[arg(long)]
        store: Option<StoreKind>,
    },

    /// List sources with their capability and tables
    Sources,
}

#[derive(Serialize)]
struct SourceInfo {
    source: SourceKind,
    capability: dashsync_ingest::sources::Capability,
    credential_env: String,
    configured: bool,
    tables: Vec<dashsync_ingest::normalize::TableSpec>,
}

fn read_request(path: &Path) -> Result<SyncRequest> {
    if path.as_os_str() == "-" {
        return Ok(SyncRequest::from_reader(std::io::stdin().lock())?);
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open request file {}", path.display()))?;
    Ok(SyncRequest::from_reader(std::io::BufReader::new(file))?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("dashsync-ingest")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let mut config = IngestConfig::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Sources => {
            let registry = SourceRegistry::from_config(&config)?;
            let sources: Vec<SourceInfo> = registry
                .all()
                .map(|connector| SourceInfo {
                    source: connector.kind(),
                    capability: connector.capability(),
                    credential_env: connector.kind().credential_env_var(),
                    configured: config.credentials.contains(connector.kind()),
                    tables: connector.tables(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&sources)?);
        },
        Command::Run {
            sources,
            all,
            tenant,
            request,
            dry_run,
            store,
        } => {
            let mut request = match request {
                Some(path) => read_request(&path)?,
                None => {
                    if sources.is_empty() && !all {
                        anyhow::bail!("Nothing to run: pass --source, --all or --request");
                    }
                    SyncRequest::new(None, sources)
                },
            };
            if tenant.is_some() {
                request.tenant_id = tenant;
            }

            if dry_run {
                config.store.kind = StoreKind::Memory;
            } else if let Some(kind) = store {
                config.store.kind = kind;
                config.validate()?;
            }

            let store = connect_store(&config.store).await?;
            let dispatcher = Dispatcher::new(
                SourceRegistry::from_config(&config)?,
                config.credentials.clone(),
                store,
            )
            .with_default_tenant(config.tenant_id);

            let reports = dispatcher.dispatch(&request).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);

            let failed = reports.iter().filter(|r| r.is_failed()).count();
            if failed > 0 {
                error!(failed, total = reports.len(), "Some runs failed");
                anyhow::bail!("{} of {} runs failed", failed, reports.len());
            }
            info!(runs = reports.len(), "All runs finished");
        },
    }

    Ok(())
}
