mod cli;
mod reporting;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rf_ingest_core::{
    load_config, validate_config, BatchJarHooks, Config, DispatchMode, EmrClusterApi,
    IngestOrchestrator, IngestRequest, ObjectBlobStore, SanitizedConfig, SparkLocalExecutor,
    SqliteSceneRepository,
};

use cli::{Cli, Command, IngestSceneArgs, LogFormat};
use reporting::RollbarReporter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    validate_config(&config).context("Configuration validation failed")?;
    info!(
        config = %serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default(),
        "Configuration loaded"
    );

    let reporter = RollbarReporter::from_config(&config.reporting);

    match cli.command {
        Command::IngestScene(args) => {
            let result = ingest_scene(&config, &args).await;
            if let (Err(e), Some(reporter)) = (&result, &reporter) {
                if let Err(report_err) = reporter
                    .report(&format!("{:#}", e), Some(&args.scene_id))
                    .await
                {
                    warn!(error = %report_err, "Failed to report error to Rollbar");
                }
            }
            result
        }
    }
}

async fn ingest_scene(config: &Config, args: &IngestSceneArgs) -> Result<()> {
    let scenes = Arc::new(
        SqliteSceneRepository::new(&config.database.path)
            .context("Failed to open scene database")?,
    );
    let blobs =
        Arc::new(ObjectBlobStore::from_config(&config.storage).context("Failed to create blob store")?);
    let local = Arc::new(SparkLocalExecutor::new(
        config.local.clone(),
        config.batch.clone(),
    ));
    let cluster = Arc::new(EmrClusterApi::new(config.cluster.clone()).await);
    let hooks = Arc::new(BatchJarHooks::new(config.batch.clone()));

    let orchestrator =
        IngestOrchestrator::from_config(config, scenes, blobs, local, cluster, hooks);

    let mode = if args.local {
        DispatchMode::Local
    } else {
        DispatchMode::Managed
    };
    let request =
        IngestRequest::new(&args.scene_id, mode).ignore_previous(args.ignore_previous);

    info!(scene_id = %args.scene_id, mode = ?mode, "Ingesting scene");
    let outcome = orchestrator
        .run(&request)
        .await
        .with_context(|| format!("Failed to ingest scene {}", args.scene_id))?;

    info!(
        scene_id = %outcome.scene_id,
        definition_id = %outcome.definition_id,
        ingest_location = %outcome.ingest_location,
        "Scene ingested"
    );
    Ok(())
}
