mod config;

use anyhow::{Context, Result};
use config::{ServiceConfig, ServiceMode};
use loginsink_domain::LoginIngestService;
use loginsink_postgres::{
    PostgresClient, PostgresDeadLetterRepository, PostgresLoginRecordRepository,
};
use loginsink_runner::Runner;
use loginsink_sqs::SqsQueueClient;
use loginsink_worker::IngestWorker;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("starting loginsink");

    let mode = match config.mode() {
        Ok(mode) => mode,
        Err(e) => {
            tracing::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let worker = match build_worker(&config).await {
        Ok(worker) => worker,
        Err(e) => {
            tracing::error!("failed to initialize: {:#}", e);
            std::process::exit(1);
        }
    };

    match mode {
        ServiceMode::Drain => {
            // One batch session with a natural end; no signal plumbing.
            match worker.drain().await {
                Ok(summary) => {
                    info!(
                        persisted = summary.persisted,
                        dead_lettered = summary.dead_lettered,
                        "drain session finished"
                    );
                }
                Err(e) => {
                    tracing::error!("drain failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        ServiceMode::Continuous => {
            let code = Runner::new()
                .with_process(move |ctx| async move { worker.run(ctx).await })
                .run()
                .await;
            std::process::exit(code);
        }
    }
}

async fn build_worker(config: &ServiceConfig) -> Result<IngestWorker> {
    let postgres = PostgresClient::connect(&config.postgres())
        .context("failed to create postgres pool")?;
    postgres
        .ping()
        .await
        .context("failed to reach postgres")?;

    let queue = SqsQueueClient::connect(&config.sqs())
        .await
        .context("failed to create sqs client")?;

    let service = Arc::new(LoginIngestService::new(
        Arc::new(PostgresLoginRecordRepository::new(postgres.clone())),
        Arc::new(PostgresDeadLetterRepository::new(postgres)),
    ));

    Ok(IngestWorker::new(Arc::new(queue), service, config.worker()))
}
