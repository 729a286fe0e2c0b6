//! Domain verifier daemon
//!
//! Loads the configuration file, opens the record store, and runs the
//! verifier and rescheduler jobs until Ctrl-C.
//!
//! ```text
//! domain-verifierd --config /etc/domain-verifier/verifier.toml
//! RUST_LOG=domain_verifier_core=debug domain-verifierd -c verifier.toml --once
//! ```

mod args;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use domain_verifier_app::adapters::{LogEventPublisher, SqliteStore};
use domain_verifier_app::{AppConfig, AppState, AppStateBuilder};
use domain_verifier_probe::HickoryDnsProbe;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // 日志输出到 stderr；`log` 宏的记录也经由 tracing-log 汇入
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;
    let state = build_state(config).await?;

    if args.once {
        run_once(&state).await;
        return Ok(());
    }

    state.start_jobs().await;
    tracing::info!("Domain verifier running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Received Ctrl-C, shutting down");

    state.shutdown().await;
    Ok(())
}

async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let AppConfig {
        database_path,
        nameservers,
        verification,
    } = config;

    let probe = HickoryDnsProbe::with_nameservers(&nameservers, verification.probe_timeout);
    if nameservers.is_empty() {
        tracing::info!("DNS probe uses the system resolver configuration");
    } else {
        tracing::info!("DNS probe uses nameservers {nameservers:?}");
    }

    let mut builder = AppStateBuilder::new()
        .config(verification)
        .dns_probe(Arc::new(probe))
        .event_publisher(Arc::new(LogEventPublisher));

    match database_path {
        Some(path) => {
            let store = SqliteStore::new(&path)
                .await
                .with_context(|| format!("Failed to open record store {}", path.display()))?;
            builder = builder.domain_record_repository(Arc::new(store));
        }
        None => {
            tracing::warn!("No databasePath configured, records are kept in memory");
        }
    }

    Ok(builder.build()?)
}

async fn run_once(state: &AppState) {
    for job in [&state.jobs.rescheduler, &state.jobs.verifier] {
        match job.run_once().await {
            Some(summary) => tracing::info!(
                "{}: processed {}, succeeded {}, failed {}, activated {}",
                job.name(),
                summary.processed,
                summary.succeeded,
                summary.failed,
                summary.activated
            ),
            None => tracing::warn!("{}: previous tick still running, skipped", job.name()),
        }
    }
}
