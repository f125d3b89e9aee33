use anyhow::Result;
use clap::Parser;
use gmail_vacation_responder::cli::{Cli, Commands};
use gmail_vacation_responder::config::Config;
use gmail_vacation_responder::error::ResponderError;
use gmail_vacation_responder::{auth, GmailMailService, ReplyEngine, Scheduler};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Install default crypto provider for rustls
    // This is necessary because multiple dependencies use different crypto providers
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command() {
        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                return Err(ResponderError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(&output).await?;
            println!("Created example configuration file at: {:?}", output);
            Ok(())
        }

        command => {
            let config = Config::load(&cli.config).await?;

            let hub = match auth::authorize(&cli.credentials, &cli.token).await {
                Ok(hub) => hub,
                Err(e) => {
                    tracing::error!("Error authorizing: {}", e);
                    return Err(e.into());
                }
            };

            let service = GmailMailService::new(hub, config.client.request_timeout());
            let engine = Arc::new(ReplyEngine::new(service, config.responder.clone()));

            if command == Commands::Once {
                let report = engine.run_tick().await;
                println!(
                    "Tick {}: {} unread, {} replied, {} skipped, {} failed",
                    report.tick_id,
                    report.unread_seen,
                    report.replies_sent,
                    report.skipped,
                    report.failed
                );
                return Ok(());
            }

            tracing::info!(
                "Polling every {}-{}s ({:?}, serialize_ticks = {})",
                config.schedule.min_interval_secs,
                config.schedule.max_interval_secs,
                config.schedule.interval_mode,
                config.schedule.serialize_ticks
            );
            Scheduler::new(engine, &config.schedule).run().await;
            Ok(())
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_vacation_responder=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_vacation_responder=info,warn"))
    };

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
