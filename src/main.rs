use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use streamsim::{config, engine, Config};
use streamsim_transport::KafkaTransport;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Synthetic load generator for streaming ingestion endpoints.
#[derive(Parser, Debug)]
#[command(name = "streamsim", version, about)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "streamsim.yaml")]
    config: PathBuf,

    /// Target rate in messages/second
    #[arg(long, env = "STREAMSIM_RATE")]
    rate: Option<u64>,

    /// Run duration in seconds (0 = run until Ctrl-C)
    #[arg(long, env = "STREAMSIM_DURATION")]
    duration: Option<u64>,

    /// Target message size in bytes
    #[arg(long, env = "STREAMSIM_MSG_SIZE")]
    msg_size: Option<usize>,

    /// Symbol set: comma-separated list, a file with one symbol per line,
    /// or a single symbol
    #[arg(long, env = "STREAMSIM_SYMBOLS")]
    symbols: Option<String>,

    /// Kafka bootstrap servers
    #[arg(long)]
    brokers: Option<String>,

    /// Destination topic
    #[arg(long)]
    topic: Option<String>,
}

impl Cli {
    /// Overlay CLI arguments on the resolved configuration.
    fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(rate) = self.rate {
            config.simulator.target_rate = rate;
        }
        if let Some(duration) = self.duration {
            config.simulator.duration_secs = duration;
        }
        if let Some(msg_size) = self.msg_size {
            config.message.message_size_bytes = msg_size;
        }
        if let Some(symbols) = &self.symbols {
            config.message.symbols =
                config::load_symbols(symbols).context("failed to load symbol set")?;
        }
        if let Some(brokers) = &self.brokers {
            config.endpoint.brokers = brokers.clone();
        }
        if let Some(topic) = &self.topic {
            config.endpoint.topic = topic.clone();
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::resolve(&cli.config).context("failed to resolve configuration")?;
    cli.apply(&mut config)?;

    let transport = KafkaTransport::new(&config.endpoint.brokers, &config.endpoint.topic)
        .context("failed to create Kafka transport")?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            signal_cancel.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("second interrupt, exiting immediately");
            std::process::exit(130);
        }
    });

    let summary = engine::run(&config, Arc::new(transport), cancel).await?;

    info!(
        sent = summary.sent,
        average_rate = format_args!("{:.0}", summary.average_rate()),
        "done"
    );
    Ok(())
}
