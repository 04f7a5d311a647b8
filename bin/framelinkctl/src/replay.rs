//! ---
//! fl_section: "05-networking-external-interfaces"
//! fl_subsection: "binary"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Operator CLI for captured frame/host traffic."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use framelink_common::config::BridgeConfig;
use framelink_common::logging::{self, LogStream};
use framelink_msg::{
    replay_from_file, InMemoryTransport, InboundMessageType, MessageService,
    MessagingMetricsExporter, ReplaySummary,
};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::{debug, info};

const DEFAULT_CONFIG: &str = "configs/framelink.toml";

/// Options for `framelinkctl replay`.
#[derive(Debug, Args)]
pub struct ReplayOptions {
    /// NDJSON capture of inbound host messages.
    #[arg(value_name = "FILE")]
    pub capture: PathBuf,
    /// Path to the configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
    /// Print the Prometheus exposition after the summary.
    #[arg(long)]
    pub metrics: bool,
}

pub fn run(options: ReplayOptions) -> Result<()> {
    let mut config = load_config(options.config.as_deref())?;
    // stdout carries the summary.
    config.logging.stream = LogStream::Stderr;
    logging::init_tracing("framelinkctl", &config.logging)?;

    let transport = Arc::new(InMemoryTransport::new());
    let service = MessageService::with_config(transport, config.messaging.clone());
    let registry = Registry::new();
    if options.metrics {
        service.attach_metrics(MessagingMetricsExporter::register(&registry)?);
    }
    for kind in InboundMessageType::ALL {
        service.on(kind, move |message| {
            info!(
                kind = kind.as_str(),
                request_id = message.request_id().map(|id| id.as_str()).unwrap_or(""),
                "audited inbound message"
            );
        });
    }

    let summary = replay_from_file(&service, &options.capture)
        .with_context(|| format!("failed to replay {}", options.capture.display()))?;
    render_summary(&summary, options.json)?;

    if options.metrics {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        print!("{}", String::from_utf8_lossy(&buffer));
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    if let Some(path) = path {
        return BridgeConfig::from_path(path);
    }
    match BridgeConfig::load_with_source(&[DEFAULT_CONFIG]) {
        Ok(loaded) => {
            debug!(source = %loaded.source.display(), "configuration loaded");
            Ok(loaded.config)
        }
        Err(err) if std::env::var_os(BridgeConfig::ENV_CONFIG_PATH).is_none() => {
            debug!(error = %err, "no configuration file; using defaults");
            Ok(BridgeConfig::default())
        }
        Err(err) => Err(err),
    }
}

fn render_summary(summary: &ReplaySummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }
    println!(
        "Records: {}\nDelivered: {}\nDiscarded: {}\nResolved: {}",
        summary.records, summary.delivered, summary.discarded, summary.resolved
    );
    for (kind, count) in &summary.by_kind {
        println!("  {kind}: {count}");
    }
    Ok(())
}
