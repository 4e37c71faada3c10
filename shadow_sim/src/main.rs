//! Shadow simulator CLI
//!
//! Parses the scenario files, bootstraps the simulated network and runs it
//! in serial or parallel mode.

mod cli;

use clap::Parser;
use cli::Args;
use shadow_core::{JsonScenarioParser, Master, RunReport};
use shadow_env::simtime_to_millis_f64;
use std::error::Error;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn print_summary(report: &RunReport, json: bool) {
    if json {
        let summary = serde_json::json!({
            "mode": report.mode,
            "windows": report.windows,
            "events": report.events_processed,
            "late_events": report.late_events,
            "end_time_ms": simtime_to_millis_f64(report.end_time),
            "packets_received": report.packets_received(),
            "nodes": report.nodes,
            "paths": report.paths,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
        return;
    }

    for node in &report.nodes {
        info!(
            "{} ({}) on network {}: sent={} received={} dropped={} clock={:.3}ms",
            node.name,
            node.id,
            node.vertex,
            node.stats.packets_sent,
            node.stats.packets_received,
            node.stats.packets_dropped,
            simtime_to_millis_f64(node.clock)
        );
    }
    for path in &report.paths {
        info!(
            "path {} -> {}: {} packets ({:.3}ms, reliability {:.3})",
            path.src, path.dst, path.packet_count, path.latency_ms, path.reliability
        );
    }
    if report.late_events > 0 {
        warn!(
            "{} cross-node events arrived late; lower --runahead below the fastest path",
            report.late_events
        );
    }
}

fn main() {
    let args = Args::parse();
    let json = args.json;

    // RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_filter()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let mut master = Master::new(args.into_configuration());

    let handle = master.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || handle.request()) {
        warn!("Failed to install interrupt handler: {}", e);
    }

    match master.run(&mut JsonScenarioParser::new()) {
        Ok(report) => print_summary(&report, json),
        Err(e) => {
            error!("Simulation failed: {}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            drop(master);
            std::process::exit(1);
        }
    }
}
