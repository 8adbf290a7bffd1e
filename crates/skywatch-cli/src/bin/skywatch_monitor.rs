//! Headless dashboard: loads history, follows the push channel and prints
//! the filtered view until interrupted.

use std::time::Duration;

use chrono::Local;
use clap::Parser;
use skywatch_cli::args::BackendArgs;
use skywatch_cli::render::render_snapshot;
use skywatch_core::{DateFilter, SourceFilter};
use skywatch_sdk::{Dashboard, RefreshOutcome};
use tokio::time;

/// Follow Skywatch alerts from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(flatten)]
    backend: BackendArgs,

    /// Time window: today, yesterday, last7days, last30days, all
    #[arg(long, default_value = "today")]
    window: DateFilter,

    /// Source filter: all, onboard, offboard
    #[arg(long, default_value = "all")]
    source: SourceFilter,

    /// Seconds between screen refreshes
    #[arg(long, default_value_t = 5)]
    every: u64,

    /// Rows to print
    #[arg(long, default_value_t = 20)]
    rows: usize,

    /// Print JSON snapshots instead of text
    #[arg(long)]
    json: bool,

    /// Start with live alerts paused
    #[arg(long)]
    paused: bool,

    /// Stop after this many seconds (0 runs until Ctrl-C)
    #[arg(long, default_value_t = 0)]
    duration: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    skywatch_cli::init_tracing("skywatch_sdk=info", args.json)?;

    let config = args.backend.into_config();
    println!("Connecting to {} (stream {})...", config.api_url, config.ws_url);

    let dashboard = Dashboard::new(config)?;
    dashboard.set_date_filter(args.window);
    dashboard.set_source_filter(args.source);
    dashboard.set_paused(args.paused);
    dashboard.start();

    if let RefreshOutcome::Failed(err) = dashboard.refresh_history().await {
        eprintln!("History unavailable: {}", err);
    }

    let mut ticker = time::interval(Duration::from_secs(args.every.max(1)));
    let stop_after = async {
        if args.duration == 0 {
            std::future::pending::<()>().await;
        } else {
            time::sleep(Duration::from_secs(args.duration)).await;
        }
    };
    tokio::pin!(stop_after);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut stop_after => break,
            _ = ticker.tick() => {
                let snapshot = dashboard.snapshot();
                if args.json {
                    println!("{}", serde_json::to_string(&snapshot)?);
                } else {
                    print!("{}", render_snapshot(&snapshot, &Local, args.rows));
                    println!();
                }
            }
        }
    }

    dashboard.shutdown().await;
    let snapshot = dashboard.snapshot();
    println!(
        "Stopped. {} alerts listed, {} received live.",
        snapshot.total_alerts, snapshot.received_count
    );
    Ok(())
}
