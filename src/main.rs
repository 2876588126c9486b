use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use scavenger_stats::accounting::{exclude_fee_receipts, Accounting};
use scavenger_stats::api::ScavengerClient;
use scavenger_stats::dashboard::{join_dashboard, launch_dashboard};
use scavenger_stats::stats::{build_report, StatsReport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scavenger Stats - receipt statistics", long_about = None)]
struct Cli {
    /// Scavenger API base URL
    #[arg(long, env = "SCAVENGER_API", default_value = "https://scavenger.prod.gd.midnighttge.io")]
    api: String,

    /// Directory holding the receipt and error logs
    #[arg(long, env = "KEYSTORE", default_value = "keystore")]
    keystore: String,

    /// Log level (error|warn|info|debug|trace)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,

    /// Operator fee addresses whose receipts are left out of the stats
    #[arg(long = "fee-address", env = "FEE_ADDRESSES", value_delimiter = ',')]
    fee_addresses: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute statistics once and print them as JSON
    Stats {
        /// Use the saved rate table instead of fetching it
        #[arg(long, default_value_t = false)]
        offline: bool,
        /// Pretty-print the JSON
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Fetch the per-day STAR rate table and print it
    Rates {
        /// Also save it to the keystore for offline use
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Recompute statistics periodically and print a summary
    Watch {
        /// Seconds between refreshes
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .init();

    match cli.command {
        Commands::Stats { offline, pretty } => cmd_stats(&cli, offline, pretty).await?,
        Commands::Rates { save } => cmd_rates(&cli, save).await?,
        Commands::Watch { interval } => cmd_watch(&cli, interval).await?,
    }

    Ok(())
}

/// Read a fresh snapshot of everything a report needs and build it.
async fn compute_report(
    cli: &Cli,
    accounting: &Accounting,
    client: &ScavengerClient,
    offline: bool,
) -> anyhow::Result<StatsReport> {
    let receipts = exclude_fee_receipts(accounting.read_all_receipts()?, &cli.fee_addresses);
    let rates = if offline {
        accounting.read_star_rates()?
    } else {
        client.fetch_rates().await
    };
    let errors = accounting.count_errors()?;
    tracing::info!(receipts = receipts.len(), rates = rates.len(), "computing stats");

    build_report(&receipts, &rates, errors).context("receipt log contains malformed data")
}

async fn cmd_stats(cli: &Cli, offline: bool, pretty: bool) -> anyhow::Result<()> {
    let accounting = Accounting::new(&cli.keystore)?;
    let client = ScavengerClient::new(cli.api.clone())?;
    let report = compute_report(cli, &accounting, &client, offline).await?;
    if pretty {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}

async fn cmd_rates(cli: &Cli, save: bool) -> anyhow::Result<()> {
    let client = ScavengerClient::new(cli.api.clone())?;
    let rates = client.get_work_to_star_rate().await?;
    if save {
        let accounting = Accounting::new(&cli.keystore)?;
        accounting.write_star_rates(&rates)?;
        tracing::info!(days = rates.len(), "saved STAR rates");
    }
    println!("{}", serde_json::to_string_pretty(&rates)?);
    Ok(())
}

async fn cmd_watch(cli: &Cli, interval: u64) -> anyhow::Result<()> {
    let accounting = Accounting::new(&cli.keystore)?;
    let client = ScavengerClient::new(cli.api.clone())?;
    let every = Duration::from_secs(interval.max(1));

    let (tx, rx) = watch::channel::<Option<StatsReport>>(None);
    let dashboard = tokio::spawn(launch_dashboard(rx));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match compute_report(cli, &accounting, &client, false).await {
                    Ok(report) => {
                        if tx.send(Some(report)).is_err() {
                            break;
                        }
                    }
                    // keep showing the previous report
                    Err(e) => tracing::warn!("stats refresh failed: {e:#}"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("stopping");
                break;
            }
        }
    }

    drop(tx);
    join_dashboard(dashboard).await;
    Ok(())
}
