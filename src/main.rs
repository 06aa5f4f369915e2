use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use routewarden::brain::{self, Analyzer};
use routewarden::config::WardenConfig;
use routewarden::probe;

#[derive(Parser)]
#[command(
    name = "routewarden",
    about = "Autonomous DNS failover sentinel drill appliance",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (sentinel loop + API server)
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,

        /// Config file path (overrides the usual lookup order)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate one synthetic probe sweep and print it
    Probe {
        /// Simulate a primary DNS failure
        #[arg(long)]
        chaos: bool,

        /// Simulate traffic riding the backup route
        #[arg(long)]
        backup_route: bool,
    },

    /// Run one probe sweep through the health analyzer
    Analyze {
        /// Simulate a primary DNS failure
        #[arg(long)]
        chaos: bool,
    },

    /// Run a headless chaos drill with compressed timing
    Drill {
        /// Number of ticks to run
        #[arg(long, default_value = "5")]
        ticks: u64,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.command {
        Commands::Serve {
            config: Some(path), ..
        } => WardenConfig::load(path)?,
        _ => WardenConfig::load_or_default(),
    };

    // RUST_LOG wins; the config level is the fallback.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cfg.logging.level.clone())),
        )
        .init();

    match cli.command {
        Commands::Serve { bind, .. } => {
            tracing::info!(%bind, "Starting Routewarden daemon");
            routewarden::serve(&bind, cfg).await?;
        }
        Commands::Probe {
            chaos,
            backup_route,
        } => {
            let reading = probe::generate(chaos, !backup_route);

            println!("\nRoutewarden Probe Sweep ({})", reading.timestamp.to_rfc3339());
            println!("{:<24} | {:>10} | Status", "Region", "Latency");
            println!("{:-<24}-|-{:-<10}-|-{:-<10}", "", "", "");
            for region in &reading.regions {
                println!(
                    "{:<24} | {:>8}ms | {}",
                    region.name, region.latency, region.status
                );
            }
            println!();
        }
        Commands::Analyze { chaos } => {
            let reading = probe::generate(chaos, true);
            let analyzer = brain::Brain::from_config(&cfg.brain);
            tracing::info!(mode = %analyzer.describe(), "Running health analysis");

            let verdict = analyzer.analyze(&reading.regions).await?;

            println!("\n=== Routewarden Health Analysis ===");
            println!("Status:      {:?}", verdict.status);
            println!("Action:      {:?}", verdict.recommended_action);
            println!("\nReasoning:");
            println!(" {}", verdict.reasoning);
            println!("===================================\n");
        }
        Commands::Drill { ticks, json } => {
            // Compressed timing so a full failover cycle fits in seconds.
            let mut cfg = cfg;
            cfg.sentinel.tick_interval_ms = 200;
            cfg.sentinel.failover_delay_ms = 150;
            cfg.sentinel.route_restore_delay_ms = 300;

            tracing::info!(%ticks, "Running chaos drill");
            let sentinel = routewarden::build_sentinel(&cfg);
            sentinel.start().await;
            sentinel.inject_chaos().await;

            // Let the loop run the requested ticks, plus slack for the
            // delayed failover to land.
            tokio::time::sleep(Duration::from_millis(
                cfg.sentinel.tick_interval_ms * ticks + 500,
            ))
            .await;

            // Capture the outcome before stop resets the machine to IDLE.
            let snapshot = sentinel.snapshot().await;
            let journal = sentinel.logs().await;
            sentinel.stop().await;

            if json {
                let report = serde_json::json!({
                    "snapshot": snapshot,
                    "journal": journal,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n=== Routewarden Chaos Drill ===");
                println!("Ticks run:     {}", snapshot.tick_count);
                println!("Final state:   {}", snapshot.state);
                println!("Route healthy: {}", snapshot.route_healthy);
                println!("Chaos active:  {}", snapshot.chaos_active);
                if let Some(analysis) = &snapshot.last_analysis {
                    println!("Last analysis: {}", analysis.reasoning);
                }
                println!("\nJournal:");
                for entry in journal.iter().rev() {
                    println!(
                        " - [{}/{:?}] {}",
                        entry.source,
                        entry.severity,
                        entry.message
                    );
                }
                println!("===============================\n");
            }
        }
    }

    Ok(())
}
