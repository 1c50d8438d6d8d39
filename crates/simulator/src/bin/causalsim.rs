//! Causal-ordering simulation CLI.
//!
//! Drives the delivery engine with either the canonical out-of-order demo
//! or a seeded random broadcast workload and prints the event transcript.

use clap::{Parser, Subcommand};

use causalsim_core::DeliveryPolicy;
use causalsim_simulator::{run_demo, run_random, RunReport, SimulatorConfig};

#[derive(Parser)]
#[command(name = "causalsim")]
#[command(about = "Causal message-ordering simulator (BSS / SES / matrix clocks)")]
#[command(version)]
struct Cli {
    /// Delivery policy (vector-full, vector-single, matrix)
    #[arg(long, global = true, default_value = "vector-full")]
    policy: String,

    /// Print the transcript as JSON events instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the canonical 3-process out-of-order scenario
    Demo,

    /// Run a seeded random broadcast workload
    Random {
        /// Number of processes
        #[arg(long, default_value = "4")]
        processes: u32,

        /// Number of broadcast messages
        #[arg(long, default_value = "20")]
        messages: usize,

        /// Random seed (same seed, same run)
        #[arg(long, default_value = "12345")]
        seed: u64,
    },
}

fn parse_policy(s: &str) -> Result<DeliveryPolicy, String> {
    match s {
        "vector-full" | "bss" => Ok(DeliveryPolicy::VectorFull),
        "vector-single" | "ses" => Ok(DeliveryPolicy::VectorSingleDependency),
        "matrix" => Ok(DeliveryPolicy::Matrix),
        other => Err(format!(
            "unknown policy '{other}' (expected vector-full, vector-single, or matrix)"
        )),
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.events)?);
    } else {
        for line in report.transcript() {
            println!("{line}");
        }
    }
    println!("{}", report.stats);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let policy = parse_policy(&cli.policy)?;

    let report = match cli.command {
        Commands::Demo => run_demo(policy)?,
        Commands::Random {
            processes,
            messages,
            seed,
        } => {
            let config = SimulatorConfig::new(policy, processes)
                .with_messages(messages)
                .with_seed(seed);
            run_random(&config)?
        }
    };

    print_report(&report, cli.json)
}
