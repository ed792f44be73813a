//! Matching simulator CLI.
//!
//! Generates a random connected topology, runs the distributed matching
//! protocol over it with one thread per node, writes the event log for
//! external inspection, and prints the verification verdict.
//!
//! # Example
//!
//! ```bash
//! # 30 nodes, 2 extra edges per node, default seed
//! pairwise-sim -n 30 -e 2
//!
//! # fast headless run: no pacing, no bounded inboxes
//! pairwise-sim -n 200 --pacing-ms 0 --capacity 0
//! ```

use clap::Parser;
use pairwise_fabric::DeliveryMode;
use pairwise_simulation::{Simulation, SimulationConfig};
use pairwise_trace::{EventSink, JsonRecorder};
use pairwise_types::Topology;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Distributed maximal matching simulator.
///
/// Every node runs on its own thread and coordinates with its neighbors
/// through message passing alone; the run ends when all nodes have either
/// paired up or finished single.
#[derive(Parser, Debug)]
#[command(name = "pairwise-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of nodes in the generated topology
    #[arg(short = 'n', long, default_value = "20")]
    nodes: u32,

    /// Extra random edges per node, on top of the spanning path
    #[arg(short = 'e', long, default_value = "2")]
    extra_edges: u32,

    /// Random seed for topology generation
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Event log output path
    #[arg(short = 'o', long, default_value = "simulation_events.json")]
    output: PathBuf,

    /// Pacing delay in milliseconds around sends and receives, purely to
    /// spread concurrent trace events apart (0 disables)
    #[arg(long, default_value = "50")]
    pacing_ms: u64,

    /// Inbox capacity for best-effort delivery (0 = reliable, unbounded)
    #[arg(long, default_value = "1024")]
    capacity: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let topology = Topology::random_connected(args.nodes, args.nodes * args.extra_edges, &mut rng);
    info!(
        nodes = args.nodes,
        edges = topology.num_edges(),
        seed = args.seed,
        "generated topology"
    );

    let delivery = match args.capacity {
        0 => DeliveryMode::Reliable,
        capacity => DeliveryMode::BestEffort { capacity },
    };
    let config = SimulationConfig::default()
        .with_delivery(delivery)
        .with_pacing(Duration::from_millis(args.pacing_ms));

    let recorder = Arc::new(JsonRecorder::create(&args.output).expect("failed to create event log"));
    let sink: Arc<dyn EventSink> = recorder.clone();
    let report = Simulation::new(topology, config)
        .with_sink(sink)
        .run()
        .expect("simulation failed");
    recorder.close().expect("failed to flush event log");

    println!("\n=== Matching Complete ===");
    println!("Pairs:     {}", report.pairs().len());
    println!("Singles:   {}", report.singles().len());
    println!("Sent:      {}", report.messages_sent);
    println!("Dropped:   {}", report.messages_dropped_full);
    println!("Event log: {}", args.output.display());

    if report.verification.passed() {
        println!("Verification: PASS");
    } else {
        // A failed check is a diagnostic, not a process failure.
        println!("Verification: FAIL");
        for (u, v) in &report.verification.adjacent_singles {
            println!("  adjacent singles: {u} - {v}");
        }
        for (node, partner) in &report.verification.asymmetric_pairs {
            println!("  asymmetric pair: {node} -> {partner}");
        }
        for (node, partner) in &report.verification.foreign_partners {
            println!("  foreign partner: {node} -> {partner}");
        }
    }
}
