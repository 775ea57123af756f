//! Drone Dispatch Simulator CLI
//!
//! Seeds a fleet, then feeds random orders through the dispatch engine tick
//! by tick and reports the outcome.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drone_dispatch::{DispatchConfig, DispatchService, SelectionPolicy};
use drone_simulator::{FleetSimulator, ScenarioGenerator, SimulationSettings};

#[derive(Parser, Debug)]
#[command(name = "drone-simulator")]
#[command(about = "Simulate urban drone delivery traffic")]
struct Args {
    /// Number of drones
    #[arg(short, long, default_value = "6")]
    drones: usize,

    /// New orders per tick
    #[arg(short, long, default_value = "3")]
    orders_per_tick: usize,

    /// Total run length in ticks
    #[arg(short, long, default_value = "60")]
    ticks: u32,

    /// Tick interval in milliseconds
    #[arg(long, default_value = "500")]
    tick_ms: u64,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Drone selection policy
    #[arg(long, env = "SELECTION_POLICY", default_value = "min_delivery_time")]
    policy: SelectionPolicy,

    /// Probability that an in-transit delivery fails
    #[arg(long, default_value = "0.05")]
    failure_rate: f64,

    /// Plan fleet routes every N ticks (0 disables)
    #[arg(long, default_value = "10")]
    plan_every: u32,

    /// Don't sleep between ticks
    #[arg(long)]
    no_sleep: bool,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("drone_simulator=info".parse()?),
        )
        .init();

    let args = Args::parse();

    info!(
        "Starting dispatch simulation: {} drones, {} orders/tick, policy {}",
        args.drones, args.orders_per_tick, args.policy
    );

    let service = DispatchService::in_memory(DispatchConfig::default().with_policy(args.policy));
    let generator = ScenarioGenerator::new(args.seed)?;
    let settings = SimulationSettings {
        orders_per_tick: args.orders_per_tick,
        failure_rate: args.failure_rate,
        plan_every: args.plan_every,
    };

    let mut sim = FleetSimulator::new(service, generator, settings);
    sim.seed_fleet(args.drones).await?;

    for _ in 0..args.ticks {
        let s = sim.step().await?;
        info!(
            "Tick {}/{} | +{} orders | dispatched {} | unplaced {} | delivered {} | failed {} \
             | recharged {}",
            s.tick,
            args.ticks,
            s.orders_created,
            s.dispatched,
            s.unplaced,
            s.delivered,
            s.failed,
            s.recharged
        );

        if !args.no_sleep {
            sleep(Duration::from_millis(args.tick_ms)).await;
        }
    }

    info!("Simulation complete!");

    let svc = sim.service();
    let overview = sim.overview().await;
    let fleet = svc.fleet_stats().await;
    let deliveries = svc.delivery_stats().await;
    let queue = svc.queue_stats().await;

    if args.json {
        let report = serde_json::json!({
            "overview": overview,
            "fleet": fleet,
            "deliveries": deliveries,
            "queue": queue,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    info!("=== FINAL REPORT ===");
    info!(
        "Orders: {} total, {} delivered, {} still queued",
        overview.orders_total, overview.orders_delivered, queue.total
    );
    info!(
        "Deliveries: {} delivered, {} failed, avg {:.1} min, {:.1} units flown",
        deliveries.delivered, deliveries.failed, deliveries.average_time, deliveries.total_distance
    );
    info!(
        "Fleet: {} drones, avg battery {:.1}%, {} deliveries flown",
        fleet.total, fleet.average_battery, fleet.total_deliveries
    );

    Ok(())
}
