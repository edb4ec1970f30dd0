use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use lane_sim::simulation::{
    Metric, MetricsRecorder, Road, RoadConfig, DEFAULT_GRID_SIZE_M, DEFAULT_LANES,
    DEFAULT_LENGTH_KM, DEFAULT_SPAWN_CHANCE, DEFAULT_SPEED_KMH,
};

#[derive(Parser)]
#[command(name = "lane_sim")]
#[command(about = "Multi-lane road traffic simulation")]
struct Cli {
    /// Number of lanes
    #[arg(long, default_value_t = DEFAULT_LANES)]
    lanes: i64,

    /// Road length in kilometres
    #[arg(long, default_value_t = DEFAULT_LENGTH_KM)]
    length_km: f64,

    /// Size of one road cell in metres
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE_M)]
    grid_size: f64,

    /// Chance per lane per tick that a car enters the road
    #[arg(long, default_value_t = DEFAULT_SPAWN_CHANCE)]
    spawn_chance: f64,

    /// Free-flow speed of every car in km/h
    #[arg(long, default_value_t = DEFAULT_SPEED_KMH)]
    speed_kmh: f64,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Print a summary every this many ticks (0 disables)
    #[arg(long, default_value = "100")]
    report_every: u64,

    /// Cars placed at the entry of the first lanes before the first tick
    #[arg(long, default_value = "2")]
    seed_cars: usize,

    /// Width of the terminal road map in characters
    #[arg(long, default_value = "100")]
    map_width: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn,lane_sim=info")).init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    let config = RoadConfig::from_physical(
        cli.lanes,
        cli.length_km,
        cli.grid_size,
        cli.spawn_chance,
        cli.speed_kmh,
    )
    .context("Invalid road configuration")?;

    println!("Running lane simulation in headless mode...");
    println!(
        "Ticks: {}, Road: {} cells x {} lanes, Car speed: {} cells/tick",
        cli.ticks, config.length, config.lanes, config.spawn_speed
    );
    println!();

    let mut road = Road::from_config(config, cli.seed).context("Failed to build road")?;
    road.seed_cars(cli.seed_cars)
        .context("Failed to place initial cars")?;

    println!("Initial state:");
    road.print_summary();
    road.draw_map(cli.map_width);

    let mut recorder = MetricsRecorder::new();
    let chunk = if cli.report_every == 0 {
        cli.ticks.max(1)
    } else {
        cli.report_every
    };

    while road.tick_count() < cli.ticks {
        let ticks_to_run = chunk.min(cli.ticks - road.tick_count());
        road.run(ticks_to_run, &mut recorder)
            .with_context(|| format!("Simulation aborted at tick {}", road.tick_count()))?;

        if cli.report_every > 0 {
            println!("--- After tick {} ---", road.tick_count());
            road.print_summary();
            road.draw_map(cli.map_width);
        }
    }

    println!("=== Final State ===");
    road.print_summary();
    road.draw_map(cli.map_width);

    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks run: {}", road.tick_count());
    info!("Total cars spawned: {}", road.total_spawned());
    info!("Total cars exited: {}", road.total_exited());
    info!("Active cars: {}", road.car_count());
    info!(
        "Final average speed: {:.2}",
        road.metric(Metric::AverageSpeed)
    );
    info!(
        "Mean average speed: {:.2}",
        recorder.mean_average_speed()
    );
    if let Some(row) = recorder.latest() {
        info!(
            "Last sampled tick: {} ({} cars, lanes {:?})",
            row.tick, row.active_cars, row.cars_per_lane
        );
    }

    Ok(())
}
