//! TERRARIUM - CLI Entry Point
//!
//! Closed-atmosphere ecosystem simulator.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use terrarium::agents::AgentKind;
use terrarium::checkpoint::{Checkpoint, CheckpointManager};
use terrarium::{benchmark, Config, World};

#[derive(Parser)]
#[command(name = "terrarium")]
#[command(version)]
#[command(about = "Closed-atmosphere ecosystem simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of steps to simulate
        #[arg(short, long, default_value = "10000")]
        steps: u64,

        /// Output directory for checkpoints
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Override the simulation speed multiplier
        #[arg(long)]
        speed: Option<f64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resume simulation from checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Number of additional steps
        #[arg(short, long, default_value = "10000")]
        steps: u64,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of steps
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Initial herbivores
        #[arg(short = 'n', long, default_value = "30")]
        herbivores: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Analyze a checkpoint file
    Analyze {
        /// Checkpoint file
        checkpoint: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            output,
            seed,
            speed,
            quiet,
        } => run_simulation(config, steps, output, seed, speed, quiet),

        Commands::Resume {
            checkpoint,
            steps,
            output,
        } => resume_simulation(checkpoint, steps, output),

        Commands::Benchmark { steps, herbivores } => run_benchmark(steps, herbivores),

        Commands::Init { output } => generate_config(output),

        Commands::Analyze { checkpoint } => analyze_checkpoint(checkpoint),
    }
}

fn print_population(world: &World) {
    println!(
        "  Trees: {}  Grass: {}  Herbivores: {}  Carnivores: {}",
        world.population(AgentKind::Tree),
        world.population(AgentKind::Grass),
        world.population(AgentKind::Herbivore),
        world.population(AgentKind::Carnivore)
    );
}

/// Advance `world` to `target_time`, printing stats and saving checkpoints
fn drive(
    world: &mut World,
    target_time: u64,
    output: &Path,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut checkpoint_mgr = CheckpointManager::new(
        output.to_string_lossy().to_string(),
        world.config.logging.checkpoint_interval,
        10,
    );

    let stats_interval = world.config.logging.stats_interval.max(1);
    let mut last_status = world.ledger.status();
    let mut window_start = Instant::now();
    let mut window_steps = 0u64;

    while world.time < target_time {
        world.step();
        window_steps += 1;

        if world.time % stats_interval == 0 {
            let seconds = window_start.elapsed().as_secs_f64().max(f64::EPSILON);
            world.stats.steps_per_second = (window_steps as f64 / seconds) as f32;
            window_start = Instant::now();
            window_steps = 0;
            if !quiet {
                println!("{}", world.stats.summary());
            }
        }

        let status = world.ledger.status();
        if status != last_status {
            log::warn!("Air quality changed: {} -> {}", last_status, status);
            last_status = status;
        }

        if checkpoint_mgr.should_save(world.time) {
            let checkpoint = world.create_checkpoint();
            match checkpoint_mgr.save(&checkpoint) {
                Ok(path) => {
                    if !quiet {
                        println!("  Checkpoint saved: {}", path);
                    }
                }
                Err(e) => log::error!("Checkpoint error: {}", e),
            }
        }

        if world.is_extinct() {
            println!("\nAll animals extinct at step {}", world.time);
            break;
        }
    }

    Ok(())
}

fn run_simulation(
    config_path: PathBuf,
    steps: u64,
    output: PathBuf,
    seed: Option<u64>,
    speed: Option<f64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Config::from_file(&config_path)?
    } else {
        println!("Using default configuration");
        Config::default()
    };
    if let Some(speed) = speed {
        config.simulation.speed_multiplier = speed;
    }

    std::fs::create_dir_all(&output)?;

    let mut world = if let Some(s) = seed {
        println!("Using seed: {}", s);
        World::new_with_seed(config, s)
    } else {
        World::new(config)
    };

    println!("Starting simulation (seed {})", world.seed());
    print_population(&world);
    println!("  Island: {}x{}", world.config.habitat.width, world.config.habitat.height);
    println!("  Steps: {}", steps);
    println!();

    let start = Instant::now();
    drive(&mut world, steps, &output, quiet)?;
    let elapsed = start.elapsed();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Steps: {}", world.time);
    println!("Speed: {:.1} steps/s", world.time as f64 / elapsed.as_secs_f64().max(f64::EPSILON));
    println!("Day {} {}", world.clock.day(), world.clock.clock_string());
    print_population(&world);
    println!("Air: {} (worst seen: {})", world.ledger.status(), world.stats_history.worst_status());

    let final_checkpoint = world.create_checkpoint();
    let final_path = output.join("checkpoint_final.bin");
    final_checkpoint.save(&final_path)?;
    println!("Final checkpoint: {:?}", final_path);

    let stats_path = output.join("stats_history.json");
    world.stats_history.save(&stats_path.to_string_lossy())?;
    println!("Stats history: {:?}", stats_path);

    Ok(())
}

fn resume_simulation(
    checkpoint_path: PathBuf,
    steps: u64,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading checkpoint: {:?}", checkpoint_path);

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let mut world = World::from_checkpoint(checkpoint);

    println!(
        "Resumed at step {} (day {} {})",
        world.time,
        world.clock.day(),
        world.clock.clock_string()
    );
    print_population(&world);
    println!("Running {} additional steps", steps);
    println!();

    std::fs::create_dir_all(&output)?;

    let start = Instant::now();
    let target_time = world.time + steps;
    drive(&mut world, target_time, &output, false)?;

    let elapsed = start.elapsed();
    println!();
    println!("=== Resume Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Final step: {}", world.time);
    print_population(&world);
    println!("Air: {}", world.ledger.status());

    Ok(())
}

fn run_benchmark(steps: u64, herbivores: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== TERRARIUM Benchmark ===");
    println!("Steps: {}", steps);
    println!("Herbivores: {}", herbivores);
    println!();

    let result = benchmark(steps, herbivores);
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_checkpoint(checkpoint_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Checkpoint Analysis ===");
    println!("File: {:?}", checkpoint_path);
    println!();

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let size = checkpoint.size_bytes();

    println!("Step: {}", checkpoint.time);
    println!("Simulated time: {:.0}s (day {})", checkpoint.elapsed, checkpoint.day);
    println!("Seed: {}", checkpoint.random_seed);
    println!();

    let percentages = checkpoint.gas.percentages();
    println!("Atmosphere:");
    println!("  O2:  {:8.1} mol ({:.3}%)", checkpoint.gas.oxygen(), percentages.oxygen);
    println!(
        "  CO2: {:8.1} mol ({:.4}%)",
        checkpoint.gas.carbon_dioxide(),
        percentages.carbon_dioxide
    );
    println!("  N2:  {:8.1} mol ({:.3}%)", checkpoint.gas.nitrogen(), percentages.nitrogen);
    println!("  Ar:  {:8.1} mol ({:.3}%)", checkpoint.gas.argon(), percentages.argon);
    println!();

    println!("Agents:");
    for kind in AgentKind::ALL {
        let living: Vec<f64> = checkpoint
            .agents
            .iter()
            .filter(|(_, agent)| agent.is_alive() && agent.kind() == kind)
            .map(|(_, agent)| agent.biomass())
            .collect();
        let total: f64 = living.iter().sum();
        let mean = if living.is_empty() { 0.0 } else { total / living.len() as f64 };
        println!(
            "  {:10} {:5}  total {:8.1} kg  mean {:6.2} kg",
            kind.name(),
            living.len(),
            total,
            mean
        );
    }

    println!();
    println!("Pending respawns: {}", checkpoint.respawn.len());
    println!("Scheduled effects: {}", checkpoint.scheduler.len());
    println!();
    println!("Checkpoint size: {:.2} MB", size as f64 / 1_000_000.0);

    Ok(())
}
