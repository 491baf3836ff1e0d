//! # TERRARIUM
//!
//! Closed-atmosphere ecosystem simulator.
//!
//! Plants, herbivores and carnivores live on an island and breathe from one
//! shared, finite pool of gas. Every tick each living agent reports an
//! instantaneous O2/CO2 rate; a central ledger integrates them, lets the
//! ocean absorb some CO2, and classifies the air as healthy, warning, danger
//! or critical.
//!
//! ## Features
//!
//! - **Day/night cycle**: temperature and photosynthesis follow the clock
//! - **Mass balance**: N2 and Ar never change, only O2 and CO2 move
//! - **Population control**: plant respawn, capped reproduction, sexed breeding
//! - **Parallel**: per-agent metabolism runs on all cores via Rayon
//! - **Reproducible**: seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use terrarium::{World, Config};
//! use terrarium::agents::AgentKind;
//!
//! let config = Config::default();
//! let mut world = World::new(config);
//!
//! world.run(1000);
//!
//! println!("Herbivores: {}", world.population(AgentKind::Herbivore));
//! println!("O2: {:.3}%", world.ledger.percentages().oxygen);
//! println!("Status: {}", world.ledger.status());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use terrarium::Config;
//!
//! let mut config = Config::default();
//! config.population.initial_herbivores = 50;
//! config.simulation.speed_multiplier = 10.0;
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use terrarium::{World, Config};
//! use terrarium::checkpoint::Checkpoint;
//!
//! let mut world = World::new(Config::default());
//! world.run(1000);
//!
//! let checkpoint = world.create_checkpoint();
//! checkpoint.save("checkpoint.bin").unwrap();
//!
//! let loaded = Checkpoint::load("checkpoint.bin").unwrap();
//! let restored_world = World::from_checkpoint(loaded);
//! ```

pub mod agents;
pub mod atmosphere;
pub mod checkpoint;
pub mod config;
pub mod environment;
pub mod habitat;
pub mod population;
pub mod spatial;
pub mod stats;
pub mod world;

// Re-export main types
pub use config::Config;
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(steps: u64, herbivores: usize) -> BenchmarkResult {
    use std::time::Instant;

    let mut config = Config::default();
    config.population.initial_herbivores = herbivores;
    config.population.herbivore_cap = config.population.herbivore_cap.max(herbivores);

    let mut world = World::new(config);
    let initial_population = world.total_population();

    let start = Instant::now();
    world.run(steps);
    let elapsed = start.elapsed();

    BenchmarkResult {
        steps,
        initial_population,
        final_population: world.total_population(),
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        final_status: world.ledger.status(),
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
    pub final_status: atmosphere::EnvironmentalStatus,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Agents: {} -> {}", self.initial_population, self.final_population)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        writeln!(f, "Final air: {}", self.final_status)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let config = Config::default();
        let mut world = World::new(config);

        world.run(100);

        assert_eq!(world.time, 100);
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(50, 20);

        assert_eq!(result.steps, 50);
        assert!(result.steps_per_second > 0.0);
    }
}
