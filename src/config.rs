//! Configuration system for the terrarium simulation.
//!
//! Supports YAML configuration files with sensible defaults. Invalid values
//! are corrected with a warning rather than rejected, so a loaded
//! configuration always produces a running simulation.

use crate::agents::{CarnivoreConfig, HerbivoreConfig, PlantSpecies};
use crate::atmosphere::AtmosphereConfig;
use crate::environment::ClockConfig;
use crate::habitat::HabitatConfig;
use crate::population::PopulationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub clock: ClockConfig,
    pub atmosphere: AtmosphereConfig,
    pub habitat: HabitatConfig,
    pub tree: PlantSpecies,
    pub grass: PlantSpecies,
    pub herbivore: HerbivoreConfig,
    pub carnivore: CarnivoreConfig,
    pub population: PopulationConfig,
    pub logging: LoggingConfig,
}

/// Tick driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per step
    pub tick_seconds: f64,
    /// Scales gas exchange without changing tick granularity
    pub speed_multiplier: f64,
    /// Bucket size of the spatial index
    pub spatial_cell_size: f64,
}

/// Logging and checkpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Steps between checkpoints
    pub checkpoint_interval: u64,
    /// Steps between stats records
    pub stats_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            clock: ClockConfig::default(),
            atmosphere: AtmosphereConfig::default(),
            habitat: HabitatConfig::default(),
            tree: PlantSpecies::tree(),
            grass: PlantSpecies::grass(),
            herbivore: HerbivoreConfig::default(),
            carnivore: CarnivoreConfig::default(),
            population: PopulationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 0.5,
            speed_multiplier: 1.0,
            spatial_cell_size: 10.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 1000,
            stats_interval: 20,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config.sanitized())
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Copy with every invalid value corrected. Each correction logs a warning.
    pub fn sanitized(&self) -> Self {
        let mut out = self.clone();

        let sim = &mut out.simulation;
        positive("simulation.tick_seconds", &mut sim.tick_seconds, 0.5);
        non_negative("simulation.speed_multiplier", &mut sim.speed_multiplier);
        positive("simulation.spatial_cell_size", &mut sim.spatial_cell_size, 10.0);

        out.clock = self.clock.sanitized();
        out.atmosphere.thresholds = self.atmosphere.thresholds.sanitized();
        non_negative("atmosphere.ocean_sink_per_day", &mut out.atmosphere.ocean_sink_per_day);
        non_negative(
            "atmosphere.combustion_co2_per_kg",
            &mut out.atmosphere.combustion_co2_per_kg,
        );

        sanitize_species("tree", &mut out.tree);
        sanitize_species("grass", &mut out.grass);
        sanitize_herbivore(&mut out.herbivore);
        sanitize_carnivore(&mut out.carnivore);
        sanitize_population(&mut out.population);

        if out.logging.stats_interval == 0 {
            log::warn!("logging.stats_interval = 0; using 1");
            out.logging.stats_interval = 1;
        }
        out
    }
}

/// Clamp a value to `>= 0`
fn non_negative(name: &str, value: &mut f64) {
    if !value.is_finite() || *value < 0.0 {
        log::warn!("{} = {} is invalid; using 0", name, value);
        *value = 0.0;
    }
}

/// Replace a non-positive value with `fallback`
fn positive(name: &str, value: &mut f64, fallback: f64) {
    if !value.is_finite() || *value <= 0.0 {
        log::warn!("{} = {} must be positive; using {}", name, value, fallback);
        *value = fallback;
    }
}

fn fraction(name: &str, value: &mut f64) {
    if !value.is_finite() || !(0.0..=1.0).contains(&*value) {
        let fixed = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
        log::warn!("{} = {} is not a fraction; using {}", name, value, fixed);
        *value = fixed;
    }
}

fn ordered_range(name: &str, min: &mut f64, max: &mut f64) {
    non_negative(&format!("{}.min_biomass", name), min);
    non_negative(&format!("{}.max_biomass", name), max);
    if *min > *max {
        log::warn!(
            "{}: min_biomass {} > max_biomass {}; swapped",
            name,
            min,
            max
        );
        std::mem::swap(min, max);
    }
}

fn sanitize_species(name: &str, species: &mut PlantSpecies) {
    non_negative(&format!("{}.r_base", name), &mut species.r_base);
    non_negative(&format!("{}.q10", name), &mut species.q10);
    non_negative(&format!("{}.p_max", name), &mut species.p_max);
    non_negative(&format!("{}.layer_height", name), &mut species.layer_height);
    non_negative(
        &format!("{}.gas_exchange_multiplier", name),
        &mut species.gas_exchange_multiplier,
    );
    fraction(
        &format!("{}.initial_biomass_fraction", name),
        &mut species.initial_biomass_fraction,
    );
    ordered_range(name, &mut species.min_biomass, &mut species.max_biomass);
}

fn sanitize_herbivore(h: &mut HerbivoreConfig) {
    non_negative("herbivore.metabolism.bmr", &mut h.metabolism.bmr);
    ordered_range("herbivore", &mut h.min_biomass, &mut h.max_biomass);
    fraction("herbivore.initial_biomass_fraction", &mut h.initial_biomass_fraction);
    fraction("herbivore.hunger_threshold", &mut h.hunger_threshold);
    fraction("herbivore.trophic_efficiency", &mut h.trophic_efficiency);
    fraction("herbivore.rest_chance", &mut h.rest_chance);
    for (name, value) in [
        ("herbivore.biomass_per_mol_o2", &mut h.biomass_per_mol_o2),
        ("herbivore.upkeep_rate", &mut h.upkeep_rate),
        ("herbivore.search_radius", &mut h.search_radius),
        ("herbivore.search_interval", &mut h.search_interval),
        ("herbivore.min_plant_biomass", &mut h.min_plant_biomass),
        ("herbivore.eating_amount", &mut h.eating_amount),
        ("herbivore.eating_range", &mut h.eating_range),
        ("herbivore.eating_interval", &mut h.eating_interval),
        ("herbivore.walk_speed", &mut h.walk_speed),
        ("herbivore.flee_speed", &mut h.flee_speed),
        ("herbivore.flee_radius", &mut h.flee_radius),
        ("herbivore.wander_radius", &mut h.wander_radius),
        ("herbivore.activity_interval", &mut h.activity_interval),
        ("herbivore.gas_exchange_multiplier", &mut h.gas_exchange_multiplier),
    ] {
        non_negative(name, value);
    }
}

fn sanitize_carnivore(c: &mut CarnivoreConfig) {
    non_negative("carnivore.metabolism.bmr", &mut c.metabolism.bmr);
    ordered_range("carnivore", &mut c.min_biomass, &mut c.max_biomass);
    fraction("carnivore.initial_biomass_fraction", &mut c.initial_biomass_fraction);
    fraction("carnivore.initial_hunger_fraction", &mut c.initial_hunger_fraction);
    fraction("carnivore.hunt_threshold", &mut c.hunt_threshold);
    fraction("carnivore.wake_hunger_fraction", &mut c.wake_hunger_fraction);
    fraction("carnivore.trophic_efficiency", &mut c.trophic_efficiency);
    for (name, value) in [
        ("carnivore.max_hunger", &mut c.max_hunger),
        ("carnivore.starvation_burn_rate", &mut c.starvation_burn_rate),
        ("carnivore.sleep_burn_factor", &mut c.sleep_burn_factor),
        ("carnivore.search_radius", &mut c.search_radius),
        ("carnivore.search_interval", &mut c.search_interval),
        ("carnivore.eating_range", &mut c.eating_range),
        ("carnivore.hunger_restore", &mut c.hunger_restore),
        ("carnivore.walk_speed", &mut c.walk_speed),
        ("carnivore.hunt_speed", &mut c.hunt_speed),
        ("carnivore.wander_radius", &mut c.wander_radius),
        ("carnivore.activity_interval", &mut c.activity_interval),
        ("carnivore.activity_costs.idle_hunger_rate", &mut c.activity_costs.idle_hunger_rate),
        ("carnivore.activity_costs.active_hunger_rate", &mut c.activity_costs.active_hunger_rate),
        ("carnivore.gas_exchange_multiplier", &mut c.gas_exchange_multiplier),
    ] {
        non_negative(name, value);
    }
}

fn sanitize_population(p: &mut PopulationConfig) {
    fraction("population.offspring_biomass_fraction", &mut p.offspring_biomass_fraction);
    fraction("population.offspring_hunger_fraction", &mut p.offspring_hunger_fraction);
    for (name, value) in [
        ("population.respawn_biomass", &mut p.respawn_biomass),
        ("population.offspring_jitter", &mut p.offspring_jitter),
        ("population.reproduction_delay", &mut p.reproduction_delay),
        ("population.breeding_distance", &mut p.breeding_distance),
        ("population.breeding_timeout", &mut p.breeding_timeout),
    ] {
        non_negative(name, value);
    }
}
