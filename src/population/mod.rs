//! Population controllers.
//!
//! - [`RespawnQueue`]: plants eaten to exhaustion come back one per tick
//! - [`ReproductionController`]: two random parents, offspring at their midpoint
//! - [`BreedingController`]: one male/female pairing per day
//! - [`Scheduler`]: delayed effects such as reproduction after a kill

pub mod breeding;
pub mod reproduction;
pub mod respawn;
pub mod scheduler;

pub use breeding::{BreedingController, Pairing, PairingOutcome};
pub use reproduction::{ReproductionController, ReproductionTrigger};
pub use respawn::RespawnQueue;
pub use scheduler::{ScheduledEffect, Scheduler};

use crate::agents::{
    Agent, AgentArena, AgentId, AgentKind, Carnivore, Herbivore, Plant, PlantKind, Sex,
};
use crate::atmosphere::GasLedger;
use crate::config::Config;
use crate::habitat::{Habitat, Point};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Population configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub initial_trees: usize,
    pub initial_grass: usize,
    pub initial_herbivores: usize,
    pub initial_carnivores: usize,
    /// Biomass of a respawned plant (kg)
    pub respawn_biomass: f64,
    /// Automatic reproduction stops at this many living herbivores
    pub herbivore_cap: usize,
    /// Automatic reproduction stops at this many living carnivores
    pub carnivore_cap: usize,
    /// Maximum offset of offspring from the parents' midpoint
    pub offspring_jitter: f64,
    /// Offspring biomass as a fraction of max
    pub offspring_biomass_fraction: f64,
    /// Offspring hunger as a fraction of max
    pub offspring_hunger_fraction: f64,
    /// Seconds between a kill and the herbivore reproduction it triggers
    pub reproduction_delay: f64,
    /// No new pairings at or above this many living carnivores
    pub breeding_cap: usize,
    pub breeding_distance: f64,
    /// Seconds a pairing may last before it is abandoned
    pub breeding_timeout: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_trees: 20,
            initial_grass: 150,
            initial_herbivores: 30,
            initial_carnivores: 6,
            respawn_biomass: 0.2,
            herbivore_cap: 80,
            carnivore_cap: 20,
            offspring_jitter: 2.0,
            offspring_biomass_fraction: 0.3,
            offspring_hunger_fraction: 0.5,
            reproduction_delay: 10.0,
            breeding_cap: 20,
            breeding_distance: 2.0,
            breeding_timeout: 300.0,
        }
    }
}

impl PopulationConfig {
    /// Automatic cap for a kind, if it has one
    pub fn cap(&self, kind: AgentKind) -> Option<usize> {
        match kind {
            AgentKind::Herbivore => Some(self.herbivore_cap),
            AgentKind::Carnivore => Some(self.carnivore_cap),
            AgentKind::Tree | AgentKind::Grass => None,
        }
    }
}

/// Starting state for a new agent. `None` fields use the kind's defaults.
#[derive(Clone, Copy, Debug)]
pub struct Birth {
    pub kind: AgentKind,
    pub position: Point,
    pub biomass: Option<f64>,
    pub hunger: Option<f64>,
    pub sex: Option<Sex>,
}

impl Birth {
    pub fn new(kind: AgentKind, position: Point) -> Self {
        Self {
            kind,
            position,
            biomass: None,
            hunger: None,
            sex: None,
        }
    }

    pub fn with_biomass(mut self, biomass: f64) -> Self {
        self.biomass = Some(biomass);
        self
    }

    pub fn with_hunger(mut self, hunger: f64) -> Self {
        self.hunger = Some(hunger);
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }
}

/// Everything a controller touches when it adds agents.
///
/// Spawning inserts into the arena and registers with the ledger in one
/// place, so every agent is registered exactly once.
pub struct Nursery<'a> {
    pub agents: &'a mut AgentArena,
    pub ledger: &'a mut GasLedger,
    pub habitat: &'a dyn Habitat,
    pub rng: &'a mut dyn RngCore,
    pub config: &'a Config,
    /// Simulation time (s)
    pub now: f64,
    /// Agents spawned through this nursery
    pub births: usize,
}

impl<'a> Nursery<'a> {
    pub fn spawn(&mut self, birth: Birth) -> AgentId {
        let config = self.config;
        let now = self.now;
        let position = self.habitat.clamp_to_habitable(birth.position);
        let sex = match (birth.sex, birth.kind) {
            (Some(sex), _) => sex,
            (None, AgentKind::Carnivore) => Sex::random(&mut *self.rng),
            (None, _) => Sex::Female,
        };

        let id = self.agents.insert_with(|id| match birth.kind {
            AgentKind::Tree | AgentKind::Grass => {
                let (kind, species) = if birth.kind == AgentKind::Tree {
                    (PlantKind::Tree, config.tree)
                } else {
                    (PlantKind::Grass, config.grass)
                };
                let biomass = birth.biomass.unwrap_or_else(|| species.initial_biomass());
                Agent::Plant(Plant::with_biomass(id, kind, species, position, biomass, now))
            }
            AgentKind::Herbivore => {
                let cfg = config.herbivore;
                let biomass = birth.biomass.unwrap_or_else(|| cfg.initial_biomass());
                Agent::Herbivore(Herbivore::with_biomass(id, cfg, position, biomass, now))
            }
            AgentKind::Carnivore => {
                let cfg = config.carnivore;
                Agent::Carnivore(Carnivore::with_state(
                    id,
                    cfg,
                    sex,
                    position,
                    birth.biomass.unwrap_or_else(|| cfg.initial_biomass()),
                    birth.hunger.unwrap_or_else(|| cfg.initial_hunger()),
                    now,
                ))
            }
        });

        self.ledger.register(id);
        self.births += 1;
        log::debug!(
            "Spawned {} {} at ({:.1}, {:.1})",
            birth.kind.name(),
            id,
            position.x,
            position.y
        );
        id
    }

    /// Offspring starting state for a kind
    pub fn offspring(&self, kind: AgentKind, position: Point) -> Birth {
        let population = &self.config.population;
        let fraction = population.offspring_biomass_fraction.clamp(0.0, 1.0);
        let birth = Birth::new(kind, position);
        match kind {
            AgentKind::Tree => birth.with_biomass(self.config.tree.max_biomass * fraction),
            AgentKind::Grass => birth.with_biomass(self.config.grass.max_biomass * fraction),
            AgentKind::Herbivore => {
                birth.with_biomass(self.config.herbivore.max_biomass * fraction)
            }
            AgentKind::Carnivore => birth
                .with_biomass(self.config.carnivore.max_biomass * fraction)
                .with_hunger(
                    self.config.carnivore.max_hunger
                        * population.offspring_hunger_fraction.clamp(0.0, 1.0),
                ),
        }
    }
}

/// Living agents of a kind, in slot order
pub fn living_of(agents: &AgentArena, kind: AgentKind) -> Vec<AgentId> {
    agents
        .iter()
        .filter(|(_, agent)| agent.is_alive() && agent.kind() == kind)
        .map(|(id, _)| id)
        .collect()
}

pub fn count_living(agents: &AgentArena, kind: AgentKind) -> usize {
    agents
        .iter()
        .filter(|(_, agent)| agent.is_alive() && agent.kind() == kind)
        .count()
}
