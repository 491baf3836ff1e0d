//! Herbivore: grazes plants, flees hunting carnivores.
//!
//! Biomass is the only energy store. Respiration burns it continuously;
//! grazing replaces it at `trophic_efficiency` of what was eaten.

use super::metabolism::BasalMetabolism;
use super::{AgentId, Body, DeathCause};
use crate::environment::Conditions;
use crate::habitat::{Habitat, Point};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Herbivore activity states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HerbivoreActivity {
    Resting,
    Grazing,
    Walking,
    Fleeing,
}

/// Metabolic multiplier per activity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HerbivoreActivityCosts {
    pub resting: f64,
    pub grazing: f64,
    pub walking: f64,
    pub fleeing: f64,
}

impl Default for HerbivoreActivityCosts {
    fn default() -> Self {
        Self {
            resting: 1.0,
            grazing: 1.2,
            walking: 1.5,
            fleeing: 2.5,
        }
    }
}

impl HerbivoreActivityCosts {
    pub fn multiplier(&self, activity: HerbivoreActivity) -> f64 {
        match activity {
            HerbivoreActivity::Resting => self.resting,
            HerbivoreActivity::Grazing => self.grazing,
            HerbivoreActivity::Walking => self.walking,
            HerbivoreActivity::Fleeing => self.fleeing,
        }
    }
}

/// Herbivore configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HerbivoreConfig {
    pub metabolism: BasalMetabolism,
    pub activity_costs: HerbivoreActivityCosts,
    /// Death threshold (kg)
    pub min_biomass: f64,
    pub max_biomass: f64,
    pub initial_biomass_fraction: f64,
    /// Biomass burnt per mole of O2 respired (kg/mol)
    pub biomass_per_mol_o2: f64,
    /// Fixed biomass cost per second on top of respiration (kg/s)
    pub upkeep_rate: f64,
    /// Forage only while biomass fraction is below this
    pub hunger_threshold: f64,
    pub search_radius: f64,
    /// Seconds between food searches
    pub search_interval: f64,
    /// Plants at or below this biomass are ignored
    pub min_plant_biomass: f64,
    /// Biomass bitten off a plant per bite (kg)
    pub eating_amount: f64,
    pub eating_range: f64,
    /// Seconds between bites
    pub eating_interval: f64,
    /// Fraction of eaten biomass gained
    pub trophic_efficiency: f64,
    pub walk_speed: f64,
    pub flee_speed: f64,
    /// Hunting carnivores closer than this trigger fleeing
    pub flee_radius: f64,
    pub wander_radius: f64,
    /// Seconds between idle activity changes
    pub activity_interval: f64,
    /// Chance of resting rather than walking when idle
    pub rest_chance: f64,
    pub gas_exchange_multiplier: f64,
}

impl Default for HerbivoreConfig {
    fn default() -> Self {
        Self {
            metabolism: BasalMetabolism {
                bmr: 0.002,
                q10: 2.0,
                thermoreg_coefficient: 0.02,
                comfort_temperature: 21.0,
            },
            activity_costs: HerbivoreActivityCosts::default(),
            min_biomass: 0.0,
            max_biomass: 8.0,
            initial_biomass_fraction: 0.6,
            biomass_per_mol_o2: 0.03,
            upkeep_rate: 0.0005,
            hunger_threshold: 0.9,
            search_radius: 30.0,
            search_interval: 2.0,
            min_plant_biomass: 0.2,
            eating_amount: 0.5,
            eating_range: 1.5,
            eating_interval: 1.0,
            trophic_efficiency: 0.1,
            walk_speed: 2.0,
            flee_speed: 5.0,
            flee_radius: 12.0,
            wander_radius: 15.0,
            activity_interval: 8.0,
            rest_chance: 0.4,
            gas_exchange_multiplier: 1.0,
        }
    }
}

impl HerbivoreConfig {
    pub fn initial_biomass(&self) -> f64 {
        self.max_biomass * self.initial_biomass_fraction.clamp(0.0, 1.0)
    }
}

/// What the world resolved for a herbivore this tick
#[derive(Clone, Copy, Debug, Default)]
pub struct HerbivoreSenses {
    /// Position of the nearest hunting carnivore inside the flee radius
    pub threat: Option<Point>,
    /// Current position of the validated food target
    pub target: Option<Point>,
}

/// A grazing animal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Herbivore {
    pub body: Body,
    pub activity: HerbivoreActivity,
    /// Plant currently being approached or eaten
    pub target: Option<AgentId>,
    pub waypoint: Option<Point>,
    search_timer: f64,
    eat_timer: f64,
    activity_timer: f64,
    pub config: HerbivoreConfig,
}

impl Herbivore {
    pub fn new(id: AgentId, config: HerbivoreConfig, position: Point, born_at: f64) -> Self {
        Self::with_biomass(id, config, position, config.initial_biomass(), born_at)
    }

    pub fn with_biomass(
        id: AgentId,
        config: HerbivoreConfig,
        position: Point,
        biomass: f64,
        born_at: f64,
    ) -> Self {
        Self {
            body: Body::new(
                id,
                position,
                biomass,
                config.min_biomass,
                config.max_biomass,
                born_at,
            ),
            activity: HerbivoreActivity::Resting,
            target: None,
            waypoint: None,
            search_timer: 0.0,
            eat_timer: 0.0,
            activity_timer: 0.0,
            config,
        }
    }

    /// Instantaneous O2 consumption (mol/s) before calibration
    pub fn respiration(&self, conditions: &Conditions) -> f64 {
        self.config.metabolism.total_respiration(
            self.body.biomass(),
            conditions.temperature,
            self.config.activity_costs.multiplier(self.activity),
        )
    }

    pub fn o2_rate(&self, conditions: &Conditions) -> f64 {
        -self.respiration(conditions) * self.config.gas_exchange_multiplier
    }

    /// 1:1 aerobic stoichiometry
    pub fn co2_rate(&self, conditions: &Conditions) -> f64 {
        self.respiration(conditions) * self.config.gas_exchange_multiplier
    }

    /// Burn biomass and run down timers. Returns the cause if it starved.
    pub fn update_metabolism(&mut self, dt: f64, conditions: &Conditions) -> Option<DeathCause> {
        if !self.body.is_alive() || dt <= 0.0 {
            return None;
        }

        // Respiration alone shrinks with biomass and would never reach zero
        let burnt = (self.respiration(conditions) * self.config.biomass_per_mol_o2
            + self.config.upkeep_rate)
            * dt;
        self.body.change_biomass(-burnt);

        self.search_timer -= dt;
        self.eat_timer -= dt;
        self.activity_timer -= dt;

        if self.body.is_exhausted() {
            self.body.kill(DeathCause::Starvation);
            return Some(DeathCause::Starvation);
        }
        None
    }

    pub fn is_hungry(&self) -> bool {
        self.body.biomass_fraction() < self.config.hunger_threshold
    }

    pub fn search_due(&self) -> bool {
        self.search_timer <= 0.0
    }

    /// Restart the search interval
    pub fn reset_search(&mut self) {
        self.search_timer = self.config.search_interval;
    }

    /// Drop the current target and search again on the next tick
    pub fn lose_target(&mut self) {
        self.target = None;
        self.search_timer = 0.0;
    }

    /// Absorb `eaten` kg of plant biomass. Returns the biomass gained.
    pub fn eat(&mut self, eaten: f64) -> f64 {
        let gained = self.body.credit(eaten * self.config.trophic_efficiency);
        if !self.is_hungry() {
            self.target = None;
        }
        gained
    }

    /// Move and pick an activity. Returns the plant to bite, if a bite is due.
    pub fn act(
        &mut self,
        dt: f64,
        senses: &HerbivoreSenses,
        habitat: &dyn Habitat,
        rng: &mut dyn RngCore,
    ) -> Option<AgentId> {
        if !self.body.is_alive() {
            return None;
        }

        if let Some(threat) = senses.threat {
            self.activity = HerbivoreActivity::Fleeing;
            self.target = None;
            self.waypoint = None;
            let next = self.body.position.away_from(threat, self.config.flee_speed * dt);
            self.body.position = habitat.clamp_to_habitable(next);
            return None;
        }

        if let (Some(target), Some(food)) = (self.target, senses.target) {
            if self.body.position.distance(food) <= self.config.eating_range {
                self.activity = HerbivoreActivity::Grazing;
                if self.eat_timer <= 0.0 {
                    self.eat_timer = self.config.eating_interval;
                    return Some(target);
                }
                return None;
            }
            self.activity = HerbivoreActivity::Walking;
            let next = self.body.position.towards(food, self.config.walk_speed * dt);
            self.body.position = habitat.clamp_to_habitable(next);
            return None;
        }

        self.wander(dt, habitat, rng);
        None
    }

    fn wander(&mut self, dt: f64, habitat: &dyn Habitat, rng: &mut dyn RngCore) {
        let settled = matches!(
            self.activity,
            HerbivoreActivity::Resting | HerbivoreActivity::Walking
        );
        if !settled || self.activity_timer <= 0.0 {
            self.activity_timer = self.config.activity_interval;
            if rng.gen::<f64>() < self.config.rest_chance {
                self.activity = HerbivoreActivity::Resting;
                self.waypoint = None;
            } else {
                self.activity = HerbivoreActivity::Walking;
                let r = self.config.wander_radius;
                let goal = self
                    .body
                    .position
                    .offset(rng.gen_range(-r..=r), rng.gen_range(-r..=r));
                self.waypoint = Some(habitat.clamp_to_habitable(goal));
            }
        }

        if self.activity == HerbivoreActivity::Walking {
            match self.waypoint {
                Some(goal) => {
                    let next = self.body.position.towards(goal, self.config.walk_speed * dt);
                    self.body.position = habitat.clamp_to_habitable(next);
                    if self.body.position.distance(goal) <= f64::EPSILON {
                        self.activity = HerbivoreActivity::Resting;
                        self.waypoint = None;
                    }
                }
                None => self.activity = HerbivoreActivity::Resting,
            }
        }
    }
}
