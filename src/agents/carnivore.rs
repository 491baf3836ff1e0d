//! Carnivore: hunts herbivores, sleeps at night, breeds in pairs.
//!
//! Unlike herbivores it keeps a hunger pool separate from biomass. Hunger
//! drains with activity; once empty, biomass burns instead.

use super::metabolism::BasalMetabolism;
use super::{AgentId, Body, DeathCause};
use crate::environment::Conditions;
use crate::habitat::{Habitat, Point};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn random(rng: &mut dyn RngCore) -> Self {
        if rng.gen_bool(0.5) {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

/// Carnivore activity states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarnivoreActivity {
    Sleeping,
    Resting,
    Walking,
    Working,
    Hunting,
}

impl CarnivoreActivity {
    /// Sleeping and resting
    pub fn is_idle(&self) -> bool {
        matches!(self, CarnivoreActivity::Sleeping | CarnivoreActivity::Resting)
    }
}

/// Per-activity constants: metabolic multiplier and hunger drain (units/s)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarnivoreActivityCosts {
    pub sleeping: f64,
    pub resting: f64,
    pub walking: f64,
    pub working: f64,
    pub hunting: f64,
    pub idle_hunger_rate: f64,
    pub active_hunger_rate: f64,
}

impl Default for CarnivoreActivityCosts {
    fn default() -> Self {
        Self {
            sleeping: 0.8,
            resting: 1.0,
            walking: 1.5,
            working: 2.0,
            hunting: 2.5,
            idle_hunger_rate: 0.01,
            active_hunger_rate: 0.05,
        }
    }
}

impl CarnivoreActivityCosts {
    pub fn multiplier(&self, activity: CarnivoreActivity) -> f64 {
        match activity {
            CarnivoreActivity::Sleeping => self.sleeping,
            CarnivoreActivity::Resting => self.resting,
            CarnivoreActivity::Walking => self.walking,
            CarnivoreActivity::Working => self.working,
            CarnivoreActivity::Hunting => self.hunting,
        }
    }

    pub fn hunger_rate(&self, activity: CarnivoreActivity) -> f64 {
        if activity.is_idle() {
            self.idle_hunger_rate
        } else {
            self.active_hunger_rate
        }
    }
}

/// Carnivore configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarnivoreConfig {
    pub metabolism: BasalMetabolism,
    pub activity_costs: CarnivoreActivityCosts,
    pub min_biomass: f64,
    pub max_biomass: f64,
    pub initial_biomass_fraction: f64,
    pub max_hunger: f64,
    pub initial_hunger_fraction: f64,
    /// Biomass burnt per second once hunger is empty (kg/s)
    pub starvation_burn_rate: f64,
    /// Starvation burn multiplier while asleep
    pub sleep_burn_factor: f64,
    /// Start hunting below this hunger fraction
    pub hunt_threshold: f64,
    /// Skip sleep below this hunger fraction
    pub wake_hunger_fraction: f64,
    pub search_radius: f64,
    pub search_interval: f64,
    pub eating_range: f64,
    /// Fraction of prey biomass gained
    pub trophic_efficiency: f64,
    /// Hunger restored per kill
    pub hunger_restore: f64,
    pub walk_speed: f64,
    pub hunt_speed: f64,
    pub wander_radius: f64,
    /// Seconds between daytime activity changes
    pub activity_interval: f64,
    pub gas_exchange_multiplier: f64,
}

impl Default for CarnivoreConfig {
    fn default() -> Self {
        Self {
            metabolism: BasalMetabolism {
                bmr: 0.0015,
                q10: 2.0,
                thermoreg_coefficient: 0.02,
                comfort_temperature: 22.0,
            },
            activity_costs: CarnivoreActivityCosts::default(),
            min_biomass: 0.0,
            max_biomass: 80.0,
            initial_biomass_fraction: 0.8,
            max_hunger: 100.0,
            initial_hunger_fraction: 1.0,
            starvation_burn_rate: 0.05,
            sleep_burn_factor: 0.25,
            hunt_threshold: 0.5,
            wake_hunger_fraction: 0.25,
            search_radius: 60.0,
            search_interval: 3.0,
            eating_range: 1.5,
            trophic_efficiency: 0.2,
            hunger_restore: 40.0,
            walk_speed: 1.5,
            hunt_speed: 4.0,
            wander_radius: 20.0,
            activity_interval: 30.0,
            gas_exchange_multiplier: 1.0,
        }
    }
}

impl CarnivoreConfig {
    pub fn initial_biomass(&self) -> f64 {
        self.max_biomass * self.initial_biomass_fraction.clamp(0.0, 1.0)
    }

    pub fn initial_hunger(&self) -> f64 {
        self.max_hunger * self.initial_hunger_fraction.clamp(0.0, 1.0)
    }
}

/// What the world resolved for a carnivore this tick
#[derive(Clone, Copy, Debug, Default)]
pub struct CarnivoreSenses {
    /// Current position of the validated prey target
    pub prey: Option<Point>,
    /// Current position of the assigned mate
    pub mate: Option<Point>,
}

/// A hunting animal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Carnivore {
    pub body: Body,
    pub sex: Sex,
    hunger: f64,
    pub activity: CarnivoreActivity,
    pub target: Option<AgentId>,
    pub waypoint: Option<Point>,
    search_timer: f64,
    activity_timer: f64,
    pub config: CarnivoreConfig,
}

impl Carnivore {
    pub fn new(
        id: AgentId,
        config: CarnivoreConfig,
        sex: Sex,
        position: Point,
        born_at: f64,
    ) -> Self {
        Self::with_state(
            id,
            config,
            sex,
            position,
            config.initial_biomass(),
            config.initial_hunger(),
            born_at,
        )
    }

    pub fn with_state(
        id: AgentId,
        config: CarnivoreConfig,
        sex: Sex,
        position: Point,
        biomass: f64,
        hunger: f64,
        born_at: f64,
    ) -> Self {
        let mut carnivore = Self {
            body: Body::new(
                id,
                position,
                biomass,
                config.min_biomass,
                config.max_biomass,
                born_at,
            ),
            sex,
            hunger: 0.0,
            activity: CarnivoreActivity::Resting,
            target: None,
            waypoint: None,
            search_timer: 0.0,
            activity_timer: 0.0,
            config,
        };
        carnivore.set_hunger(hunger);
        carnivore
    }

    pub fn hunger(&self) -> f64 {
        self.hunger
    }

    /// Set hunger, clamped to `[0, max_hunger]`
    pub fn set_hunger(&mut self, hunger: f64) {
        let max = self.config.max_hunger.max(0.0);
        self.hunger = if hunger.is_finite() {
            hunger.clamp(0.0, max)
        } else {
            0.0
        };
    }

    pub fn hunger_fraction(&self) -> f64 {
        if self.config.max_hunger <= 0.0 {
            0.0
        } else {
            self.hunger / self.config.max_hunger
        }
    }

    pub fn wants_to_hunt(&self) -> bool {
        self.hunger_fraction() < self.config.hunt_threshold
    }

    /// Hungry enough to skip sleep
    pub fn must_wake(&self) -> bool {
        self.hunger_fraction() < self.config.wake_hunger_fraction
    }

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

    pub fn co2_rate(&self, conditions: &Conditions) -> f64 {
        self.respiration(conditions) * self.config.gas_exchange_multiplier
    }

    /// Drain hunger, then biomass once hunger is empty. Returns the cause if it starved.
    pub fn update_metabolism(&mut self, dt: f64, _conditions: &Conditions) -> Option<DeathCause> {
        if !self.body.is_alive() || dt <= 0.0 {
            return None;
        }

        let drain = self.config.activity_costs.hunger_rate(self.activity) * dt;
        self.set_hunger(self.hunger - drain);

        if self.hunger <= 0.0 {
            let factor = if self.activity == CarnivoreActivity::Sleeping {
                self.config.sleep_burn_factor
            } else {
                1.0
            };
            self.body
                .change_biomass(-self.config.starvation_burn_rate * factor * dt);
        }

        self.search_timer -= dt;
        self.activity_timer -= dt;

        if self.body.is_exhausted() {
            self.body.kill(DeathCause::Starvation);
            return Some(DeathCause::Starvation);
        }
        None
    }

    pub fn search_due(&self) -> bool {
        self.search_timer <= 0.0
    }

    pub fn reset_search(&mut self) {
        self.search_timer = self.config.search_interval;
    }

    /// Drop the current prey and search again on the next tick
    pub fn lose_target(&mut self) {
        self.target = None;
        self.search_timer = 0.0;
    }

    /// Consume a kill. Returns the biomass gained.
    pub fn eat_prey(&mut self, prey_biomass: f64) -> f64 {
        let gained = self
            .body
            .credit(prey_biomass.max(0.0) * self.config.trophic_efficiency);
        self.set_hunger(self.hunger + self.config.hunger_restore);
        self.target = None;
        gained
    }

    /// Pick an activity and move. Returns the prey to eat, if in range.
    pub fn act(
        &mut self,
        dt: f64,
        conditions: &Conditions,
        senses: &CarnivoreSenses,
        habitat: &dyn Habitat,
        rng: &mut dyn RngCore,
    ) -> Option<AgentId> {
        if !self.body.is_alive() {
            return None;
        }

        if conditions.phase.is_night() && !self.must_wake() {
            self.activity = CarnivoreActivity::Sleeping;
            self.target = None;
            self.waypoint = None;
            return None;
        }

        if self.wants_to_hunt() || self.target.is_some() {
            self.activity = CarnivoreActivity::Hunting;
            if let (Some(target), Some(prey)) = (self.target, senses.prey) {
                if self.body.position.distance(prey) <= self.config.eating_range {
                    return Some(target);
                }
                self.move_towards(prey, self.config.hunt_speed * dt, habitat);
            } else {
                self.roam(self.config.hunt_speed * dt, habitat, rng);
            }
            return None;
        }

        if let Some(mate) = senses.mate {
            self.activity = CarnivoreActivity::Walking;
            self.move_towards(mate, self.config.walk_speed * dt, habitat);
            return None;
        }

        self.daily_routine(dt, habitat, rng);
        None
    }

    fn daily_routine(&mut self, dt: f64, habitat: &dyn Habitat, rng: &mut dyn RngCore) {
        let settled = matches!(
            self.activity,
            CarnivoreActivity::Resting | CarnivoreActivity::Walking | CarnivoreActivity::Working
        );
        if !settled || self.activity_timer <= 0.0 {
            self.activity_timer = self.config.activity_interval;
            self.waypoint = None;
            self.activity = match rng.gen_range(0..3) {
                0 => CarnivoreActivity::Resting,
                1 => CarnivoreActivity::Walking,
                _ => CarnivoreActivity::Working,
            };
        }

        if self.activity == CarnivoreActivity::Walking {
            self.roam(self.config.walk_speed * dt, habitat, rng);
        }
    }

    fn roam(&mut self, step: f64, habitat: &dyn Habitat, rng: &mut dyn RngCore) {
        let goal = match self.waypoint {
            Some(goal) if self.body.position.distance(goal) > f64::EPSILON => goal,
            _ => {
                let r = self.config.wander_radius;
                let goal = self
                    .body
                    .position
                    .offset(rng.gen_range(-r..=r), rng.gen_range(-r..=r));
                let goal = habitat.clamp_to_habitable(goal);
                self.waypoint = Some(goal);
                goal
            }
        };
        self.move_towards(goal, step, habitat);
    }

    fn move_towards(&mut self, goal: Point, step: f64, habitat: &dyn Habitat) {
        let next = self.body.position.towards(goal, step);
        self.body.position = habitat.clamp_to_habitable(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::DayPhase;
    use crate::habitat::{HabitatConfig, IslandHabitat};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn carnivore(biomass: f64, hunger: f64) -> Carnivore {
        Carnivore::with_state(
            AgentId::new(0, 0),
            CarnivoreConfig::default(),
            Sex::Female,
            Point::new(50.0, 50.0),
            biomass,
            hunger,
            0.0,
        )
    }

    fn night() -> Conditions {
        Conditions {
            hour: 1.0,
            phase: DayPhase::Night,
            ..Conditions::fixed(12.0, 0.0)
        }
    }

    fn open_field() -> IslandHabitat {
        IslandHabitat::new(&HabitatConfig {
            width: 100.0,
            height: 100.0,
            lakes: Vec::new(),
        })
    }

    #[test]
    fn test_starving_carnivore_dies() {
        let mut c = carnivore(10.0, 0.0);
        let conditions = Conditions::fixed(20.0, 1.0);

        let mut previous = c.body.biomass();
        let mut ticks = 0;
        while c.body.is_alive() {
            c.update_metabolism(1.0, &conditions);
            assert!(c.body.biomass() < previous || !c.body.is_alive());
            previous = c.body.biomass();
            ticks += 1;
            assert!(ticks < 1_000);
        }

        assert_eq!(c.body.death_cause(), Some(DeathCause::Starvation));
        assert_eq!(c.body.biomass(), 0.0);
        // 10 kg at 0.05 kg/s, give or take rounding
        assert!((200..=201).contains(&ticks));
    }

    #[test]
    fn test_hunger_never_negative() {
        let mut c = carnivore(50.0, 0.5);
        c.activity = CarnivoreActivity::Hunting;
        for _ in 0..100 {
            c.update_metabolism(5.0, &Conditions::fixed(20.0, 1.0));
            assert!(c.hunger() >= 0.0);
        }
        assert_eq!(c.hunger(), 0.0);
    }

    #[test]
    fn test_hunger_clamped_to_max() {
        let mut c = carnivore(50.0, 90.0);
        c.eat_prey(5.0);
        assert_eq!(c.hunger(), 100.0);
    }

    #[test]
    fn test_sleep_burns_slower() {
        let conditions = Conditions::fixed(20.0, 1.0);
        let mut awake = carnivore(10.0, 0.0);
        let mut asleep = carnivore(10.0, 0.0);
        asleep.activity = CarnivoreActivity::Sleeping;

        awake.update_metabolism(10.0, &conditions);
        asleep.update_metabolism(10.0, &conditions);

        assert!((10.0 - awake.body.biomass() - 0.5).abs() < 1e-12);
        assert!((10.0 - asleep.body.biomass() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_idle_drains_hunger_slower() {
        let conditions = Conditions::fixed(20.0, 1.0);
        let mut resting = carnivore(50.0, 50.0);
        let mut working = carnivore(50.0, 50.0);
        working.activity = CarnivoreActivity::Working;

        resting.update_metabolism(10.0, &conditions);
        working.update_metabolism(10.0, &conditions);
        assert!(resting.hunger() > working.hunger());
    }

    #[test]
    fn test_sleeps_at_night_when_fed() {
        let habitat = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut c = carnivore(50.0, 90.0);
        c.act(1.0, &night(), &CarnivoreSenses::default(), &habitat, &mut rng);
        assert_eq!(c.activity, CarnivoreActivity::Sleeping);
    }

    #[test]
    fn test_wakes_to_hunt_when_starving() {
        let habitat = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut c = carnivore(50.0, 10.0);
        c.act(1.0, &night(), &CarnivoreSenses::default(), &habitat, &mut rng);
        assert_eq!(c.activity, CarnivoreActivity::Hunting);
    }

    #[test]
    fn test_hunt_reaches_prey() {
        let habitat = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut c = carnivore(50.0, 20.0);
        let prey = AgentId::new(7, 2);
        c.target = Some(prey);
        let senses = CarnivoreSenses {
            prey: Some(Point::new(54.0, 50.0)),
            mate: None,
        };
        let day = Conditions::fixed(20.0, 1.0);

        assert_eq!(c.act(1.0, &day, &senses, &habitat, &mut rng), None);
        assert_eq!(c.act(1.0, &day, &senses, &habitat, &mut rng), Some(prey));
    }

    #[test]
    fn test_eat_prey_converts_biomass() {
        let mut c = carnivore(20.0, 10.0);
        c.target = Some(AgentId::new(1, 0));
        let gained = c.eat_prey(5.0);
        assert!((gained - 1.0).abs() < 1e-12);
        assert!((c.hunger() - 50.0).abs() < 1e-12);
        assert_eq!(c.target, None);
    }

    #[test]
    fn test_sex_opposite() {
        assert_eq!(Sex::Male.opposite(), Sex::Female);
        assert_eq!(Sex::Female.opposite(), Sex::Male);
    }
}
