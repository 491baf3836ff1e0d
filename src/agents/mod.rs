//! Metabolic agents.
//!
//! Three kinds share a [`Body`] (identity, position, clamped biomass, alive
//! flag) and differ in how they turn biomass, temperature, light and activity
//! into an instantaneous gas-exchange rate:
//! - Plants photosynthesize and respire
//! - Herbivores graze plants and burn their own biomass
//! - Carnivores hunt herbivores and keep a separate hunger pool

pub mod arena;
pub mod carnivore;
pub mod herbivore;
pub mod metabolism;
pub mod plant;

pub use arena::{AgentArena, AgentId};
pub use carnivore::{Carnivore, CarnivoreActivity, CarnivoreConfig, CarnivoreSenses, Sex};
pub use herbivore::{Herbivore, HerbivoreActivity, HerbivoreConfig, HerbivoreSenses};
pub use metabolism::BasalMetabolism;
pub use plant::{Plant, PlantKind, PlantSpecies};

use crate::atmosphere::GasExchange;
use crate::environment::Conditions;
use crate::habitat::Point;
use serde::{Deserialize, Serialize};

/// Concrete agent kinds, as counted by the population statistics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    Tree,
    Grass,
    Herbivore,
    Carnivore,
}

impl AgentKind {
    pub const ALL: [AgentKind; 4] = [
        AgentKind::Tree,
        AgentKind::Grass,
        AgentKind::Herbivore,
        AgentKind::Carnivore,
    ];

    pub fn is_plant(&self) -> bool {
        matches!(self, AgentKind::Tree | AgentKind::Grass)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AgentKind::Tree => "tree",
            AgentKind::Grass => "grass",
            AgentKind::Herbivore => "herbivore",
            AgentKind::Carnivore => "carnivore",
        }
    }
}

/// Cause of death tracking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Animal ran out of biomass
    Starvation,
    /// Killed and eaten by a carnivore
    Predation,
    /// Plant grazed down to its minimum biomass
    Grazed,
    /// Plant respiration outran photosynthesis
    Withered,
    /// Plant burnt
    Burned,
}

/// State shared by every agent
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Body {
    pub id: AgentId,
    pub position: Point,
    biomass: f64,
    min_biomass: f64,
    max_biomass: f64,
    alive: bool,
    /// Simulation time (s) at spawn
    pub born_at: f64,
    death: Option<DeathCause>,
}

impl Body {
    pub fn new(
        id: AgentId,
        position: Point,
        biomass: f64,
        min_biomass: f64,
        max_biomass: f64,
        born_at: f64,
    ) -> Self {
        let lo = min_biomass.min(max_biomass).max(0.0);
        let hi = max_biomass.max(min_biomass).max(lo);
        let mut body = Self {
            id,
            position,
            biomass: lo,
            min_biomass: lo,
            max_biomass: hi,
            alive: true,
            born_at,
            death: None,
        };
        body.set_biomass(biomass);
        body
    }

    #[inline]
    pub fn biomass(&self) -> f64 {
        self.biomass
    }

    pub fn min_biomass(&self) -> f64 {
        self.min_biomass
    }

    pub fn max_biomass(&self) -> f64 {
        self.max_biomass
    }

    /// Biomass as a fraction of the maximum
    pub fn biomass_fraction(&self) -> f64 {
        if self.max_biomass <= 0.0 {
            0.0
        } else {
            self.biomass / self.max_biomass
        }
    }

    /// Set biomass, clamped to `[min, max]`
    pub fn set_biomass(&mut self, biomass: f64) {
        self.biomass = if biomass.is_finite() {
            biomass.clamp(self.min_biomass, self.max_biomass)
        } else {
            self.min_biomass
        };
    }

    /// Add a signed amount, clamped
    pub fn change_biomass(&mut self, delta: f64) {
        self.set_biomass(self.biomass + delta);
    }

    /// Remove up to `amount` kg. Returns what was actually taken.
    pub fn debit(&mut self, amount: f64) -> f64 {
        let taken = amount.max(0.0).min(self.biomass);
        let before = self.biomass;
        self.set_biomass(self.biomass - taken);
        // Clamping to the floor keeps the remainder; report only what left
        (before - self.biomass).min(taken)
    }

    /// Add `amount` kg. Returns what was actually absorbed below the cap.
    pub fn credit(&mut self, amount: f64) -> f64 {
        let before = self.biomass;
        self.change_biomass(amount.max(0.0));
        self.biomass - before
    }

    /// At or below the minimum
    pub fn is_exhausted(&self) -> bool {
        self.biomass <= self.min_biomass
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn death_cause(&self) -> Option<DeathCause> {
        self.death
    }

    /// Mark dead. Returns false if it already was.
    pub fn kill(&mut self, cause: DeathCause) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.death = Some(cause);
        true
    }
}

/// Any agent in the simulation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Agent {
    Plant(Plant),
    Herbivore(Herbivore),
    Carnivore(Carnivore),
}

impl Agent {
    pub fn body(&self) -> &Body {
        match self {
            Agent::Plant(p) => &p.body,
            Agent::Herbivore(h) => &h.body,
            Agent::Carnivore(c) => &c.body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Body {
        match self {
            Agent::Plant(p) => &mut p.body,
            Agent::Herbivore(h) => &mut h.body,
            Agent::Carnivore(c) => &mut c.body,
        }
    }

    pub fn id(&self) -> AgentId {
        self.body().id
    }

    pub fn kind(&self) -> AgentKind {
        match self {
            Agent::Plant(p) => p.kind.into(),
            Agent::Herbivore(_) => AgentKind::Herbivore,
            Agent::Carnivore(_) => AgentKind::Carnivore,
        }
    }

    pub fn position(&self) -> Point {
        self.body().position
    }

    pub fn biomass(&self) -> f64 {
        self.body().biomass()
    }

    pub fn is_alive(&self) -> bool {
        self.body().is_alive()
    }

    pub fn as_plant(&self) -> Option<&Plant> {
        match self {
            Agent::Plant(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_herbivore(&self) -> Option<&Herbivore> {
        match self {
            Agent::Herbivore(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_carnivore(&self) -> Option<&Carnivore> {
        match self {
            Agent::Carnivore(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_plant_mut(&mut self) -> Option<&mut Plant> {
        match self {
            Agent::Plant(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_herbivore_mut(&mut self) -> Option<&mut Herbivore> {
        match self {
            Agent::Herbivore(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_carnivore_mut(&mut self) -> Option<&mut Carnivore> {
        match self {
            Agent::Carnivore(c) => Some(c),
            _ => None,
        }
    }

    /// Advance this agent's own metabolism. Returns the cause if it died this tick.
    pub fn update_metabolism(&mut self, dt: f64, conditions: &Conditions) -> Option<DeathCause> {
        match self {
            Agent::Plant(p) => p.update(dt, conditions),
            Agent::Herbivore(h) => h.update_metabolism(dt, conditions),
            Agent::Carnivore(c) => c.update_metabolism(dt, conditions),
        }
    }
}

impl GasExchange for Agent {
    fn is_alive(&self) -> bool {
        self.body().is_alive()
    }

    fn kind(&self) -> AgentKind {
        Agent::kind(self)
    }

    fn current_o2_rate(&self, conditions: &Conditions) -> f64 {
        if !self.is_alive() {
            return 0.0;
        }
        match self {
            Agent::Plant(p) => p.o2_rate(conditions),
            Agent::Herbivore(h) => h.o2_rate(conditions),
            Agent::Carnivore(c) => c.o2_rate(conditions),
        }
    }

    fn current_co2_rate(&self, conditions: &Conditions) -> f64 {
        if !self.is_alive() {
            return 0.0;
        }
        match self {
            Agent::Plant(p) => p.co2_rate(conditions),
            Agent::Herbivore(h) => h.co2_rate(conditions),
            Agent::Carnivore(c) => c.co2_rate(conditions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(biomass: f64) -> Body {
        Body::new(AgentId::new(0, 0), Point::default(), biomass, 0.5, 10.0, 0.0)
    }

    #[test]
    fn test_biomass_clamped_on_creation() {
        assert_eq!(body(50.0).biomass(), 10.0);
        assert_eq!(body(-5.0).biomass(), 0.5);
        assert_eq!(body(f64::NAN).biomass(), 0.5);
    }

    #[test]
    fn test_debit_never_below_floor() {
        let mut b = body(2.0);
        let taken = b.debit(100.0);
        assert_eq!(b.biomass(), 0.5);
        assert!((taken - 1.5).abs() < 1e-12);
        assert!(b.is_exhausted());
        assert_eq!(b.debit(1.0), 0.0);
    }

    #[test]
    fn test_credit_capped() {
        let mut b = body(9.0);
        assert!((b.credit(5.0) - 1.0).abs() < 1e-12);
        assert_eq!(b.biomass(), 10.0);
    }

    #[test]
    fn test_kill_once() {
        let mut b = body(5.0);
        assert!(b.kill(DeathCause::Predation));
        assert!(!b.kill(DeathCause::Starvation));
        assert_eq!(b.death_cause(), Some(DeathCause::Predation));
    }

    #[test]
    fn test_inverted_range_reordered() {
        let b = Body::new(AgentId::new(0, 0), Point::default(), 5.0, 10.0, 1.0, 0.0);
        assert_eq!(b.min_biomass(), 1.0);
        assert_eq!(b.max_biomass(), 10.0);
    }
}
