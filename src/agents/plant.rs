//! Plant metabolism: photosynthesis minus Q10-scaled respiration.

use super::metabolism::q10_factor;
use super::{AgentId, AgentKind, Body, DeathCause};
use crate::environment::Conditions;
use crate::habitat::Point;
use serde::{Deserialize, Serialize};

/// Plant kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlantKind {
    Tree,
    Grass,
}

impl From<PlantKind> for AgentKind {
    fn from(kind: PlantKind) -> Self {
        match kind {
            PlantKind::Tree => AgentKind::Tree,
            PlantKind::Grass => AgentKind::Grass,
        }
    }
}

/// Per-species plant constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantSpecies {
    /// Base respiration (mol / s / kg at 20 °C)
    pub r_base: f64,
    pub q10: f64,
    /// Maximum photosynthesis (mol / s / kg at full efficiency)
    pub p_max: f64,
    pub min_biomass: f64,
    pub max_biomass: f64,
    /// Starting biomass as a fraction of `max_biomass`
    pub initial_biomass_fraction: f64,
    /// Height of the canopy layer (m)
    pub layer_height: f64,
    /// Temperature offset per metre of layer height (°C/m)
    pub layer_temperature_gradient: f64,
    /// Whether reaching `min_biomass` kills the plant
    pub death_enabled: bool,
    /// Calibration applied to the rate reported to the atmosphere
    pub gas_exchange_multiplier: f64,
}

impl PlantSpecies {
    pub fn tree() -> Self {
        Self {
            r_base: 0.00072,
            q10: 2.5,
            p_max: 0.0108,
            min_biomass: 1.0,
            max_biomass: 500.0,
            initial_biomass_fraction: 0.2,
            layer_height: 10.0,
            layer_temperature_gradient: -0.05,
            death_enabled: false,
            gas_exchange_multiplier: 1.0,
        }
    }

    pub fn grass() -> Self {
        Self {
            r_base: 0.0009,
            q10: 2.0,
            p_max: 0.015,
            min_biomass: 0.05,
            max_biomass: 2.0,
            initial_biomass_fraction: 0.5,
            layer_height: 0.1,
            layer_temperature_gradient: -0.05,
            death_enabled: true,
            gas_exchange_multiplier: 1.0,
        }
    }

    pub fn initial_biomass(&self) -> f64 {
        self.max_biomass * self.initial_biomass_fraction.clamp(0.0, 1.0)
    }

    /// Local temperature of this species' layer
    #[inline]
    pub fn local_temperature(&self, ambient: f64) -> f64 {
        ambient + self.layer_height * self.layer_temperature_gradient
    }

    /// `R_total = R_base * Q10^((T-20)/10) * biomass`
    #[inline]
    pub fn respiration(&self, biomass: f64, temperature: f64) -> f64 {
        self.r_base * q10_factor(self.q10, temperature) * biomass
    }

    /// `P_gross = P_max * E * biomass`
    #[inline]
    pub fn gross_photosynthesis(&self, biomass: f64, efficiency: f64) -> f64 {
        self.p_max * efficiency * biomass
    }

    /// `P_net = P_gross - R_total` at a local temperature
    #[inline]
    pub fn net_production(&self, biomass: f64, temperature: f64, efficiency: f64) -> f64 {
        self.gross_photosynthesis(biomass, efficiency) - self.respiration(biomass, temperature)
    }
}

/// A tree or a patch of grass
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plant {
    pub body: Body,
    pub kind: PlantKind,
    pub species: PlantSpecies,
}

impl Plant {
    /// Create a plant at its species' initial biomass. `born_at` is the simulation time.
    pub fn new(
        id: AgentId,
        kind: PlantKind,
        species: PlantSpecies,
        position: Point,
        born_at: f64,
    ) -> Self {
        Self::with_biomass(id, kind, species, position, species.initial_biomass(), born_at)
    }

    pub fn with_biomass(
        id: AgentId,
        kind: PlantKind,
        species: PlantSpecies,
        position: Point,
        biomass: f64,
        born_at: f64,
    ) -> Self {
        Self {
            body: Body::new(
                id,
                position,
                biomass,
                species.min_biomass,
                species.max_biomass,
                born_at,
            ),
            kind,
            species,
        }
    }

    /// Net production (mol/s) for the current biomass
    pub fn net_production(&self, conditions: &Conditions) -> f64 {
        self.species.net_production(
            self.body.biomass(),
            self.species.local_temperature(conditions.temperature),
            conditions.photosynthetic_efficiency,
        )
    }

    /// Grow or shrink by `P_net * dt`. Returns the cause if the plant died.
    pub fn update(&mut self, dt: f64, conditions: &Conditions) -> Option<DeathCause> {
        if !self.body.is_alive() || dt <= 0.0 {
            return None;
        }

        let net = self.net_production(conditions);
        self.body.change_biomass(net * dt);

        if self.species.death_enabled && self.body.is_exhausted() {
            self.body.kill(DeathCause::Withered);
            return Some(DeathCause::Withered);
        }
        None
    }

    /// Biomass removed by a grazer. Returns kg actually removed.
    pub fn graze(&mut self, amount: f64) -> f64 {
        if !self.body.is_alive() {
            return 0.0;
        }
        let taken = self.body.debit(amount);
        if self.species.death_enabled && self.body.is_exhausted() {
            self.body.kill(DeathCause::Grazed);
        }
        taken
    }

    /// Plants are net O2 producers while `P_net > 0`
    pub fn o2_rate(&self, conditions: &Conditions) -> f64 {
        self.net_production(conditions) * self.species.gas_exchange_multiplier
    }

    pub fn co2_rate(&self, conditions: &Conditions) -> f64 {
        -self.o2_rate(conditions)
    }
}
