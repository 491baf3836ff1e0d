//! The shared atmosphere.
//!
//! - Molar gas pool with derived percentages
//! - Environmental status from O2/CO2 thresholds
//! - Ledger integrating every agent's gas exchange each tick

pub mod gas;
pub mod ledger;
pub mod status;

pub use gas::{Gas, GasComposition, GasPercentages, GasPool};
pub use ledger::{AgentSource, GasExchange, GasLedger, RateBreakdown, TickReport};
pub use status::{EnvironmentalStatus, StatusChange, StatusThresholds};

use serde::{Deserialize, Serialize};

/// Atmosphere configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    /// Starting moles of each gas
    pub initial: GasComposition,
    /// CO2 absorbed by the ocean per in-sim day (moles)
    pub ocean_sink_per_day: f64,
    /// Status thresholds (percent)
    pub thresholds: StatusThresholds,
    /// Moles of CO2 released per kg of burnt plant biomass
    pub combustion_co2_per_kg: f64,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            initial: GasComposition::default(),
            ocean_sink_per_day: 120.0,
            thresholds: StatusThresholds::default(),
            combustion_co2_per_kg: 37.5,
        }
    }
}
