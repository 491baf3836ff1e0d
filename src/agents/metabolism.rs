//! Shared respiration formulas.

use serde::{Deserialize, Serialize};

/// Temperature at which base rates are quoted (°C)
pub const REFERENCE_TEMPERATURE: f64 = 20.0;

/// Rate multiplier for a temperature: `Q10^((T - 20) / 10)`
#[inline]
pub fn q10_factor(q10: f64, temperature: f64) -> f64 {
    q10.powf((temperature - REFERENCE_TEMPERATURE) / 10.0)
}

/// Basal metabolism of an animal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasalMetabolism {
    /// Basal metabolic rate (mol O2 / s / kg at 20 °C, at rest)
    pub bmr: f64,
    pub q10: f64,
    /// Extra cost per °C away from the comfort temperature
    pub thermoreg_coefficient: f64,
    /// Thermoneutral temperature (°C)
    pub comfort_temperature: f64,
}

impl Default for BasalMetabolism {
    fn default() -> Self {
        Self {
            bmr: 0.002,
            q10: 2.0,
            thermoreg_coefficient: 0.02,
            comfort_temperature: 22.0,
        }
    }
}

impl BasalMetabolism {
    /// `1 + k * |T - comfort|`
    #[inline]
    pub fn thermoregulation_factor(&self, temperature: f64) -> f64 {
        1.0 + self.thermoreg_coefficient * (temperature - self.comfort_temperature).abs()
    }

    /// Instantaneous O2 consumption (mol/s).
    ///
    /// `BMR * biomass * Q10^((T-20)/10) * (1 + k|T - comfort|) * activity`
    pub fn total_respiration(
        &self,
        biomass: f64,
        temperature: f64,
        activity_multiplier: f64,
    ) -> f64 {
        let base = self.bmr * biomass.max(0.0);
        base * q10_factor(self.q10, temperature)
            * self.thermoregulation_factor(temperature)
            * activity_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q10() {
        assert_eq!(q10_factor(2.5, 20.0), 1.0);
        assert!((q10_factor(2.0, 30.0) - 2.0).abs() < 1e-12);
        assert!((q10_factor(2.0, 10.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_total_respiration() {
        let m = BasalMetabolism {
            bmr: 0.001,
            q10: 2.0,
            thermoreg_coefficient: 0.05,
            comfort_temperature: 20.0,
        };
        // At comfort and reference temperature only BMR * biomass * activity remains
        assert!((m.total_respiration(10.0, 20.0, 1.5) - 0.015).abs() < 1e-12);

        // 10 °C warmer: Q10 doubles it, thermoregulation adds 50%
        assert!((m.total_respiration(10.0, 30.0, 1.0) - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_negative_biomass_contributes_nothing() {
        let m = BasalMetabolism::default();
        assert_eq!(m.total_respiration(-3.0, 25.0, 2.0), 0.0);
    }
}
