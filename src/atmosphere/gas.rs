//! Molar gas pool. Percentages are always derived from the moles.

use serde::{Deserialize, Serialize};

/// Gas species tracked by the atmosphere
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gas {
    WaterVapor,
    Nitrogen,
    Oxygen,
    Argon,
    CarbonDioxide,
}

impl Gas {
    pub const ALL: [Gas; 5] = [
        Gas::WaterVapor,
        Gas::Nitrogen,
        Gas::Oxygen,
        Gas::Argon,
        Gas::CarbonDioxide,
    ];

    /// Inert gases are never changed by any code path
    pub fn is_inert(&self) -> bool {
        matches!(self, Gas::Nitrogen | Gas::Argon)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Gas::WaterVapor => "H2O",
            Gas::Nitrogen => "N2",
            Gas::Oxygen => "O2",
            Gas::Argon => "Ar",
            Gas::CarbonDioxide => "CO2",
        }
    }
}

/// Initial gas composition in moles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GasComposition {
    pub water_vapor: f64,
    pub nitrogen: f64,
    pub oxygen: f64,
    pub argon: f64,
    pub carbon_dioxide: f64,
}

impl Default for GasComposition {
    /// Earth-like air
    fn default() -> Self {
        Self {
            water_vapor: 4000.0,
            nitrogen: 780_800.0,
            oxygen: 209_500.0,
            argon: 9300.0,
            carbon_dioxide: 415.0,
        }
    }
}

/// Five molar pools. Fields are private so the inert gases stay untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GasPool {
    water_vapor: f64,
    nitrogen: f64,
    oxygen: f64,
    argon: f64,
    carbon_dioxide: f64,
}

fn non_negative(moles: f64) -> f64 {
    if moles.is_finite() {
        moles.max(0.0)
    } else {
        0.0
    }
}

impl GasPool {
    pub fn new(composition: &GasComposition) -> Self {
        Self {
            water_vapor: non_negative(composition.water_vapor),
            nitrogen: non_negative(composition.nitrogen),
            oxygen: non_negative(composition.oxygen),
            argon: non_negative(composition.argon),
            carbon_dioxide: non_negative(composition.carbon_dioxide),
        }
    }

    pub fn moles(&self, gas: Gas) -> f64 {
        match gas {
            Gas::WaterVapor => self.water_vapor,
            Gas::Nitrogen => self.nitrogen,
            Gas::Oxygen => self.oxygen,
            Gas::Argon => self.argon,
            Gas::CarbonDioxide => self.carbon_dioxide,
        }
    }

    pub fn oxygen(&self) -> f64 {
        self.oxygen
    }

    pub fn carbon_dioxide(&self) -> f64 {
        self.carbon_dioxide
    }

    pub fn nitrogen(&self) -> f64 {
        self.nitrogen
    }

    pub fn argon(&self) -> f64 {
        self.argon
    }

    pub fn water_vapor(&self) -> f64 {
        self.water_vapor
    }

    /// Literal sum of the five pools
    pub fn total_moles(&self) -> f64 {
        self.water_vapor + self.nitrogen + self.oxygen + self.argon + self.carbon_dioxide
    }

    /// Percentage of one gas (0 when the pool is empty)
    pub fn percentage(&self, gas: Gas) -> f64 {
        let total = self.total_moles();
        if total <= 0.0 {
            return 0.0;
        }
        self.moles(gas) / total * 100.0
    }

    pub fn percentages(&self) -> GasPercentages {
        GasPercentages {
            water_vapor: self.percentage(Gas::WaterVapor),
            nitrogen: self.percentage(Gas::Nitrogen),
            oxygen: self.percentage(Gas::Oxygen),
            argon: self.percentage(Gas::Argon),
            carbon_dioxide: self.percentage(Gas::CarbonDioxide),
        }
    }

    /// Add a signed O2/CO2 delta. Both pools are clamped to >= 0.
    pub fn apply_flux(&mut self, delta_o2: f64, delta_co2: f64) {
        if delta_o2.is_finite() {
            self.oxygen = (self.oxygen + delta_o2).max(0.0);
        }
        if delta_co2.is_finite() {
            self.carbon_dioxide = (self.carbon_dioxide + delta_co2).max(0.0);
        }
    }

    /// Add moles of a non-inert gas. Returns false (and changes nothing) for inert gases.
    pub fn add(&mut self, gas: Gas, moles: f64) -> bool {
        if gas.is_inert() || !moles.is_finite() {
            return false;
        }
        let pool = match gas {
            Gas::WaterVapor => &mut self.water_vapor,
            Gas::Oxygen => &mut self.oxygen,
            Gas::CarbonDioxide => &mut self.carbon_dioxide,
            Gas::Nitrogen | Gas::Argon => return false,
        };
        *pool = (*pool + moles).max(0.0);
        true
    }
}

impl Default for GasPool {
    fn default() -> Self {
        Self::new(&GasComposition::default())
    }
}

/// Derived percentages. A view, never written back into the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GasPercentages {
    pub water_vapor: f64,
    pub nitrogen: f64,
    pub oxygen: f64,
    pub argon: f64,
    pub carbon_dioxide: f64,
}

impl GasPercentages {
    pub fn sum(&self) -> f64 {
        self.water_vapor + self.nitrogen + self.oxygen + self.argon + self.carbon_dioxide
    }
}
