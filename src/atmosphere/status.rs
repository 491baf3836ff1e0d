//! Environmental status derived from O2/CO2 percentages.

use super::gas::{Gas, GasPool};
use serde::{Deserialize, Serialize};

/// Ordered severity. `max` of two statuses is the worse one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnvironmentalStatus {
    #[default]
    Healthy,
    Warning,
    Danger,
    Critical,
}

impl EnvironmentalStatus {
    pub fn name(&self) -> &'static str {
        match self {
            EnvironmentalStatus::Healthy => "Healthy",
            EnvironmentalStatus::Warning => "Warning",
            EnvironmentalStatus::Danger => "Danger",
            EnvironmentalStatus::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for EnvironmentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Six independent thresholds, in percent.
///
/// Oxygen is low-is-bad, carbon dioxide is high-is-bad.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    pub o2_warning: f64,
    pub o2_danger: f64,
    pub o2_critical: f64,
    pub co2_warning: f64,
    pub co2_danger: f64,
    pub co2_critical: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            o2_warning: 19.5,
            o2_danger: 16.0,
            o2_critical: 12.0,
            co2_warning: 0.1,
            co2_danger: 0.5,
            co2_critical: 1.0,
        }
    }
}

impl StatusThresholds {
    /// Severity from oxygen alone
    pub fn oxygen_status(&self, o2_percent: f64) -> EnvironmentalStatus {
        if o2_percent < self.o2_critical {
            EnvironmentalStatus::Critical
        } else if o2_percent < self.o2_danger {
            EnvironmentalStatus::Danger
        } else if o2_percent < self.o2_warning {
            EnvironmentalStatus::Warning
        } else {
            EnvironmentalStatus::Healthy
        }
    }

    /// Severity from carbon dioxide alone
    pub fn carbon_dioxide_status(&self, co2_percent: f64) -> EnvironmentalStatus {
        if co2_percent > self.co2_critical {
            EnvironmentalStatus::Critical
        } else if co2_percent > self.co2_danger {
            EnvironmentalStatus::Danger
        } else if co2_percent > self.co2_warning {
            EnvironmentalStatus::Warning
        } else {
            EnvironmentalStatus::Healthy
        }
    }

    /// Worse of the two one-sided classifications
    pub fn classify(&self, o2_percent: f64, co2_percent: f64) -> EnvironmentalStatus {
        self.oxygen_status(o2_percent)
            .max(self.carbon_dioxide_status(co2_percent))
    }

    /// Status of a pool, recomputed from its current moles
    pub fn status_of(&self, pool: &GasPool) -> EnvironmentalStatus {
        self.classify(
            pool.percentage(Gas::Oxygen),
            pool.percentage(Gas::CarbonDioxide),
        )
    }

    /// Order each side so warning/danger/critical escalate monotonically
    pub fn sanitized(&self) -> Self {
        let mut o2 = [self.o2_critical, self.o2_danger, self.o2_warning];
        o2.sort_by(f64::total_cmp);
        let mut co2 = [self.co2_warning, self.co2_danger, self.co2_critical];
        co2.sort_by(f64::total_cmp);

        let fixed = Self {
            o2_critical: o2[0],
            o2_danger: o2[1],
            o2_warning: o2[2],
            co2_warning: co2[0],
            co2_danger: co2[1],
            co2_critical: co2[2],
        };
        if o2 != [self.o2_critical, self.o2_danger, self.o2_warning]
            || co2 != [self.co2_warning, self.co2_danger, self.co2_critical]
        {
            log::warn!("status thresholds were out of order; reordered to {:?}", fixed);
        }
        fixed
    }
}

/// Edge event emitted once when the status changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub from: EnvironmentalStatus,
    pub to: EnvironmentalStatus,
}

impl StatusChange {
    pub fn is_escalation(&self) -> bool {
        self.to > self.from
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oxygen_levels() {
        let t = StatusThresholds::default();
        assert_eq!(t.oxygen_status(20.9), EnvironmentalStatus::Healthy);
        assert_eq!(t.oxygen_status(18.0), EnvironmentalStatus::Warning);
        assert_eq!(t.oxygen_status(14.0), EnvironmentalStatus::Danger);
        assert_eq!(t.oxygen_status(5.0), EnvironmentalStatus::Critical);
    }

    #[test]
    fn test_carbon_dioxide_levels() {
        let t = StatusThresholds::default();
        assert_eq!(t.carbon_dioxide_status(0.04), EnvironmentalStatus::Healthy);
        assert_eq!(t.carbon_dioxide_status(0.2), EnvironmentalStatus::Warning);
        assert_eq!(t.carbon_dioxide_status(0.7), EnvironmentalStatus::Danger);
        assert_eq!(t.carbon_dioxide_status(3.0), EnvironmentalStatus::Critical);
    }

    #[test]
    fn test_worse_side_wins() {
        let t = StatusThresholds::default();
        assert_eq!(t.classify(18.0, 3.0), EnvironmentalStatus::Critical);
        assert_eq!(t.classify(5.0, 0.04), EnvironmentalStatus::Critical);
        assert_eq!(t.classify(14.0, 0.2), EnvironmentalStatus::Danger);
        assert_eq!(t.classify(20.9, 0.04), EnvironmentalStatus::Healthy);
    }

    #[test]
    fn test_ordering() {
        assert!(EnvironmentalStatus::Critical > EnvironmentalStatus::Danger);
        assert!(EnvironmentalStatus::Danger > EnvironmentalStatus::Warning);
        assert!(EnvironmentalStatus::Warning > EnvironmentalStatus::Healthy);
    }

    #[test]
    fn test_sanitize_reorders() {
        let t = StatusThresholds {
            o2_warning: 10.0,
            o2_danger: 16.0,
            o2_critical: 19.5,
            ..StatusThresholds::default()
        };
        let fixed = t.sanitized();
        assert_eq!(fixed.o2_warning, 19.5);
        assert_eq!(fixed.o2_danger, 16.0);
        assert_eq!(fixed.o2_critical, 10.0);
    }
}
