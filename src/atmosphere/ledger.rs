//! Gas-exchange ledger.
//!
//! Agents are registered by handle. Every tick the ledger pulls the
//! instantaneous O2/CO2 rate of each registered agent, integrates the net flux
//! into the pool and re-derives the environmental status.

use super::gas::{Gas, GasPercentages, GasPool};
use super::status::{EnvironmentalStatus, StatusChange, StatusThresholds};
use super::AtmosphereConfig;
use crate::agents::{AgentId, AgentKind};
use crate::environment::Conditions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What the ledger needs from an agent
pub trait GasExchange {
    fn is_alive(&self) -> bool;
    fn kind(&self) -> AgentKind;
    /// Instantaneous O2 rate (mol/s), recomputed from current state
    fn current_o2_rate(&self, conditions: &Conditions) -> f64;
    /// Instantaneous CO2 rate (mol/s), recomputed from current state
    fn current_co2_rate(&self, conditions: &Conditions) -> f64;
}

/// Resolves registry handles to live objects. `None` means destroyed.
pub trait AgentSource {
    fn lookup(&self, id: AgentId) -> Option<&dyn GasExchange>;
}

/// Net rates of the last tick, split by contributor (mol/s)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RateBreakdown {
    pub plants_o2: f64,
    pub plants_co2: f64,
    pub herbivores_o2: f64,
    pub herbivores_co2: f64,
    pub carnivores_o2: f64,
    pub carnivores_co2: f64,
    pub ocean_co2: f64,
}

impl RateBreakdown {
    pub fn net_o2(&self) -> f64 {
        self.plants_o2 + self.herbivores_o2 + self.carnivores_o2
    }

    pub fn net_co2(&self) -> f64 {
        self.plants_co2 + self.herbivores_co2 + self.carnivores_co2 + self.ocean_co2
    }

    fn add(&mut self, kind: AgentKind, o2: f64, co2: f64) {
        match kind {
            AgentKind::Tree | AgentKind::Grass => {
                self.plants_o2 += o2;
                self.plants_co2 += co2;
            }
            AgentKind::Herbivore => {
                self.herbivores_o2 += o2;
                self.herbivores_co2 += co2;
            }
            AgentKind::Carnivore => {
                self.carnivores_o2 += o2;
                self.carnivores_co2 += co2;
            }
        }
    }
}

/// Result of one ledger tick
#[derive(Clone, Copy, Debug, Default)]
pub struct TickReport {
    pub rates: RateBreakdown,
    pub status_change: Option<StatusChange>,
    /// Dangling or dead entries removed during this tick
    pub purged: usize,
}

/// Insertion-ordered set of handles with O(1) insert/remove.
///
/// Order only changes on removal (swap-remove), so aggregation order is
/// reproducible for a given sequence of operations.
#[derive(Clone, Debug, Default)]
struct Registry {
    ids: Vec<AgentId>,
    slots: HashMap<AgentId, usize>,
}

impl Registry {
    fn insert(&mut self, id: AgentId) -> bool {
        if self.slots.contains_key(&id) {
            return false;
        }
        self.slots.insert(id, self.ids.len());
        self.ids.push(id);
        true
    }

    fn remove(&mut self, id: AgentId) -> bool {
        let Some(index) = self.slots.remove(&id) else {
            return false;
        };
        self.ids.swap_remove(index);
        if let Some(&moved) = self.ids.get(index) {
            self.slots.insert(moved, index);
        }
        true
    }

    fn contains(&self, id: AgentId) -> bool {
        self.slots.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.slots.clear();
    }
}

/// The shared atmosphere
#[derive(Clone, Debug)]
pub struct GasLedger {
    pool: GasPool,
    thresholds: StatusThresholds,
    registry: Registry,
    /// Ocean sink, mol/s of CO2 removed
    ocean_sink_rate: f64,
    speed_multiplier: f64,
    /// Status at the end of the previous tick, for edge detection only
    last_status: EnvironmentalStatus,
    last_rates: RateBreakdown,
    status_changes: u64,
}

impl GasLedger {
    /// Create a ledger. `seconds_per_day` converts the ocean sink from mol/day.
    pub fn new(config: &AtmosphereConfig, seconds_per_day: f64, speed_multiplier: f64) -> Self {
        Self::from_pool(
            GasPool::new(&config.initial),
            config,
            seconds_per_day,
            speed_multiplier,
        )
    }

    /// Create a ledger around an existing pool (e.g. loaded from a checkpoint)
    pub fn from_pool(
        pool: GasPool,
        config: &AtmosphereConfig,
        seconds_per_day: f64,
        speed_multiplier: f64,
    ) -> Self {
        let thresholds = config.thresholds.sanitized();
        let ocean_sink_rate = if seconds_per_day > 0.0 && seconds_per_day.is_finite() {
            config.ocean_sink_per_day.max(0.0) / seconds_per_day
        } else {
            0.0
        };
        let last_status = thresholds.status_of(&pool);

        Self {
            pool,
            thresholds,
            registry: Registry::default(),
            ocean_sink_rate,
            speed_multiplier: if speed_multiplier.is_finite() {
                speed_multiplier.max(0.0)
            } else {
                1.0
            },
            last_status,
            last_rates: RateBreakdown::default(),
            status_changes: 0,
        }
    }

    /// Register an agent. Returns false if it was already registered.
    pub fn register(&mut self, id: AgentId) -> bool {
        self.registry.insert(id)
    }

    /// Unregister an agent. Returns false if it was not registered.
    pub fn unregister(&mut self, id: AgentId) -> bool {
        self.registry.remove(id)
    }

    pub fn is_registered(&self, id: AgentId) -> bool {
        self.registry.contains(id)
    }

    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    /// Drop every registration
    pub fn clear_registry(&mut self) {
        self.registry.clear();
    }

    /// Integrate one tick of net flux
    pub fn tick(
        &mut self,
        dt: f64,
        agents: &dyn AgentSource,
        conditions: &Conditions,
    ) -> TickReport {
        let mut report = TickReport::default();
        if dt <= 0.0 || !dt.is_finite() {
            report.rates = self.last_rates;
            return report;
        }

        let mut rates = RateBreakdown {
            ocean_co2: -self.ocean_sink_rate,
            ..RateBreakdown::default()
        };
        let mut stale = Vec::new();

        for &id in &self.registry.ids {
            match agents.lookup(id) {
                Some(agent) if agent.is_alive() => {
                    let o2 = agent.current_o2_rate(conditions);
                    let co2 = agent.current_co2_rate(conditions);
                    if o2.is_finite() && co2.is_finite() {
                        rates.add(agent.kind(), o2, co2);
                    }
                }
                _ => stale.push(id),
            }
        }

        for id in &stale {
            self.registry.remove(*id);
        }
        if !stale.is_empty() {
            log::debug!("Ledger purged {} dangling registrations", stale.len());
        }
        report.purged = stale.len();

        let scale = dt * self.speed_multiplier;
        self.pool
            .apply_flux(rates.net_o2() * scale, rates.net_co2() * scale);

        self.last_rates = rates;
        report.rates = rates;
        report.status_change = self.refresh_status();
        report
    }

    /// One-time injection of a non-inert gas (e.g. a burning tree)
    pub fn add_spike(&mut self, moles: f64, gas: Gas) -> bool {
        if gas.is_inert() {
            log::warn!("Ignoring {} mol spike of inert gas {}", moles, gas.symbol());
            return false;
        }
        self.pool.add(gas, moles)
    }

    /// CO2 spike, the common case
    pub fn add_co2_spike(&mut self, moles: f64) -> bool {
        self.add_spike(moles, Gas::CarbonDioxide)
    }

    /// Re-derive status from the pool, emitting an edge event on change
    fn refresh_status(&mut self) -> Option<StatusChange> {
        let status = self.thresholds.status_of(&self.pool);
        if status == self.last_status {
            return None;
        }

        let change = StatusChange {
            from: self.last_status,
            to: status,
        };
        self.last_status = status;
        self.status_changes += 1;

        let o2 = self.pool.percentage(Gas::Oxygen);
        let co2 = self.pool.percentage(Gas::CarbonDioxide);
        if change.is_escalation() && status >= EnvironmentalStatus::Danger {
            log::warn!(
                "Atmosphere status {} -> {} (O2 {:.3}%, CO2 {:.4}%)",
                change.from,
                change.to,
                o2,
                co2
            );
        } else {
            log::info!(
                "Atmosphere status {} -> {} (O2 {:.3}%, CO2 {:.4}%)",
                change.from,
                change.to,
                o2,
                co2
            );
        }
        Some(change)
    }

    pub fn pool(&self) -> &GasPool {
        &self.pool
    }

    pub fn moles(&self, gas: Gas) -> f64 {
        self.pool.moles(gas)
    }

    pub fn total_moles(&self) -> f64 {
        self.pool.total_moles()
    }

    pub fn percentages(&self) -> GasPercentages {
        self.pool.percentages()
    }

    pub fn percentage(&self, gas: Gas) -> f64 {
        self.pool.percentage(gas)
    }

    /// Current status, always recomputed from the pool
    pub fn status(&self) -> EnvironmentalStatus {
        self.thresholds.status_of(&self.pool)
    }

    pub fn thresholds(&self) -> &StatusThresholds {
        &self.thresholds
    }

    /// Rates integrated during the last tick
    pub fn last_rates(&self) -> RateBreakdown {
        self.last_rates
    }

    /// Number of status transitions seen so far
    pub fn status_changes(&self) -> u64 {
        self.status_changes
    }

    pub fn ocean_sink_rate(&self) -> f64 {
        self.ocean_sink_rate
    }
}
