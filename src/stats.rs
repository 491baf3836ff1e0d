//! Statistics tracking for the simulation.

use crate::agents::{AgentArena, AgentKind};
use crate::atmosphere::{EnvironmentalStatus, GasLedger, GasPercentages, RateBreakdown};
use crate::environment::{DayPhase, EnvironmentClock};
use serde::{Deserialize, Serialize};

/// Statistics snapshot for a simulation step
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Current simulation step
    pub time: u64,
    /// Simulated seconds since start
    pub elapsed: f64,
    pub day: u32,
    pub hour: f64,
    pub phase: DayPhase,
    pub temperature: f64,
    pub photosynthetic_efficiency: f64,
    pub light_intensity: f64,
    /// Living agents per kind
    pub trees: usize,
    pub grass: usize,
    pub herbivores: usize,
    pub carnivores: usize,
    /// Total living biomass per trophic level (kg)
    pub plant_biomass: f64,
    pub herbivore_biomass: f64,
    pub carnivore_biomass: f64,
    /// Mean carnivore hunger fraction
    pub carnivore_hunger_mean: f64,
    /// Births this step
    pub births: usize,
    /// Deaths this step
    pub deaths: usize,
    pub oxygen_moles: f64,
    pub carbon_dioxide_moles: f64,
    pub percentages: GasPercentages,
    pub status: EnvironmentalStatus,
    /// Gas exchange of the last tick by contributor (mol/s)
    pub rates: RateBreakdown,
    pub respawn_backlog: usize,
    /// Steps per second (performance)
    pub steps_per_second: f32,
}

impl Stats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats from current simulation state
    pub fn update(&mut self, agents: &AgentArena, ledger: &GasLedger, clock: &EnvironmentClock) {
        self.trees = 0;
        self.grass = 0;
        self.herbivores = 0;
        self.carnivores = 0;
        self.plant_biomass = 0.0;
        self.herbivore_biomass = 0.0;
        self.carnivore_biomass = 0.0;
        let mut hunger_sum = 0.0;

        for (_, agent) in agents.iter().filter(|(_, a)| a.is_alive()) {
            match agent.kind() {
                AgentKind::Tree => {
                    self.trees += 1;
                    self.plant_biomass += agent.biomass();
                }
                AgentKind::Grass => {
                    self.grass += 1;
                    self.plant_biomass += agent.biomass();
                }
                AgentKind::Herbivore => {
                    self.herbivores += 1;
                    self.herbivore_biomass += agent.biomass();
                }
                AgentKind::Carnivore => {
                    self.carnivores += 1;
                    self.carnivore_biomass += agent.biomass();
                    if let Some(c) = agent.as_carnivore() {
                        hunger_sum += c.hunger_fraction();
                    }
                }
            }
        }
        self.carnivore_hunger_mean = if self.carnivores > 0 {
            hunger_sum / self.carnivores as f64
        } else {
            0.0
        };

        self.day = clock.day();
        self.hour = clock.clock_hour();
        self.phase = clock.phase();
        self.temperature = clock.temperature();
        self.photosynthetic_efficiency = clock.photosynthetic_efficiency();
        self.light_intensity = clock.light_intensity();

        let pool = ledger.pool();
        self.oxygen_moles = pool.oxygen();
        self.carbon_dioxide_moles = pool.carbon_dioxide();
        self.percentages = ledger.percentages();
        self.status = ledger.status();
        self.rates = ledger.last_rates();
    }

    /// Living agents of one kind
    pub fn population(&self, kind: AgentKind) -> usize {
        match kind {
            AgentKind::Tree => self.trees,
            AgentKind::Grass => self.grass,
            AgentKind::Herbivore => self.herbivores,
            AgentKind::Carnivore => self.carnivores,
        }
    }

    pub fn total_population(&self) -> usize {
        self.trees + self.grass + self.herbivores + self.carnivores
    }

    /// Save stats to JSON file
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load stats from JSON file
    pub fn load_json(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | Day {:3} {:02.0}h {:9} {:5.1}°C | Tree:{:3} Grass:{:4} Herb:{:3} Carn:{:3} | O2 {:6.3}% CO2 {:6.4}% | {}",
            self.time,
            self.day,
            self.hour.floor(),
            self.phase.name(),
            self.temperature,
            self.trees,
            self.grass,
            self.herbivores,
            self.carnivores,
            self.percentages.oxygen,
            self.percentages.carbon_dioxide,
            self.status,
        )
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// All recorded stats snapshots
    pub snapshots: Vec<Stats>,
    /// Recording interval
    pub interval: u64,
}

impl StatsHistory {
    /// Create new history with recording interval
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval: interval.max(1),
        }
    }

    /// Record a stats snapshot
    pub fn record(&mut self, stats: Stats) {
        self.snapshots.push(stats);
    }

    /// Get stats at a specific time (approximate)
    pub fn get_at(&self, time: u64) -> Option<&Stats> {
        let index = (time / self.interval) as usize;
        self.snapshots.get(index)
    }

    /// Population of one kind over time
    pub fn population_series(&self, kind: AgentKind) -> Vec<(u64, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.time, s.population(kind)))
            .collect()
    }

    /// Oxygen percentage over time
    pub fn oxygen_series(&self) -> Vec<(u64, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.time, s.percentages.oxygen))
            .collect()
    }

    /// Carbon dioxide percentage over time
    pub fn carbon_dioxide_series(&self) -> Vec<(u64, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.time, s.percentages.carbon_dioxide))
            .collect()
    }

    /// Worst status seen so far
    pub fn worst_status(&self) -> EnvironmentalStatus {
        self.snapshots
            .iter()
            .map(|s| s.status)
            .max()
            .unwrap_or_default()
    }

    /// Save history to file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Agent, AgentId, Plant, PlantKind, PlantSpecies};
    use crate::atmosphere::AtmosphereConfig;
    use crate::environment::ClockConfig;
    use crate::habitat::Point;
    use tempfile::tempdir;

    fn plant(id: AgentId, kind: PlantKind, species: PlantSpecies) -> Agent {
        Agent::Plant(Plant::new(id, kind, species, Point::default(), 0.0))
    }

    #[test]
    fn test_stats_update() {
        let mut agents = AgentArena::new();
        for _ in 0..3 {
            agents.insert_with(|id| plant(id, PlantKind::Grass, PlantSpecies::grass()));
        }
        let tree = agents.insert_with(|id| plant(id, PlantKind::Tree, PlantSpecies::tree()));
        if let Some(agent) = agents.get_mut(tree) {
            agent.body_mut().kill(crate::agents::DeathCause::Burned);
        }

        let ledger = GasLedger::new(&AtmosphereConfig::default(), 600.0, 1.0);
        let clock = EnvironmentClock::new(&ClockConfig::default());

        let mut stats = Stats::new();
        stats.update(&agents, &ledger, &clock);

        assert_eq!(stats.grass, 3);
        assert_eq!(stats.trees, 0);
        assert!((stats.plant_biomass - 3.0).abs() < 1e-12);
        assert_eq!(stats.status, EnvironmentalStatus::Healthy);
        assert!((stats.percentages.sum() - 100.0).abs() < 1e-9);
        assert_eq!(stats.day, 1);
    }

    #[test]
    fn test_stats_history() {
        let mut history = StatsHistory::new(10);

        for i in 0..5 {
            let mut stats = Stats::new();
            stats.time = i * 10;
            stats.herbivores = (i + 1) as usize * 100;
            if i == 3 {
                stats.status = EnvironmentalStatus::Danger;
            }
            history.record(stats);
        }

        let series = history.population_series(AgentKind::Herbivore);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], (0, 100));
        assert_eq!(series[4], (40, 500));
        assert_eq!(history.get_at(20).map(|s| s.time), Some(20));
        assert_eq!(history.worst_status(), EnvironmentalStatus::Danger);
    }

    #[test]
    fn test_history_json_roundtrip() {
        let mut history = StatsHistory::new(5);
        let mut stats = Stats::new();
        stats.time = 5;
        stats.carnivores = 4;
        history.record(stats);

        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let path = path.to_string_lossy().to_string();
        history.save(&path).unwrap();
        let loaded = StatsHistory::load(&path).unwrap();
        assert_eq!(loaded.population_series(AgentKind::Carnivore), vec![(5, 4)]);
    }
}
