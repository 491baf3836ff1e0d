//! Plant respawn backlog.
//!
//! Every plant eaten to exhaustion adds one entry. At most one entry is
//! drained per tick, so a grazing frenzy never turns into a burst of spawns.

use super::{Birth, Nursery};
use crate::agents::{AgentId, AgentKind, PlantKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RespawnQueue {
    backlog: VecDeque<PlantKind>,
}

impl RespawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one plant eaten to exhaustion
    pub fn notify(&mut self, kind: PlantKind) {
        self.backlog.push_back(kind);
    }

    pub fn len(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.is_empty()
    }

    /// Spawn the oldest pending plant at a random habitable point
    pub fn drain_one(&mut self, nursery: &mut Nursery<'_>) -> Option<AgentId> {
        let kind = self.backlog.pop_front()?;
        let position = nursery.habitat.random_habitable_point(&mut *nursery.rng);
        let biomass = nursery.config.population.respawn_biomass;
        let id = nursery.spawn(Birth::new(AgentKind::from(kind), position).with_biomass(biomass));
        log::debug!("Respawned {:?} {} ({} pending)", kind, id, self.backlog.len());
        Some(id)
    }
}
