//! Arena holding every agent, backed by a generational slot map.
//!
//! Handles stay valid while the agent exists. Removing an agent bumps its
//! slot's version, so a stale handle resolves to `None` instead of to
//! whatever reuses the slot.

use super::Agent;
use crate::atmosphere::{AgentSource, GasExchange};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use slotmap::{Key, KeyData, SlotMap};

slotmap::new_key_type! {
    /// Stable agent handle
    pub struct AgentId;
}

impl AgentId {
    /// Handle from a raw slot index and generation, for tools and tests.
    /// Only handles returned by an arena resolve to agents.
    pub fn new(index: u32, generation: u32) -> Self {
        let ffi = (u64::from(generation.wrapping_mul(2).wrapping_add(1)) << 32) | u64::from(index);
        Self::from(KeyData::from_ffi(ffi))
    }

    pub fn index(&self) -> u32 {
        (self.data().as_ffi() & 0xffff_ffff) as u32
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:?}", self.data())
    }
}

/// Arena of agents with O(1) insert, lookup and removal
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentArena {
    agents: SlotMap<AgentId, Agent>,
}

impl AgentArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an agent built from its freshly assigned handle
    pub fn insert_with<F>(&mut self, build: F) -> AgentId
    where
        F: FnOnce(AgentId) -> Agent,
    {
        self.agents.insert_with_key(build)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    /// Destroy an agent. Stale or repeated removals return `None`.
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(id)
    }

    /// Number of stored agents, dead or alive
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents in slot order
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.agents.iter()
    }

    /// Snapshot of handles, safe to hold while mutating the arena
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().collect()
    }

    /// Run `update` on every agent in parallel, collecting non-`None` results in slot order.
    ///
    /// `update` only sees its own agent, so the outcome does not depend on scheduling.
    pub fn par_update<R, F>(&mut self, update: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&mut Agent) -> Option<R> + Sync + Send,
    {
        let agents: Vec<&mut Agent> = self.agents.values_mut().collect();
        agents.into_par_iter().filter_map(update).collect()
    }
}

impl AgentSource for AgentArena {
    fn lookup(&self, id: AgentId) -> Option<&dyn GasExchange> {
        self.get(id).map(|agent| agent as &dyn GasExchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::plant::{Plant, PlantKind, PlantSpecies};
    use crate::habitat::Point;

    fn grass(id: AgentId) -> Agent {
        Agent::Plant(Plant::new(
            id,
            PlantKind::Grass,
            PlantSpecies::grass(),
            Point::new(1.0, 1.0),
            0.0,
        ))
    }

    #[test]
    fn test_insert_get_remove() {
        let mut arena = AgentArena::new();
        let a = arena.insert_with(grass);
        let b = arena.insert_with(grass);

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a).map(|ag| ag.id()), Some(a));

        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        assert!(arena.get(a).is_none());
        assert!(arena.contains(b));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut arena = AgentArena::new();
        let old = arena.insert_with(grass);
        arena.remove(old);

        let new = arena.insert_with(grass);
        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);
        assert!(arena.get(old).is_none());
        assert!(arena.get(new).is_some());
    }

    #[test]
    fn test_ids_in_slot_order() {
        let mut arena = AgentArena::new();
        let ids: Vec<_> = (0..5).map(|_| arena.insert_with(grass)).collect();
        assert_eq!(arena.ids(), ids);
    }

    #[test]
    fn test_raw_handles_distinct() {
        assert_ne!(AgentId::new(0, 0), AgentId::new(1, 0));
        assert_ne!(AgentId::new(3, 0), AgentId::new(3, 1));
        assert_eq!(AgentId::new(7, 2).index(), 7);
    }

    #[test]
    fn test_par_update_collects_in_order() {
        let mut arena = AgentArena::new();
        let ids: Vec<_> = (0..50).map(|_| arena.insert_with(grass)).collect();
        let seen = arena.par_update(|agent| Some(agent.id()));
        assert_eq!(seen, ids);
    }
}
