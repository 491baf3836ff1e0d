//! Delayed effects, checked once per tick.
//!
//! Effects carry only what they need at fire time, never a handle to the
//! agent that scheduled them, so they stay valid if that agent dies.

use crate::agents::AgentKind;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledEffect {
    /// Run automatic reproduction for a kind
    Reproduce(AgentKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct Entry {
    due: f64,
    seq: u64,
    effect: ScheduledEffect,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `effect` to fire once simulation time reaches `due`
    pub fn schedule(&mut self, due: f64, effect: ScheduledEffect) {
        let due = if due.is_finite() { due } else { 0.0 };
        self.entries.push(Entry {
            due,
            seq: self.next_seq,
            effect,
        });
        self.next_seq += 1;
    }

    /// Remove and return every effect due at `now`, earliest first
    pub fn take_due(&mut self, now: f64) -> Vec<ScheduledEffect> {
        let mut due: Vec<Entry> = Vec::new();
        self.entries.retain(|entry| {
            if entry.due <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|entry| entry.effect).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the next pending effect
    pub fn next_due(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|entry| entry.due)
            .min_by(|a, b| a.total_cmp(b))
    }
}
