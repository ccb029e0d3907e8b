//! Combat logging
//!
//! Records all combat events for narration and post-encounter analysis.

use super::events::{CombatEvent, CombatEventKind};

/// A single entry in the combat log
#[derive(Debug, Clone)]
pub struct CombatLogEntry {
    /// Round the event occurred in
    pub round: u32,
    /// The structured event
    pub event: CombatEvent,
    /// Human-readable description of the event
    pub message: String,
}

/// The combat log storing all events of one encounter
#[derive(Debug, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current round, stamped onto new entries
    pub round: u32,
}

impl CombatLog {
    /// Clear the log for a new encounter
    pub fn clear(&mut self) {
        self.entries.clear();
        self.round = 0;
    }

    /// Add a new event to the log
    pub fn push(&mut self, event: CombatEvent) {
        let message = event.describe();
        self.entries.push(CombatLogEntry {
            round: self.round,
            event,
            message,
        });
    }

    /// Get entries filtered by event kind
    pub fn filter_by_kind(&self, kind: CombatEventKind) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event.kind() == kind)
            .collect()
    }

    /// Total damage recorded for a given action display name
    pub fn damage_by_action(&self, action_name: &str) -> i32 {
        self.entries
            .iter()
            .filter_map(|e| match &e.event {
                CombatEvent::Damage { action, amount, .. } if action == action_name => {
                    Some(*amount)
                }
                _ => None,
            })
            .sum()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }
}
