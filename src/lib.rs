//! BattleSim - Turn-Based RPG Combat Engine
//!
//! A deterministic combat engine for turn-based RPG encounters: hit/miss
//! resolution, damage magnitude, status-effect application and expiry, and
//! utility-scored action selection for AI-controlled combatants.
//!
//! The engine is driven entirely by a caller-supplied [`rules::RulesTable`]
//! (curve parameters, skill/status/archetype definitions) and a seeded
//! [`rng::GameRng`], so the same seed always reproduces the same encounter.
//!
//! This library exposes the core engine modules for testing and reuse.

pub mod ai;
pub mod combat;
pub mod combatant;
pub mod constants;
pub mod dispatch;
pub mod effects;
pub mod encounter;
pub mod rng;
pub mod rules;
pub mod skills;

// Re-export commonly used types
pub use combat::events::{CombatEvent, CombatEventKind};
pub use combat::log::CombatLog;
pub use combat::{CritTier, DamageSource, Element};
pub use combatant::{Combatant, Controller, StatBlock};
pub use effects::{EffectKind, StatusEffect};
pub use encounter::{Encounter, EncounterOutcome};
pub use rng::GameRng;
pub use rules::{Archetype, PassiveId, RulesError, RulesTable, SkillId};
