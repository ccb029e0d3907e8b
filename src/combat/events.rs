//! Combat events
//!
//! Structured per-action outcomes emitted by the resolver, executor and
//! dispatcher. Rendering is a collaborator concern; the engine only records
//! these plus a prebuilt human-readable message in the combat log.

use crate::effects::EffectKind;
use crate::rules::SkillId;

/// One structured combat outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    /// A new round began
    RoundStarted { round: u32 },
    /// Damage dealt to a target (basic attack or skill)
    Damage {
        actor: String,
        target: String,
        /// Action display name ("attack" for basic attacks)
        action: String,
        amount: i32,
        crit: bool,
        weak: bool,
        resist: bool,
        killing_blow: bool,
    },
    /// Cleave splash damage to a secondary target
    Splash {
        actor: String,
        target: String,
        amount: i32,
    },
    /// An attack or damage skill missed
    Miss {
        actor: String,
        target: String,
        action: String,
        /// The hit chance that was rolled against
        chance: f32,
    },
    /// A skill failed its independent success gate
    Fizzle {
        actor: String,
        skill: SkillId,
        chance: f32,
    },
    /// The actor's action was cancelled by a stun
    Stunned { actor: String },
    /// A skill was used (logged before per-target resolution)
    SkillUsed { actor: String, skill: SkillId },
    /// A status effect was applied
    EffectApplied {
        target: String,
        kind: EffectKind,
        turns: u32,
    },
    /// A status effect expired or was consumed
    EffectRemoved { target: String, kind: EffectKind },
    /// Periodic damage from a status effect
    EffectTick {
        target: String,
        kind: EffectKind,
        amount: i32,
    },
    /// An evade effect nullified an incoming hit
    Evaded { target: String },
    /// A shield absorbed part of an incoming hit
    Absorbed {
        target: String,
        amount: i32,
        remaining: i32,
    },
    /// A survive-fatal guard pinned the target at 1 health
    LastStand { target: String },
    /// An extra-turn marker was consumed
    ExtraTurn { actor: String },
    /// Mana restored to the actor (draining debuff)
    ManaRestored { actor: String, amount: i32 },
    /// A combatant died
    Death { target: String },
    /// The encounter finished
    EncounterEnded {
        /// Winning team, None on a round-ceiling draw
        winner: Option<u8>,
        rounds: u32,
    },
}

/// Event categories for log filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatEventKind {
    Turn,
    Damage,
    Miss,
    SkillUsed,
    EffectApplied,
    EffectRemoved,
    EffectTick,
    Mitigation,
    Stunned,
    Resource,
    Death,
    Encounter,
}

impl CombatEvent {
    /// The filtering category for this event.
    pub fn kind(&self) -> CombatEventKind {
        match self {
            CombatEvent::RoundStarted { .. } | CombatEvent::ExtraTurn { .. } => {
                CombatEventKind::Turn
            }
            CombatEvent::Damage { .. } | CombatEvent::Splash { .. } => CombatEventKind::Damage,
            CombatEvent::Miss { .. } | CombatEvent::Fizzle { .. } => CombatEventKind::Miss,
            CombatEvent::Stunned { .. } => CombatEventKind::Stunned,
            CombatEvent::SkillUsed { .. } => CombatEventKind::SkillUsed,
            CombatEvent::EffectApplied { .. } => CombatEventKind::EffectApplied,
            CombatEvent::EffectRemoved { .. } => CombatEventKind::EffectRemoved,
            CombatEvent::EffectTick { .. } => CombatEventKind::EffectTick,
            CombatEvent::Evaded { .. }
            | CombatEvent::Absorbed { .. }
            | CombatEvent::LastStand { .. } => CombatEventKind::Mitigation,
            CombatEvent::ManaRestored { .. } => CombatEventKind::Resource,
            CombatEvent::Death { .. } => CombatEventKind::Death,
            CombatEvent::EncounterEnded { .. } => CombatEventKind::Encounter,
        }
    }

    /// Human-readable description stored alongside the event.
    pub fn describe(&self) -> String {
        match self {
            CombatEvent::RoundStarted { round } => format!("=== Round {round} ==="),
            CombatEvent::Damage {
                actor,
                target,
                action,
                amount,
                crit,
                weak,
                resist,
                killing_blow,
            } => {
                let mut msg = format!("{actor} hits {target} with {action} for {amount}");
                if *crit {
                    msg.push_str(" (crit)");
                }
                if *weak {
                    msg.push_str(" (weakness)");
                } else if *resist {
                    msg.push_str(" (resisted)");
                }
                if *killing_blow {
                    msg.push_str(", killing them");
                }
                msg
            }
            CombatEvent::Splash {
                actor,
                target,
                amount,
            } => format!("{actor}'s cleave splashes {target} for {amount}"),
            CombatEvent::Miss {
                actor,
                target,
                action,
                chance,
            } => format!(
                "{actor}'s {action} misses {target} ({:.0}% chance)",
                chance * 100.0
            ),
            CombatEvent::Fizzle {
                actor,
                skill,
                chance,
            } => format!(
                "{actor}'s {skill:?} fizzles ({:.0}% success chance)",
                chance * 100.0
            ),
            CombatEvent::Stunned { actor } => format!("{actor} is stunned and cannot act"),
            CombatEvent::SkillUsed { actor, skill } => format!("{actor} uses {skill:?}"),
            CombatEvent::EffectApplied {
                target,
                kind,
                turns,
            } => format!("{target} gains {kind:?} for {turns} turns"),
            CombatEvent::EffectRemoved { target, kind } => {
                format!("{target} loses {kind:?}")
            }
            CombatEvent::EffectTick {
                target,
                kind,
                amount,
            } => format!("{target} suffers {amount} from {kind:?}"),
            CombatEvent::Evaded { target } => format!("{target} evades the attack"),
            CombatEvent::Absorbed {
                target,
                amount,
                remaining,
            } => format!("{target}'s shield absorbs {amount} ({remaining} left)"),
            CombatEvent::LastStand { target } => {
                format!("{target} holds on at 1 health")
            }
            CombatEvent::ExtraTurn { actor } => format!("{actor} gains an extra turn"),
            CombatEvent::ManaRestored { actor, amount } => {
                format!("{actor} recovers {amount} mana")
            }
            CombatEvent::Death { target } => format!("{target} falls"),
            CombatEvent::EncounterEnded { winner, rounds } => match winner {
                Some(team) => format!("team {team} wins after {rounds} rounds"),
                None => format!("encounter drawn after {rounds} rounds"),
            },
        }
    }
}
