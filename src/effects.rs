//! Status-Effect Pipeline
//!
//! Effect application/expiry, incoming-damage modification, periodic ticks
//! and extra-turn grants. The per-turn evaluation order is fixed:
//! start-of-turn hook, action resolution, end-of-turn hook. Both hooks funnel
//! into the same periodic-damage routine so duration bookkeeping stays
//! centralized.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::combat::events::CombatEvent;
use crate::combat::log::CombatLog;
use crate::combatant::Combatant;
use crate::rules::{DecrementPhase, EffectSpec, RulesError, RulesTable, StatusRule};

// ============================================================================
// Effect Types
// ============================================================================

/// Keys for the data-driven per-status rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Burn,
    Poison,
    Stun,
    Provoke,
    Evade,
    ReduceDamage,
    MagicShield,
    StrengthUp,
    IntellectDrain,
    ExtraTurn,
    SurviveFatal,
}

impl EffectKind {
    pub const ALL: [EffectKind; 11] = [
        EffectKind::Burn,
        EffectKind::Poison,
        EffectKind::Stun,
        EffectKind::Provoke,
        EffectKind::Evade,
        EffectKind::ReduceDamage,
        EffectKind::MagicShield,
        EffectKind::StrengthUp,
        EffectKind::IntellectDrain,
        EffectKind::ExtraTurn,
        EffectKind::SurviveFatal,
    ];
}

/// One active status effect. Each variant carries exactly the fields it
/// needs; there are no loose optional slots.
#[derive(Clone, Debug, PartialEq)]
pub enum StatusEffect {
    Burn { turns: u32 },
    Poison { turns: u32 },
    Stun { turns: u32 },
    Provoke { turns: u32 },
    Evade { turns: u32 },
    ReduceDamage { turns: u32, power: f32 },
    MagicShield { capacity: i32, absorbed: i32 },
    StrengthUp { turns: u32, power: f32 },
    IntellectDrain { turns: u32, power: f32 },
    ExtraTurn,
    SurviveFatal,
}

impl StatusEffect {
    pub fn kind(&self) -> EffectKind {
        match self {
            StatusEffect::Burn { .. } => EffectKind::Burn,
            StatusEffect::Poison { .. } => EffectKind::Poison,
            StatusEffect::Stun { .. } => EffectKind::Stun,
            StatusEffect::Provoke { .. } => EffectKind::Provoke,
            StatusEffect::Evade { .. } => EffectKind::Evade,
            StatusEffect::ReduceDamage { .. } => EffectKind::ReduceDamage,
            StatusEffect::MagicShield { .. } => EffectKind::MagicShield,
            StatusEffect::StrengthUp { .. } => EffectKind::StrengthUp,
            StatusEffect::IntellectDrain { .. } => EffectKind::IntellectDrain,
            StatusEffect::ExtraTurn => EffectKind::ExtraTurn,
            StatusEffect::SurviveFatal => EffectKind::SurviveFatal,
        }
    }

    /// Remaining duration in turns, if this effect is duration-bound.
    pub fn turns(&self) -> Option<u32> {
        match self {
            StatusEffect::Burn { turns }
            | StatusEffect::Poison { turns }
            | StatusEffect::Stun { turns }
            | StatusEffect::Provoke { turns }
            | StatusEffect::Evade { turns }
            | StatusEffect::ReduceDamage { turns, .. }
            | StatusEffect::StrengthUp { turns, .. }
            | StatusEffect::IntellectDrain { turns, .. } => Some(*turns),
            StatusEffect::MagicShield { .. }
            | StatusEffect::ExtraTurn
            | StatusEffect::SurviveFatal => None,
        }
    }

    /// Mutable duration for tick bookkeeping.
    pub(crate) fn turns_mut(&mut self) -> Option<&mut u32> {
        match self {
            StatusEffect::Burn { turns }
            | StatusEffect::Poison { turns }
            | StatusEffect::Stun { turns }
            | StatusEffect::Provoke { turns }
            | StatusEffect::Evade { turns }
            | StatusEffect::ReduceDamage { turns, .. }
            | StatusEffect::StrengthUp { turns, .. }
            | StatusEffect::IntellectDrain { turns, .. } => Some(turns),
            StatusEffect::MagicShield { .. }
            | StatusEffect::ExtraTurn
            | StatusEffect::SurviveFatal => None,
        }
    }

    /// Build an effect instance from a skill's effect spec and the status
    /// rule defaults. Shield capacity is fixed at application time from the
    /// holder's max health.
    pub fn from_spec(spec: &EffectSpec, rule: &StatusRule, max_health: i32) -> StatusEffect {
        match spec.kind {
            EffectKind::Burn => StatusEffect::Burn { turns: spec.turns },
            EffectKind::Poison => StatusEffect::Poison { turns: spec.turns },
            EffectKind::Stun => StatusEffect::Stun { turns: spec.turns },
            EffectKind::Provoke => StatusEffect::Provoke { turns: spec.turns },
            EffectKind::Evade => StatusEffect::Evade { turns: spec.turns },
            EffectKind::ReduceDamage => {
                let power = if spec.power > 0.0 {
                    spec.power
                } else {
                    rule.damage_multiplier
                };
                StatusEffect::ReduceDamage {
                    turns: spec.turns,
                    power,
                }
            }
            EffectKind::MagicShield => {
                let fraction = if spec.power > 0.0 {
                    spec.power
                } else {
                    rule.absorb_fraction
                };
                StatusEffect::MagicShield {
                    capacity: (max_health as f32 * fraction).round() as i32,
                    absorbed: 0,
                }
            }
            EffectKind::StrengthUp => StatusEffect::StrengthUp {
                turns: spec.turns,
                power: spec.power,
            },
            EffectKind::IntellectDrain => StatusEffect::IntellectDrain {
                turns: spec.turns,
                power: spec.power,
            },
            EffectKind::ExtraTurn => StatusEffect::ExtraTurn,
            EffectKind::SurviveFatal => StatusEffect::SurviveFatal,
        }
    }
}

// ============================================================================
// Action Gating
// ============================================================================

/// Result of gating an action through the attacker's and candidates' effects.
#[derive(Debug, PartialEq)]
pub enum GateOutcome {
    /// The attacker is stunned; the whole action is cancelled
    Stunned,
    /// Indices of the candidates that remain valid targets
    Targets(SmallVec<[usize; 4]>),
}

/// Stun on the attacker cancels the action; otherwise provoke holders among
/// the candidates, if any, are the only valid targets.
pub fn gate_action(
    attacker: &Combatant,
    candidates: &[usize],
    combatants: &[Combatant],
) -> GateOutcome {
    if attacker.has_effect(EffectKind::Stun) {
        return GateOutcome::Stunned;
    }

    let provoked: SmallVec<[usize; 4]> = candidates
        .iter()
        .copied()
        .filter(|&i| combatants[i].has_effect(EffectKind::Provoke))
        .collect();

    if provoked.is_empty() {
        GateOutcome::Targets(candidates.iter().copied().collect())
    } else {
        GateOutcome::Targets(provoked)
    }
}

// ============================================================================
// Incoming Damage
// ============================================================================

/// Apply the defender's damage-modifying effects, in order: the first evade
/// nullifies everything and is consumed; a damage-reduction effect scales
/// what remains (not consumed); the first shield absorbs up to its remaining
/// capacity and is removed once exhausted.
pub fn modify_incoming_damage(defender: &mut Combatant, amount: i32, log: &mut CombatLog) -> i32 {
    // 1) Evade: full nullification of one hit
    if let Some(pos) = defender
        .effects
        .iter()
        .position(|e| e.kind() == EffectKind::Evade)
    {
        defender.effects.remove(pos);
        log.push(CombatEvent::Evaded {
            target: defender.name.clone(),
        });
        log.push(CombatEvent::EffectRemoved {
            target: defender.name.clone(),
            kind: EffectKind::Evade,
        });
        return 0;
    }

    let mut damage = amount;

    // 2) ReduceDamage: scale what remains, effect persists
    if let Some(StatusEffect::ReduceDamage { power, .. }) = defender
        .effects
        .iter()
        .find(|e| e.kind() == EffectKind::ReduceDamage)
    {
        damage = (damage as f32 * (1.0 - power)) as i32;
    }

    // 3) MagicShield: absorb up to remaining capacity
    if let Some(pos) = defender
        .effects
        .iter()
        .position(|e| e.kind() == EffectKind::MagicShield)
    {
        if let StatusEffect::MagicShield { capacity, absorbed } = &mut defender.effects[pos] {
            let to_absorb = (*capacity - *absorbed).min(damage);
            damage -= to_absorb;
            *absorbed += to_absorb;
            let remaining = *capacity - *absorbed;
            log.push(CombatEvent::Absorbed {
                target: defender.name.clone(),
                amount: to_absorb,
                remaining,
            });
            if remaining <= 0 {
                defender.effects.remove(pos);
                log.push(CombatEvent::EffectRemoved {
                    target: defender.name.clone(),
                    kind: EffectKind::MagicShield,
                });
            }
        }
    }

    damage
}

/// Remove one extra-turn marker if present, signaling the dispatcher.
pub fn consume_extra_turn(combatant: &mut Combatant, log: &mut CombatLog) -> bool {
    if let Some(pos) = combatant
        .effects
        .iter()
        .position(|e| e.kind() == EffectKind::ExtraTurn)
    {
        combatant.effects.remove(pos);
        log.push(CombatEvent::ExtraTurn {
            actor: combatant.name.clone(),
        });
        true
    } else {
        false
    }
}

// ============================================================================
// Periodic Hooks
// ============================================================================

/// Start-of-turn hook. Funnels into the periodic-damage routine so duration
/// bookkeeping stays in one place; no durations decrement in this phase.
pub fn start_of_turn(
    combatant: &mut Combatant,
    rules: &RulesTable,
    log: &mut CombatLog,
) -> Result<(), RulesError> {
    run_periodic(combatant, rules, log, false)
}

/// End-of-turn hook. End-of-turn-configured durations decrement here, so an
/// effect like stun still gates the action it was applied for.
pub fn end_of_turn(
    combatant: &mut Combatant,
    rules: &RulesTable,
    log: &mut CombatLog,
) -> Result<(), RulesError> {
    run_periodic(combatant, rules, log, true)
}

/// One full periodic pass, including the end-of-turn duration bookkeeping.
pub fn apply_periodic_damage(
    combatant: &mut Combatant,
    rules: &RulesTable,
    log: &mut CombatLog,
) -> Result<(), RulesError> {
    run_periodic(combatant, rules, log, true)
}

/// Deal periodic damage for every effect carrying a periodic fraction, then,
/// when `decrement` is set, handle the durations configured for end-of-turn
/// decrement.
///
/// The damage is subtracted directly from health so a survive-fatal guard is
/// never consumed by a burn or poison tick.
fn run_periodic(
    combatant: &mut Combatant,
    rules: &RulesTable,
    log: &mut CombatLog,
    decrement: bool,
) -> Result<(), RulesError> {
    let mut idx = 0;
    while idx < combatant.effects.len() {
        let kind = combatant.effects[idx].kind();
        let rule = rules.status(kind)?;

        if let Some(fraction) = rule.periodic_damage {
            let damage = (combatant.max_health as f32 * fraction).floor() as i32;
            if damage > 0 && combatant.health > 0 {
                combatant.health = (combatant.health - damage).max(0);
                log.push(CombatEvent::EffectTick {
                    target: combatant.name.clone(),
                    kind,
                    amount: damage,
                });
                if combatant.health == 0 {
                    log.push(CombatEvent::Death {
                        target: combatant.name.clone(),
                    });
                }
            }
        }

        // End-of-turn-configured durations decrement here, not in tick_effects
        if decrement && rule.decrement == DecrementPhase::EndOfTurn {
            if let Some(turns) = combatant.effects[idx].turns_mut() {
                *turns = turns.saturating_sub(1);
                if *turns == 0 {
                    combatant.effects.remove(idx);
                    log.push(CombatEvent::EffectRemoved {
                        target: combatant.name.clone(),
                        kind,
                    });
                    continue;
                }
            }
        }
        idx += 1;
    }
    Ok(())
}
