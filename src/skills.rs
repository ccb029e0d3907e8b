//! Skill Executor & Target Selector
//!
//! Resolves a targeting mode into concrete combatants, then applies a
//! skill's cost, per-target resolution and cooldown. Combatants are
//! addressed by index into the encounter's combatant slice.

use smallvec::SmallVec;
use tracing::debug;

use crate::combat::events::CombatEvent;
use crate::combat::log::CombatLog;
use crate::combat::resolver;
use crate::combat::{CritTier, DamageSource};
use crate::combatant::Combatant;
use crate::effects::{self, EffectKind, GateOutcome, StatusEffect};
use crate::rng::GameRng;
use crate::rules::{RulesError, RulesTable, SkillCategory, SkillId, TargetMode, Trigger};

pub type Targets = SmallVec<[usize; 4]>;

/// Target candidates handed over by the AI. Multi-target skills carry their
/// raw set; single-target skills one combatant; None defers to the fallback.
#[derive(Debug, Clone, Default)]
pub enum Chosen {
    #[default]
    None,
    One(usize),
    Many(Targets),
}

impl Chosen {
    fn as_list(&self) -> Targets {
        match self {
            Chosen::None => Targets::new(),
            Chosen::One(i) => {
                let mut t = Targets::new();
                t.push(*i);
                t
            }
            Chosen::Many(list) => list.clone(),
        }
    }
}

/// Borrow two distinct combatants mutably.
pub(crate) fn pair_mut(
    combatants: &mut [Combatant],
    a: usize,
    b: usize,
) -> (&mut Combatant, &mut Combatant) {
    debug_assert!(a != b, "attacker and defender must differ");
    if a < b {
        let (left, right) = combatants.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = combatants.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Resolve a targeting mode into combatant indices.
pub fn select_targets(
    mode: TargetMode,
    chosen: &Chosen,
    fallback: usize,
    user: usize,
    enemies: &[usize],
    allies: &[usize],
    rng: &mut GameRng,
) -> Targets {
    let chosen_list = chosen.as_list();
    match mode {
        TargetMode::Enemy => {
            if chosen_list.is_empty() {
                let mut t = Targets::new();
                t.push(fallback);
                t
            } else {
                chosen_list
            }
        }
        TargetMode::AllEnemies => enemies.iter().copied().collect(),
        TargetMode::TwoRandomEnemies => sample_two(enemies, rng),
        TargetMode::Team => allies.iter().copied().collect(),
        TargetMode::Ally => {
            if chosen_list.is_empty() {
                let mut t = Targets::new();
                t.push(user);
                t
            } else {
                chosen_list
            }
        }
        TargetMode::SelfTarget => {
            let mut t = Targets::new();
            t.push(user);
            t
        }
    }
}

/// Sample up to two enemies without replacement.
fn sample_two(enemies: &[usize], rng: &mut GameRng) -> Targets {
    let mut out = Targets::new();
    match enemies.len() {
        0 => {}
        1 => out.push(enemies[0]),
        n => {
            let first = rng.index(n);
            let mut second = rng.index(n - 1);
            if second >= first {
                second += 1;
            }
            out.push(enemies[first]);
            out.push(enemies[second]);
        }
    }
    out
}

/// Execute one skill: re-gate the targets, pay the cost, dispatch by
/// category, set the cooldown. Aborted gates leave no state change beyond
/// ticks already committed by the dispatcher.
pub fn execute_skill(
    combatants: &mut [Combatant],
    user: usize,
    raw_targets: &[usize],
    skill: SkillId,
    rules: &RulesTable,
    rng: &mut GameRng,
    log: &mut CombatLog,
) -> Result<(), RulesError> {
    let def = rules.skill(skill)?;

    // 1) Re-gate through the user's visible enemy set. Stun cancels before
    // any cost is paid; provoke narrows enemy-directed targets.
    let visible = combatants[user].visible_enemies.clone();
    let allowed = match effects::gate_action(&combatants[user], &visible, combatants) {
        GateOutcome::Stunned => {
            log.push(CombatEvent::Stunned {
                actor: combatants[user].name.clone(),
            });
            return Ok(());
        }
        GateOutcome::Targets(t) => t,
    };
    if allowed.is_empty() {
        return Ok(());
    }

    let offensive = matches!(
        def.target,
        TargetMode::Enemy | TargetMode::AllEnemies | TargetMode::TwoRandomEnemies
    );
    let targets: Targets = if offensive {
        let narrowed: Targets = raw_targets
            .iter()
            .copied()
            .filter(|i| allowed.contains(i))
            .collect();
        if narrowed.is_empty() {
            allowed
        } else {
            narrowed
        }
    } else {
        raw_targets.iter().copied().collect()
    };

    // 2) Pay the mana cost, clamped at zero
    if def.mana_cost > 0 {
        let u = &mut combatants[user];
        u.mana = (u.mana - def.mana_cost).max(0);
    }

    log.push(CombatEvent::SkillUsed {
        actor: combatants[user].name.clone(),
        skill,
    });
    debug!(actor = %combatants[user].name, ?skill, ?targets, "executing skill");

    // 3) Category dispatch
    match def.category {
        SkillCategory::Damage => {
            exec_damage(combatants, user, &targets, skill, rules, rng, log)?;
        }
        SkillCategory::Buff | SkillCategory::Debuff => {
            exec_buff_debuff(combatants, user, &targets, skill, rules, log)?;
        }
        SkillCategory::Utility => {
            exec_utility(combatants, user, &targets, skill, rules, log)?;
        }
    }

    // 4) Set the cooldown (0 = none)
    let def = rules.skill(skill)?;
    if def.cooldown > 0 {
        combatants[user].cooldowns.insert(skill, def.cooldown);
    }

    Ok(())
}

fn exec_damage(
    combatants: &mut [Combatant],
    user: usize,
    targets: &[usize],
    skill: SkillId,
    rules: &RulesTable,
    rng: &mut GameRng,
    log: &mut CombatLog,
) -> Result<(), RulesError> {
    let def = rules.skill(skill)?.clone();

    // Triggered skills strike at the heavy crit tier
    let crit_tier = match def.trigger {
        Trigger::FirstAction | Trigger::EnemyLowHealth => CritTier::Heavy,
        _ => CritTier::Normal,
    };

    for &tgt in targets {
        if tgt == user || !combatants[tgt].is_alive() {
            continue;
        }

        // Independent per-target success gate
        if rng.uniform() > def.success_chance {
            log.push(CombatEvent::Fizzle {
                actor: combatants[user].name.clone(),
                skill,
                chance: def.success_chance,
            });
            continue;
        }

        let (attacker, defender) = pair_mut(combatants, user, tgt);
        if !resolver::resolve_hit(attacker, defender, rules, rng) {
            log.push(CombatEvent::Miss {
                actor: attacker.name.clone(),
                target: defender.name.clone(),
                action: def.name.clone(),
                chance: attacker.last_hit_chance,
            });
            continue;
        }

        let amount = resolver::compute_damage(
            attacker,
            defender,
            def.element,
            DamageSource::Normal,
            crit_tier,
            def.power,
            rules,
            rng,
        )?;
        let actor_name = attacker.name.clone();
        let crit = attacker.last_crit;
        let weak = attacker.last_weak;
        let resist = attacker.last_resist;

        combatants[tgt].take_damage(amount, log);
        let target = &combatants[tgt];
        log.push(CombatEvent::Damage {
            actor: actor_name,
            target: target.name.clone(),
            action: def.name.clone(),
            amount,
            crit,
            weak,
            resist,
            killing_blow: !target.is_alive(),
        });

        // Attach the configured effect only if the target survives
        if let Some(spec) = def.effect {
            if combatants[tgt].is_alive() {
                let rule = rules.status(spec.kind)?;
                let effect = StatusEffect::from_spec(&spec, rule, combatants[tgt].max_health);
                combatants[tgt].apply_effect(effect, log);
            }
        }
    }
    Ok(())
}

fn exec_buff_debuff(
    combatants: &mut [Combatant],
    user: usize,
    targets: &[usize],
    skill: SkillId,
    rules: &RulesTable,
    log: &mut CombatLog,
) -> Result<(), RulesError> {
    let def = rules.skill(skill)?.clone();
    let Some(spec) = def.effect else {
        return Ok(());
    };
    let rule = rules.status(spec.kind)?.clone();

    for &tgt in targets {
        if !combatants[tgt].is_alive() {
            continue;
        }
        let effect = StatusEffect::from_spec(&spec, &rule, combatants[tgt].max_health);
        combatants[tgt].apply_effect(effect, log);
    }

    // The draining debuff immediately restores a fraction of the caster's
    // mana pool
    if spec.kind == EffectKind::IntellectDrain {
        let u = &mut combatants[user];
        let recover = (u.max_mana as f32 * rule.mana_recover) as i32;
        if recover > 0 {
            u.mana = (u.mana + recover).min(u.max_mana);
            log.push(CombatEvent::ManaRestored {
                actor: u.name.clone(),
                amount: recover,
            });
        }
    }
    Ok(())
}

fn exec_utility(
    combatants: &mut [Combatant],
    user: usize,
    targets: &[usize],
    skill: SkillId,
    rules: &RulesTable,
    log: &mut CombatLog,
) -> Result<(), RulesError> {
    let def = rules.skill(skill)?.clone();
    let Some(spec) = def.effect else {
        return Ok(());
    };

    if spec.kind == EffectKind::ExtraTurn {
        combatants[user].apply_effect(StatusEffect::ExtraTurn, log);
        return Ok(());
    }

    // Generic effect to self or to the first resolved target
    let tgt = if def.target == TargetMode::SelfTarget {
        user
    } else {
        targets.first().copied().unwrap_or(user)
    };
    let rule = rules.status(spec.kind)?;
    let effect = StatusEffect::from_spec(&spec, rule, combatants[tgt].max_health);
    combatants[tgt].apply_effect(effect, log);
    Ok(())
}
