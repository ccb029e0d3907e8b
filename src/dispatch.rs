//! Turn Dispatcher
//!
//! Orchestrates one combatant's full turn: upkeep ticks, the start-of-turn
//! hook, action selection (archetype AI for players, basic attack for
//! monsters), the end-of-turn hook, and bounded extra-turn repeats.

use tracing::debug;

use crate::ai::{archetype_ai, AiContext};
use crate::combat::events::CombatEvent;
use crate::combat::log::CombatLog;
use crate::combat::resolver;
use crate::combat::{CritTier, DamageSource, Element};
use crate::combatant::Combatant;
use crate::constants::{CLEAVE_MIN_SPLASH, MAX_EXTRA_TURNS};
use crate::effects::{self, EffectKind, GateOutcome, StatusEffect};
use crate::rng::GameRng;
use crate::rules::{PassiveId, RulesError, RulesTable};
use crate::skills::{self, Chosen};

/// Opponent indices that are still alive, in slice order.
fn live_opponents(combatants: &[Combatant], user: usize) -> Vec<usize> {
    let team = combatants[user].team;
    combatants
        .iter()
        .enumerate()
        .filter(|(_, c)| c.team != team && c.is_alive())
        .map(|(i, _)| i)
        .collect()
}

/// Live allies of the user, the user included.
fn live_allies(combatants: &[Combatant], user: usize) -> Vec<usize> {
    let team = combatants[user].team;
    combatants
        .iter()
        .enumerate()
        .filter(|(_, c)| c.team == team && c.is_alive())
        .map(|(i, _)| i)
        .collect()
}

/// Dispatch one full turn for `user`. Extra-turn markers repeat the action
/// body; the repeat count is capped so a misconfigured rules table can never
/// loop forever.
pub fn take_turn(
    combatants: &mut [Combatant],
    rules: &RulesTable,
    rng: &mut GameRng,
    log: &mut CombatLog,
    user: usize,
) -> Result<(), RulesError> {
    let mut extra_turns = 0;
    loop {
        if !combatants[user].is_alive() {
            return Ok(());
        }
        let pool = live_opponents(combatants, user);
        if pool.is_empty() {
            return Ok(());
        }
        // Recorded for mid-action passives (Cleave splash) and re-gating
        combatants[user].visible_enemies = pool.clone();

        // Upkeep runs once per dispatched turn, not per extra-turn repeat
        if extra_turns == 0 {
            let u = &mut combatants[user];
            if u.has_passive(PassiveId::LastStand)
                && !u.last_stand_used
                && !u.has_effect(EffectKind::SurviveFatal)
            {
                u.apply_effect(StatusEffect::SurviveFatal, log);
            }
            u.tick_effects(rules, log)?;
            u.tick_cooldowns();
            u.tick_mana();
            effects::start_of_turn(u, rules, log)?;

            // A lethal tick cancels the action; the end hook still runs
            if !combatants[user].is_alive() {
                effects::end_of_turn(&mut combatants[user], rules, log)?;
                return Ok(());
            }
        }

        act(combatants, rules, rng, log, user, &pool)?;
        combatants[user].has_acted = true;
        effects::end_of_turn(&mut combatants[user], rules, log)?;

        if extra_turns < MAX_EXTRA_TURNS && effects::consume_extra_turn(&mut combatants[user], log)
        {
            extra_turns += 1;
            continue;
        }
        return Ok(());
    }
}

/// Pick and perform the user's action for this turn body.
fn act(
    combatants: &mut [Combatant],
    rules: &RulesTable,
    rng: &mut GameRng,
    log: &mut CombatLog,
    user: usize,
    pool: &[usize],
) -> Result<(), RulesError> {
    // Monsters have no archetype and simply swing at the first live opponent
    let Some(archetype) = combatants[user].archetype() else {
        return basic_attack(combatants, user, pool[0], rules, rng, log);
    };

    let cfg = rules.archetype(archetype)?;
    let (decision, primary) = {
        let ctx = AiContext::new(combatants, rules, user, cfg);
        let primary = ctx.select_primary(pool).unwrap_or(pool[0]);
        let decision = archetype_ai(archetype).choose_action(&ctx, primary, pool)?;
        (decision, primary)
    };
    debug!(actor = %combatants[user].name, ?decision, "turn decision");

    if let Some(mark) = decision.mark {
        combatants[user].poison_mark = Some(mark);
    }

    match decision.skill {
        None => {
            let target = match decision.chosen {
                Chosen::One(i) => i,
                _ => primary,
            };
            basic_attack(combatants, user, target, rules, rng, log)
        }
        Some(skill) => {
            let def = rules.skill(skill)?;
            let allies = live_allies(combatants, user);
            let targets =
                skills::select_targets(def.target, &decision.chosen, primary, user, pool, &allies, rng);
            skills::execute_skill(combatants, user, &targets, skill, rules, rng, log)
        }
    }
}

/// One gated physical swing, plus the Cleave splash for holders of the
/// passive.
pub fn basic_attack(
    combatants: &mut [Combatant],
    user: usize,
    target: usize,
    rules: &RulesTable,
    rng: &mut GameRng,
    log: &mut CombatLog,
) -> Result<(), RulesError> {
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
    let target = if allowed.contains(&target) {
        target
    } else {
        allowed[0]
    };

    let (attacker, defender) = skills::pair_mut(combatants, user, target);
    if !resolver::resolve_hit(attacker, defender, rules, rng) {
        log.push(CombatEvent::Miss {
            actor: attacker.name.clone(),
            target: defender.name.clone(),
            action: "Attack".into(),
            chance: attacker.last_hit_chance,
        });
        return Ok(());
    }

    let amount = resolver::compute_damage(
        attacker,
        defender,
        Element::Physical,
        DamageSource::Normal,
        CritTier::Normal,
        1.0,
        rules,
        rng,
    )?;
    let actor_name = attacker.name.clone();
    let crit = attacker.last_crit;
    let weak = attacker.last_weak;
    let resist = attacker.last_resist;

    combatants[target].take_damage(amount, log);
    log.push(CombatEvent::Damage {
        actor: actor_name.clone(),
        target: combatants[target].name.clone(),
        action: "Attack".into(),
        amount,
        crit,
        weak,
        resist,
        killing_blow: !combatants[target].is_alive(),
    });

    // Cleave splashes a fraction of the dealt damage onto every other
    // visible live enemy
    if combatants[user].has_passive(PassiveId::Cleave) && amount > 0 {
        let power = rules.passive(PassiveId::Cleave)?.power;
        let splash = ((amount as f32 * power).round() as i32).max(CLEAVE_MIN_SPLASH);
        for other in visible {
            if other == target || !combatants[other].is_alive() {
                continue;
            }
            combatants[other].take_damage(splash, log);
            log.push(CombatEvent::Splash {
                actor: actor_name.clone(),
                target: combatants[other].name.clone(),
                amount: splash,
            });
        }
    }
    Ok(())
}
