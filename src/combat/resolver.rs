//! Damage & Hit Resolver
//!
//! Pure computation of hit probability and damage magnitude. Deterministic
//! given a fixed RNG stream; the only external state touched is the shared
//! RNG and the narration flags written back onto the attacker.

use super::{CritTier, DamageSource, Element};
use crate::combatant::{Combatant, Controller};
use crate::rng::GameRng;
use crate::rules::{PassiveId, RulesError, RulesTable};

fn logistic(x: f32, x0: f32, k: f32) -> f32 {
    1.0 / (1.0 + (-(x - x0) / k).exp())
}

/// Hit probability: a logistic curve over the agility gap, scaled by the
/// attacker's accuracy and the defender's dodge, clamped to the configured
/// range. Non-decreasing in (attacker agility - defender agility).
pub fn hit_chance(attacker: &Combatant, defender: &Combatant, rules: &RulesTable) -> f32 {
    let delta = (attacker.stats.agility - defender.stats.agility) as f32 / rules.hit.scale;
    let p = logistic(delta, rules.hit.x0, rules.hit.k);
    let p = p * attacker.accuracy * (1.0 - defender.dodge_chance);
    p.clamp(rules.hit.clamp_min, rules.hit.clamp_max)
}

/// Roll one uniform draw against the hit probability. The probability is
/// retained on the attacker for narration and tests.
pub fn resolve_hit(
    attacker: &mut Combatant,
    defender: &Combatant,
    rules: &RulesTable,
    rng: &mut GameRng,
) -> bool {
    let chance = hit_chance(attacker, defender, rules);
    attacker.last_hit_chance = chance;
    rng.chance(chance)
}

/// Compute damage for one resolved hit.
///
/// 1. offense from strength/intelligence coefficients and base damage
/// 2. level scaling (player and monster attackers scale differently)
/// 3. contested mitigation: offense * offense / (offense + defense)
/// 4. truncated-normal variance
/// 5. crit roll at the given tier
/// 6. elemental weakness-then-resistance (skipped for true damage)
/// 7. Arcane Mastery amplify for non-physical elements
/// 8. round, floored at the configured minimum
#[allow(clippy::too_many_arguments)]
pub fn compute_damage(
    attacker: &mut Combatant,
    defender: &Combatant,
    element: Element,
    source: DamageSource,
    crit_tier: CritTier,
    power: f32,
    rules: &RulesTable,
    rng: &mut GameRng,
) -> Result<i32, RulesError> {
    let dmg = &rules.damage;

    // 1) Offensive rating, with class/species coefficients
    let coeffs = match &attacker.controller {
        Controller::Player { archetype } => rules.class_coeffs(*archetype),
        Controller::Monster { species } => rules.species_coeffs(species),
    };
    let phys = attacker.effective_strength() as f32 * dmg.phys_coeff * coeffs.phys;
    let mag = attacker.effective_intelligence() as f32 * dmg.mag_coeff * coeffs.mag;
    let base = attacker.base_damage as f32 * power;
    let mut offense = phys + mag + base;

    // 2) Level scaling
    let level_coeff = match attacker.controller {
        Controller::Player { .. } => dmg.level_coeff_player,
        Controller::Monster { .. } => dmg.level_coeff_monster,
    };
    offense *= 1.0 + attacker.level as f32 * level_coeff;

    // 3) Contested mitigation
    let def_val = defender.stats.defense * rules.defense.reduction_per_point;
    let factor = if offense + def_val > 0.0 {
        offense / (offense + def_val)
    } else {
        0.0
    };
    let mut raw = offense * factor;

    // 4) Variance
    raw *= rng.variance(dmg.variance_min, dmg.variance_max);

    // 5) Critical
    if rng.chance(attacker.crit_chance) {
        raw *= match crit_tier {
            CritTier::Normal => dmg.crit_normal,
            CritTier::Heavy => dmg.crit_heavy,
        };
        attacker.last_crit = true;
    } else {
        attacker.last_crit = false;
    }

    // 6) Elemental weakness/resistance, weakness checked first
    attacker.last_weak = false;
    attacker.last_resist = false;
    if source != DamageSource::True {
        if defender.weaknesses.contains(&element) {
            raw *= rules.elements.weak_multiplier;
            attacker.last_weak = true;
        } else if defender.resistances.contains(&element) {
            raw *= rules.elements.resist_multiplier;
            attacker.last_resist = true;
        }
    }

    // 7) Arcane Mastery amplifies non-physical damage
    if !element.is_physical() && attacker.has_passive(PassiveId::ArcaneMastery) {
        let bonus = rules.passive(PassiveId::ArcaneMastery)?.power;
        raw *= 1.0 + bonus;
    }

    // 8) Floor & round
    Ok((raw.round() as i32).max(dmg.min_damage))
}
