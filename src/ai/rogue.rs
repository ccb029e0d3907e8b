//! Rogue archetype
//!
//! Stealth-focused play: finishes low targets with Assassinate, escapes
//! when a single enemy hit threatens a large health chunk, spreads poison
//! onto the largest target and remembers it for follow-up Backstabs.

use tracing::debug;

use crate::constants::{KILL_ESTIMATE_MARGIN, SHADOWSTEP_DANGER_PCT};
use crate::effects::EffectKind;
use crate::rules::{RulesError, SkillId};
use crate::skills::Chosen;

use super::{basic_attack_fallback, AiContext, ArchetypeAi, Decision};

pub struct RogueAi;

/// Per-skill target preference. The poison mark (one-turn memory) steers
/// Assassinate and Backstab toward the already-poisoned enemy.
fn pick_target(ctx: &AiContext, skill: SkillId, enemies: &[usize], primary: usize) -> usize {
    if enemies.is_empty() {
        return primary;
    }
    let user = ctx.actor();
    let mark = user.poison_mark.filter(|m| enemies.contains(m));

    match skill {
        SkillId::Assassinate => {
            let power = ctx
                .rules
                .skill(SkillId::Assassinate)
                .map(|d| d.power)
                .unwrap_or(1.0);
            let estimate = user.stats.strength as f32 * power;
            let finishable = enemies
                .iter()
                .copied()
                .filter(|&e| (ctx.combatants[e].health as f32) < estimate * KILL_ESTIMATE_MARGIN)
                .min_by_key(|&e| ctx.combatants[e].health);
            finishable
                .or(mark)
                .unwrap_or_else(|| lowest_health(ctx, enemies))
        }
        SkillId::Backstab => mark.unwrap_or_else(|| hardest_hitter(ctx, enemies)),
        SkillId::PoisonedBlade => enemies
            .iter()
            .copied()
            .max_by_key(|&e| ctx.combatants[e].max_health)
            .unwrap_or(primary),
        _ => primary,
    }
}

fn lowest_health(ctx: &AiContext, enemies: &[usize]) -> usize {
    enemies
        .iter()
        .copied()
        .min_by_key(|&e| ctx.combatants[e].health)
        .unwrap_or(enemies[0])
}

fn hardest_hitter(ctx: &AiContext, enemies: &[usize]) -> usize {
    enemies
        .iter()
        .copied()
        .max_by_key(|&e| ctx.combatants[e].base_damage)
        .unwrap_or(enemies[0])
}

/// True if any enemy's base hit threatens a big fraction of the rogue's
/// health in one swing.
fn in_danger(ctx: &AiContext, enemies: &[usize]) -> bool {
    let threshold = SHADOWSTEP_DANGER_PCT * ctx.actor().max_health as f32;
    enemies
        .iter()
        .any(|&e| ctx.combatants[e].base_damage as f32 >= threshold)
}

impl ArchetypeAi for RogueAi {
    fn choose_action(
        &self,
        ctx: &AiContext,
        primary: usize,
        enemies: &[usize],
    ) -> Result<Decision, RulesError> {
        let user = ctx.actor();

        // 1) Hard gate: Assassinate a sufficiently low target
        let assassinate = ctx.skill_cfg(SkillId::Assassinate)?;
        if assassinate.enabled {
            let tgt = pick_target(ctx, SkillId::Assassinate, enemies, primary);
            if ctx.can_use(SkillId::Assassinate, tgt)?
                && ctx.combatants[tgt].health_pct() < assassinate.hp_pct
            {
                debug!(actor = %user.name, target = %ctx.combatants[tgt].name, "finisher gate");
                return Ok(Decision {
                    skill: Some(SkillId::Assassinate),
                    chosen: Chosen::One(tgt),
                    mark: None,
                });
            }
        }

        // 2) Hard gate: Shadowstep out of danger
        let step = ctx.skill_cfg(SkillId::Shadowstep)?;
        if step.enabled
            && ctx.can_use(SkillId::Shadowstep, primary)?
            && (user.health_pct() < step.hp_pct || in_danger(ctx, enemies))
        {
            debug!(actor = %user.name, hp_pct = user.health_pct(), "escape gate");
            return Ok(Decision {
                skill: Some(SkillId::Shadowstep),
                chosen: Chosen::One(ctx.actor),
                mark: None,
            });
        }

        let mut utils: Vec<(SkillId, f32)> = Vec::with_capacity(3);

        // 3) Smoke Bomb: team-wide evade against a crowd
        let smoke = ctx.skill_cfg(SkillId::SmokeBomb)?;
        let mut score = 0.0;
        if smoke.enabled
            && ctx.can_use(SkillId::SmokeBomb, primary)?
            && enemies.len() >= smoke.min_enemies
        {
            let power = ctx.rules.skill(SkillId::SmokeBomb)?.power;
            score = power * ctx.live_allies() as f32 * ctx.cd_factor(SkillId::SmokeBomb);
        }
        utils.push((SkillId::SmokeBomb, score));

        // 4) Poisoned Blade: worth the most on the largest unpoisoned target
        let blade = ctx.skill_cfg(SkillId::PoisonedBlade)?;
        let mut score = 0.0;
        let blade_target = pick_target(ctx, SkillId::PoisonedBlade, enemies, primary);
        if blade.enabled
            && ctx.can_use(SkillId::PoisonedBlade, blade_target)?
            && !ctx.combatants[blade_target].has_effect(EffectKind::Poison)
        {
            let power = ctx.rules.skill(SkillId::PoisonedBlade)?.power;
            score = ctx.combatants[blade_target].max_health as f32
                * power
                * ctx.cd_factor(SkillId::PoisonedBlade);
        }
        utils.push((SkillId::PoisonedBlade, score));

        // 5) Backstab: heavy single hit on the most dangerous target
        let backstab = ctx.skill_cfg(SkillId::Backstab)?;
        let mut score = 0.0;
        if backstab.enabled && ctx.can_use(SkillId::Backstab, primary)? {
            let power = ctx.rules.skill(SkillId::Backstab)?.power;
            score = user.stats.strength as f32 * power * ctx.cd_factor(SkillId::Backstab);
        }
        utils.push((SkillId::Backstab, score));

        let (best_skill, best_score) = utils
            .iter()
            .copied()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((SkillId::Backstab, 0.0));
        debug!(?utils, ?best_skill, best_score, "rogue utilities");

        if best_score <= 0.0 {
            return Ok(basic_attack_fallback(ctx, primary, enemies));
        }

        if best_skill == SkillId::SmokeBomb {
            // Team mode: the selector gathers the allies
            return Ok(Decision {
                skill: Some(best_skill),
                chosen: Chosen::None,
                mark: None,
            });
        }

        let target = pick_target(ctx, best_skill, enemies, primary);
        let mark = (best_skill == SkillId::PoisonedBlade).then_some(target);
        Ok(Decision {
            skill: Some(best_skill),
            chosen: Chosen::One(target),
            mark,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::tests_support::{test_monster, test_player};
    use crate::rules::tests_support::test_rules;
    use crate::rules::Archetype;

    fn context_with<'a>(
        combatants: &'a [crate::combatant::Combatant],
        rules: &'a crate::rules::RulesTable,
    ) -> AiContext<'a> {
        AiContext::new(combatants, rules, 0, rules.archetype(Archetype::Rogue).unwrap())
    }

    #[test]
    fn test_assassinate_finisher_fires_on_low_target() {
        let rules = test_rules();
        let mut combatants = vec![
            test_player(Archetype::Rogue),
            test_monster("Healthy", 60, 5),
            test_monster("Bleeding", 60, 5),
        ];
        // 15/60 = 25%, under the 0.35 gate and the 0.3 trigger threshold
        combatants[2].health = 15;

        let ctx = context_with(&combatants, &rules);
        let d = RogueAi.choose_action(&ctx, 1, &[1, 2]).unwrap();
        assert_eq!(d.skill, Some(SkillId::Assassinate));
        assert!(matches!(d.chosen, Chosen::One(2)));
    }

    #[test]
    fn test_shadowstep_escapes_a_heavy_hitter() {
        let rules = test_rules();
        // base damage 30 >= 20% of 120 health
        let combatants = vec![test_player(Archetype::Rogue), test_monster("Ogre", 200, 30)];
        let ctx = context_with(&combatants, &rules);
        let d = RogueAi.choose_action(&ctx, 1, &[1]).unwrap();
        assert_eq!(d.skill, Some(SkillId::Shadowstep));
        assert!(matches!(d.chosen, Chosen::One(0)));
    }

    #[test]
    fn test_poisoned_blade_targets_the_largest_and_marks_it() {
        let rules = test_rules();
        let mut combatants = vec![
            test_player(Archetype::Rogue),
            test_monster("Small", 60, 5),
            test_monster("Large", 150, 5),
        ];
        // Backstab requires the first action; spend it
        combatants[0].has_acted = true;

        let ctx = context_with(&combatants, &rules);
        let d = RogueAi.choose_action(&ctx, 1, &[1, 2]).unwrap();
        // blade: 150 * 1.0 * 1.2 = 180 vs smoke bomb 1.0 * 1 = 1
        assert_eq!(d.skill, Some(SkillId::PoisonedBlade));
        assert!(matches!(d.chosen, Chosen::One(2)));
        assert_eq!(d.mark, Some(2));
    }

    #[test]
    fn test_backstab_follows_the_poison_mark() {
        let rules = test_rules();
        let mut combatants = vec![
            test_player(Archetype::Rogue),
            test_monster("Hitter", 150, 12),
            test_monster("Marked", 150, 5),
        ];
        combatants[0].poison_mark = Some(2);
        combatants[2]
            .effects
            .push(crate::effects::StatusEffect::Poison { turns: 2 });

        let ctx = context_with(&combatants, &rules);
        // Blade's preferred target (max health, tie keeps the later index)
        // is already poisoned, so it scores zero and Backstab wins
        let d = RogueAi.choose_action(&ctx, 1, &[1, 2]).unwrap();
        assert_eq!(d.skill, Some(SkillId::Backstab));
        assert!(matches!(d.chosen, Chosen::One(2)), "follows the mark");
    }
}
