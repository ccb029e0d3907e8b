//! Warrior archetype
//!
//! Melee-focused play: buffs the team when outnumbered or facing a boss,
//! shields up under pressure, controls dangerous enemies with stuns and
//! taunts, and trades single-target hits for the whirlwind when the AoE
//! beats a Shield Bash.

use tracing::debug;

use crate::effects::EffectKind;
use crate::rules::{RulesError, SkillId};
use crate::skills::Chosen;

use super::{basic_attack_fallback, AiContext, ArchetypeAi, Decision};

pub struct WarriorAi;

impl ArchetypeAi for WarriorAi {
    fn choose_action(
        &self,
        ctx: &AiContext,
        primary: usize,
        enemies: &[usize],
    ) -> Result<Decision, RulesError> {
        let user = ctx.actor();
        let mut utils: Vec<(SkillId, f32)> = Vec::with_capacity(5);

        // 1) Battle Roar: team buff when outnumbered or against a boss
        let roar = ctx.skill_cfg(SkillId::BattleRoar)?;
        let mut score = 0.0;
        if roar.enabled
            && ctx.can_use(SkillId::BattleRoar, primary)?
            && !user.has_effect(EffectKind::StrengthUp)
        {
            let is_boss = roar.boss_hp_pct.is_some_and(|pct| {
                enemies
                    .iter()
                    .any(|&e| ctx.combatants[e].max_health as f32 > user.max_health as f32 * pct)
            });
            if enemies.len() >= roar.min_enemies || is_boss {
                score = user.stats.strength as f32
                    * roar.strength_pct
                    * ctx.live_allies() as f32
                    * ctx.cd_factor(SkillId::BattleRoar);
            }
        }
        utils.push((SkillId::BattleRoar, score));

        // 2) Iron Will: shield up when low or after a big hit
        let will = ctx.skill_cfg(SkillId::IronWill)?;
        let mut score = 0.0;
        if will.enabled && ctx.can_use(SkillId::IronWill, primary)? {
            let big_hit =
                user.last_incoming_damage as f32 >= will.big_hit_pct * user.max_health as f32;
            if user.health_pct() < will.hp_pct || big_hit {
                score =
                    user.max_health as f32 * will.shield_pct * ctx.cd_factor(SkillId::IronWill);
            }
        }
        utils.push((SkillId::IronWill, score));

        // 3) Shield Bash: reliable hit, boosted against dangerous enemies
        let bash = ctx.skill_cfg(SkillId::ShieldBash)?;
        let mut score = 0.0;
        if bash.enabled && ctx.can_use(SkillId::ShieldBash, primary)? {
            let danger = enemies
                .iter()
                .any(|&e| ctx.threat(e) >= bash.danger_dps_thresh);
            let base = user.stats.strength as f32 * bash.base_str_pct;
            let mult = if danger { bash.danger_mult } else { 1.0 };
            score = base * mult * ctx.cd_factor(SkillId::ShieldBash);
        }
        utils.push((SkillId::ShieldBash, score));

        // 4) Taunt: pull accurate, unprovoked enemies onto the warrior
        let taunt = ctx.skill_cfg(SkillId::Taunt)?;
        let mut score = 0.0;
        if taunt.enabled && ctx.can_use(SkillId::Taunt, primary)? {
            let viable: Vec<usize> = enemies
                .iter()
                .copied()
                .filter(|&e| {
                    let c = &ctx.combatants[e];
                    !c.has_effect(EffectKind::Provoke) && c.accuracy > taunt.acc_threshold
                })
                .collect();
            if !viable.is_empty() {
                let avg: f32 =
                    viable.iter().map(|&e| ctx.threat(e)).sum::<f32>() / viable.len() as f32;
                score = avg * viable.len() as f32 * ctx.cd_factor(SkillId::Taunt);
            }
        }
        utils.push((SkillId::Taunt, score));

        // 5) Whirlwind Slash: AoE, scored against a Shield Bash baseline
        let whirl = ctx.skill_cfg(SkillId::WhirlwindSlash)?;
        let mut score = 0.0;
        if whirl.enabled
            && ctx.can_use(SkillId::WhirlwindSlash, primary)?
            && enemies.len() >= whirl.min_enemies
        {
            let mana_cost = ctx.rules.skill(SkillId::WhirlwindSlash)?.mana_cost;
            if ctx.mana_future() >= mana_cost {
                let aoe = user.stats.strength as f32 * whirl.whirl_str_pct * enemies.len() as f32;
                let bash_base = user.stats.strength as f32 * bash.base_str_pct;
                score = (aoe - bash_base).max(0.0) * ctx.cd_factor(SkillId::WhirlwindSlash);
            }
        }
        utils.push((SkillId::WhirlwindSlash, score));

        let (best_skill, best_score) = utils
            .iter()
            .copied()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((SkillId::ShieldBash, 0.0));
        debug!(?utils, ?best_skill, best_score, "warrior utilities");

        if best_score <= 0.0 {
            // In a duel, try the stun before giving up on skills
            if enemies.len() == 1 && ctx.can_use(SkillId::ShieldBash, primary)? {
                return Ok(Decision {
                    skill: Some(SkillId::ShieldBash),
                    chosen: Chosen::One(primary),
                    mark: None,
                });
            }
            return Ok(basic_attack_fallback(ctx, primary, enemies));
        }

        let chosen = match best_skill {
            SkillId::ShieldBash => {
                Chosen::One(ctx.select_primary(enemies).unwrap_or(primary))
            }
            SkillId::BattleRoar | SkillId::IronWill => Chosen::One(ctx.actor),
            // Taunt and Whirlwind Slash resolve multi-target modes
            _ => Chosen::One(primary),
        };
        Ok(Decision {
            skill: Some(best_skill),
            chosen,
            mark: None,
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
        AiContext::new(combatants, rules, 0, rules.archetype(Archetype::Warrior).unwrap())
    }

    #[test]
    fn test_iron_will_fires_when_low() {
        let rules = test_rules();
        let mut combatants = vec![
            test_player(Archetype::Warrior),
            test_monster("Goblin", 60, 5),
        ];
        combatants[0].health = 30; // 25% of 120, under the 0.5 threshold

        let ctx = context_with(&combatants, &rules);
        let d = WarriorAi.choose_action(&ctx, 1, &[1]).unwrap();
        assert_eq!(d.skill, Some(SkillId::IronWill));
        assert!(matches!(d.chosen, Chosen::One(0)), "self-cast");
    }

    #[test]
    fn test_whirlwind_outscores_bash_against_a_crowd() {
        let rules = test_rules();
        let combatants = vec![
            test_player(Archetype::Warrior),
            test_monster("A", 60, 5),
            test_monster("B", 60, 5),
            test_monster("C", 60, 5),
            test_monster("D", 60, 5),
        ];
        let ctx = context_with(&combatants, &rules);
        let d = WarriorAi.choose_action(&ctx, 1, &[1, 2, 3, 4]).unwrap();
        // aoe = 25 * 0.8 * 4 = 80 vs bash 25 * 1.2 = 30
        assert_eq!(d.skill, Some(SkillId::WhirlwindSlash));
    }

    #[test]
    fn test_duel_falls_back_to_shield_bash() {
        let rules = test_rules();
        let mut combatants = vec![
            test_player(Archetype::Warrior),
            test_monster("Goblin", 60, 5),
        ];
        // Suppress scored skills: roar needs a crowd or boss, will needs low
        // health, bash scores though. Drain mana so only the duel fallback
        // path (which re-checks can_use) decides.
        combatants[0].mana = 0;
        combatants[0].health = 120;

        let ctx = context_with(&combatants, &rules);
        let d = WarriorAi.choose_action(&ctx, 1, &[1]).unwrap();
        // Shield Bash costs 10 mana: unaffordable, so plain basic attack
        assert_eq!(d.skill, None);
        assert!(matches!(d.chosen, Chosen::One(1)));
    }

    #[test]
    fn test_battle_roar_skipped_while_buffed() {
        let rules = test_rules();
        let mut combatants = vec![
            test_player(Archetype::Warrior),
            test_monster("A", 60, 5),
            test_monster("B", 60, 5),
        ];
        combatants[0]
            .effects
            .push(crate::effects::StatusEffect::StrengthUp {
                turns: 2,
                power: 0.2,
            });

        let ctx = context_with(&combatants, &rules);
        let d = WarriorAi.choose_action(&ctx, 1, &[1, 2]).unwrap();
        assert_ne!(d.skill, Some(SkillId::BattleRoar));
    }
}
