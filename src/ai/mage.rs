//! Mage archetype
//!
//! Magic-focused play: shields immediately when health drops below the
//! barrier threshold, otherwise weighs direct damage against multi-target
//! spells by intelligence-scaled estimates, tops up mana when low, and
//! occasionally warps time for an extra turn.

use tracing::debug;

use crate::rules::{RulesError, SkillId, TargetMode};
use crate::skills::Chosen;

use super::{basic_attack_fallback, AiContext, ArchetypeAi, Decision};

pub struct MageAi;

impl ArchetypeAi for MageAi {
    fn choose_action(
        &self,
        ctx: &AiContext,
        primary: usize,
        enemies: &[usize],
    ) -> Result<Decision, RulesError> {
        let user = ctx.actor();
        let intelligence = user.stats.intelligence as f32;

        // 0) Hard gate: barrier first when health is low
        let barrier = ctx.skill_cfg(SkillId::MagicBarrier)?;
        if barrier.enabled
            && ctx.can_use(SkillId::MagicBarrier, primary)?
            && user.health_pct() < barrier.hp_pct
        {
            debug!(actor = %user.name, hp_pct = user.health_pct(), "barrier gate");
            return Ok(Decision {
                skill: Some(SkillId::MagicBarrier),
                chosen: Chosen::One(ctx.actor),
                mark: None,
            });
        }

        let mut utils: Vec<(SkillId, f32)> = Vec::with_capacity(5);

        // 1) Fireball: direct damage estimate
        let fireball = ctx.skill_cfg(SkillId::Fireball)?;
        let mut score = 0.0;
        if fireball.enabled && ctx.can_use(SkillId::Fireball, primary)? {
            let power = ctx.rules.skill(SkillId::Fireball)?.power;
            score = intelligence * power * ctx.cd_factor(SkillId::Fireball);
        }
        utils.push((SkillId::Fireball, score));

        // 2) Chain Lightning: two targets, main plus secondary power
        let chain = ctx.skill_cfg(SkillId::ChainLightning)?;
        let mut score = 0.0;
        if chain.enabled
            && ctx.can_use(SkillId::ChainLightning, primary)?
            && enemies.len() >= chain.min_enemies
        {
            let def = ctx.rules.skill(SkillId::ChainLightning)?;
            let main = def.power * intelligence;
            let secondary = def.secondary_power * intelligence;
            score = (main + secondary) * ctx.cd_factor(SkillId::ChainLightning);
        }
        utils.push((SkillId::ChainLightning, score));

        // 3) Meteor: AoE over every live enemy
        let meteor = ctx.skill_cfg(SkillId::Meteor)?;
        let mut score = 0.0;
        if meteor.enabled
            && ctx.can_use(SkillId::Meteor, primary)?
            && enemies.len() >= meteor.min_enemies
        {
            let power = ctx.rules.skill(SkillId::Meteor)?.power;
            score = intelligence * power * enemies.len() as f32 * ctx.cd_factor(SkillId::Meteor);
        }
        utils.push((SkillId::Meteor, score));

        // 4) Mana Drain: only when running dry
        let drain = ctx.skill_cfg(SkillId::ManaDrain)?;
        let mut score = 0.0;
        if drain.enabled && ctx.can_use(SkillId::ManaDrain, primary)? {
            let threshold = (user.max_mana as f32 * drain.mana_threshold) as i32;
            if user.mana < threshold {
                let power = ctx.rules.skill(SkillId::ManaDrain)?.power;
                score = intelligence * power * ctx.cd_factor(SkillId::ManaDrain);
            }
        }
        utils.push((SkillId::ManaDrain, score));

        // 5) Time Warp: flat-weighted utility
        let warp = ctx.skill_cfg(SkillId::TimeWarp)?;
        let mut score = 0.0;
        if warp.enabled && ctx.can_use(SkillId::TimeWarp, primary)? {
            score = intelligence * warp.utility_weight * ctx.cd_factor(SkillId::TimeWarp);
        }
        utils.push((SkillId::TimeWarp, score));

        let (best_skill, best_score) = utils
            .iter()
            .copied()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((SkillId::Fireball, 0.0));
        debug!(?utils, ?best_skill, best_score, "mage utilities");

        if best_score <= 0.0 {
            return Ok(basic_attack_fallback(ctx, primary, enemies));
        }

        // Multi-target modes hand the raw set to the selector
        let chosen = match ctx.rules.skill(best_skill)?.target {
            TargetMode::Enemy => Chosen::One(primary),
            TargetMode::SelfTarget | TargetMode::Ally => Chosen::One(ctx.actor),
            _ => Chosen::None,
        };
        Ok(Decision {
            skill: Some(best_skill),
            chosen,
            mark: None,
        })
    }
}
