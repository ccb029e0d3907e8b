//! AI Decision Module
//!
//! Per-archetype utility scoring producing a skill choice or a basic-attack
//! fallback. Shared capabilities (threat model, cooldown factor, primary
//! ranking) live on [`AiContext`]; each archetype implements
//! [`ArchetypeAi::choose_action`] with its own formulas.
//!
//! Hard-gated emergency/finisher skills bypass scoring entirely. Remaining
//! skills are scored and the highest strictly-positive score wins; with no
//! positive score the fallback is a fixed tie-break, never scored.

pub mod mage;
pub mod rogue;
pub mod warrior;

use crate::combat::Element;
use crate::combatant::Combatant;
use crate::rules::{
    AiSkillConfig, Archetype, ArchetypeConfig, RulesError, RulesTable, SkillId,
};
use crate::skills::Chosen;

pub use mage::MageAi;
pub use rogue::RogueAi;
pub use warrior::WarriorAi;

/// The action an archetype settled on.
#[derive(Debug, Default)]
pub struct Decision {
    /// None means basic attack
    pub skill: Option<SkillId>,
    /// Raw target candidates; the selector resolves the final set
    pub chosen: Chosen,
    /// Target to remember as the poison mark (rogue memory)
    pub mark: Option<usize>,
}

/// Read-only view of the encounter handed to an archetype for one decision.
pub struct AiContext<'a> {
    pub combatants: &'a [Combatant],
    pub rules: &'a RulesTable,
    pub actor: usize,
    pub cfg: &'a ArchetypeConfig,
}

impl<'a> AiContext<'a> {
    pub fn new(
        combatants: &'a [Combatant],
        rules: &'a RulesTable,
        actor: usize,
        cfg: &'a ArchetypeConfig,
    ) -> Self {
        Self {
            combatants,
            rules,
            actor,
            cfg,
        }
    }

    pub fn actor(&self) -> &Combatant {
        &self.combatants[self.actor]
    }

    /// Base-damage DPS estimate for one enemy, adjusted by its physical
    /// resistances/weaknesses and the archetype's tag weights.
    pub fn threat(&self, enemy: usize) -> f32 {
        let t = &self.cfg.threat;
        let e = &self.combatants[enemy];

        let acc = if t.use_accuracy { e.accuracy } else { 1.0 };
        let interval = if t.use_interval { e.attack_interval } else { 1.0 };
        let mut dps = e.base_damage as f32 * acc / interval.max(f32::EPSILON);

        if e.resistances.contains(&Element::Physical) {
            dps *= t.resist_modifier;
        }
        if e.weaknesses.contains(&Element::Physical) {
            dps *= t.weak_modifier;
        }
        for tag in &e.tags {
            dps *= t
                .tag_weights
                .get(tag)
                .copied()
                .unwrap_or(t.default_tag_weight);
        }
        dps
    }

    /// Readiness factor: configured weight scaled down while the skill is
    /// cooling down.
    pub fn cd_factor(&self, skill: SkillId) -> f32 {
        let weight = self
            .cfg
            .skills
            .get(&skill)
            .map(|s| s.cd_weight)
            .unwrap_or(1.0);
        let cd = self.actor().cooldowns.get(&skill).copied().unwrap_or(0);
        weight * (1.0 / (cd as f32 + 1.0))
    }

    /// The archetype's scoring knobs for one skill.
    pub fn skill_cfg(&self, skill: SkillId) -> Result<&AiSkillConfig, RulesError> {
        self.cfg.skills.get(&skill).ok_or(RulesError::UnknownAiSkill {
            archetype: self
                .actor()
                .archetype()
                .unwrap_or(Archetype::Warrior),
            skill,
        })
    }

    /// The enemy with the highest threat.
    pub fn select_primary(&self, enemies: &[usize]) -> Option<usize> {
        enemies
            .iter()
            .copied()
            .max_by(|&a, &b| {
                self.threat(a)
                    .partial_cmp(&self.threat(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Mana available next action, optionally projecting one turn of regen.
    pub fn mana_future(&self) -> i32 {
        let a = self.actor();
        if self.cfg.resource.consider_mana_regen {
            a.mana + a.mana_regen
        } else {
            a.mana
        }
    }

    /// Proxy to the combatant-level usability gate.
    pub fn can_use(&self, skill: SkillId, target: usize) -> Result<bool, RulesError> {
        self.actor()
            .can_use(self.rules, skill, &self.combatants[target])
    }

    /// Live allies of the actor, the actor included.
    pub fn live_allies(&self) -> usize {
        let team = self.actor().team;
        self.combatants
            .iter()
            .filter(|c| c.team == team && c.is_alive())
            .count()
    }
}

/// Strategy trait implemented by the three archetypes.
pub trait ArchetypeAi {
    fn choose_action(
        &self,
        ctx: &AiContext,
        primary: usize,
        enemies: &[usize],
    ) -> Result<Decision, RulesError>;
}

/// Look up the strategy for an archetype.
pub fn archetype_ai(archetype: Archetype) -> &'static dyn ArchetypeAi {
    match archetype {
        Archetype::Warrior => &WarriorAi,
        Archetype::Mage => &MageAi,
        Archetype::Rogue => &RogueAi,
    }
}

/// Shared fallback: prefer a guaranteed-kill basic attack against any enemy
/// whose health is at or below the actor's raw strength (lowest health
/// first); otherwise basic-attack the given primary.
pub(crate) fn basic_attack_fallback(ctx: &AiContext, primary: usize, enemies: &[usize]) -> Decision {
    let strength = ctx.actor().stats.strength;
    let killable = enemies
        .iter()
        .copied()
        .filter(|&i| ctx.combatants[i].health <= strength)
        .min_by_key(|&i| ctx.combatants[i].health);

    Decision {
        skill: None,
        chosen: Chosen::One(killable.unwrap_or(primary)),
        mark: None,
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use crate::combatant::{Controller, StatBlock};
    use crate::rules::PassiveId;

    /// A level-5 player combatant on team 1 with full kit for an archetype.
    pub(crate) fn test_player(archetype: Archetype) -> Combatant {
        let (skills, stats) = match archetype {
            Archetype::Warrior => (
                vec![
                    SkillId::BattleRoar,
                    SkillId::IronWill,
                    SkillId::ShieldBash,
                    SkillId::Taunt,
                    SkillId::WhirlwindSlash,
                ],
                StatBlock {
                    strength: 25,
                    agility: 12,
                    intelligence: 5,
                    defense: 8.0,
                },
            ),
            Archetype::Mage => (
                vec![
                    SkillId::Fireball,
                    SkillId::MagicBarrier,
                    SkillId::ChainLightning,
                    SkillId::ManaDrain,
                    SkillId::Meteor,
                    SkillId::TimeWarp,
                ],
                StatBlock {
                    strength: 6,
                    agility: 10,
                    intelligence: 28,
                    defense: 3.0,
                },
            ),
            Archetype::Rogue => (
                vec![
                    SkillId::SmokeBomb,
                    SkillId::PoisonedBlade,
                    SkillId::Assassinate,
                    SkillId::Shadowstep,
                    SkillId::Backstab,
                ],
                StatBlock {
                    strength: 18,
                    agility: 22,
                    intelligence: 8,
                    defense: 4.0,
                },
            ),
        };
        Combatant::new("Hero", 1, 5, 120, stats, Controller::Player { archetype })
            .with_mana(80, 8)
            .with_rates(0.9, 0.1, 0.05)
            .with_skills(skills)
            .with_passives(match archetype {
                Archetype::Warrior => vec![PassiveId::Cleave, PassiveId::LastStand],
                Archetype::Mage => vec![PassiveId::ArcaneMastery],
                Archetype::Rogue => vec![PassiveId::EvasionMastery],
            })
    }

    /// A monster on team 2 with template data for threat scoring.
    pub(crate) fn test_monster(name: &str, health: i32, base_damage: i32) -> Combatant {
        Combatant::new(
            name,
            2,
            3,
            health,
            StatBlock {
                strength: 12,
                agility: 10,
                intelligence: 2,
                defense: 2.0,
            },
            Controller::Monster {
                species: "GOBLIN".into(),
            },
        )
        .with_template(base_damage, 1.0, vec![], vec![], vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::{test_monster, test_player};
    use super::*;
    use crate::rules::tests_support::test_rules;

    #[test]
    fn test_threat_ranks_the_hardest_hitter_first() {
        let rules = test_rules();
        let cfg = rules.archetype(Archetype::Warrior).unwrap();
        let combatants = vec![
            test_player(Archetype::Warrior),
            test_monster("Weak", 50, 5),
            test_monster("Strong", 50, 20),
        ];
        let ctx = AiContext::new(&combatants, &rules, 0, cfg);

        assert!(ctx.threat(2) > ctx.threat(1));
        assert_eq!(ctx.select_primary(&[1, 2]), Some(2));
    }

    #[test]
    fn test_tag_weights_raise_threat() {
        let rules = test_rules();
        let cfg = rules.archetype(Archetype::Warrior).unwrap();
        let mut combatants = vec![
            test_player(Archetype::Warrior),
            test_monster("Grunt", 50, 10),
            test_monster("Shaman", 50, 10),
        ];
        combatants[2].tags.push("caster".into());
        let ctx = AiContext::new(&combatants, &rules, 0, cfg);

        // Warrior weighs casters at 1.4
        assert!(ctx.threat(2) > ctx.threat(1));
    }

    #[test]
    fn test_cd_factor_decays_with_cooldown() {
        let rules = test_rules();
        let cfg = rules.archetype(Archetype::Mage).unwrap();
        let mut combatants = vec![test_player(Archetype::Mage), test_monster("G", 50, 5)];
        combatants[0].cooldowns.insert(SkillId::Meteor, 3);
        let ctx = AiContext::new(&combatants, &rules, 0, cfg);

        let ready = ctx.cd_factor(SkillId::Fireball);
        let cooling = ctx.cd_factor(SkillId::Meteor);
        assert_eq!(ready, 1.0);
        assert_eq!(cooling, 0.25);
    }

    #[test]
    fn test_fallback_prefers_guaranteed_kill() {
        let rules = test_rules();
        let cfg = rules.archetype(Archetype::Warrior).unwrap();
        let mut combatants = vec![
            test_player(Archetype::Warrior),
            test_monster("Tough", 80, 10),
            test_monster("Dying", 80, 10),
        ];
        // Warrior strength is 25: health 20 is a guaranteed kill
        combatants[2].health = 20;
        let ctx = AiContext::new(&combatants, &rules, 0, cfg);

        let d = basic_attack_fallback(&ctx, 1, &[1, 2]);
        assert!(d.skill.is_none());
        assert!(matches!(d.chosen, Chosen::One(2)));
    }
}
