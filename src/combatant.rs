//! Combatant State
//!
//! The mutable per-participant record: health, resources, stats, active
//! effects, cooldowns and known skills. One shared struct covers both
//! player-class and monster-class participants; behavior differences are
//! dispatched on the [`Controller`] tag, never on separate types.

use std::collections::HashMap;

use crate::combat::events::CombatEvent;
use crate::combat::log::CombatLog;
use crate::combat::Element;
use crate::effects::{self, EffectKind, StatusEffect};
use crate::rules::{
    Archetype, DecrementPhase, PassiveId, RulesError, RulesTable, SkillId, Trigger,
};

/// Who drives this combatant's turns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Controller {
    /// Archetype AI picks the action
    Player { archetype: Archetype },
    /// Plain basic-attack behavior; species keys the damage coefficients
    Monster { species: String },
}

/// Core offensive/defensive stats.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatBlock {
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub defense: f32,
}

/// One combat participant. Created at encounter setup from a template or
/// profile; mutated every resolved action and turn tick; never removed
/// mid-encounter (clamped at 0 health and excluded from further turns).
#[derive(Clone, Debug)]
pub struct Combatant {
    pub name: String,
    pub team: u8,
    pub level: i32,
    pub controller: Controller,

    pub max_health: i32,
    pub health: i32,
    pub max_mana: i32,
    pub mana: i32,
    pub mana_regen: i32,

    pub stats: StatBlock,
    pub accuracy: f32,
    pub crit_chance: f32,
    pub dodge_chance: f32,

    /// Ordered active effects; order matters for the damage pipeline
    pub effects: Vec<StatusEffect>,
    pub cooldowns: HashMap<SkillId, u32>,
    pub skills: Vec<SkillId>,
    pub passives: Vec<PassiveId>,

    // Monster template data read by AI threat scoring
    pub base_damage: i32,
    pub attack_interval: f32,
    pub resistances: Vec<Element>,
    pub weaknesses: Vec<Element>,
    pub tags: Vec<String>,

    // Narration flags written back by the resolver
    pub last_hit_chance: f32,
    pub last_crit: bool,
    pub last_weak: bool,
    pub last_resist: bool,
    pub last_incoming_damage: i32,

    // Turn bookkeeping
    pub has_acted: bool,
    pub last_stand_used: bool,
    /// Rogue AI memory: index of the last poisoned target
    pub poison_mark: Option<usize>,
    /// Live opponent indices recorded by the dispatcher for mid-action
    /// passives (Cleave splash)
    pub visible_enemies: Vec<usize>,
}

impl Combatant {
    pub fn new(
        name: impl Into<String>,
        team: u8,
        level: i32,
        max_health: i32,
        stats: StatBlock,
        controller: Controller,
    ) -> Self {
        Self {
            name: name.into(),
            team,
            level,
            controller,
            max_health,
            health: max_health,
            max_mana: 0,
            mana: 0,
            mana_regen: 0,
            stats,
            accuracy: 0.8,
            crit_chance: 0.05,
            dodge_chance: 0.03,
            effects: Vec::new(),
            cooldowns: HashMap::new(),
            skills: Vec::new(),
            passives: Vec::new(),
            base_damage: 0,
            attack_interval: 1.0,
            resistances: Vec::new(),
            weaknesses: Vec::new(),
            tags: Vec::new(),
            last_hit_chance: 0.0,
            last_crit: false,
            last_weak: false,
            last_resist: false,
            last_incoming_damage: 0,
            has_acted: false,
            last_stand_used: false,
            poison_mark: None,
            visible_enemies: Vec::new(),
        }
    }

    pub fn with_mana(mut self, max_mana: i32, regen: i32) -> Self {
        self.max_mana = max_mana;
        self.mana = max_mana;
        self.mana_regen = regen;
        self
    }

    pub fn with_rates(mut self, accuracy: f32, crit_chance: f32, dodge_chance: f32) -> Self {
        self.accuracy = accuracy;
        self.crit_chance = crit_chance;
        self.dodge_chance = dodge_chance;
        self
    }

    pub fn with_skills(mut self, skills: impl Into<Vec<SkillId>>) -> Self {
        self.skills = skills.into();
        self
    }

    pub fn with_passives(mut self, passives: impl Into<Vec<PassiveId>>) -> Self {
        self.passives = passives.into();
        self
    }

    /// Monster template fields used by the basic attack and threat scoring.
    pub fn with_template(
        mut self,
        base_damage: i32,
        attack_interval: f32,
        resistances: Vec<Element>,
        weaknesses: Vec<Element>,
        tags: Vec<String>,
    ) -> Self {
        self.base_damage = base_damage;
        self.attack_interval = attack_interval;
        self.resistances = resistances;
        self.weaknesses = weaknesses;
        self.tags = tags;
        self
    }

    // ========================================================================
    // Derived State
    // ========================================================================

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn health_pct(&self) -> f32 {
        if self.max_health > 0 {
            self.health as f32 / self.max_health as f32
        } else {
            0.0
        }
    }

    pub fn archetype(&self) -> Option<Archetype> {
        match &self.controller {
            Controller::Player { archetype } => Some(*archetype),
            Controller::Monster { .. } => None,
        }
    }

    pub fn species(&self) -> Option<&str> {
        match &self.controller {
            Controller::Player { .. } => None,
            Controller::Monster { species } => Some(species),
        }
    }

    pub fn knows_skill(&self, id: SkillId) -> bool {
        self.skills.contains(&id)
    }

    pub fn has_passive(&self, id: PassiveId) -> bool {
        self.passives.contains(&id)
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind() == kind)
    }

    /// Strength with the StrengthUp buff folded in.
    pub fn effective_strength(&self) -> i32 {
        let bonus: f32 = self
            .effects
            .iter()
            .filter_map(|e| match e {
                StatusEffect::StrengthUp { power, .. } => Some(*power),
                _ => None,
            })
            .sum();
        self.stats.strength + (self.stats.strength as f32 * bonus).round() as i32
    }

    /// Intelligence with the draining debuff folded in.
    pub fn effective_intelligence(&self) -> i32 {
        let drain: f32 = self
            .effects
            .iter()
            .filter_map(|e| match e {
                StatusEffect::IntellectDrain { power, .. } => Some(*power),
                _ => None,
            })
            .sum();
        let reduced =
            self.stats.intelligence - (self.stats.intelligence as f32 * drain).round() as i32;
        reduced.max(0)
    }

    // ========================================================================
    // Effects & Damage
    // ========================================================================

    pub fn apply_effect(&mut self, effect: StatusEffect, log: &mut CombatLog) {
        log.push(CombatEvent::EffectApplied {
            target: self.name.clone(),
            kind: effect.kind(),
            turns: effect.turns().unwrap_or(0),
        });
        self.effects.push(effect);
    }

    /// Apply damage through the incoming-damage pipeline, then the
    /// survive-fatal guard. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: i32, log: &mut CombatLog) -> i32 {
        let amount = effects::modify_incoming_damage(self, amount, log);
        self.last_incoming_damage = amount;

        // Last Stand: one-time guard against a lethal hit
        if !self.last_stand_used
            && amount >= self.health
            && self.has_effect(EffectKind::SurviveFatal)
        {
            self.effects.retain(|e| e.kind() != EffectKind::SurviveFatal);
            self.last_stand_used = true;
            let lost = self.health - 1;
            self.health = 1;
            log.push(CombatEvent::LastStand {
                target: self.name.clone(),
            });
            return lost;
        }

        let before = self.health;
        self.health = (self.health - amount).max(0);
        if before > 0 && self.health == 0 {
            log.push(CombatEvent::Death {
                target: self.name.clone(),
            });
        }
        before - self.health
    }

    // ========================================================================
    // Turn Ticks
    // ========================================================================

    /// Decrement effect durations and drop expired ones. Effects whose rule
    /// decrements at end-of-turn are left for the periodic hook so a single
    /// effect never loses two turns per round.
    pub fn tick_effects(
        &mut self,
        rules: &RulesTable,
        log: &mut CombatLog,
    ) -> Result<(), RulesError> {
        let mut idx = 0;
        while idx < self.effects.len() {
            let kind = self.effects[idx].kind();
            if rules.status(kind)?.decrement == DecrementPhase::EndOfTurn {
                idx += 1;
                continue;
            }
            if let Some(turns) = self.effects[idx].turns_mut() {
                *turns = turns.saturating_sub(1);
                if *turns == 0 {
                    self.effects.remove(idx);
                    log.push(CombatEvent::EffectRemoved {
                        target: self.name.clone(),
                        kind,
                    });
                    continue;
                }
            }
            idx += 1;
        }
        Ok(())
    }

    /// Decrement skill cooldowns, dropping the ones that reach zero.
    pub fn tick_cooldowns(&mut self) {
        self.cooldowns.retain(|_, cd| {
            if *cd > 1 {
                *cd -= 1;
                true
            } else {
                false
            }
        });
    }

    /// Regenerate mana, clamped at the maximum.
    pub fn tick_mana(&mut self) {
        if self.max_mana > 0 {
            self.mana = (self.mana + self.mana_regen).min(self.max_mana);
        }
    }

    // ========================================================================
    // Skill Gates
    // ========================================================================

    /// Evaluate a skill trigger against this combatant and a target.
    pub fn check_trigger(&self, trigger: Trigger, target: &Combatant, rules: &RulesTable) -> bool {
        match trigger {
            Trigger::Always => true,
            Trigger::SelfLowHealth => self.health_pct() < rules.triggers.self_low_health,
            Trigger::EnemyLowHealth => target.health_pct() < rules.triggers.enemy_low_health,
            Trigger::OnFatalHit => self.last_incoming_damage >= self.health,
            Trigger::FirstAction => !self.has_acted,
        }
    }

    /// Whether a skill may be used right now: known, off cooldown, mana
    /// sufficient and trigger met. The AI routes around `false`; skills are
    /// never force-executed without this gate.
    pub fn can_use(
        &self,
        rules: &RulesTable,
        id: SkillId,
        target: &Combatant,
    ) -> Result<bool, RulesError> {
        if !self.knows_skill(id) {
            return Ok(false);
        }
        let def = rules.skill(id)?;
        if self.cooldowns.get(&id).copied().unwrap_or(0) > 0 {
            return Ok(false);
        }
        if def.mana_cost > 0 && self.mana < def.mana_cost {
            return Ok(false);
        }
        Ok(self.check_trigger(def.trigger, target, rules))
    }

    /// One-time stat bonuses from passives, applied by the encounter
    /// assembler before the first round.
    pub fn apply_passive_stat_bonuses(&mut self, rules: &RulesTable) -> Result<(), RulesError> {
        if self.has_passive(PassiveId::EvasionMastery) {
            let power = rules.passive(PassiveId::EvasionMastery)?.power;
            self.stats.agility += (self.stats.agility as f32 * power + 0.5) as i32;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn test_dummy(name: &str, health: i32) -> Combatant {
        Combatant::new(
            name,
            0,
            1,
            health,
            StatBlock {
                strength: 10,
                agility: 10,
                intelligence: 10,
                defense: 0.0,
            },
            Controller::Monster {
                species: "GOBLIN".into(),
            },
        )
    }
}
