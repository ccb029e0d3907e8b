//! Data-Driven Combat Rules
//!
//! This module provides the immutable rules table loaded from a RON config
//! file. Instead of hardcoding curve parameters and skill stats in Rust, all
//! tuning data is defined in `assets/config/rules.ron`.
//!
//! ## Benefits
//! - Balance changes don't require recompilation
//! - Easier to review and modify skill values
//! - Validates all skills/statuses/archetypes exist at startup
//!
//! The table is read-only after loading and is passed by reference to every
//! component; nothing in the engine mutates it.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::combat::Element;
use crate::effects::EffectKind;

// ============================================================================
// Identifiers
// ============================================================================

/// Every active skill the engine knows about. Used as RON map keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillId {
    // Warrior
    BattleRoar,
    IronWill,
    ShieldBash,
    Taunt,
    WhirlwindSlash,
    // Mage
    Fireball,
    MagicBarrier,
    ChainLightning,
    ManaDrain,
    Meteor,
    TimeWarp,
    // Rogue
    SmokeBomb,
    PoisonedBlade,
    Assassinate,
    Shadowstep,
    Backstab,
}

impl SkillId {
    pub const ALL: [SkillId; 16] = [
        SkillId::BattleRoar,
        SkillId::IronWill,
        SkillId::ShieldBash,
        SkillId::Taunt,
        SkillId::WhirlwindSlash,
        SkillId::Fireball,
        SkillId::MagicBarrier,
        SkillId::ChainLightning,
        SkillId::ManaDrain,
        SkillId::Meteor,
        SkillId::TimeWarp,
        SkillId::SmokeBomb,
        SkillId::PoisonedBlade,
        SkillId::Assassinate,
        SkillId::Shadowstep,
        SkillId::Backstab,
    ];
}

/// Passive abilities. Power knobs live in the rules table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassiveId {
    Cleave,
    LastStand,
    ArcaneMastery,
    EvasionMastery,
}

impl PassiveId {
    pub const ALL: [PassiveId; 4] = [
        PassiveId::Cleave,
        PassiveId::LastStand,
        PassiveId::ArcaneMastery,
        PassiveId::EvasionMastery,
    ];
}

/// AI play-styles for player-class combatants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Warrior,
    Mage,
    Rogue,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Warrior, Archetype::Mage, Archetype::Rogue];
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration lookups that miss are fatal to the action and surface the
/// missing key explicitly. These propagate out of the executor and dispatcher.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("skill {0:?} missing from rules table")]
    UnknownSkill(SkillId),
    #[error("status effect {0:?} missing from rules table")]
    UnknownStatus(EffectKind),
    #[error("passive {0:?} missing from rules table")]
    UnknownPassive(PassiveId),
    #[error("archetype {0:?} missing from rules table")]
    UnknownArchetype(Archetype),
    #[error("archetype {archetype:?} has no AI config for skill {skill:?}")]
    UnknownAiSkill {
        archetype: Archetype,
        skill: SkillId,
    },
    #[error("reward tier {0} missing from rules table")]
    UnknownTier(u32),
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rules file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("rules table incomplete, missing: {0}")]
    Incomplete(String),
}

// ============================================================================
// Resolver Tuning
// ============================================================================

fn default_one() -> f32 {
    1.0
}

/// Hit-chance curve parameters.
///
/// Hit chance is a logistic function of the agility gap, scaled by the
/// attacker's accuracy and the defender's dodge, then clamped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HitCurve {
    /// Agility-delta divisor before the logistic is applied
    pub scale: f32,
    /// Logistic midpoint
    #[serde(default)]
    pub x0: f32,
    /// Logistic steepness
    #[serde(default = "default_one")]
    pub k: f32,
    /// Lower clamp on the final probability
    pub clamp_min: f32,
    /// Upper clamp on the final probability
    pub clamp_max: f32,
}

/// Damage formula coefficients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DamageRules {
    /// Strength contribution per point
    pub phys_coeff: f32,
    /// Intelligence contribution per point
    pub mag_coeff: f32,
    /// Per-level offense scaling for player-class attackers
    pub level_coeff_player: f32,
    /// Per-level offense scaling for monster-class attackers
    pub level_coeff_monster: f32,
    /// Lower bound on the variance multiplier
    pub variance_min: f32,
    /// Upper bound on the variance multiplier
    pub variance_max: f32,
    /// Normal crit multiplier
    pub crit_normal: f32,
    /// Heavy crit multiplier (triggered skills)
    pub crit_heavy: f32,
    /// Damage floor applied after rounding, regardless of mitigation
    pub min_damage: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefenseRules {
    /// Converts defense points into the mitigation denominator
    pub reduction_per_point: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementRules {
    /// Multiplier when the element matches a defender weakness
    pub weak_multiplier: f32,
    /// Multiplier when the element matches a defender resistance
    pub resist_multiplier: f32,
}

/// Phys/mag coefficient pair for a class or monster species.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DamageCoeffs {
    #[serde(default = "default_one")]
    pub phys: f32,
    #[serde(default = "default_one")]
    pub mag: f32,
}

impl Default for DamageCoeffs {
    fn default() -> Self {
        Self { phys: 1.0, mag: 1.0 }
    }
}

// ============================================================================
// Status Effects
// ============================================================================

/// When a status effect's remaining duration decrements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecrementPhase {
    /// Decremented by the per-turn effect tick
    #[default]
    OnTick,
    /// Decremented by the end-of-turn periodic-damage hook
    EndOfTurn,
}

/// Per-status tuning data, keyed by [`EffectKind`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusRule {
    /// Fraction of max health dealt per turn (burn, poison)
    #[serde(default)]
    pub periodic_damage: Option<f32>,
    /// Which hook owns this effect's duration bookkeeping
    #[serde(default)]
    pub decrement: DecrementPhase,
    /// Fraction of the caster's max mana restored when the draining debuff
    /// lands (IntellectDrain only)
    #[serde(default)]
    pub mana_recover: f32,
    /// Default reduction power when the applying skill carries none
    #[serde(default)]
    pub damage_multiplier: f32,
    /// Default shield capacity (fraction of max health) when the applying
    /// skill carries none
    #[serde(default)]
    pub absorb_fraction: f32,
}

// ============================================================================
// Skills & Passives
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillCategory {
    Damage,
    Buff,
    Debuff,
    Utility,
}

/// Who a skill resolves against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMode {
    #[default]
    Enemy,
    AllEnemies,
    TwoRandomEnemies,
    SelfTarget,
    Ally,
    Team,
}

/// Precondition on a skill, evaluated by `Combatant::check_trigger`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    #[default]
    Always,
    SelfLowHealth,
    EnemyLowHealth,
    OnFatalHit,
    FirstAction,
}

/// Status effect attached by a skill.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EffectSpec {
    pub kind: EffectKind,
    #[serde(default)]
    pub turns: u32,
    #[serde(default)]
    pub power: f32,
}

/// Complete skill definition loaded from RON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillDef {
    /// Display name
    pub name: String,
    pub category: SkillCategory,
    #[serde(default)]
    pub target: TargetMode,
    #[serde(default)]
    pub mana_cost: i32,
    /// Cooldown in turns (0 = none)
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default)]
    pub trigger: Trigger,
    /// Damage/effect magnitude; meaning depends on category
    #[serde(default = "default_one")]
    pub power: f32,
    /// Independent per-target success gate rolled before the hit check
    #[serde(default = "default_one")]
    pub success_chance: f32,
    #[serde(default)]
    pub element: Element,
    /// Status effect applied on success (if any)
    #[serde(default)]
    pub effect: Option<EffectSpec>,
    /// Second-target power fraction (Chain Lightning), used by AI scoring
    #[serde(default)]
    pub secondary_power: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PassiveDef {
    /// Display name
    pub name: String,
    /// Magnitude; meaning depends on the passive (splash fraction, amplify
    /// bonus, agility bonus)
    #[serde(default)]
    pub power: f32,
}

// ============================================================================
// AI Configuration
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_infinity() -> f32 {
    f32::INFINITY
}

/// Threat-model tuning for one archetype.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreatConfig {
    /// Read the enemy's accuracy into the DPS estimate
    #[serde(default)]
    pub use_accuracy: bool,
    /// Divide the DPS estimate by the enemy's attack interval
    #[serde(default)]
    pub use_interval: bool,
    /// Multiplier when the enemy resists physical damage
    #[serde(default = "default_one")]
    pub resist_modifier: f32,
    /// Multiplier when the enemy is weak to physical damage
    #[serde(default = "default_one")]
    pub weak_modifier: f32,
    /// Per-tag threat multipliers
    #[serde(default)]
    pub tag_weights: HashMap<String, f32>,
    /// Weight applied to tags without an entry in `tag_weights`
    #[serde(default = "default_one")]
    pub default_tag_weight: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Project one turn of mana regen into affordability checks
    #[serde(default)]
    pub consider_mana_regen: bool,
}

/// Per-skill AI scoring knobs. Fields are shared across archetypes; each
/// skill's formula reads only the ones it needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiSkillConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Readiness weight in the cooldown factor
    #[serde(default = "default_one")]
    pub cd_weight: f32,
    /// Minimum live enemy count before the skill scores
    #[serde(default)]
    pub min_enemies: usize,
    /// Boss detection: enemy max health relative to the actor's
    #[serde(default)]
    pub boss_hp_pct: Option<f32>,
    /// Strength fraction in the Battle Roar formula
    #[serde(default)]
    pub strength_pct: f32,
    /// Self or target health-fraction threshold
    #[serde(default)]
    pub hp_pct: f32,
    /// Fraction of max health a recent hit must reach to count as big
    #[serde(default = "default_infinity")]
    pub big_hit_pct: f32,
    /// Shield value as a fraction of max health (Iron Will)
    #[serde(default)]
    pub shield_pct: f32,
    /// Base strength fraction (Shield Bash)
    #[serde(default)]
    pub base_str_pct: f32,
    /// Score multiplier when a dangerous enemy is present
    #[serde(default = "default_one")]
    pub danger_mult: f32,
    /// Threat DPS above which an enemy counts as dangerous
    #[serde(default = "default_infinity")]
    pub danger_dps_thresh: f32,
    /// Minimum enemy accuracy for Taunt to consider it
    #[serde(default)]
    pub acc_threshold: f32,
    /// Per-enemy strength fraction (Whirlwind Slash)
    #[serde(default)]
    pub whirl_str_pct: f32,
    /// Mana fraction below which Mana Drain scores
    #[serde(default)]
    pub mana_threshold: f32,
    /// Flat weight for utility skills (Time Warp)
    #[serde(default = "default_one")]
    pub utility_weight: f32,
}

/// One archetype's complete AI configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    pub threat: ThreatConfig,
    #[serde(default)]
    pub resource: ResourceConfig,
    pub skills: HashMap<SkillId, AiSkillConfig>,
}

// ============================================================================
// Rewards & Triggers
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TierReward {
    /// Display name of the difficulty bucket
    pub name: String,
    /// Base experience awarded per encounter at this tier
    pub base_xp: i32,
}

/// Health-fraction thresholds for trigger evaluation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriggerRules {
    /// SelfLowHealth fires below this fraction
    pub self_low_health: f32,
    /// EnemyLowHealth fires below this fraction
    pub enemy_low_health: f32,
}

// ============================================================================
// Rules Table
// ============================================================================

/// The complete, immutable rules table.
///
/// Loaded once from `assets/config/rules.ron` and shared by reference with
/// every engine component. Safe to share across independent encounters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RulesTable {
    pub hit: HitCurve,
    pub damage: DamageRules,
    pub defense: DefenseRules,
    pub elements: ElementRules,
    pub statuses: HashMap<EffectKind, StatusRule>,
    pub skills: HashMap<SkillId, SkillDef>,
    pub passives: HashMap<PassiveId, PassiveDef>,
    pub archetypes: HashMap<Archetype, ArchetypeConfig>,
    /// Phys/mag coefficients per player archetype
    #[serde(default)]
    pub class_coeffs: HashMap<Archetype, DamageCoeffs>,
    /// Phys/mag coefficients per monster species
    #[serde(default)]
    pub species: HashMap<String, DamageCoeffs>,
    pub tiers: HashMap<u32, TierReward>,
    pub triggers: TriggerRules,
}

impl RulesTable {
    /// Get a skill definition, surfacing the missing key as an error.
    pub fn skill(&self, id: SkillId) -> Result<&SkillDef, RulesError> {
        self.skills.get(&id).ok_or(RulesError::UnknownSkill(id))
    }

    /// Get a status rule, surfacing the missing key as an error.
    pub fn status(&self, kind: EffectKind) -> Result<&StatusRule, RulesError> {
        self.statuses
            .get(&kind)
            .ok_or(RulesError::UnknownStatus(kind))
    }

    /// Get a passive definition, surfacing the missing key as an error.
    pub fn passive(&self, id: PassiveId) -> Result<&PassiveDef, RulesError> {
        self.passives.get(&id).ok_or(RulesError::UnknownPassive(id))
    }

    /// Get an archetype's AI configuration.
    pub fn archetype(&self, a: Archetype) -> Result<&ArchetypeConfig, RulesError> {
        self.archetypes
            .get(&a)
            .ok_or(RulesError::UnknownArchetype(a))
    }

    /// Get a tier's reward entry.
    pub fn tier(&self, t: u32) -> Result<&TierReward, RulesError> {
        self.tiers.get(&t).ok_or(RulesError::UnknownTier(t))
    }

    /// Phys/mag coefficients for a player archetype (1.0/1.0 when absent).
    pub fn class_coeffs(&self, a: Archetype) -> DamageCoeffs {
        self.class_coeffs.get(&a).copied().unwrap_or_default()
    }

    /// Phys/mag coefficients for a monster species (1.0/1.0 when absent).
    pub fn species_coeffs(&self, species: &str) -> DamageCoeffs {
        self.species.get(species).copied().unwrap_or_default()
    }

    /// Check that every skill, passive, status and archetype the engine can
    /// reference has an entry. Returns the list of missing key names.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut missing = Vec::new();

        for id in SkillId::ALL {
            if !self.skills.contains_key(&id) {
                missing.push(format!("skill {id:?}"));
            }
        }
        for id in PassiveId::ALL {
            if !self.passives.contains_key(&id) {
                missing.push(format!("passive {id:?}"));
            }
        }
        for kind in EffectKind::ALL {
            if !self.statuses.contains_key(&kind) {
                missing.push(format!("status {kind:?}"));
            }
        }
        for a in Archetype::ALL {
            match self.archetypes.get(&a) {
                None => missing.push(format!("archetype {a:?}")),
                Some(cfg) => {
                    // Every skill the archetype can score must have AI knobs
                    for (id, def) in &self.skills {
                        if def_belongs_to(*id, a) && !cfg.skills.contains_key(id) {
                            missing.push(format!("ai config {a:?}/{id:?}"));
                        }
                    }
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

/// Which archetype a skill belongs to, for validation purposes.
fn def_belongs_to(id: SkillId, a: Archetype) -> bool {
    use SkillId::*;
    let owner = match id {
        BattleRoar | IronWill | ShieldBash | Taunt | WhirlwindSlash => Archetype::Warrior,
        Fireball | MagicBarrier | ChainLightning | ManaDrain | Meteor | TimeWarp => Archetype::Mage,
        SmokeBomb | PoisonedBlade | Assassinate | Shadowstep | Backstab => Archetype::Rogue,
    };
    owner == a
}

/// Load and validate a rules table from a RON file.
pub fn load_rules(path: impl AsRef<Path>) -> Result<RulesTable, RulesError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| RulesError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let table: RulesTable = ron::from_str(&contents)?;
    table
        .validate()
        .map_err(|missing| RulesError::Incomplete(missing.join(", ")))?;

    info!(
        skills = table.skills.len(),
        statuses = table.statuses.len(),
        "loaded combat rules from {}",
        path.display()
    );

    Ok(table)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_table() -> RulesTable {
        RulesTable {
            hit: HitCurve {
                scale: 10.0,
                x0: 0.0,
                k: 1.0,
                clamp_min: 0.05,
                clamp_max: 0.95,
            },
            damage: DamageRules {
                phys_coeff: 1.0,
                mag_coeff: 1.0,
                level_coeff_player: 0.05,
                level_coeff_monster: 0.03,
                variance_min: 0.85,
                variance_max: 1.15,
                crit_normal: 1.5,
                crit_heavy: 2.0,
                min_damage: 1,
            },
            defense: DefenseRules {
                reduction_per_point: 2.0,
            },
            elements: ElementRules {
                weak_multiplier: 1.5,
                resist_multiplier: 0.5,
            },
            statuses: HashMap::new(),
            skills: HashMap::new(),
            passives: HashMap::new(),
            archetypes: HashMap::new(),
            class_coeffs: HashMap::new(),
            species: HashMap::new(),
            tiers: HashMap::new(),
            triggers: TriggerRules {
                self_low_health: 0.35,
                enemy_low_health: 0.3,
            },
        }
    }

    #[test]
    fn test_missing_skill_is_an_error() {
        let table = minimal_table();
        let err = table.skill(SkillId::Fireball).unwrap_err();
        assert!(matches!(err, RulesError::UnknownSkill(SkillId::Fireball)));
        assert!(err.to_string().contains("Fireball"));
    }

    #[test]
    fn test_missing_tier_is_an_error() {
        let table = minimal_table();
        let err = table.tier(3).unwrap_err();
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_coeff_lookups_default_to_unity() {
        let table = minimal_table();
        let cc = table.class_coeffs(Archetype::Mage);
        assert_eq!(cc.phys, 1.0);
        assert_eq!(cc.mag, 1.0);
        let sc = table.species_coeffs("GOBLIN");
        assert_eq!(sc.phys, 1.0);
        assert_eq!(sc.mag, 1.0);
    }

    #[test]
    fn test_validate_reports_every_missing_key() {
        let table = minimal_table();
        let missing = table.validate().unwrap_err();
        // 16 skills + 4 passives + all statuses + 3 archetypes
        assert!(missing.iter().any(|m| m.contains("Fireball")));
        assert!(missing.iter().any(|m| m.contains("LastStand")));
        assert!(missing.iter().any(|m| m.contains("Warrior")));
    }

    #[test]
    fn test_default_config_parses_and_validates() {
        let table = tests_support::test_rules();
        assert_eq!(table.skills.len(), SkillId::ALL.len());
        assert_eq!(table.passives.len(), PassiveId::ALL.len());
        assert!(table.tier(1).is_ok());
        let fireball = table.skill(SkillId::Fireball).unwrap();
        assert_eq!(fireball.category, SkillCategory::Damage);
        assert_eq!(fireball.element, Element::Fire);
    }

    #[test]
    fn test_skill_def_defaults_deserialize() {
        let def: SkillDef = ron::from_str(
            r#"(name: "Test Strike", category: Damage)"#,
        )
        .unwrap();
        assert_eq!(def.target, TargetMode::Enemy);
        assert_eq!(def.trigger, Trigger::Always);
        assert_eq!(def.power, 1.0);
        assert_eq!(def.success_chance, 1.0);
        assert_eq!(def.mana_cost, 0);
        assert!(def.effect.is_none());
    }
}
