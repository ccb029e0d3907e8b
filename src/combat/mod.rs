//! Combat Primitives
//!
//! Shared enums for the resolver plus the structured event and log types.

pub mod events;
pub mod log;
pub mod resolver;

use serde::{Deserialize, Serialize};

/// Damage element. Weakness/resistance matching and the Arcane Mastery
/// amplify both key off whether the element is [`Element::Physical`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    #[default]
    Physical,
    Fire,
    Ice,
    Lightning,
    Poison,
    Holy,
    Dark,
}

impl Element {
    pub fn is_physical(self) -> bool {
        self == Element::Physical
    }
}

/// How damage reached the defender. True damage skips elemental modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    #[default]
    Normal,
    True,
}

/// Crit magnitude tier. Skills with FirstAction or EnemyLowHealth triggers
/// crit at the heavy tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CritTier {
    #[default]
    Normal,
    Heavy,
}
