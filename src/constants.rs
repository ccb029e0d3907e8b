//! Engine Constants
//!
//! Centralized location for magic numbers used throughout the combat engine.
//! Tuning data that varies per deployment lives in the rules table instead;
//! only values baked into the engine's behavior belong here.

// ============================================================================
// Turn Sequencing
// ============================================================================

/// Safety cap on extra turns granted within a single dispatch.
///
/// Each extra-turn marker is single-use, so a combatant can never loop
/// forever, but a misconfigured rules table could keep re-granting markers.
/// The dispatcher stops recursing past this many extra turns.
pub const MAX_EXTRA_TURNS: u32 = 3;

/// Initiative jitter added to agility when sorting the round order.
/// Small enough that it only breaks ties between equal-agility combatants.
pub const INITIATIVE_JITTER: f32 = 0.1;

// ============================================================================
// Basic Attacks & Passives
// ============================================================================

/// Minimum splash damage dealt by the Cleave passive to secondary targets.
pub const CLEAVE_MIN_SPLASH: i32 = 1;

// ============================================================================
// AI Heuristics
// ============================================================================

/// Margin applied to the Assassinate kill estimate: targets below
/// `estimate * KILL_ESTIMATE_MARGIN` health count as finishable.
pub const KILL_ESTIMATE_MARGIN: f32 = 0.9;

/// Fraction of the rogue's max health a single enemy hit must threaten
/// before Shadowstep is considered an emergency escape.
pub const SHADOWSTEP_DANGER_PCT: f32 = 0.2;

// ============================================================================
// Rewards
// ============================================================================

/// Experience multiplier applied when the defeated group had more than one
/// enemy.
pub const GROUP_XP_BONUS: f32 = 1.2;

/// Fraction of the tier's base experience awarded on a loss.
pub const LOSS_XP_FRACTION: f32 = 0.5;
