//! Encounter Loop
//!
//! Sequences dispatched turns by initiative order until one side is
//! eliminated or the round ceiling trips. Team 1 holds the player party,
//! team 2 the opposing group; rewards are paid from the tier table.

use tracing::{debug, info};

use crate::combat::events::CombatEvent;
use crate::combat::log::CombatLog;
use crate::combatant::Combatant;
use crate::constants::{GROUP_XP_BONUS, INITIATIVE_JITTER, LOSS_XP_FRACTION};
use crate::dispatch;
use crate::rng::GameRng;
use crate::rules::{RulesError, RulesTable};

pub const PLAYER_TEAM: u8 = 1;
pub const ENEMY_TEAM: u8 = 2;

/// Terminal result of one encounter.
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterOutcome {
    /// Winning team, None on a round-ceiling draw
    pub winner: Option<u8>,
    /// Rounds played
    pub rounds: u32,
    /// Experience paid to the player party
    pub xp_reward: i32,
}

/// Transient pairing of two teams. Owns the combatants, the RNG and the
/// combat log for the duration of one simulation; no identity beyond that.
pub struct Encounter {
    pub combatants: Vec<Combatant>,
    pub rng: GameRng,
    pub log: CombatLog,
    pub tier: u32,
}

impl Encounter {
    /// Assemble an encounter. One-time passive stat bonuses are applied
    /// here, before the first round.
    pub fn new(
        rules: &RulesTable,
        mut combatants: Vec<Combatant>,
        rng: GameRng,
        tier: u32,
    ) -> Result<Self, RulesError> {
        for c in &mut combatants {
            c.apply_passive_stat_bonuses(rules)?;
        }
        Ok(Self {
            combatants,
            rng,
            log: CombatLog::default(),
            tier,
        })
    }

    fn team_alive(&self, team: u8) -> bool {
        self.combatants
            .iter()
            .any(|c| c.team == team && c.is_alive())
    }

    /// Round order: living participants sorted descending by agility plus a
    /// small uniform jitter, so equal-agility ties break differently round
    /// to round.
    fn initiative(&mut self) -> Vec<usize> {
        let mut order: Vec<(usize, f32)> = self
            .combatants
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_alive())
            .map(|(i, c)| (i, c.stats.agility as f32))
            .collect();
        for entry in &mut order {
            entry.1 += self.rng.uniform() * INITIATIVE_JITTER;
        }
        order.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        order.into_iter().map(|(i, _)| i).collect()
    }

    /// Run rounds until one team is eliminated or `max_rounds` trips.
    pub fn run(&mut self, rules: &RulesTable, max_rounds: u32) -> Result<EncounterOutcome, RulesError> {
        info!(seed = ?self.rng.seed, tier = self.tier, "encounter start");
        let enemy_count = self
            .combatants
            .iter()
            .filter(|c| c.team == ENEMY_TEAM)
            .count();

        let mut rounds = 0;
        while rounds < max_rounds && self.team_alive(PLAYER_TEAM) && self.team_alive(ENEMY_TEAM) {
            rounds += 1;
            self.log.round = rounds;
            self.log.push(CombatEvent::RoundStarted { round: rounds });
            debug!(round = rounds, "round start");

            for actor in self.initiative() {
                dispatch::take_turn(
                    &mut self.combatants,
                    rules,
                    &mut self.rng,
                    &mut self.log,
                    actor,
                )?;
                if !self.team_alive(PLAYER_TEAM) || !self.team_alive(ENEMY_TEAM) {
                    break;
                }
            }
        }

        let winner = match (self.team_alive(PLAYER_TEAM), self.team_alive(ENEMY_TEAM)) {
            (true, false) => Some(PLAYER_TEAM),
            (false, true) => Some(ENEMY_TEAM),
            _ => None,
        };

        let base_xp = rules.tier(self.tier)?.base_xp;
        let xp_reward = match winner {
            Some(PLAYER_TEAM) => {
                let group = if enemy_count > 1 { GROUP_XP_BONUS } else { 1.0 };
                (base_xp as f32 * enemy_count as f32 * group) as i32
            }
            // A wipe still pays a consolation fraction of the tier base
            Some(_) => (base_xp as f32 * LOSS_XP_FRACTION) as i32,
            None => 0,
        };

        self.log.push(CombatEvent::EncounterEnded { winner, rounds });
        info!(?winner, rounds, xp_reward, "encounter over");
        Ok(EncounterOutcome {
            winner,
            rounds,
            xp_reward,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{Controller, StatBlock};
    use crate::rules::tests_support::test_rules;

    fn brawler(name: &str, team: u8, health: i32, strength: i32, agility: i32) -> Combatant {
        let mut c = Combatant::new(
            name,
            team,
            1,
            health,
            StatBlock {
                strength,
                agility,
                intelligence: 0,
                defense: 0.0,
            },
            Controller::Monster {
                species: "GOBLIN".into(),
            },
        );
        c.accuracy = 1.0;
        c.dodge_chance = 0.0;
        c.crit_chance = 0.0;
        c
    }

    #[test]
    fn test_initiative_orders_by_agility_desc() {
        let rules = test_rules();
        let combatants = vec![
            brawler("Slow", 1, 50, 10, 5),
            brawler("Fast", 2, 50, 10, 30),
            brawler("Mid", 2, 50, 10, 15),
        ];
        let mut enc = Encounter::new(&rules, combatants, GameRng::from_seed(1), 1).unwrap();
        assert_eq!(enc.initiative(), vec![1, 2, 0]);
    }

    #[test]
    fn test_dead_combatants_excluded_from_initiative() {
        let rules = test_rules();
        let mut combatants = vec![
            brawler("A", 1, 50, 10, 20),
            brawler("B", 2, 50, 10, 10),
        ];
        combatants[0].health = 0;
        let mut enc = Encounter::new(&rules, combatants, GameRng::from_seed(1), 1).unwrap();
        assert_eq!(enc.initiative(), vec![1]);
    }

    #[test]
    fn test_player_win_pays_group_bonus() {
        let rules = test_rules();
        let combatants = vec![
            brawler("Hero", 1, 500, 50, 100),
            brawler("Goblin A", 2, 1, 0, 0),
            brawler("Goblin B", 2, 1, 0, 0),
        ];
        // Round 1: 3 jitter draws, hero kill (hit/variance/crit), survivor
        // misses (0.99 vs the 0.05 clamp floor). Round 2: 2 jitter draws,
        // hero kill.
        let rng = GameRng::scripted([
            0.5, 0.5, 0.5, 0.0, 1.0, 0.99, 0.99, 0.5, 0.5, 0.0, 1.0, 0.99,
        ]);
        let mut enc = Encounter::new(&rules, combatants, rng, 1).unwrap();
        let outcome = enc.run(&rules, 10).unwrap();

        assert_eq!(outcome.winner, Some(PLAYER_TEAM));
        assert_eq!(outcome.rounds, 2);
        // tier 1 base 50 x 2 enemies x 1.2 group bonus
        assert_eq!(outcome.xp_reward, 120);
    }

    #[test]
    fn test_single_enemy_win_skips_group_bonus() {
        let rules = test_rules();
        let combatants = vec![
            brawler("Hero", 1, 500, 50, 100),
            brawler("Goblin", 2, 1, 0, 0),
        ];
        let rng = GameRng::scripted([0.5, 0.5, 0.0, 1.0, 0.99]);
        let mut enc = Encounter::new(&rules, combatants, rng, 1).unwrap();
        let outcome = enc.run(&rules, 10).unwrap();

        assert_eq!(outcome.winner, Some(PLAYER_TEAM));
        assert_eq!(outcome.xp_reward, 50);
    }

    #[test]
    fn test_loss_pays_half_the_tier_base() {
        let rules = test_rules();
        let combatants = vec![
            brawler("Hero", 1, 1, 0, 0),
            brawler("Ogre", 2, 500, 80, 100),
        ];
        let rng = GameRng::scripted([0.5, 0.5, 0.0, 1.0, 0.99]);
        let mut enc = Encounter::new(&rules, combatants, rng, 1).unwrap();
        let outcome = enc.run(&rules, 10).unwrap();

        assert_eq!(outcome.winner, Some(ENEMY_TEAM));
        assert_eq!(outcome.xp_reward, 25);
    }

    #[test]
    fn test_round_ceiling_yields_a_draw() {
        let rules = test_rules();
        let combatants = vec![
            brawler("A", 1, 10_000, 1, 10),
            brawler("B", 2, 10_000, 1, 10),
        ];
        let mut enc = Encounter::new(&rules, combatants, GameRng::from_seed(9), 1).unwrap();
        let outcome = enc.run(&rules, 2).unwrap();

        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.xp_reward, 0);
    }

    #[test]
    fn test_round_started_events_stamped_per_round() {
        let rules = test_rules();
        let combatants = vec![
            brawler("A", 1, 10_000, 1, 10),
            brawler("B", 2, 10_000, 1, 10),
        ];
        let mut enc = Encounter::new(&rules, combatants, GameRng::from_seed(9), 1).unwrap();
        enc.run(&rules, 3).unwrap();

        let rounds: Vec<u32> = enc
            .log
            .entries
            .iter()
            .filter_map(|e| match e.event {
                CombatEvent::RoundStarted { round } => Some(round),
                _ => None,
            })
            .collect();
        assert_eq!(rounds, vec![1, 2, 3]);
    }
}
