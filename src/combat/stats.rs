//! Character stats, leveling and temporary slows
//!
//! Stats are plain numbers owned by an actor. Attack speed is the only
//! stat with a temporary modifier: a slow lowers the live value to
//! `base * (1 - fraction)` until it expires, and the base is never touched.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::constants::{BASE_ENERGY, BASE_ENERGY_REGEN, BASE_HEALTH};

/// Attack speed cap used by leveling; rolls past it go to strength
pub const MAX_LEVELED_ATTACK_SPEED: f32 = 3.0;

/// Upgradable stat categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatType {
    Strength,
    Defence,
    Regen,
    AttackSpeed,
    Health,
    Energy,
}

impl StatType {
    const LEVEL_ROLLS: [StatType; 6] = [
        StatType::Strength,
        StatType::Defence,
        StatType::Regen,
        StatType::AttackSpeed,
        StatType::Health,
        StatType::Energy,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct SlowEffect {
    fraction: f32,
    remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub strength: f32,
    pub defence: f32,
    /// Health regenerated per second
    pub regen_speed: f32,
    pub max_energy: f32,
    /// Energy regenerated per second
    pub energy_regen_rate: f32,
    pub max_health: f32,
    base_attack_speed: f32,
    slow: Option<SlowEffect>,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            strength: 1.0,
            defence: 0.0,
            regen_speed: 1.0,
            max_energy: BASE_ENERGY,
            energy_regen_rate: BASE_ENERGY_REGEN,
            max_health: BASE_HEALTH,
            base_attack_speed: 1.0,
            slow: None,
        }
    }
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh stats with `level - 1` random upgrades applied
    ///
    /// Each roll picks one stat uniformly. An attack speed roll at or above
    /// the cap becomes a strength roll instead.
    pub fn leveled<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Self {
        let mut stats = Self::default();
        for _ in 1..level.max(1) {
            let roll = StatType::LEVEL_ROLLS[rng.gen_range(0..StatType::LEVEL_ROLLS.len())];
            let roll = if roll == StatType::AttackSpeed
                && stats.base_attack_speed + 0.05 >= MAX_LEVELED_ATTACK_SPEED
            {
                StatType::Strength
            } else {
                roll
            };
            stats.raise(roll, 10.0);
        }
        stats
    }

    /// Level implied by the current base stats
    ///
    /// Inverse of `leveled`: each rolled upgrade contributes one level.
    pub fn level(&self) -> u32 {
        let points = (self.strength - 1.0)
            + self.defence
            + (self.regen_speed - 1.0) * 2.0
            + (self.base_attack_speed - 1.0) * 10.0
            + (self.max_health - BASE_HEALTH) / 10.0
            + (self.max_energy - BASE_ENERGY) / 10.0;
        (1.0 + points.round()).max(1.0) as u32
    }

    /// Permanent upgrade from a reward pickup
    ///
    /// Health upgrades are larger than leveling rolls. Raising max health
    /// does not touch current health; the owner tops that up.
    pub fn apply_upgrade(&mut self, stat: StatType) {
        self.raise(stat, 50.0);
    }

    fn raise(&mut self, stat: StatType, health_step: f32) {
        match stat {
            StatType::Strength => self.strength += 1.0,
            StatType::Defence => self.defence += 1.0,
            StatType::Regen => self.regen_speed += 0.5,
            StatType::AttackSpeed => self.base_attack_speed += 0.1,
            StatType::Health => self.max_health += health_step,
            StatType::Energy => self.max_energy += 10.0,
        }
    }

    /// Live attack speed, including any active slow
    pub fn attack_speed(&self) -> f32 {
        match self.slow {
            Some(slow) => self.base_attack_speed * (1.0 - slow.fraction),
            None => self.base_attack_speed,
        }
    }

    pub fn base_attack_speed(&self) -> f32 {
        self.base_attack_speed
    }

    pub fn set_base_attack_speed(&mut self, speed: f32) {
        self.base_attack_speed = speed.max(0.1);
    }

    pub fn is_slowed(&self) -> bool {
        self.slow.is_some()
    }

    /// Apply a temporary attack-speed slow
    ///
    /// Slows do not stack: the new fraction replaces the old one and the
    /// effect lasts for the longer of the two remaining durations.
    pub fn apply_slow(&mut self, fraction: f32, duration: f32) {
        let fraction = fraction.clamp(0.0, 0.95);
        let remaining = match self.slow {
            Some(current) => current.remaining.max(duration),
            None => duration,
        };
        self.slow = Some(SlowEffect { fraction, remaining });
    }

    /// Restore attack speed to its base value
    pub fn remove_slow(&mut self) {
        self.slow = None;
    }

    /// Advance timed effects
    pub fn tick_effects(&mut self, dt: f32) {
        if let Some(slow) = self.slow.as_mut() {
            slow.remaining -= dt;
            if slow.remaining <= 0.0 {
                self.slow = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_default_stats() {
        let stats = Stats::default();
        assert_eq!(stats.strength, 1.0);
        assert_eq!(stats.defence, 0.0);
        assert_eq!(stats.attack_speed(), 1.0);
        assert_eq!(stats.level(), 1);
    }

    #[test]
    fn test_leveled_stats_report_their_level() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for level in [1, 2, 5, 10, 25] {
            let stats = Stats::leveled(level, &mut rng);
            assert_eq!(stats.level(), level, "level {} round trip", level);
        }
    }

    #[test]
    fn test_slow_restores_base_on_expiry() {
        let mut stats = Stats::default();
        stats.apply_slow(0.5, 1.0);
        assert!((stats.attack_speed() - 0.5).abs() < 1e-6);

        stats.tick_effects(0.6);
        assert!(stats.is_slowed());
        stats.tick_effects(0.6);
        assert!(!stats.is_slowed());
        assert_eq!(stats.attack_speed(), 1.0);
    }

    #[test]
    fn test_slows_do_not_stack() {
        let mut stats = Stats::default();
        stats.apply_slow(0.3, 3.0);
        stats.apply_slow(0.5, 1.0);
        assert!((stats.attack_speed() - 0.5).abs() < 1e-6);

        // Longer duration survives the replacement
        stats.tick_effects(2.0);
        assert!(stats.is_slowed());
    }

    #[test]
    fn test_slow_does_not_change_level() {
        let mut stats = Stats::default();
        stats.apply_upgrade(StatType::AttackSpeed);
        let level = stats.level();
        stats.apply_slow(0.5, 2.0);
        assert_eq!(stats.level(), level);
        assert!((stats.base_attack_speed() - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_health_upgrade_adds_fifty() {
        let mut stats = Stats::default();
        stats.apply_upgrade(StatType::Health);
        assert_eq!(stats.max_health, 150.0);
    }
}
