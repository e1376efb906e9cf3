//! Health and energy pools
//!
//! Health only goes down through `apply_damage` and never leaves
//! `[0, max_health]`. Energy is spent by attacks and blocks and always
//! stays in `[0, max_energy]`.

use serde::{Deserialize, Serialize};

use crate::combat::stats::Stats;
use crate::core::config::ResourceConfig;

/// Result of applying damage to a pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageApplied {
    /// Health actually removed, after clamping at zero
    pub amount: f32,
    pub new_health: f32,
    /// True only on the hit that took health from positive to zero
    pub crossed_death_threshold: bool,
}

/// Which pools changed since the last drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceChanges {
    pub health: bool,
    pub energy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    health: f32,
    max_health: f32,
    energy: f32,
    max_energy: f32,
    #[serde(skip)]
    health_dirty: bool,
    #[serde(skip)]
    energy_dirty: bool,
}

impl ResourcePool {
    /// Full pools sized from stats
    pub fn from_stats(stats: &Stats) -> Self {
        Self {
            health: stats.max_health,
            max_health: stats.max_health,
            energy: stats.max_energy,
            max_energy: stats.max_energy,
            health_dirty: false,
            energy_dirty: false,
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn max_energy(&self) -> f32 {
        self.max_energy
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0
    }

    /// Remove health, clamping at zero
    ///
    /// Non-positive amounts are ignored. Damage against an empty pool is a
    /// no-op so the death threshold is crossed exactly once.
    pub fn apply_damage(&mut self, amount: f32) -> DamageApplied {
        if amount <= 0.0 || self.health <= 0.0 {
            return DamageApplied {
                amount: 0.0,
                new_health: self.health,
                crossed_death_threshold: false,
            };
        }

        let before = self.health;
        self.health = (self.health - amount).max(0.0);
        self.health_dirty = true;
        DamageApplied {
            amount: before - self.health,
            new_health: self.health,
            crossed_death_threshold: self.health <= 0.0,
        }
    }

    /// Spend energy if enough is available; otherwise leave it untouched
    pub fn try_spend_energy(&mut self, cost: f32) -> bool {
        if cost <= 0.0 {
            return true;
        }
        if self.energy < cost {
            return false;
        }
        self.energy -= cost;
        self.energy_dirty = true;
        true
    }

    /// Drain energy without an affordability check, clamping at zero
    pub fn drain_energy(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        self.energy = (self.energy - amount).max(0.0);
        self.energy_dirty = true;
    }

    pub fn refund_energy(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        let before = self.energy;
        self.energy = (self.energy + amount).min(self.max_energy);
        self.energy_dirty |= self.energy != before;
    }

    /// Raise health toward max without reviving an emptied pool
    pub fn heal(&mut self, amount: f32) {
        if amount <= 0.0 || self.health <= 0.0 {
            return;
        }
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        self.health_dirty |= self.health != before;
    }

    /// Per-tick regeneration
    ///
    /// Health regenerates only while alive and below max. Energy regenerates
    /// while alive, at a reduced rate while blocking.
    pub fn regenerate(&mut self, dt: f32, stats: &Stats, blocking: bool, config: &ResourceConfig) {
        if self.health <= 0.0 {
            return;
        }

        self.heal(stats.regen_speed * dt);

        let multiplier = if blocking {
            config.blocking_regen_multiplier
        } else {
            1.0
        };
        self.refund_energy(stats.energy_regen_rate * multiplier * dt);
    }

    /// Refill both pools, e.g. between rounds
    pub fn reset_to_max(&mut self) {
        self.health = self.max_health;
        self.energy = self.max_energy;
        self.health_dirty = true;
        self.energy_dirty = true;
    }

    /// Change max health; a raise also heals by the same amount
    pub fn set_max_health(&mut self, max_health: f32) {
        let gain = max_health - self.max_health;
        self.max_health = max_health.max(0.0);
        if gain > 0.0 && self.health > 0.0 {
            self.health += gain;
        }
        self.health = self.health.min(self.max_health);
        self.health_dirty = true;
    }

    /// Pick up changed maximums after an upgrade
    ///
    /// A raised max health also raises current health by the same amount.
    pub fn sync_maximums(&mut self, stats: &Stats) {
        self.set_max_health(stats.max_health);
        self.max_energy = stats.max_energy;
        self.energy = self.energy.min(self.max_energy);
        self.energy_dirty = true;
    }

    /// Drain the change flags
    pub fn take_changes(&mut self) -> ResourceChanges {
        let changes = ResourceChanges {
            health: self.health_dirty,
            energy: self.energy_dirty,
        };
        self.health_dirty = false;
        self.energy_dirty = false;
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ResourcePool {
        ResourcePool::from_stats(&Stats::default())
    }

    #[test]
    fn test_damage_clamps_at_zero_and_crosses_once() {
        let mut pool = pool();
        let first = pool.apply_damage(150.0);
        assert_eq!(first.amount, 100.0);
        assert_eq!(first.new_health, 0.0);
        assert!(first.crossed_death_threshold);

        let second = pool.apply_damage(10.0);
        assert_eq!(second.amount, 0.0);
        assert!(!second.crossed_death_threshold);
    }

    #[test]
    fn test_reset_refills_both_pools() {
        let mut pool = pool();
        pool.apply_damage(60.0);
        pool.drain_energy(70.0);
        pool.reset_to_max();
        assert_eq!(pool.health(), 100.0);
        assert_eq!(pool.energy(), 100.0);
    }

    #[test]
    fn test_lowering_max_health_clamps_current() {
        let mut pool = pool();
        pool.set_max_health(150.0);
        assert_eq!(pool.health(), 150.0);
        pool.set_max_health(80.0);
        assert_eq!(pool.health(), 80.0);
    }

    #[test]
    fn test_non_positive_damage_ignored() {
        let mut pool = pool();
        pool.apply_damage(-5.0);
        pool.apply_damage(0.0);
        assert_eq!(pool.health(), 100.0);
        assert!(!pool.take_changes().health);
    }

    #[test]
    fn test_spend_fails_without_partial_deduction() {
        let mut pool = pool();
        assert!(pool.try_spend_energy(90.0));
        assert!(!pool.try_spend_energy(20.0));
        assert_eq!(pool.energy(), 10.0);
    }

    #[test]
    fn test_refund_clamps_at_max() {
        let mut pool = pool();
        pool.try_spend_energy(5.0);
        pool.refund_energy(20.0);
        assert_eq!(pool.energy(), 100.0);
    }

    #[test]
    fn test_blocking_slows_energy_regen() {
        let stats = Stats::default();
        let config = ResourceConfig::default();

        let mut open = pool();
        let mut guarded = pool();
        open.try_spend_energy(50.0);
        guarded.try_spend_energy(50.0);

        open.regenerate(1.0, &stats, false, &config);
        guarded.regenerate(1.0, &stats, true, &config);

        assert!((open.energy() - 60.0).abs() < 1e-4);
        assert!((guarded.energy() - 52.0).abs() < 1e-4);
    }

    #[test]
    fn test_dead_pool_does_not_regenerate() {
        let stats = Stats::default();
        let mut pool = pool();
        pool.try_spend_energy(50.0);
        pool.apply_damage(100.0);
        pool.regenerate(5.0, &stats, false, &ResourceConfig::default());
        assert_eq!(pool.health(), 0.0);
        assert_eq!(pool.energy(), 50.0);
    }

    #[test]
    fn test_health_upgrade_tops_up_current() {
        let mut stats = Stats::default();
        let mut pool = ResourcePool::from_stats(&stats);
        pool.apply_damage(30.0);
        stats.apply_upgrade(crate::combat::stats::StatType::Health);
        pool.sync_maximums(&stats);
        assert_eq!(pool.max_health(), 150.0);
        assert_eq!(pool.health(), 120.0);
    }
}
