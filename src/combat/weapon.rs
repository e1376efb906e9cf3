//! Weapon profiles and per-swing hit tracking
//!
//! A weapon's hitbox is open only while its wielder's swing says so. Each
//! opening starts a new swing with an empty struck set, so any defender can
//! be hit at most once per swing.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::types::{flatten, ActorId, Vec3};

/// Static weapon characteristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub name: String,
    /// Base damage before strength, heavy and defence modifiers
    pub damage: f32,
    /// Impulse applied to the defender on a clean hit
    pub knockback: f32,
    /// Reach measured from the wielder's center to the target's edge
    pub reach: f32,
    /// Full swing arc in radians, centered on the wielder's forward
    pub arc: f32,
}

impl Default for WeaponProfile {
    fn default() -> Self {
        Self::sword()
    }
}

impl WeaponProfile {
    pub fn sword() -> Self {
        Self {
            name: "sword".into(),
            damage: 20.0,
            knockback: 5.0,
            reach: 2.0,
            arc: 120f32.to_radians(),
        }
    }

    pub fn axe() -> Self {
        Self {
            name: "axe".into(),
            damage: 26.0,
            knockback: 7.0,
            reach: 2.2,
            arc: 100f32.to_radians(),
        }
    }

    pub fn spear() -> Self {
        Self {
            name: "spear".into(),
            damage: 18.0,
            knockback: 4.0,
            reach: 2.8,
            arc: 40f32.to_radians(),
        }
    }

    pub fn fists() -> Self {
        Self {
            name: "fists".into(),
            damage: 8.0,
            knockback: 2.0,
            reach: 1.2,
            arc: 90f32.to_radians(),
        }
    }

    /// Look up a preset by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "sword" => Some(Self::sword()),
            "axe" => Some(Self::axe()),
            "spear" => Some(Self::spear()),
            "fists" => Some(Self::fists()),
            _ => None,
        }
    }

    /// Whether a target lies inside this weapon's reach and arc
    pub fn covers(&self, origin: Vec3, forward: Vec3, target: Vec3, target_radius: f32) -> bool {
        let offset = flatten(target - origin);
        let distance = offset.length();
        if distance - target_radius > self.reach {
            return false;
        }
        if distance <= f32::EPSILON {
            return true;
        }

        let facing = flatten(forward).normalize_or_zero();
        let cos_half_arc = (self.arc * 0.5).cos();
        facing.dot(offset / distance) >= cos_half_arc
    }
}

/// An equipped weapon with its live hitbox
#[derive(Debug, Clone, Default)]
pub struct Weapon {
    pub profile: WeaponProfile,
    hitbox_active: bool,
    heavy_swing: bool,
    struck: AHashSet<ActorId>,
}

impl Weapon {
    pub fn new(profile: WeaponProfile) -> Self {
        Self {
            profile,
            hitbox_active: false,
            heavy_swing: false,
            struck: AHashSet::new(),
        }
    }

    /// Open the hitbox for a new swing
    pub fn open_hitbox(&mut self, heavy: bool) {
        self.hitbox_active = true;
        self.heavy_swing = heavy;
        self.struck.clear();
    }

    pub fn close_hitbox(&mut self) {
        self.hitbox_active = false;
    }

    pub fn hitbox_active(&self) -> bool {
        self.hitbox_active
    }

    /// Whether the current or most recent swing is heavy
    pub fn heavy_swing(&self) -> bool {
        self.heavy_swing
    }

    /// Record a strike; false if this defender was already struck this swing
    pub fn register_strike(&mut self, defender: ActorId) -> bool {
        self.struck.insert(defender)
    }

    pub fn has_struck(&self, defender: ActorId) -> bool {
        self.struck.contains(&defender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strike_registered_once_per_swing() {
        let mut weapon = Weapon::new(WeaponProfile::sword());
        weapon.open_hitbox(false);
        assert!(weapon.register_strike(ActorId(2)));
        assert!(!weapon.register_strike(ActorId(2)));

        weapon.close_hitbox();
        weapon.open_hitbox(true);
        assert!(weapon.heavy_swing());
        assert!(weapon.register_strike(ActorId(2)));
    }

    #[test]
    fn test_coverage_respects_reach_and_arc() {
        let sword = WeaponProfile::sword();
        let origin = Vec3::ZERO;
        let forward = Vec3::Z;

        assert!(sword.covers(origin, forward, Vec3::new(0.0, 0.0, 2.0), 0.5));
        assert!(!sword.covers(origin, forward, Vec3::new(0.0, 0.0, 3.0), 0.5));
        // Directly behind
        assert!(!sword.covers(origin, forward, Vec3::new(0.0, 0.0, -1.5), 0.5));
        // Spear is narrow
        let spear = WeaponProfile::spear();
        assert!(!spear.covers(origin, forward, Vec3::new(1.5, 0.0, 1.5), 0.5));
        assert!(sword.covers(origin, forward, Vec3::new(1.0, 0.0, 1.0), 0.5));
    }

    #[test]
    fn test_presets_by_name() {
        assert_eq!(WeaponProfile::by_name("axe"), Some(WeaponProfile::axe()));
        assert!(WeaponProfile::by_name("trebuchet").is_none());
    }
}
