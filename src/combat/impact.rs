//! Knockback impulse accumulator
//!
//! Hits add `direction * force / mass` to a decaying impact vector. While
//! the impact is above a threshold the actor is displaced a bounded step
//! each tick, so a large impulse can never carry it through an obstacle in
//! one step.

use serde::{Deserialize, Serialize};

use crate::core::config::KnockbackConfig;
use crate::core::types::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Impact {
    velocity: Vec3,
}

impl Impact {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate an impulse
    ///
    /// Downward pushes are reflected so knockback never drives an actor
    /// into the ground.
    pub fn add_impulse(&mut self, direction: Vec3, force: f32, mass: f32) {
        let mut direction = direction.normalize_or_zero();
        if direction.y < 0.0 {
            direction.y = -direction.y;
        }
        self.velocity += direction * force / mass.max(f32::EPSILON);
    }

    pub fn magnitude(&self) -> f32 {
        self.velocity.length()
    }

    pub fn clear(&mut self) {
        self.velocity = Vec3::ZERO;
    }

    /// Advance one tick and return this tick's displacement
    pub fn step(&mut self, dt: f32, radius: f32, config: &KnockbackConfig) -> Vec3 {
        let displacement = if self.velocity.length() > config.min_impact {
            (self.velocity * dt).clamp_length_max(radius * config.max_step_fraction)
        } else {
            Vec3::ZERO
        };

        self.velocity *= (-config.damping * dt).exp();
        if self.velocity.length() <= f32::EPSILON {
            self.velocity = Vec3::ZERO;
        }
        displacement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_scales_with_mass() {
        let mut light = Impact::new();
        let mut heavy = Impact::new();
        light.add_impulse(Vec3::X, 6.0, 1.0);
        heavy.add_impulse(Vec3::X, 6.0, 3.0);
        assert!((light.magnitude() - 6.0).abs() < 1e-5);
        assert!((heavy.magnitude() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_downward_impulse_reflected() {
        let mut impact = Impact::new();
        impact.add_impulse(Vec3::new(0.0, -1.0, 0.0), 3.0, 1.0);
        let step = impact.step(0.02, 0.5, &KnockbackConfig::default());
        assert!(step.y > 0.0);
    }

    #[test]
    fn test_step_is_bounded_and_decays() {
        let config = KnockbackConfig::default();
        let mut impact = Impact::new();
        impact.add_impulse(Vec3::Z, 1000.0, 1.0);

        let step = impact.step(0.1, 0.5, &config);
        assert!(step.length() <= 0.5 * config.max_step_fraction + 1e-5);

        for _ in 0..200 {
            impact.step(0.02, 0.5, &config);
        }
        assert_eq!(impact.step(0.02, 0.5, &config), Vec3::ZERO);
    }

    #[test]
    fn test_small_impact_does_not_move() {
        let mut impact = Impact::new();
        impact.add_impulse(Vec3::X, 0.1, 1.0);
        assert_eq!(impact.step(0.02, 0.5, &KnockbackConfig::default()), Vec3::ZERO);
    }
}
