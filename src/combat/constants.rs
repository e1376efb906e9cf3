//! Combat tuning defaults - every tunable value in one place
//!
//! `CombatConfig::default()` is built from these. Times are seconds,
//! distances are world units, angles are radians.

// Defense constants
pub const FRONTAL_CONE_THRESHOLD: f32 = 0.25;
pub const PARRY_WINDOW: f32 = 0.35;
pub const BLOCK_ENERGY_COST: f32 = 20.0;
pub const PARRY_ENERGY_REFUND: f32 = 20.0;
pub const BLOCK_SLOW_FRACTION: f32 = 0.3;
pub const BLOCK_SLOW_DURATION: f32 = 3.0;
pub const PARRY_STUN_DURATION: f32 = 1.2;
pub const STAGGER_SLOW_FRACTION: f32 = 0.5;
pub const STAGGER_SLOW_DURATION: f32 = 2.0;
pub const GUARD_BREAK_STUN_DURATION: f32 = 0.8;

// Damage constants
pub const HEAVY_DAMAGE_MULTIPLIER: f32 = 1.5;
pub const STRENGTH_SCALING: f32 = 0.1;
pub const DEFENCE_CONSTANT: f32 = 100.0;

// Attack timing constants
pub const LIGHT_ATTACK_COST: f32 = 10.0;
pub const HEAVY_ATTACK_COST: f32 = 25.0;
pub const LIGHT_SWING_DURATION: f32 = 0.9;
pub const HEAVY_SWING_DURATION: f32 = 1.6;
pub const COMBO_LENGTH: u8 = 2;
pub const ATTACK_RECOVERY: f32 = 0.2;
pub const HEAVY_COOLDOWN_BONUS: f32 = 0.5;
pub const MIN_ATTACK_TIME: f32 = 0.2;
pub const FAILSAFE_DURATION: f32 = 4.5;

// Swing timeline, as fractions of the swing duration
pub const HITBOX_OPEN_AT: f32 = 0.35;
pub const HITBOX_CLOSE_AT: f32 = 0.6;
pub const COMBO_WINDOW_AT: f32 = 0.65;

// Block and roll constants
pub const BLOCK_COOLDOWN: f32 = 0.5;
pub const ROLL_DURATION: f32 = 0.8;
pub const ROLL_COOLDOWN: f32 = 1.0;

// Resource constants
pub const BLOCKING_REGEN_MULTIPLIER: f32 = 0.2;
pub const BASE_HEALTH: f32 = 100.0;
pub const BASE_ENERGY: f32 = 100.0;
pub const BASE_ENERGY_REGEN: f32 = 10.0;

// Knockback constants
pub const DEFAULT_MASS: f32 = 3.0;
pub const IMPACT_DAMPING: f32 = 5.0;
pub const MIN_IMPACT: f32 = 0.2;
pub const MAX_STEP_FRACTION: f32 = 0.5;

// Behavior constants
pub const STRAFE_DISTANCE: f32 = 8.0;
pub const ATTACK_RANGE: f32 = 2.5;
pub const CHASE_SPEED: f32 = 3.5;
pub const STRAFE_SPEED: f32 = 2.0;
pub const STRAFE_OFFSET: f32 = 2.0;
pub const HEAVY_ATTACK_CHANCE: f32 = 0.3;
pub const COMBO_CHAIN_CHANCE: f32 = 0.6;
pub const DODGE_CHANCE_PER_LEVEL: f32 = 0.05;
pub const MAX_DODGE_CHANCE: f32 = 0.75;
pub const DODGE_COOLDOWN_PENALTY: f32 = 0.75;
pub const DODGE_DISTANCE: f32 = 2.5;
pub const DODGE_SPEED: f32 = 6.0;
pub const INCOMING_ATTACK_RADIUS: f32 = 5.0;
pub const SURPRISE_ATTACK_CHANCE: f32 = 0.3;
pub const HIT_STUN_DELAY: f32 = 0.5;

// Arena constants
pub const DESPAWN_DELAY: f32 = 5.0;
pub const ACTOR_RADIUS: f32 = 0.5;
pub const WALK_SPEED: f32 = 4.0;
pub const RUN_SPEED: f32 = 8.0;
pub const FIXED_TICK_RATE: f32 = 50.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swing_timeline_ordered() {
        assert!(HITBOX_OPEN_AT < HITBOX_CLOSE_AT);
        assert!(HITBOX_CLOSE_AT <= COMBO_WINDOW_AT);
        assert!(COMBO_WINDOW_AT < 1.0);
    }

    #[test]
    fn test_failsafe_outlasts_swings() {
        assert!(FAILSAFE_DURATION > HEAVY_SWING_DURATION);
        assert!(FAILSAFE_DURATION > LIGHT_SWING_DURATION);
        assert!(MIN_ATTACK_TIME < LIGHT_SWING_DURATION);
    }

    #[test]
    fn test_defense_constants_reasonable() {
        assert!(FRONTAL_CONE_THRESHOLD > 0.0 && FRONTAL_CONE_THRESHOLD < 1.0);
        assert!(PARRY_WINDOW > 0.0 && PARRY_WINDOW < 1.0);
        assert!(BLOCK_ENERGY_COST < BASE_ENERGY);
        assert!(MAX_DODGE_CHANCE <= 1.0);
    }
}
