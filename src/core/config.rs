//! Combat configuration with documented tuning values
//!
//! Every magic number of the combat core lives here, grouped by the
//! subsystem that reads it. Configs are plain values passed to the arena
//! at construction; there is no global instance. Files are TOML with one
//! table per section, and any missing key falls back to its default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::combat::constants::*;
use crate::core::error::{CombatError, Result};

/// Inclusive `[min, max]` range sampled uniformly by the enemy controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRange {
    pub min: f32,
    pub max: f32,
}

impl SampleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &str) -> std::result::Result<(), String> {
        if self.min < 0.0 || self.max < self.min {
            return Err(format!(
                "{} range must satisfy 0 <= min <= max (got {}..{})",
                name, self.min, self.max
            ));
        }
        Ok(())
    }
}

/// Block and parry tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseConfig {
    /// Minimum dot(defender forward, direction to attacker) for a guard to count
    ///
    /// 0.25 is roughly a 150 degree frontal cone.
    pub frontal_cone_threshold: f32,

    /// Seconds after raising the guard during which a frontal hit is parried
    pub parry_window: f32,

    /// Energy drained from the defender by a successful block
    pub block_energy_cost: f32,

    /// Energy returned to the defender by a successful parry
    pub parry_energy_refund: f32,

    /// Attack-speed slow applied to an attacker whose hit was blocked
    pub block_slow_fraction: f32,
    pub block_slow_duration: f32,

    /// Stun applied to an attacker whose hit was parried
    pub parry_stun_duration: f32,

    /// Attack-speed slow applied to a staggered enemy, parried or guard-broken
    pub stagger_slow_fraction: f32,
    pub stagger_slow_duration: f32,

    /// Stun applied to a defender whose guard broke
    pub guard_break_stun_duration: f32,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        Self {
            frontal_cone_threshold: FRONTAL_CONE_THRESHOLD,
            parry_window: PARRY_WINDOW,
            block_energy_cost: BLOCK_ENERGY_COST,
            parry_energy_refund: PARRY_ENERGY_REFUND,
            block_slow_fraction: BLOCK_SLOW_FRACTION,
            block_slow_duration: BLOCK_SLOW_DURATION,
            parry_stun_duration: PARRY_STUN_DURATION,
            stagger_slow_fraction: STAGGER_SLOW_FRACTION,
            stagger_slow_duration: STAGGER_SLOW_DURATION,
            guard_break_stun_duration: GUARD_BREAK_STUN_DURATION,
        }
    }
}

/// Damage formula tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConfig {
    /// Multiplier applied to weapon damage for heavy swings
    pub heavy_multiplier: f32,

    /// Fractional bonus per point of attacker strength
    ///
    /// raw = base * (1 + strength * strength_scaling)
    pub strength_scaling: f32,

    /// Diminishing-returns constant for defence mitigation
    ///
    /// final = raw * K / (K + defence). At defence == K damage is halved.
    pub defence_constant: f32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            heavy_multiplier: HEAVY_DAMAGE_MULTIPLIER,
            strength_scaling: STRENGTH_SCALING,
            defence_constant: DEFENCE_CONSTANT,
        }
    }
}

/// Attack, block and roll timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub light_attack_cost: f32,
    pub heavy_attack_cost: f32,

    /// Nominal swing lengths at attack speed 1.0
    ///
    /// Light swings scale by 1 / attack_speed, heavy swings by
    /// 1 / (attack_speed / 2 + 0.5).
    pub light_swing_duration: f32,
    pub heavy_swing_duration: f32,

    /// Number of steps in the light combo before it wraps to the first
    pub combo_length: u8,

    /// Attack cooldown after any swing finishes
    pub attack_recovery: f32,

    /// Added to 1 / attack_speed to gate the next attack after a heavy starts
    pub heavy_cooldown_bonus: f32,

    /// Finish callbacks arriving sooner than this after a swing starts are stale
    pub min_attack_time: f32,

    /// Maximum time in Attacking or Stunned before the machine forces Idle
    pub failsafe_duration: f32,

    /// Swing timeline fractions used by the self-timed animation driver
    pub hitbox_open_at: f32,
    pub hitbox_close_at: f32,
    pub combo_window_at: f32,

    pub block_cooldown: f32,
    pub roll_duration: f32,
    pub roll_cooldown: f32,

    /// Whether Rolling grants invulnerability
    pub roll_iframes: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            light_attack_cost: LIGHT_ATTACK_COST,
            heavy_attack_cost: HEAVY_ATTACK_COST,
            light_swing_duration: LIGHT_SWING_DURATION,
            heavy_swing_duration: HEAVY_SWING_DURATION,
            combo_length: COMBO_LENGTH,
            attack_recovery: ATTACK_RECOVERY,
            heavy_cooldown_bonus: HEAVY_COOLDOWN_BONUS,
            min_attack_time: MIN_ATTACK_TIME,
            failsafe_duration: FAILSAFE_DURATION,
            hitbox_open_at: HITBOX_OPEN_AT,
            hitbox_close_at: HITBOX_CLOSE_AT,
            combo_window_at: COMBO_WINDOW_AT,
            block_cooldown: BLOCK_COOLDOWN,
            roll_duration: ROLL_DURATION,
            roll_cooldown: ROLL_COOLDOWN,
            roll_iframes: true,
        }
    }
}

/// Regeneration tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Energy regen is multiplied by this while blocking
    pub blocking_regen_multiplier: f32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            blocking_regen_multiplier: BLOCKING_REGEN_MULTIPLIER,
        }
    }
}

/// Knockback accumulator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnockbackConfig {
    /// Exponential decay rate of accumulated impact per second
    pub damping: f32,

    /// Impact magnitude below which no displacement is applied
    pub min_impact: f32,

    /// Largest displacement per tick, as a fraction of the actor radius
    pub max_step_fraction: f32,

    /// Mass used for actors spawned without an explicit one
    pub default_mass: f32,
}

impl Default for KnockbackConfig {
    fn default() -> Self {
        Self {
            damping: IMPACT_DAMPING,
            min_impact: MIN_IMPACT,
            max_step_fraction: MAX_STEP_FRACTION,
            default_mass: DEFAULT_MASS,
        }
    }
}

/// Enemy controller tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Beyond this distance the enemy chases, within it the enemy strafes
    pub strafe_distance: f32,

    /// Distance at which the enemy commits to an attack
    pub attack_range: f32,

    pub chase_speed: f32,
    pub strafe_speed: f32,

    /// Lateral offset from the target used as the strafe destination
    pub strafe_offset: f32,

    /// Idle wait between strafe repositions
    pub wait_interval: SampleRange,

    /// Length of one strafe reposition
    pub reposition_duration: SampleRange,

    /// Delay between enemy attacks
    pub attack_cooldown: SampleRange,

    /// Chance an enemy attack is heavy
    pub heavy_attack_chance: f32,

    /// Chance a light swing chains into the next combo step
    pub combo_chain_chance: f32,

    /// Dodge chance gained per enemy level, capped by max_dodge_chance
    pub dodge_chance_per_level: f32,
    pub max_dodge_chance: f32,

    /// Added to the attack cooldown after a successful dodge
    pub dodge_cooldown_penalty: f32,
    pub dodge_distance: f32,
    pub dodge_speed: f32,

    /// Enemies within this radius of a player swing get a dodge roll
    pub incoming_attack_radius: f32,

    /// Chance taking damage resets the attack cooldown to zero
    pub surprise_attack_chance: f32,

    /// Otherwise taking damage adds this delay to the attack cooldown
    pub hit_stun_delay: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            strafe_distance: STRAFE_DISTANCE,
            attack_range: ATTACK_RANGE,
            chase_speed: CHASE_SPEED,
            strafe_speed: STRAFE_SPEED,
            strafe_offset: STRAFE_OFFSET,
            wait_interval: SampleRange::new(2.0, 5.0),
            reposition_duration: SampleRange::new(0.5, 1.2),
            attack_cooldown: SampleRange::new(2.0, 4.0),
            heavy_attack_chance: HEAVY_ATTACK_CHANCE,
            combo_chain_chance: COMBO_CHAIN_CHANCE,
            dodge_chance_per_level: DODGE_CHANCE_PER_LEVEL,
            max_dodge_chance: MAX_DODGE_CHANCE,
            dodge_cooldown_penalty: DODGE_COOLDOWN_PENALTY,
            dodge_distance: DODGE_DISTANCE,
            dodge_speed: DODGE_SPEED,
            incoming_attack_radius: INCOMING_ATTACK_RADIUS,
            surprise_attack_chance: SURPRISE_ATTACK_CHANCE,
            hit_stun_delay: HIT_STUN_DELAY,
        }
    }
}

/// Arena-level tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Seconds a dead enemy lingers before it is removed
    pub despawn_delay: f32,

    /// Radius for actors spawned without an explicit one
    pub actor_radius: f32,

    pub walk_speed: f32,
    pub run_speed: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            despawn_delay: DESPAWN_DELAY,
            actor_radius: ACTOR_RADIUS,
            walk_speed: WALK_SPEED,
            run_speed: RUN_SPEED,
        }
    }
}

/// Complete combat configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CombatConfig {
    pub defense: DefenseConfig,
    pub damage: DamageConfig,
    pub timing: TimingConfig,
    pub resources: ResourceConfig,
    pub knockback: KnockbackConfig,
    pub behavior: BehaviorConfig,
    pub arena: ArenaConfig,
}

impl CombatConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document, filling missing keys with defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(contents)?;
        config.validate().map_err(CombatError::InvalidConfig)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        let d = &self.defense;
        if !(0.0..1.0).contains(&d.frontal_cone_threshold) {
            return Err(format!(
                "frontal_cone_threshold ({}) must be in [0, 1)",
                d.frontal_cone_threshold
            ));
        }
        if d.parry_window < 0.0 || d.block_energy_cost < 0.0 || d.parry_energy_refund < 0.0 {
            return Err("Defense windows and energy amounts must be non-negative".into());
        }
        for (name, fraction) in [
            ("block_slow_fraction", d.block_slow_fraction),
            ("stagger_slow_fraction", d.stagger_slow_fraction),
        ] {
            if !(0.0..1.0).contains(&fraction) {
                return Err(format!("{} ({}) must be in [0, 1)", name, fraction));
            }
        }

        if self.damage.defence_constant <= 0.0 {
            return Err(format!(
                "defence_constant ({}) must be positive",
                self.damage.defence_constant
            ));
        }
        if self.damage.heavy_multiplier < 1.0 {
            return Err("heavy_multiplier must be at least 1.0".into());
        }

        let t = &self.timing;
        if t.light_swing_duration <= 0.0 || t.heavy_swing_duration <= 0.0 {
            return Err("Swing durations must be positive".into());
        }
        if t.combo_length == 0 {
            return Err("combo_length must be at least 1".into());
        }
        if t.light_swing_duration < t.min_attack_time || t.heavy_swing_duration < t.min_attack_time {
            return Err(format!(
                "Swing durations must be at least min_attack_time ({})",
                t.min_attack_time
            ));
        }
        if t.failsafe_duration <= t.heavy_swing_duration {
            return Err(format!(
                "failsafe_duration ({}) must exceed heavy_swing_duration ({})",
                t.failsafe_duration, t.heavy_swing_duration
            ));
        }
        if !(t.hitbox_open_at < t.hitbox_close_at && t.hitbox_close_at < 1.0) {
            return Err("Swing timeline must satisfy hitbox_open_at < hitbox_close_at < 1".into());
        }
        if !(0.0..1.0).contains(&t.combo_window_at) {
            return Err("combo_window_at must be in [0, 1)".into());
        }

        if !(0.0..=1.0).contains(&self.resources.blocking_regen_multiplier) {
            return Err("blocking_regen_multiplier must be in [0, 1]".into());
        }

        if self.knockback.default_mass <= 0.0 || self.knockback.damping < 0.0 {
            return Err("Knockback mass must be positive and damping non-negative".into());
        }

        let b = &self.behavior;
        b.wait_interval.validate("wait_interval")?;
        b.reposition_duration.validate("reposition_duration")?;
        b.attack_cooldown.validate("attack_cooldown")?;
        for (name, chance) in [
            ("heavy_attack_chance", b.heavy_attack_chance),
            ("combo_chain_chance", b.combo_chain_chance),
            ("max_dodge_chance", b.max_dodge_chance),
            ("surprise_attack_chance", b.surprise_attack_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(format!("{} ({}) must be a probability", name, chance));
            }
        }
        if b.attack_range <= 0.0 || b.strafe_distance < b.attack_range {
            return Err(format!(
                "strafe_distance ({}) must be >= attack_range ({}) > 0",
                b.strafe_distance, b.attack_range
            ));
        }

        if self.arena.actor_radius <= 0.0 {
            return Err("actor_radius must be positive".into());
        }

        Ok(())
    }
}
