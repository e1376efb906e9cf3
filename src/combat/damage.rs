//! Damage pipeline - resolves one weapon contact end to end
//!
//! Order of resolution:
//! 1. Drop contacts that cannot land (own faction, closed hitbox, dead or
//!    invulnerable defender, defender already struck this swing)
//! 2. Ask the defense resolver for parry, block or guard break
//! 3. Scale weapon damage by swing type and attacker strength
//! 4. Mitigate by defender defence
//! 5. Apply damage and knockback, then death if health ran out

use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::collab::PresentationSink;
use crate::combat::defense::{resolve_defense, DefenseQuery, DefenseVerdict};
use crate::combat::events::CombatEvent;
use crate::core::config::{CombatConfig, DamageConfig};
use crate::core::types::{ground_direction, Tick};

/// Why a contact produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IgnoreReason {
    SelfContact,
    SameFaction,
    HitboxClosed,
    DefenderDead,
    Invulnerable,
    AlreadyStruck,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContactOutcome {
    Ignored(IgnoreReason),
    Parried,
    Blocked { energy_spent: f32 },
    Hit {
        damage: f32,
        guard_broken: bool,
        killed: bool,
    },
}

impl ContactOutcome {
    pub fn damage(&self) -> f32 {
        match self {
            ContactOutcome::Hit { damage, .. } => *damage,
            _ => 0.0,
        }
    }
}

/// Damage before defence: base * heavy multiplier * (1 + strength * scaling)
pub fn raw_damage(base: f32, heavy: bool, strength: f32, config: &DamageConfig) -> f32 {
    let swing = if heavy { config.heavy_multiplier } else { 1.0 };
    base * swing * (1.0 + strength * config.strength_scaling)
}

/// Defence mitigation with diminishing returns
pub fn mitigate(raw: f32, defence: f32, config: &DamageConfig) -> f32 {
    let k = config.defence_constant;
    raw * k / (k + defence.max(0.0))
}

/// Resolve one contact between an attacker's open hitbox and a defender
pub fn resolve_contact<P: PresentationSink + ?Sized>(
    attacker: &mut Actor,
    defender: &mut Actor,
    config: &CombatConfig,
    tick: Tick,
    sink: &mut P,
) -> ContactOutcome {
    // ===== 1. ELIGIBILITY =====
    let ignored = if attacker.id == defender.id {
        Some(IgnoreReason::SelfContact)
    } else if attacker.faction == defender.faction {
        Some(IgnoreReason::SameFaction)
    } else if !attacker.weapon.hitbox_active() {
        Some(IgnoreReason::HitboxClosed)
    } else if !defender.is_alive() {
        Some(IgnoreReason::DefenderDead)
    } else if defender.is_invulnerable(config) {
        Some(IgnoreReason::Invulnerable)
    } else if !attacker.weapon.register_strike(defender.id) {
        Some(IgnoreReason::AlreadyStruck)
    } else {
        None
    };
    if let Some(reason) = ignored {
        return ContactOutcome::Ignored(reason);
    }

    // ===== 2. DEFENSE =====
    let query = DefenseQuery {
        blocking: defender.fsm.is_blocking(),
        time_since_block_start: defender.fsm.time_since_block_start().unwrap_or(0.0),
        defender_position: defender.position,
        defender_forward: defender.forward,
        attacker_position: attacker.position,
        defender_energy: defender.resources.energy(),
    };
    let verdict = resolve_defense(&query, &config.defense);

    let guard_broken = match verdict {
        DefenseVerdict::Parry => {
            defender
                .resources
                .refund_energy(config.defense.parry_energy_refund);
            attacker.punish_parried(config);
            tracing::info!(attacker = %attacker.id, defender = %defender.id, "parry");
            sink.emit(
                tick,
                CombatEvent::Parried {
                    attacker: attacker.id,
                    defender: defender.id,
                },
            );
            return ContactOutcome::Parried;
        }
        DefenseVerdict::Block => {
            let energy_spent = config.defense.block_energy_cost;
            defender.resources.drain_energy(energy_spent);
            attacker.slow_after_block(config);
            tracing::debug!(attacker = %attacker.id, defender = %defender.id, "block");
            sink.emit(
                tick,
                CombatEvent::Blocked {
                    attacker: attacker.id,
                    defender: defender.id,
                    energy_spent,
                },
            );
            return ContactOutcome::Blocked { energy_spent };
        }
        DefenseVerdict::GuardBreak => {
            defender.break_guard(config);
            tracing::info!(attacker = %attacker.id, defender = %defender.id, "guard broken");
            sink.emit(
                tick,
                CombatEvent::GuardBroken {
                    attacker: attacker.id,
                    defender: defender.id,
                },
            );
            true
        }
        DefenseVerdict::Unguarded | DefenseVerdict::Flanked => false,
    };

    // ===== 3-4. DAMAGE =====
    let heavy = attacker.weapon.heavy_swing();
    let raw = raw_damage(
        attacker.weapon.profile.damage,
        heavy,
        attacker.stats.strength,
        &config.damage,
    );
    let damage = mitigate(raw, defender.stats.defence, &config.damage);

    // ===== 5. APPLY =====
    let applied = defender.resources.apply_damage(damage);
    let direction = match ground_direction(attacker.position, defender.position) {
        d if d.length_squared() > 0.0 => d,
        _ => attacker.forward,
    };
    defender
        .impact
        .add_impulse(direction, attacker.weapon.profile.knockback, defender.mass);

    tracing::debug!(
        attacker = %attacker.id,
        defender = %defender.id,
        damage = applied.amount,
        health = applied.new_health,
        heavy,
        guard_broken,
        "hit"
    );
    sink.emit(
        tick,
        CombatEvent::Hit {
            attacker: attacker.id,
            defender: defender.id,
            damage: applied.amount,
            heavy,
            guard_broken,
        },
    );

    if applied.crossed_death_threshold {
        defender.die(config);
        tracing::info!(actor = %defender.id, name = %defender.name, killer = %attacker.id, "actor died");
        sink.emit(
            tick,
            CombatEvent::Death {
                actor: defender.id,
                killer: Some(attacker.id),
            },
        );
    } else if let Some(behavior) = defender.behavior_mut() {
        behavior.on_damaged(&config.behavior);
    }

    ContactOutcome::Hit {
        damage: applied.amount,
        guard_broken,
        killed: applied.crossed_death_threshold,
    }
}
