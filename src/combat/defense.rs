//! Defense resolution - block, parry or nothing
//!
//! Pure decision logic. Given the defender's guard and the geometry of
//! the incoming swing, decide whether the hit is parried, blocked, or
//! lands. Side effects (energy, stuns, slows) are applied by the damage
//! pipeline.

use serde::{Deserialize, Serialize};

use crate::core::config::DefenseConfig;
use crate::core::types::Vec3;

/// Everything the resolver needs to know about one contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenseQuery {
    pub blocking: bool,
    /// Seconds since the guard went up; ignored when not blocking
    pub time_since_block_start: f32,
    pub defender_position: Vec3,
    pub defender_forward: Vec3,
    pub attacker_position: Vec3,
    pub defender_energy: f32,
}

/// Outcome as seen by the damage pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseOutcome {
    None,
    Block,
    Parry,
}

/// Detailed verdict, distinguishing why a hit was not defended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseVerdict {
    /// Defender was not blocking
    Unguarded,
    /// Guard was up but the attacker came from outside the frontal cone
    Flanked,
    Parry,
    Block,
    /// Frontal block without enough energy to hold it
    GuardBreak,
}

impl DefenseVerdict {
    pub fn outcome(self) -> DefenseOutcome {
        match self {
            DefenseVerdict::Parry => DefenseOutcome::Parry,
            DefenseVerdict::Block => DefenseOutcome::Block,
            DefenseVerdict::Unguarded | DefenseVerdict::Flanked | DefenseVerdict::GuardBreak => {
                DefenseOutcome::None
            }
        }
    }

    pub fn is_guard_break(self) -> bool {
        self == DefenseVerdict::GuardBreak
    }
}

/// Whether the attacker stands inside the defender's frontal cone
///
/// Measured in full 3D, so an attacker far above or below the defender
/// falls outside the cone. An attacker standing exactly on the defender is
/// treated as flanking.
pub fn is_frontal(query: &DefenseQuery, config: &DefenseConfig) -> bool {
    let facing = query.defender_forward.normalize_or_zero();
    let to_attacker = (query.attacker_position - query.defender_position).normalize_or_zero();
    facing.dot(to_attacker) > config.frontal_cone_threshold
}

/// Decide how a contact is defended
///
/// Parry is checked before block, so a frontal hit inside the parry window
/// is always a parry regardless of energy.
pub fn resolve_defense(query: &DefenseQuery, config: &DefenseConfig) -> DefenseVerdict {
    if !query.blocking {
        return DefenseVerdict::Unguarded;
    }
    if !is_frontal(query, config) {
        return DefenseVerdict::Flanked;
    }
    if query.time_since_block_start <= config.parry_window {
        return DefenseVerdict::Parry;
    }
    if query.defender_energy >= config.block_energy_cost {
        DefenseVerdict::Block
    } else {
        DefenseVerdict::GuardBreak
    }
}
