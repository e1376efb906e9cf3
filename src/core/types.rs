//! Core identifiers shared by every combat subsystem

use serde::{Deserialize, Serialize};

pub use glam::{Vec2, Vec3};

/// Stable identifier for a combat actor
///
/// Ids are handed out in spawn order and never reused within an arena,
/// so ascending id order is also spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl ActorId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Side an actor fights for. Same-faction contacts never resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Faction {
    #[default]
    Player,
    Enemy,
}

/// Fixed-step simulation tick counter
pub type Tick = u64;

/// Project a vector onto the ground plane
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Unit direction from `from` to `to` on the ground plane, or zero if coincident
pub fn ground_direction(from: Vec3, to: Vec3) -> Vec3 {
    flatten(to - from).normalize_or_zero()
}

/// Distance between two points on the ground plane
pub fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}
