//! Movement provider - locomotion, facing and knockback displacement
//!
//! The combat core never integrates positions itself. It issues intents
//! (move toward, stop, face) and reads back transforms once per tick.

use ahash::AHashMap;

use crate::core::types::{flatten, ActorId, Vec3};

pub trait MovementProvider {
    /// Register an actor at a position
    fn place(&mut self, actor: ActorId, position: Vec3, forward: Vec3);

    /// Forget an actor after it despawns
    fn remove(&mut self, actor: ActorId);

    /// Walk toward a destination, halting `stopping_distance` short of it
    fn move_toward(&mut self, actor: ActorId, destination: Vec3, speed: f32, stopping_distance: f32);

    /// Cancel any movement intent
    fn stop(&mut self, actor: ActorId);

    fn face_direction(&mut self, actor: ActorId, direction: Vec3);

    /// When enabled the actor turns to face its movement direction
    fn set_auto_rotation(&mut self, actor: ActorId, enabled: bool);

    /// Instant displacement, used for knockback
    fn displace(&mut self, actor: ActorId, delta: Vec3);

    fn position(&self, actor: ActorId) -> Option<Vec3>;

    fn forward(&self, actor: ActorId) -> Option<Vec3>;

    fn is_grounded(&self, actor: ActorId) -> bool;

    /// Whether a point can be walked to at all
    fn is_reachable(&self, point: Vec3) -> bool;

    /// Integrate pending movement
    fn advance(&mut self, dt: f32);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MoveIntent {
    destination: Vec3,
    speed: f32,
    stopping_distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Body {
    position: Vec3,
    forward: Vec3,
    intent: Option<MoveIntent>,
    auto_rotate: bool,
}

/// Flat-ground kinematic mover inside an optional circular boundary
#[derive(Debug, Clone, Default)]
pub struct KinematicMovement {
    bodies: AHashMap<ActorId, Body>,
    bounds: Option<f32>,
}

impl KinematicMovement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confine every body to a disc of this radius around the origin
    pub fn with_bounds(radius: f32) -> Self {
        Self {
            bodies: AHashMap::new(),
            bounds: Some(radius),
        }
    }

    pub fn is_moving(&self, actor: ActorId) -> bool {
        self.bodies
            .get(&actor)
            .map_or(false, |body| body.intent.is_some())
    }

    fn confine(&self, position: Vec3) -> Vec3 {
        let grounded = Vec3::new(position.x, position.y.max(0.0), position.z);
        match self.bounds {
            Some(radius) => {
                let flat = flatten(grounded).clamp_length_max(radius);
                Vec3::new(flat.x, grounded.y, flat.z)
            }
            None => grounded,
        }
    }
}

impl MovementProvider for KinematicMovement {
    fn place(&mut self, actor: ActorId, position: Vec3, forward: Vec3) {
        let forward = flatten(forward).try_normalize().unwrap_or(Vec3::Z);
        let position = self.confine(position);
        self.bodies.insert(
            actor,
            Body {
                position,
                forward,
                intent: None,
                auto_rotate: true,
            },
        );
    }

    fn remove(&mut self, actor: ActorId) {
        self.bodies.remove(&actor);
    }

    fn move_toward(&mut self, actor: ActorId, destination: Vec3, speed: f32, stopping_distance: f32) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.intent = Some(MoveIntent {
                destination,
                speed: speed.max(0.0),
                stopping_distance: stopping_distance.max(0.0),
            });
        }
    }

    fn stop(&mut self, actor: ActorId) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.intent = None;
        }
    }

    fn face_direction(&mut self, actor: ActorId, direction: Vec3) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            if let Some(forward) = flatten(direction).try_normalize() {
                body.forward = forward;
            }
        }
    }

    fn set_auto_rotation(&mut self, actor: ActorId, enabled: bool) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.auto_rotate = enabled;
        }
    }

    fn displace(&mut self, actor: ActorId, delta: Vec3) {
        let Some(position) = self.bodies.get(&actor).map(|body| body.position + delta) else {
            return;
        };
        let position = self.confine(position);
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.position = position;
        }
    }

    fn position(&self, actor: ActorId) -> Option<Vec3> {
        self.bodies.get(&actor).map(|body| body.position)
    }

    fn forward(&self, actor: ActorId) -> Option<Vec3> {
        self.bodies.get(&actor).map(|body| body.forward)
    }

    fn is_grounded(&self, actor: ActorId) -> bool {
        self.bodies
            .get(&actor)
            .map_or(false, |body| body.position.y <= 0.05)
    }

    fn is_reachable(&self, point: Vec3) -> bool {
        match self.bounds {
            Some(radius) => flatten(point).length() <= radius,
            None => true,
        }
    }

    fn advance(&mut self, dt: f32) {
        let bounds = self.bounds;
        for body in self.bodies.values_mut() {
            // Airborne bodies settle back onto the ground
            body.position.y = (body.position.y - 9.8 * dt).max(0.0);

            let Some(intent) = body.intent else {
                continue;
            };
            let offset = flatten(intent.destination - body.position);
            let distance = offset.length();
            if distance <= intent.stopping_distance + 1e-4 {
                continue;
            }

            let direction = offset / distance;
            let step = (intent.speed * dt).min(distance - intent.stopping_distance);
            body.position += direction * step;
            if let Some(radius) = bounds {
                let flat = flatten(body.position).clamp_length_max(radius);
                body.position = Vec3::new(flat.x, body.position.y, flat.z);
            }
            if body.auto_rotate {
                body.forward = direction;
            }
        }
    }
}
