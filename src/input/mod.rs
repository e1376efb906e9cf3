//! Player input adapter
//!
//! Turns a frame of player input into state machine requests and
//! movement intents. Attack, roll and lock-on presses are edge triggered
//! and consumed by the next tick; movement and the block button are held.

use crate::actor::ActorBody;
use crate::collab::MovementProvider;
use crate::combat::fsm::{AttackKind, RequestOutcome};
use crate::core::config::CombatConfig;
use crate::core::types::{Vec2, Vec3};

/// Dead zone for the movement stick
const MOVE_DEAD_ZONE: f32 = 0.1;

/// Blocking players shuffle at a fraction of walk speed
const BLOCKING_SPEED_FACTOR: f32 = 0.5;

/// One frame of player input
///
/// `movement` and `look` are world-space directions on the ground plane,
/// x mapping to world x and y to world z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerInput {
    pub movement: Vec2,
    /// Explicit facing, e.g. toward a locked-on target
    pub look: Option<Vec2>,
    pub run: bool,
    pub light_attack: bool,
    pub heavy_attack: bool,
    pub block: bool,
    pub roll: bool,
    pub lock_on: bool,
}

/// What became of each request made this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputReport {
    pub attack: Option<RequestOutcome>,
    pub block: Option<RequestOutcome>,
    pub roll: Option<RequestOutcome>,
    pub lock_on: Option<RequestOutcome>,
}

#[derive(Debug, Clone, Default)]
pub struct InputAdapter {
    pending: PlayerInput,
    lock_on: bool,
    last_report: InputReport,
}

fn ground(v: Vec2) -> Vec3 {
    Vec3::new(v.x, 0.0, v.y)
}

impl InputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending frame of input
    pub fn set_input(&mut self, input: PlayerInput) {
        self.pending = input;
    }

    pub fn lock_on_active(&self) -> bool {
        self.lock_on
    }

    pub fn last_report(&self) -> InputReport {
        self.last_report
    }

    pub fn apply<M: MovementProvider + ?Sized>(
        &mut self,
        body: ActorBody<'_>,
        movement: &mut M,
        config: &CombatConfig,
    ) -> InputReport {
        let input = self.pending;
        self.pending.light_attack = false;
        self.pending.heavy_attack = false;
        self.pending.roll = false;
        self.pending.lock_on = false;

        let mut report = InputReport::default();
        if body.fsm.is_dead() {
            movement.stop(body.id);
            self.lock_on = false;
            self.last_report = report;
            return report;
        }

        if input.block && body.fsm.is_idle() {
            report.block = Some(body.fsm.request_block());
        } else if !input.block && body.fsm.is_blocking() {
            report.block = Some(body.fsm.release_block(config));
        }

        if input.heavy_attack {
            report.attack = Some(body.fsm.request_attack(
                AttackKind::Heavy,
                body.resources,
                body.stats,
                config,
            ));
        } else if input.light_attack {
            report.attack = Some(body.fsm.request_attack(
                AttackKind::Light,
                body.resources,
                body.stats,
                config,
            ));
        }

        let move_dir = ground(input.movement);
        let has_move = move_dir.length() > MOVE_DEAD_ZONE;

        if input.roll {
            let outcome = body.fsm.request_roll(config);
            if outcome.is_accepted() {
                let direction = if has_move {
                    move_dir.normalize()
                } else {
                    body.forward
                };
                movement.face_direction(body.id, direction);
                movement.move_toward(
                    body.id,
                    body.position + direction * config.behavior.dodge_distance,
                    config.behavior.dodge_speed,
                    0.0,
                );
            }
            report.roll = Some(outcome);
        }

        if input.lock_on {
            let outcome = body.fsm.request_lock_on();
            if outcome.is_accepted() {
                self.lock_on = !self.lock_on;
            }
            report.lock_on = Some(outcome);
        }

        if body.fsm.can_move() {
            if has_move {
                let speed = if body.fsm.is_blocking() {
                    config.arena.walk_speed * BLOCKING_SPEED_FACTOR
                } else if input.run {
                    config.arena.run_speed
                } else {
                    config.arena.walk_speed
                };
                movement.move_toward(body.id, body.position + move_dir.normalize(), speed, 0.0);
            } else {
                movement.stop(body.id);
            }
        } else if !body.fsm.is_rolling() {
            movement.stop(body.id);
        }

        match input.look.map(ground).filter(|look| look.length() > MOVE_DEAD_ZONE) {
            Some(look) if !body.fsm.is_rolling() => {
                movement.set_auto_rotation(body.id, false);
                movement.face_direction(body.id, look);
            }
            _ => movement.set_auto_rotation(body.id, true),
        }

        self.last_report = report;
        report
    }
}
