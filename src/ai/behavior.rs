//! Enemy behavior controller
//!
//! Chase from afar, strafe around the target at mid range, commit to an
//! attack when in reach and off cooldown. Randomness (attack cooldowns,
//! heavy choice, combo chaining, dodges, strafe timing) comes from a
//! per-controller seeded RNG so a fixed seed replays the same fight.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::actor::ActorBody;
use crate::collab::MovementProvider;
use crate::combat::fsm::{AttackKind, RequestOutcome};
use crate::core::config::{BehaviorConfig, CombatConfig, SampleRange};
use crate::core::types::{ground_direction, ground_distance, ActorId, Vec3};

/// What the controller sees of its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub id: ActorId,
    pub position: Vec3,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BehaviorMode {
    #[default]
    Chase,
    Strafe,
}

/// Chance an enemy of this level dodges an incoming swing
pub fn dodge_chance(level: u32, config: &BehaviorConfig) -> f32 {
    (level as f32 * config.dodge_chance_per_level).min(config.max_dodge_chance)
}

fn sample<R: Rng>(rng: &mut R, range: SampleRange) -> f32 {
    if range.max > range.min {
        rng.gen_range(range.min..range.max)
    } else {
        range.min
    }
}

#[derive(Debug, Clone)]
pub struct EnemyBehavior {
    mode: BehaviorMode,
    repositioning: bool,
    /// Counts down the current strafe wait or reposition
    action_timer: f32,
    /// -1 or 1, side of the target to strafe toward
    strafe_side: f32,
    attack_cooldown: f32,
    enabled: bool,
    rng: ChaCha8Rng,
}

impl EnemyBehavior {
    /// Create a controller with the default seed
    pub fn new(config: &BehaviorConfig) -> Self {
        Self::with_seed(42, config)
    }

    /// Create with specific RNG seed for deterministic behavior
    pub fn with_seed(seed: u64, config: &BehaviorConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let attack_cooldown = sample(&mut rng, config.attack_cooldown);
        Self {
            mode: BehaviorMode::Chase,
            repositioning: false,
            action_timer: 0.0,
            strafe_side: 1.0,
            attack_cooldown,
            enabled: true,
            rng,
        }
    }

    pub fn mode(&self) -> BehaviorMode {
        self.mode
    }

    pub fn is_repositioning(&self) -> bool {
        self.repositioning
    }

    pub fn attack_cooldown(&self) -> f32 {
        self.attack_cooldown
    }

    pub fn set_attack_cooldown(&mut self, seconds: f32) {
        self.attack_cooldown = seconds.max(0.0);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stop issuing requests for good
    pub fn disable(&mut self) {
        self.enabled = false;
        self.repositioning = false;
    }

    /// One decision step
    pub fn tick<M: MovementProvider + ?Sized>(
        &mut self,
        body: ActorBody<'_>,
        target: Option<TargetView>,
        movement: &mut M,
        dt: f32,
        config: &CombatConfig,
    ) {
        if !self.enabled || body.fsm.is_dead() {
            return;
        }
        self.attack_cooldown = (self.attack_cooldown - dt).max(0.0);

        let Some(target) = target.filter(|t| t.alive) else {
            movement.stop(body.id);
            return;
        };

        // Hold position for the whole swing
        if body.fsm.is_attacking() {
            movement.stop(body.id);
            return;
        }
        if body.fsm.is_stunned() || body.fsm.is_rolling() {
            return;
        }

        let behavior = &config.behavior;
        let to_target = ground_direction(body.position, target.position);
        let distance = ground_distance(body.position, target.position);

        if distance <= behavior.attack_range && body.fsm.is_idle() && self.attack_cooldown <= 0.0 {
            let kind = if self.rng.gen::<f32>() < behavior.heavy_attack_chance {
                AttackKind::Heavy
            } else {
                AttackKind::Light
            };
            match body.fsm.request_attack(kind, body.resources, body.stats, config) {
                RequestOutcome::Accepted => {
                    self.attack_cooldown = sample(&mut self.rng, behavior.attack_cooldown);
                    self.repositioning = false;
                    movement.stop(body.id);
                    movement.face_direction(body.id, to_target);
                    return;
                }
                outcome => {
                    tracing::trace!(actor = %body.id, ?outcome, "enemy attack refused");
                }
            }
        }

        let desired = if distance <= behavior.strafe_distance {
            BehaviorMode::Strafe
        } else {
            BehaviorMode::Chase
        };
        if desired != self.mode {
            self.enter_mode(desired, body.id, movement, behavior);
        }

        match self.mode {
            BehaviorMode::Chase => {
                movement.move_toward(
                    body.id,
                    target.position,
                    behavior.chase_speed,
                    (behavior.attack_range - 0.2).max(0.0),
                );
            }
            BehaviorMode::Strafe => {
                movement.face_direction(body.id, to_target);
                self.strafe(body.id, to_target, target.position, movement, dt, behavior);
            }
        }
    }

    fn enter_mode<M: MovementProvider + ?Sized>(
        &mut self,
        mode: BehaviorMode,
        id: ActorId,
        movement: &mut M,
        config: &BehaviorConfig,
    ) {
        tracing::debug!(actor = %id, ?mode, "enemy behavior mode change");
        self.mode = mode;
        self.repositioning = false;
        match mode {
            BehaviorMode::Strafe => {
                movement.stop(id);
                movement.set_auto_rotation(id, false);
                self.action_timer = sample(&mut self.rng, config.wait_interval);
            }
            BehaviorMode::Chase => {
                movement.set_auto_rotation(id, true);
            }
        }
    }

    fn strafe<M: MovementProvider + ?Sized>(
        &mut self,
        id: ActorId,
        to_target: Vec3,
        target_position: Vec3,
        movement: &mut M,
        dt: f32,
        config: &BehaviorConfig,
    ) {
        self.action_timer -= dt;

        if !self.repositioning {
            movement.stop(id);
            if self.action_timer <= 0.0 {
                self.repositioning = true;
                self.strafe_side = if self.rng.gen::<bool>() { 1.0 } else { -1.0 };
                self.action_timer = sample(&mut self.rng, config.reposition_duration);
            }
            return;
        }

        if self.action_timer <= 0.0 {
            self.repositioning = false;
            self.action_timer = sample(&mut self.rng, config.wait_interval);
            movement.stop(id);
            return;
        }

        let lateral = to_target.cross(Vec3::Y).normalize_or_zero();
        let mut destination = target_position + lateral * self.strafe_side * config.strafe_offset;
        if !movement.is_reachable(destination) {
            self.strafe_side = -self.strafe_side;
            destination = target_position + lateral * self.strafe_side * config.strafe_offset;
        }
        movement.move_toward(id, destination, config.strafe_speed, 0.0);
    }

    /// Maybe chain a light swing when its combo window opens
    pub fn on_combo_window(&mut self, body: ActorBody<'_>, config: &CombatConfig) -> bool {
        if !self.enabled || !body.fsm.is_attacking() || body.fsm.is_heavy_swing() {
            return false;
        }
        if self.rng.gen::<f32>() >= config.behavior.combo_chain_chance {
            return false;
        }
        body.fsm
            .request_attack(AttackKind::Light, body.resources, body.stats, config)
            .is_accepted()
    }

    /// Roll against the dodge chance for `level`
    pub fn roll_dodge(&mut self, level: u32, config: &BehaviorConfig) -> bool {
        self.rng.gen::<f32>() < dodge_chance(level, config)
    }

    /// A player swing opened nearby; maybe roll away from it
    pub fn react_to_incoming_attack<M: MovementProvider + ?Sized>(
        &mut self,
        body: ActorBody<'_>,
        attacker_position: Vec3,
        movement: &mut M,
        config: &CombatConfig,
    ) -> bool {
        if !self.enabled || !(body.fsm.is_idle() || body.fsm.is_blocking()) {
            return false;
        }
        if !self.roll_dodge(body.stats.level(), &config.behavior) {
            return false;
        }
        if !body.fsm.request_roll(config).is_accepted() {
            return false;
        }

        let away = ground_direction(attacker_position, body.position);
        let away = if away == Vec3::ZERO { -body.forward } else { away };
        movement.stop(body.id);
        movement.move_toward(
            body.id,
            body.position + away * config.behavior.dodge_distance,
            config.behavior.dodge_speed,
            0.0,
        );
        self.repositioning = false;
        self.attack_cooldown += config.behavior.dodge_cooldown_penalty;
        true
    }

    /// Took damage: sometimes retaliate at once, otherwise hesitate
    pub fn on_damaged(&mut self, config: &BehaviorConfig) {
        if !self.enabled {
            return;
        }
        if self.rng.gen::<f32>() < config.surprise_attack_chance {
            self.attack_cooldown = 0.0;
        } else {
            self.attack_cooldown += config.hit_stun_delay;
        }
    }

    pub fn on_staggered(&mut self) {
        self.repositioning = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::KinematicMovement;
    use crate::combat::fsm::CombatStateMachine;
    use crate::combat::resources::ResourcePool;
    use crate::combat::stats::Stats;

    struct Rig {
        fsm: CombatStateMachine,
        pool: ResourcePool,
        stats: Stats,
        position: Vec3,
    }

    impl Rig {
        fn new(position: Vec3) -> Self {
            let stats = Stats::default();
            Self {
                fsm: CombatStateMachine::new(),
                pool: ResourcePool::from_stats(&stats),
                stats,
                position,
            }
        }

        fn body(&mut self) -> ActorBody<'_> {
            ActorBody {
                id: ActorId(2),
                position: self.position,
                forward: Vec3::Z,
                fsm: &mut self.fsm,
                resources: &mut self.pool,
                stats: &self.stats,
            }
        }
    }

    fn target_at(position: Vec3) -> Option<TargetView> {
        Some(TargetView {
            id: ActorId(1),
            position,
            alive: true,
        })
    }

    #[test]
    fn test_dodge_chance_scales_and_caps() {
        let config = BehaviorConfig::default();
        assert!((dodge_chance(1, &config) - 0.05).abs() < 1e-6);
        assert!((dodge_chance(10, &config) - 0.5).abs() < 1e-6);
        assert_eq!(dodge_chance(40, &config), config.max_dodge_chance);
    }

    #[test]
    fn test_far_target_is_chased() {
        let config = CombatConfig::default();
        let mut movement = KinematicMovement::new();
        let mut rig = Rig::new(Vec3::new(0.0, 0.0, 20.0));
        movement.place(ActorId(2), rig.position, -Vec3::Z);

        let mut behavior = EnemyBehavior::with_seed(3, &config.behavior);
        behavior.tick(rig.body(), target_at(Vec3::ZERO), &mut movement, 0.02, &config);

        assert_eq!(behavior.mode(), BehaviorMode::Chase);
        assert!(movement.is_moving(ActorId(2)));
    }

    #[test]
    fn test_mid_range_target_is_strafed() {
        let config = CombatConfig::default();
        let mut movement = KinematicMovement::new();
        let mut rig = Rig::new(Vec3::new(0.0, 0.0, 5.0));
        movement.place(ActorId(2), rig.position, -Vec3::Z);

        let mut behavior = EnemyBehavior::with_seed(3, &config.behavior);
        behavior.tick(rig.body(), target_at(Vec3::ZERO), &mut movement, 0.02, &config);

        assert_eq!(behavior.mode(), BehaviorMode::Strafe);
        assert!(!behavior.is_repositioning());
        assert!(!movement.is_moving(ActorId(2)));
    }

    #[test]
    fn test_strafe_alternates_wait_and_reposition() {
        let config = CombatConfig::default();
        let dt = 0.02;
        let id = ActorId(2);
        let mut movement = KinematicMovement::new();
        let mut rig = Rig::new(Vec3::new(0.0, 0.0, 5.0));
        movement.place(id, rig.position, -Vec3::Z);

        let mut behavior = EnemyBehavior::with_seed(9, &config.behavior);
        behavior.set_attack_cooldown(100.0);

        let mut flips = Vec::new();
        let mut was_repositioning = false;
        for step in 1..=650 {
            let before = rig.position;
            behavior.tick(rig.body(), target_at(Vec3::ZERO), &mut movement, dt, &config);
            movement.advance(dt);
            rig.position = movement.position(id).unwrap();

            assert_eq!(behavior.mode(), BehaviorMode::Strafe);
            let repositioning = behavior.is_repositioning();
            if repositioning != was_repositioning {
                flips.push((step as f32 * dt, rig.position));
                was_repositioning = repositioning;
            } else if !repositioning {
                assert!((rig.position - before).length() < 1e-5, "drifted while holding");
            }
        }

        assert!(flips.len() >= 3, "strafe cycle flips: {:?}", flips);
        let (start, start_at) = flips[0];
        let (end, end_at) = flips[1];
        let (restart, _) = flips[2];
        assert!((2.0..=5.0 + dt).contains(&start), "waited {}", start);
        let moved = end - start;
        assert!((0.5 - dt..=1.2 + dt).contains(&moved), "repositioned for {}", moved);
        let waited = restart - end;
        assert!((2.0 - dt..=5.0 + dt).contains(&waited), "waited {}", waited);

        let step = end_at - start_at;
        assert!(step.x.abs() > 0.2, "no lateral motion: {:?}", step);
    }

    #[test]
    fn test_attacks_when_in_range_and_ready() {
        let config = CombatConfig::default();
        let mut movement = KinematicMovement::new();
        let mut rig = Rig::new(Vec3::new(0.0, 0.0, 2.0));
        movement.place(ActorId(2), rig.position, -Vec3::Z);

        let mut behavior = EnemyBehavior::with_seed(3, &config.behavior);
        behavior.set_attack_cooldown(0.0);
        behavior.tick(rig.body(), target_at(Vec3::ZERO), &mut movement, 0.02, &config);

        assert!(rig.fsm.is_attacking());
        let cooldown = behavior.attack_cooldown();
        assert!((2.0..=4.0).contains(&cooldown));
    }

    #[test]
    fn test_no_attack_while_on_cooldown() {
        let config = CombatConfig::default();
        let mut movement = KinematicMovement::new();
        let mut rig = Rig::new(Vec3::new(0.0, 0.0, 2.0));
        movement.place(ActorId(2), rig.position, -Vec3::Z);

        let mut behavior = EnemyBehavior::with_seed(3, &config.behavior);
        behavior.set_attack_cooldown(1.0);
        behavior.tick(rig.body(), target_at(Vec3::ZERO), &mut movement, 0.02, &config);
        assert!(rig.fsm.is_idle());
    }

    #[test]
    fn test_dead_target_stops_pursuit() {
        let config = CombatConfig::default();
        let mut movement = KinematicMovement::new();
        let mut rig = Rig::new(Vec3::new(0.0, 0.0, 20.0));
        movement.place(ActorId(2), rig.position, -Vec3::Z);
        movement.move_toward(ActorId(2), Vec3::ZERO, 1.0, 0.0);

        let mut behavior = EnemyBehavior::with_seed(3, &config.behavior);
        let dead = Some(TargetView {
            id: ActorId(1),
            position: Vec3::ZERO,
            alive: false,
        });
        behavior.tick(rig.body(), dead, &mut movement, 0.02, &config);
        assert!(!movement.is_moving(ActorId(2)));
    }

    #[test]
    fn test_damage_reaction_adjusts_cooldown() {
        let config = BehaviorConfig::default();
        let mut behavior = EnemyBehavior::with_seed(11, &config);
        let mut resets = 0;
        let mut delays = 0;
        for _ in 0..200 {
            behavior.set_attack_cooldown(1.0);
            behavior.on_damaged(&config);
            if behavior.attack_cooldown() == 0.0 {
                resets += 1;
            } else {
                assert!((behavior.attack_cooldown() - 1.5).abs() < 1e-6);
                delays += 1;
            }
        }
        assert!(resets > 0 && delays > resets);
    }

    #[test]
    fn test_dodge_extends_attack_cooldown() {
        let mut config = CombatConfig::default();
        config.behavior.dodge_chance_per_level = 1.0;
        config.behavior.max_dodge_chance = 1.0;
        let mut movement = KinematicMovement::new();
        let mut rig = Rig::new(Vec3::new(0.0, 0.0, 2.0));
        movement.place(ActorId(2), rig.position, -Vec3::Z);

        let mut behavior = EnemyBehavior::with_seed(3, &config.behavior);
        behavior.set_attack_cooldown(1.0);
        let dodged =
            behavior.react_to_incoming_attack(rig.body(), Vec3::ZERO, &mut movement, &config);

        assert!(dodged);
        assert!(rig.fsm.is_rolling());
        assert!((behavior.attack_cooldown() - 1.75).abs() < 1e-6);
    }
}
