//! Combat actors
//!
//! An actor bundles everything one fighter owns: stats, resource pools,
//! state machine, weapon, knockback and its controller. Controllers are a
//! closed set, player input or enemy behavior.

use crate::ai::EnemyBehavior;
use crate::combat::fsm::CombatStateMachine;
use crate::combat::impact::Impact;
use crate::combat::resources::ResourcePool;
use crate::combat::stats::{StatType, Stats};
use crate::combat::weapon::{Weapon, WeaponProfile};
use crate::core::config::CombatConfig;
use crate::core::types::{ActorId, Faction, Vec3};
use crate::input::InputAdapter;

/// Who decides what an actor does
#[derive(Debug, Clone)]
pub enum Controller {
    Player(InputAdapter),
    Enemy(Box<EnemyBehavior>),
}

/// Spawn parameters
#[derive(Debug, Clone)]
pub struct ActorSpec {
    pub name: String,
    pub faction: Faction,
    pub stats: Stats,
    pub weapon: WeaponProfile,
    pub position: Vec3,
    pub forward: Vec3,
    /// Falls back to the arena default when unset
    pub radius: Option<f32>,
    /// Falls back to the knockback default when unset
    pub mass: Option<f32>,
}

impl ActorSpec {
    pub fn new(name: impl Into<String>, faction: Faction) -> Self {
        Self {
            name: name.into(),
            faction,
            stats: Stats::default(),
            weapon: WeaponProfile::sword(),
            position: Vec3::ZERO,
            forward: Vec3::Z,
            radius: None,
            mass: None,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn facing(mut self, forward: Vec3) -> Self {
        self.forward = forward;
        self
    }

    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponProfile) -> Self {
        self.weapon = weapon;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }
}

/// Mutable view of the parts of an actor its controller drives
pub struct ActorBody<'a> {
    pub id: ActorId,
    pub position: Vec3,
    pub forward: Vec3,
    pub fsm: &'a mut CombatStateMachine,
    pub resources: &'a mut ResourcePool,
    pub stats: &'a Stats,
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub faction: Faction,
    pub stats: Stats,
    pub resources: ResourcePool,
    pub fsm: CombatStateMachine,
    pub weapon: Weapon,
    pub impact: Impact,
    pub position: Vec3,
    pub forward: Vec3,
    pub radius: f32,
    pub mass: f32,
    /// Externally granted invulnerability, on top of roll i-frames
    pub invincible: bool,
    pub controller: Controller,
    despawn_in: Option<f32>,
}

impl Actor {
    pub fn new(id: ActorId, spec: ActorSpec, controller: Controller, config: &CombatConfig) -> Self {
        let resources = ResourcePool::from_stats(&spec.stats);
        Self {
            id,
            name: spec.name,
            faction: spec.faction,
            resources,
            fsm: CombatStateMachine::new(),
            weapon: Weapon::new(spec.weapon),
            impact: Impact::new(),
            position: spec.position,
            forward: spec.forward.try_normalize().unwrap_or(Vec3::Z),
            radius: spec.radius.unwrap_or(config.arena.actor_radius),
            mass: spec.mass.unwrap_or(config.knockback.default_mass),
            invincible: false,
            stats: spec.stats,
            controller,
            despawn_in: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.fsm.is_dead()
    }

    pub fn is_invulnerable(&self, config: &CombatConfig) -> bool {
        self.invincible || self.fsm.is_invulnerable(&config.timing)
    }

    pub fn is_player_controlled(&self) -> bool {
        matches!(self.controller, Controller::Player(_))
    }

    pub fn behavior(&self) -> Option<&EnemyBehavior> {
        match &self.controller {
            Controller::Enemy(behavior) => Some(behavior),
            Controller::Player(_) => None,
        }
    }

    pub fn behavior_mut(&mut self) -> Option<&mut EnemyBehavior> {
        match &mut self.controller {
            Controller::Enemy(behavior) => Some(behavior),
            Controller::Player(_) => None,
        }
    }

    pub fn input(&self) -> Option<&InputAdapter> {
        match &self.controller {
            Controller::Player(input) => Some(input),
            Controller::Enemy(_) => None,
        }
    }

    pub fn input_mut(&mut self) -> Option<&mut InputAdapter> {
        match &mut self.controller {
            Controller::Player(input) => Some(input),
            Controller::Enemy(_) => None,
        }
    }

    /// Borrow the controller alongside the body it drives
    pub fn split(&mut self) -> (&mut Controller, ActorBody<'_>) {
        (
            &mut self.controller,
            ActorBody {
                id: self.id,
                position: self.position,
                forward: self.forward,
                fsm: &mut self.fsm,
                resources: &mut self.resources,
                stats: &self.stats,
            },
        )
    }

    /// Permanent stat upgrade; pools follow raised maximums
    pub fn apply_upgrade(&mut self, stat: StatType) {
        self.stats.apply_upgrade(stat);
        self.resources.sync_maximums(&self.stats);
    }

    /// Stun with an immediate hitbox close
    ///
    /// Enemies are also slowed so a staggered enemy cannot retaliate at
    /// full speed when the stun ends.
    fn stagger(&mut self, duration: f32, config: &CombatConfig) -> bool {
        if !self.fsm.stun(duration, config) {
            return false;
        }
        self.weapon.close_hitbox();
        if let Controller::Enemy(behavior) = &mut self.controller {
            self.stats.apply_slow(
                config.defense.stagger_slow_fraction,
                config.defense.stagger_slow_duration,
            );
            behavior.on_staggered();
        }
        true
    }

    /// Punishment for swinging into a parry
    pub fn punish_parried(&mut self, config: &CombatConfig) -> bool {
        self.stagger(config.defense.parry_stun_duration, config)
    }

    /// Guard gave way under a hit
    pub fn break_guard(&mut self, config: &CombatConfig) -> bool {
        self.stagger(config.defense.guard_break_stun_duration, config)
    }

    /// Attack-speed slow for swinging into a held block
    pub fn slow_after_block(&mut self, config: &CombatConfig) {
        self.stats.apply_slow(
            config.defense.block_slow_fraction,
            config.defense.block_slow_duration,
        );
    }

    /// Enter Dead and schedule removal for enemies
    pub fn die(&mut self, config: &CombatConfig) {
        if self.fsm.is_dead() {
            return;
        }
        self.fsm.kill();
        self.weapon.close_hitbox();
        self.impact.clear();
        if let Controller::Enemy(behavior) = &mut self.controller {
            behavior.disable();
            self.despawn_in = Some(config.arena.despawn_delay);
        }
    }

    /// Count down a pending despawn; true once the actor should be removed
    pub fn tick_despawn(&mut self, dt: f32) -> bool {
        match self.despawn_in.as_mut() {
            Some(remaining) => {
                *remaining -= dt;
                *remaining <= 0.0
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::fsm::{AttackKind, CombatState};

    fn enemy(config: &CombatConfig) -> Actor {
        let behavior = EnemyBehavior::with_seed(7, &config.behavior);
        Actor::new(
            ActorId(2),
            ActorSpec::new("grunt", Faction::Enemy),
            Controller::Enemy(Box::new(behavior)),
            config,
        )
    }

    #[test]
    fn test_spawn_uses_config_defaults() {
        let config = CombatConfig::default();
        let actor = enemy(&config);
        assert_eq!(actor.radius, config.arena.actor_radius);
        assert_eq!(actor.mass, config.knockback.default_mass);
        assert_eq!(actor.resources.health(), 100.0);
        assert!(actor.is_alive());
    }

    #[test]
    fn test_parried_enemy_is_stunned_and_slowed() {
        let config = CombatConfig::default();
        let mut actor = enemy(&config);
        actor
            .fsm
            .request_attack(AttackKind::Light, &mut actor.resources, &actor.stats, &config);
        actor.weapon.open_hitbox(false);

        assert!(actor.punish_parried(&config));
        assert!(!actor.weapon.hitbox_active());
        assert!(actor.stats.is_slowed());
        assert!(matches!(actor.fsm.state(), CombatState::Stunned { .. }));
    }

    #[test]
    fn test_guard_broken_enemy_gets_stagger_slow() {
        let mut config = CombatConfig::default();
        config.defense.stagger_slow_fraction = 0.4;
        let mut actor = enemy(&config);
        assert!(actor.fsm.request_block().is_accepted());

        assert!(actor.break_guard(&config));
        assert!(actor.stats.is_slowed());
        assert!((actor.stats.attack_speed() - 0.6).abs() < 1e-5);
        assert!(matches!(actor.fsm.state(), CombatState::Stunned { .. }));
    }

    #[test]
    fn test_enemy_death_schedules_despawn() {
        let config = CombatConfig::default();
        let mut actor = enemy(&config);
        actor.die(&config);
        assert!(!actor.is_alive());
        assert!(!actor.tick_despawn(4.0));
        assert!(actor.tick_despawn(1.5));
    }

    #[test]
    fn test_player_death_never_despawns() {
        let config = CombatConfig::default();
        let mut actor = Actor::new(
            ActorId(1),
            ActorSpec::new("hero", Faction::Player),
            Controller::Player(InputAdapter::new()),
            &config,
        );
        actor.die(&config);
        assert!(!actor.tick_despawn(100.0));
    }
}
