//! Enemy behavior integration tests
//!
//! Dodge rates, chase and strafe approach, combo chaining and
//! deterministic replays through the headless arena.

use arena_combat::actor::ActorSpec;
use arena_combat::ai::{dodge_chance, BehaviorMode, EnemyBehavior};
use arena_combat::arena::{Arena, HeadlessArena};
use arena_combat::collab::{KinematicMovement, SilentAnimator};
use arena_combat::combat::{
    AnimationCallback, AttackKind, CombatEvent, CombatState, EventLog, LoggedEvent, StatType,
};
use arena_combat::core::types::{ground_distance, Vec3};
use arena_combat::core::{ActorId, CombatConfig, Faction};
use arena_combat::input::PlayerInput;

const DT: f32 = 0.02;

fn duel(config: CombatConfig, enemy_at: Vec3, seed: u64) -> (HeadlessArena, ActorId, ActorId) {
    let mut arena = HeadlessArena::headless(config, seed).expect("config is valid");
    let player = arena.spawn_player(ActorSpec::new("hero", Faction::Player).facing(Vec3::Z));
    let enemy = arena.spawn_enemy(
        ActorSpec::new("grunt", Faction::Enemy)
            .at(enemy_at)
            .facing(-enemy_at),
    );
    (arena, player, enemy)
}

/// Level 10 enemies dodge half of incoming swings
#[test]
fn test_level_ten_dodge_rate_near_half() {
    let config = CombatConfig::default();
    assert!((dodge_chance(10, &config.behavior) - 0.5).abs() < 1e-6);

    let mut behavior = EnemyBehavior::with_seed(2024, &config.behavior);
    let trials = 10_000;
    let dodged = (0..trials)
        .filter(|_| behavior.roll_dodge(10, &config.behavior))
        .count();
    let rate = dodged as f32 / trials as f32;
    assert!((rate - 0.5).abs() < 0.03, "observed dodge rate {}", rate);
}

/// Dodge chance grows five percent per level up to the cap
#[test]
fn test_dodge_chance_caps_at_three_quarters() {
    let config = CombatConfig::default();
    assert!((dodge_chance(1, &config.behavior) - 0.05).abs() < 1e-6);
    assert!((dodge_chance(15, &config.behavior) - 0.75).abs() < 1e-6);
    assert!((dodge_chance(40, &config.behavior) - 0.75).abs() < 1e-6);
}

/// A distant enemy runs straight at the player
#[test]
fn test_distant_enemy_chases() {
    let (mut arena, player, enemy) = duel(CombatConfig::default(), Vec3::new(0.0, 0.0, 15.0), 3);
    for _ in 0..50 {
        arena.tick(DT);
    }
    let me = arena.actor(player).unwrap();
    let them = arena.actor(enemy).unwrap();
    assert_eq!(them.behavior().unwrap().mode(), BehaviorMode::Chase);
    let distance = ground_distance(me.position, them.position);
    assert!(distance < 12.5, "enemy still {} away", distance);
}

/// Chase hands over to strafing, which closes in until a swing lands
#[test]
fn test_enemy_closes_in_and_lands_hit() {
    let (mut arena, player, enemy) = duel(CombatConfig::default(), Vec3::new(0.0, 0.0, 15.0), 11);

    let mut landed = false;
    for _ in 0..3000 {
        arena.tick(DT);
        let hits = arena.presentation().count(|e| {
            matches!(e, CombatEvent::Hit { attacker, defender, .. } if *attacker == enemy && *defender == player)
        });
        if hits > 0 {
            landed = true;
            break;
        }
    }
    assert!(landed, "enemy never landed a hit");

    let them = arena.actor(enemy).unwrap();
    assert_eq!(them.behavior().unwrap().mode(), BehaviorMode::Strafe);
    assert!(arena.actor(player).unwrap().resources.health() < 100.0);
}

/// Enemies stand down once their only target is dead
#[test]
fn test_enemy_idles_when_target_dead() {
    let config = CombatConfig::default();
    let (mut arena, player, enemy) = duel(config.clone(), Vec3::new(0.0, 0.0, 6.0), 4);
    arena.actor_mut(player).unwrap().die(&config);

    for _ in 0..200 {
        arena.tick(DT);
    }
    let them = arena.actor(enemy).unwrap();
    assert!((them.position - Vec3::new(0.0, 0.0, 6.0)).length() < 1e-4);
    assert!(them.fsm.is_idle());
    assert_eq!(arena.presentation().count(|e| matches!(e, CombatEvent::Hit { .. })), 0);
}

/// With a certain chain chance a light swing always continues its combo
#[test]
fn test_combo_window_chains_light_swing() {
    let mut config = CombatConfig::default();
    config.behavior.combo_chain_chance = 1.0;
    let mut arena = Arena::new(
        config.clone(),
        KinematicMovement::new(),
        SilentAnimator,
        EventLog::new(),
        8,
    )
    .unwrap();
    let enemy = arena.spawn_enemy(ActorSpec::new("grunt", Faction::Enemy));

    let actor = arena.actor_mut(enemy).unwrap();
    assert!(actor
        .fsm
        .request_attack(AttackKind::Light, &mut actor.resources, &actor.stats, &config)
        .is_accepted());
    arena
        .notify_callback(enemy, AnimationCallback::ComboWindowOpen)
        .unwrap();

    let actor = arena.actor(enemy).unwrap();
    assert_eq!(
        actor.fsm.state(),
        CombatState::Attacking {
            step: 1,
            heavy: false
        }
    );
    assert_eq!(actor.resources.energy(), 80.0);
}

/// Heavy swings never chain, whatever the chance
#[test]
fn test_heavy_swing_never_chains() {
    let mut config = CombatConfig::default();
    config.behavior.combo_chain_chance = 1.0;
    let mut arena = Arena::new(
        config.clone(),
        KinematicMovement::new(),
        SilentAnimator,
        EventLog::new(),
        8,
    )
    .unwrap();
    let enemy = arena.spawn_enemy(ActorSpec::new("grunt", Faction::Enemy));

    let actor = arena.actor_mut(enemy).unwrap();
    assert!(actor
        .fsm
        .request_attack(AttackKind::Heavy, &mut actor.resources, &actor.stats, &config)
        .is_accepted());
    arena
        .notify_callback(enemy, AnimationCallback::ComboWindowOpen)
        .unwrap();

    assert_eq!(
        arena.actor(enemy).unwrap().fsm.state(),
        CombatState::Attacking {
            step: 0,
            heavy: true
        }
    );
}

/// A certain dodger rolls away from a player swing as its hitbox opens
#[test]
fn test_enemy_rolls_away_from_swing() {
    let mut config = CombatConfig::default();
    config.behavior.dodge_chance_per_level = 1.0;
    config.behavior.max_dodge_chance = 1.0;
    let (mut arena, player, enemy) = duel(config, Vec3::new(0.0, 0.0, 2.0), 6);
    arena
        .actor_mut(enemy)
        .unwrap()
        .behavior_mut()
        .unwrap()
        .set_attack_cooldown(100.0);

    arena
        .set_player_input(
            player,
            PlayerInput {
                light_attack: true,
                ..Default::default()
            },
        )
        .unwrap();

    let mut rolled = false;
    for _ in 0..30 {
        arena.tick(DT);
        rolled |= arena.actor(enemy).unwrap().fsm.is_rolling();
    }
    assert!(rolled);
    assert_eq!(
        arena
            .presentation()
            .count(|e| matches!(e, CombatEvent::Dodged { actor, .. } if *actor == enemy)),
        1
    );

    let me = arena.actor(player).unwrap();
    let them = arena.actor(enemy).unwrap();
    assert!(ground_distance(me.position, them.position) > 2.5);
    assert!(them.behavior().unwrap().attack_cooldown() > 99.0);
}

/// Upgrades bought after spawn raise the dodge chance of the next swing
#[test]
fn test_upgraded_enemy_dodges_at_new_level() {
    let mut config = CombatConfig::default();
    config.behavior.dodge_chance_per_level = 0.1;
    config.behavior.max_dodge_chance = 1.0;
    let (mut arena, player, enemy) = duel(config.clone(), Vec3::new(0.0, 0.0, 2.0), 6);
    let spawned_at = arena.actor(enemy).unwrap().stats.level();
    assert!((dodge_chance(spawned_at, &config.behavior) - 0.1).abs() < 1e-6);

    for _ in 0..9 {
        arena.apply_upgrade(enemy, StatType::Strength).unwrap();
    }
    let level = arena.actor(enemy).unwrap().stats.level();
    assert_eq!(level, 10);
    assert!((dodge_chance(level, &config.behavior) - 1.0).abs() < 1e-6);

    arena
        .actor_mut(enemy)
        .unwrap()
        .behavior_mut()
        .unwrap()
        .set_attack_cooldown(100.0);
    arena
        .set_player_input(
            player,
            PlayerInput {
                light_attack: true,
                ..Default::default()
            },
        )
        .unwrap();

    let mut rolled = false;
    for _ in 0..30 {
        arena.tick(DT);
        rolled |= arena.actor(enemy).unwrap().fsm.is_rolling();
    }
    assert!(rolled);
    assert_eq!(
        arena
            .presentation()
            .count(|e| matches!(e, CombatEvent::Dodged { actor, .. } if *actor == enemy)),
        1
    );
}

fn scripted_fight(seed: u64) -> (Vec<LoggedEvent>, f32) {
    let mut arena = HeadlessArena::headless(CombatConfig::default(), seed).unwrap();
    let player = arena.spawn_player(ActorSpec::new("hero", Faction::Player));
    arena.spawn_leveled_enemy(
        ActorSpec::new("left", Faction::Enemy).at(Vec3::new(-4.0, 0.0, 4.0)),
        5,
    );
    arena.spawn_leveled_enemy(
        ActorSpec::new("right", Faction::Enemy).at(Vec3::new(4.0, 0.0, 4.0)),
        5,
    );

    for tick in 0..1000u32 {
        let input = PlayerInput {
            light_attack: tick % 40 == 0,
            block: (tick / 100) % 3 == 1,
            ..Default::default()
        };
        arena.set_player_input(player, input).unwrap();
        arena.tick(DT);
    }
    let health = arena.actor(player).unwrap().resources.health();
    (arena.presentation().events.clone(), health)
}

/// The same seed replays the same fight event for event
#[test]
fn test_same_seed_replays_identically() {
    let (first, first_health) = scripted_fight(77);
    let (second, second_health) = scripted_fight(77);
    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(first_health, second_health);
}
