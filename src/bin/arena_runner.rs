//! Headless Arena Runner
//!
//! Pits a scripted player against a ring of enemies and prints a summary
//! of the fight as JSON or text.

use std::path::PathBuf;

use arena_combat::actor::ActorSpec;
use arena_combat::arena::{Arena, ArenaOutcome, HeadlessArena};
use arena_combat::collab::{KinematicMovement, TimelineAnimator};
use arena_combat::combat::{CombatEvent, EventLog, WeaponProfile};
use arena_combat::core::types::{ground_direction, ground_distance, Vec2, Vec3};
use arena_combat::core::{ActorId, CombatConfig, CombatError, Faction, Result};
use arena_combat::input::PlayerInput;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Headless Arena Runner - scripted player vs enemy AI
#[derive(Parser, Debug)]
#[command(name = "arena_runner")]
#[command(about = "Run a headless arena fight and print a summary")]
struct Args {
    /// Number of enemies to spawn
    #[arg(long, default_value_t = 3)]
    enemies: u32,

    /// Enemy level; stats are rolled per enemy
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated seconds before the fight is called a draw
    #[arg(long, default_value_t = 120.0)]
    max_seconds: f32,

    /// Fixed tick length in seconds
    #[arg(long, default_value_t = 0.02)]
    dt: f32,

    /// Combat config TOML (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Player weapon: sword, axe, spear or fists
    #[arg(long, default_value = "sword")]
    weapon: String,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct ArenaSummary {
    outcome: String,
    seed: u64,
    ticks: u64,
    seconds: f32,
    enemies_spawned: u32,
    enemies_defeated: usize,
    player_health: f32,
    player_energy: f32,
    hits: usize,
    blocks: usize,
    parries: usize,
    guard_breaks: usize,
    dodges: usize,
    stuns: usize,
    player_damage_dealt: f32,
    player_damage_taken: f32,
}

/// Simple scripted opponent for the enemy AI
struct PlayerBot {
    rng: ChaCha8Rng,
    block_hold: f32,
}

impl PlayerBot {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            block_hold: 0.0,
        }
    }

    fn decide(&mut self, arena: &HeadlessArena, player: ActorId, dt: f32) -> PlayerInput {
        let Some(me) = arena.actor(player) else {
            return PlayerInput::default();
        };
        let nearest = arena
            .actors()
            .iter()
            .filter(|a| a.faction == Faction::Enemy && a.is_alive())
            .min_by(|a, b| {
                ground_distance(me.position, a.position)
                    .total_cmp(&ground_distance(me.position, b.position))
            });
        let Some(enemy) = nearest else {
            return PlayerInput::default();
        };

        let to_enemy = ground_direction(me.position, enemy.position);
        let distance = ground_distance(me.position, enemy.position);
        let mut input = PlayerInput {
            look: Some(Vec2::new(to_enemy.x, to_enemy.z)),
            ..Default::default()
        };

        self.block_hold = (self.block_hold - dt).max(0.0);
        if self.block_hold > 0.0 {
            input.block = true;
            return input;
        }

        let threatened = enemy.fsm.is_attacking() && distance < 3.5;
        if threatened && self.rng.gen::<f32>() < 0.05 {
            if me.resources.health_fraction() < 0.3 {
                input.roll = true;
                input.movement = Vec2::new(-to_enemy.x, -to_enemy.z);
            } else {
                input.block = true;
                self.block_hold = 0.6;
            }
            return input;
        }

        if distance > me.weapon.profile.reach {
            input.movement = Vec2::new(to_enemy.x, to_enemy.z);
            input.run = distance > 6.0;
        } else if self.rng.gen::<f32>() < 0.1 {
            if me.resources.energy() > 40.0 && self.rng.gen::<f32>() < 0.25 {
                input.heavy_attack = true;
            } else {
                input.light_attack = true;
            }
        }
        input
    }
}

fn summarize(
    arena: &HeadlessArena,
    player: ActorId,
    seed: u64,
    enemies_spawned: u32,
    enemies_defeated: usize,
) -> ArenaSummary {
    let log: &EventLog = arena.presentation();
    let count = |f: fn(&CombatEvent) -> bool| log.count(f);
    let damage_where = |pick: &dyn Fn(ActorId, ActorId) -> bool| -> f32 {
        log.iter()
            .filter_map(|e| match e {
                CombatEvent::Hit {
                    attacker,
                    defender,
                    damage,
                    ..
                } if pick(*attacker, *defender) => Some(*damage),
                _ => None,
            })
            .sum()
    };

    let (player_health, player_energy) = arena
        .actor(player)
        .map(|a| (a.resources.health(), a.resources.energy()))
        .unwrap_or((0.0, 0.0));

    ArenaSummary {
        outcome: format!("{:?}", arena.outcome()),
        seed,
        ticks: arena.tick_count(),
        seconds: arena.elapsed(),
        enemies_spawned,
        enemies_defeated,
        player_health,
        player_energy,
        hits: count(|e| matches!(e, CombatEvent::Hit { .. })),
        blocks: count(|e| matches!(e, CombatEvent::Blocked { .. })),
        parries: count(|e| matches!(e, CombatEvent::Parried { .. })),
        guard_breaks: count(|e| matches!(e, CombatEvent::GuardBroken { .. })),
        dodges: count(|e| matches!(e, CombatEvent::Dodged { .. })),
        stuns: count(|e| matches!(e, CombatEvent::Stunned { .. })),
        player_damage_dealt: damage_where(&|attacker, _| attacker == player),
        player_damage_taken: damage_where(&|_, defender| defender == player),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "arena_combat=debug"
    } else {
        "arena_combat=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => CombatConfig::load(path)?,
        None => CombatConfig::default(),
    };
    let weapon = WeaponProfile::by_name(&args.weapon)
        .ok_or_else(|| CombatError::InvalidConfig(format!("unknown weapon '{}'", args.weapon)))?;
    if args.dt <= 0.0 {
        return Err(CombatError::InvalidConfig("dt must be positive".into()));
    }

    // Determine seed
    let seed = args.seed.unwrap_or_else(rand::random);
    let animation = TimelineAnimator::new(&config.timing);
    let mut arena: HeadlessArena = Arena::new(
        config,
        KinematicMovement::with_bounds(25.0),
        animation,
        EventLog::new(),
        seed,
    )?;

    let player = arena.spawn_player(
        ActorSpec::new("player", Faction::Player)
            .with_weapon(weapon)
            .facing(Vec3::Z),
    );
    for i in 0..args.enemies {
        let angle = std::f32::consts::TAU * i as f32 / args.enemies.max(1) as f32;
        let position = Vec3::new(angle.sin(), 0.0, angle.cos()) * 12.0;
        arena.spawn_leveled_enemy(
            ActorSpec::new(format!("enemy-{}", i + 1), Faction::Enemy)
                .at(position)
                .facing(-position),
            args.level,
        );
    }

    let mut bot = PlayerBot::new(seed.wrapping_add(1));
    let mut enemies_defeated = 0;
    let mut events_seen = 0;
    while !arena.is_over() && arena.elapsed() < args.max_seconds {
        let input = bot.decide(&arena, player, args.dt);
        arena.set_player_input(player, input)?;
        arena.tick(args.dt);

        let log = arena.presentation();
        for logged in &log.events[events_seen..] {
            if let CombatEvent::Death { actor, .. } = logged.event {
                if actor != player {
                    enemies_defeated += 1;
                }
            }
        }
        events_seen = log.len();
    }

    let summary = summarize(&arena, player, seed, args.enemies, enemies_defeated);
    if arena.outcome() == ArenaOutcome::InProgress {
        tracing::info!(seconds = arena.elapsed(), "time limit reached");
    }

    match args.format.as_str() {
        "text" => {
            println!("Arena Result");
            println!("============");
            println!("Outcome: {}", summary.outcome);
            println!("Ticks: {} ({:.1}s)", summary.ticks, summary.seconds);
            println!(
                "Enemies defeated: {}/{}",
                summary.enemies_defeated, summary.enemies_spawned
            );
            println!(
                "Player: {:.1} health, {:.1} energy",
                summary.player_health, summary.player_energy
            );
            println!(
                "Hits: {}  Blocks: {}  Parries: {}  Guard breaks: {}  Dodges: {}  Stuns: {}",
                summary.hits,
                summary.blocks,
                summary.parries,
                summary.guard_breaks,
                summary.dodges,
                summary.stuns
            );
            println!(
                "Damage dealt: {:.1}  taken: {:.1}",
                summary.player_damage_dealt, summary.player_damage_taken
            );
            println!("Seed: {}", summary.seed);
        }
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
