//! Arena - owns the actors and runs the fixed-step combat tick
//!
//! Tick phases run in a fixed order:
//! 1. Sync transforms from the movement provider
//! 2. Controllers (player input, enemy behavior) in ascending id order
//! 3. State machine timers and animation callbacks
//! 4. Weapon contacts
//! 5. Movement, regeneration, timed effects and knockback
//! 6. Resource notifications and despawns

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorSpec, Controller};
use crate::ai::{EnemyBehavior, TargetView};
use crate::collab::{
    AnimationCue, AnimationDriver, KinematicMovement, MovementProvider, PresentationSink,
    TimelineAnimator,
};
use crate::combat::damage::{resolve_contact, ContactOutcome, IgnoreReason};
use crate::combat::events::{CombatEvent, EventLog};
use crate::combat::fsm::{AnimationCallback, FsmSignal};
use crate::combat::stats::{StatType, Stats};
use crate::core::config::CombatConfig;
use crate::core::error::{CombatError, Result};
use crate::core::types::{ground_distance, ActorId, Faction, Tick, Vec3};
use crate::input::PlayerInput;

/// Overall state of the fight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArenaOutcome {
    InProgress,
    PlayerDefeated,
    EnemiesDefeated,
}

/// A swing that just went live, for dodge reactions
#[derive(Debug, Clone, Copy)]
struct Threat {
    attacker: ActorId,
    faction: Faction,
    position: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    id: ActorId,
    faction: Faction,
    position: Vec3,
    alive: bool,
}

/// Borrow two distinct actors mutably
fn pair_mut(actors: &mut [Actor], a: usize, b: usize) -> (&mut Actor, &mut Actor) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = actors.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = actors.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Nearest opposing actor, preferring living ones
fn nearest_opponent(snapshot: &[Snapshot], faction: Faction, position: Vec3) -> Option<TargetView> {
    let by_distance = |a: &&Snapshot, b: &&Snapshot| {
        ground_distance(position, a.position).total_cmp(&ground_distance(position, b.position))
    };
    let opponents = || snapshot.iter().filter(|s| s.faction != faction);
    opponents()
        .filter(|s| s.alive)
        .min_by(by_distance)
        .or_else(|| opponents().min_by(by_distance))
        .map(|s| TargetView {
            id: s.id,
            position: s.position,
            alive: s.alive,
        })
}

pub struct Arena<M, A, P>
where
    M: MovementProvider,
    A: AnimationDriver,
    P: PresentationSink,
{
    config: CombatConfig,
    actors: Vec<Actor>,
    next_id: u32,
    movement: M,
    animation: A,
    presentation: P,
    tick: Tick,
    elapsed: f32,
    rng: ChaCha8Rng,
    player_defeated: bool,
}

/// Arena wired to the in-crate headless collaborators
pub type HeadlessArena = Arena<KinematicMovement, TimelineAnimator, EventLog>;

impl HeadlessArena {
    pub fn headless(config: CombatConfig, seed: u64) -> Result<Self> {
        let animation = TimelineAnimator::new(&config.timing);
        Arena::new(config, KinematicMovement::new(), animation, EventLog::new(), seed)
    }
}

impl<M, A, P> Arena<M, A, P>
where
    M: MovementProvider,
    A: AnimationDriver,
    P: PresentationSink,
{
    pub fn new(config: CombatConfig, movement: M, animation: A, presentation: P, seed: u64) -> Result<Self> {
        config.validate().map_err(CombatError::InvalidConfig)?;
        Ok(Self {
            config,
            actors: Vec::new(),
            next_id: 1,
            movement,
            animation,
            presentation,
            tick: 0,
            elapsed: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            player_defeated: false,
        })
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn tick_count(&self) -> Tick {
        self.tick
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    fn index_of(&self, id: ActorId) -> Option<usize> {
        self.actors.binary_search_by_key(&id, |actor| actor.id).ok()
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.index_of(id).map(|idx| &self.actors[idx])
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        let idx = self.index_of(id)?;
        Some(&mut self.actors[idx])
    }

    pub fn player_id(&self) -> Option<ActorId> {
        self.actors
            .iter()
            .find(|actor| actor.is_player_controlled())
            .map(|actor| actor.id)
    }

    pub fn living_enemies(&self) -> usize {
        self.actors
            .iter()
            .filter(|actor| actor.faction == Faction::Enemy && actor.is_alive())
            .count()
    }

    pub fn outcome(&self) -> ArenaOutcome {
        if self.player_defeated {
            ArenaOutcome::PlayerDefeated
        } else if self.living_enemies() == 0 {
            ArenaOutcome::EnemiesDefeated
        } else {
            ArenaOutcome::InProgress
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome() != ArenaOutcome::InProgress
    }

    pub fn movement(&self) -> &M {
        &self.movement
    }

    pub fn movement_mut(&mut self) -> &mut M {
        &mut self.movement
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    // ===== SPAWNING =====

    fn spawn(&mut self, spec: ActorSpec, controller: Controller) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;

        let actor = Actor::new(id, spec, controller, &self.config);
        self.movement.place(id, actor.position, actor.forward);
        tracing::info!(
            actor = %id,
            name = %actor.name,
            faction = ?actor.faction,
            level = actor.stats.level(),
            "spawned"
        );
        self.actors.push(actor);
        id
    }

    pub fn spawn_player(&mut self, spec: ActorSpec) -> ActorId {
        self.spawn(spec, Controller::Player(Default::default()))
    }

    /// Spawn an enemy; its dodge level follows its current stats
    pub fn spawn_enemy(&mut self, spec: ActorSpec) -> ActorId {
        let seed = self.rng.gen::<u64>();
        let behavior = EnemyBehavior::with_seed(seed, &self.config.behavior);
        self.spawn(spec, Controller::Enemy(Box::new(behavior)))
    }

    /// Spawn an enemy with freshly rolled stats for `level`
    pub fn spawn_leveled_enemy(&mut self, spec: ActorSpec, level: u32) -> ActorId {
        let stats = Stats::leveled(level, &mut self.rng);
        self.spawn_enemy(spec.with_stats(stats))
    }

    // ===== EXTERNAL INPUT =====

    pub fn set_player_input(&mut self, id: ActorId, input: PlayerInput) -> Result<()> {
        let actor = self.actor_mut(id).ok_or(CombatError::UnknownActor(id))?;
        let adapter = actor
            .input_mut()
            .ok_or(CombatError::NotPlayerControlled(id))?;
        adapter.set_input(input);
        Ok(())
    }

    pub fn apply_upgrade(&mut self, id: ActorId, stat: StatType) -> Result<()> {
        let actor = self.actor_mut(id).ok_or(CombatError::UnknownActor(id))?;
        actor.apply_upgrade(stat);
        Ok(())
    }

    /// Deliver a timeline callback from an external animation layer
    pub fn notify_callback(&mut self, id: ActorId, callback: AnimationCallback) -> Result<()> {
        let idx = self.index_of(id).ok_or(CombatError::UnknownActor(id))?;
        let actor = &mut self.actors[idx];
        actor
            .fsm
            .on_callback(callback, &mut actor.resources, &actor.stats, &self.config);

        let mut threats = Vec::new();
        self.process_signals(idx, &mut threats);
        self.process_threats(threats);
        Ok(())
    }

    /// Resolve a contact reported by an external physics layer
    pub fn report_contact(&mut self, attacker: ActorId, defender: ActorId) -> Result<ContactOutcome> {
        let a = self.index_of(attacker).ok_or(CombatError::UnknownActor(attacker))?;
        let d = self.index_of(defender).ok_or(CombatError::UnknownActor(defender))?;
        if a == d {
            return Ok(ContactOutcome::Ignored(IgnoreReason::SelfContact));
        }

        let outcome = {
            let (att, def) = pair_mut(&mut self.actors, a, d);
            resolve_contact(att, def, &self.config, self.tick, &mut self.presentation)
        };

        let mut threats = Vec::new();
        self.process_signals(a, &mut threats);
        self.process_signals(d, &mut threats);
        self.process_threats(threats);
        self.note_deaths();
        Ok(outcome)
    }

    // ===== TICK =====

    pub fn tick(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.tick += 1;
        self.elapsed += dt;
        let mut threats = Vec::new();

        // ===== PHASE 1: SYNC TRANSFORMS =====
        for actor in &mut self.actors {
            if let Some(position) = self.movement.position(actor.id) {
                actor.position = position;
            }
            if let Some(forward) = self.movement.forward(actor.id) {
                actor.forward = forward;
            }
        }

        // ===== PHASE 2: CONTROLLERS =====
        let snapshot: Vec<Snapshot> = self
            .actors
            .iter()
            .map(|actor| Snapshot {
                id: actor.id,
                faction: actor.faction,
                position: actor.position,
                alive: actor.is_alive(),
            })
            .collect();

        for idx in 0..self.actors.len() {
            let actor = &mut self.actors[idx];
            let target = nearest_opponent(&snapshot, actor.faction, actor.position);
            let (controller, body) = actor.split();
            match controller {
                Controller::Player(input) => {
                    input.apply(body, &mut self.movement, &self.config);
                }
                Controller::Enemy(behavior) => {
                    behavior.tick(body, target, &mut self.movement, dt, &self.config);
                }
            }
            self.process_signals(idx, &mut threats);
        }
        self.process_threats(std::mem::take(&mut threats));

        // ===== PHASE 3: TIMERS AND ANIMATION =====
        for idx in 0..self.actors.len() {
            let actor = &mut self.actors[idx];
            actor.fsm.tick(dt, &self.config);
            for callback in self.animation.advance(actor.id, dt) {
                actor
                    .fsm
                    .on_callback(callback, &mut actor.resources, &actor.stats, &self.config);
            }
            self.process_signals(idx, &mut threats);
        }
        self.process_threats(std::mem::take(&mut threats));

        // ===== PHASE 4: CONTACTS =====
        self.resolve_contacts();
        for idx in 0..self.actors.len() {
            self.process_signals(idx, &mut threats);
        }
        self.process_threats(std::mem::take(&mut threats));
        self.note_deaths();

        // ===== PHASE 5: MOVEMENT, REGEN, EFFECTS =====
        self.movement.advance(dt);
        for actor in &mut self.actors {
            if !actor.is_alive() {
                continue;
            }
            let blocking = actor.fsm.is_blocking();
            actor
                .resources
                .regenerate(dt, &actor.stats, blocking, &self.config.resources);
            actor.stats.tick_effects(dt);

            let displacement = actor.impact.step(dt, actor.radius, &self.config.knockback);
            if displacement != Vec3::ZERO {
                self.movement.displace(actor.id, displacement);
            }
        }

        // ===== PHASE 6: NOTIFY AND DESPAWN =====
        for actor in &mut self.actors {
            let changes = actor.resources.take_changes();
            if changes.health {
                self.presentation.emit(
                    self.tick,
                    CombatEvent::HealthChanged {
                        actor: actor.id,
                        current: actor.resources.health(),
                        max: actor.resources.max_health(),
                    },
                );
            }
            if changes.energy {
                self.presentation.emit(
                    self.tick,
                    CombatEvent::EnergyChanged {
                        actor: actor.id,
                        current: actor.resources.energy(),
                        max: actor.resources.max_energy(),
                    },
                );
            }
        }
        self.despawn_expired(dt);
    }

    fn resolve_contacts(&mut self) {
        let count = self.actors.len();
        for a in 0..count {
            if !self.actors[a].is_alive() || !self.actors[a].weapon.hitbox_active() {
                continue;
            }
            for d in 0..count {
                if a == d {
                    continue;
                }
                let (attacker, defender) = pair_mut(&mut self.actors, a, d);
                if attacker.faction == defender.faction
                    || !defender.is_alive()
                    || attacker.weapon.has_struck(defender.id)
                {
                    continue;
                }
                let in_reach = attacker.weapon.profile.covers(
                    attacker.position,
                    attacker.forward,
                    defender.position,
                    defender.radius,
                );
                if !in_reach {
                    continue;
                }

                resolve_contact(attacker, defender, &self.config, self.tick, &mut self.presentation);
                if !attacker.weapon.hitbox_active() {
                    break;
                }
            }
        }
    }

    /// Turn drained state machine signals into cues, events and reactions
    fn process_signals(&mut self, idx: usize, threats: &mut Vec<Threat>) {
        loop {
            let signals = self.actors[idx].fsm.drain_signals();
            if signals.is_empty() {
                break;
            }

            for signal in signals {
                let actor = &mut self.actors[idx];
                let id = actor.id;
                tracing::trace!(actor = %id, ?signal, "fsm signal");

                match signal {
                    FsmSignal::AttackStarted {
                        step,
                        heavy,
                        duration,
                        speed,
                    } => {
                        actor.weapon.close_hitbox();
                        self.animation.cue(
                            id,
                            AnimationCue::Attack {
                                step,
                                heavy,
                                duration,
                                speed,
                            },
                        );
                    }
                    FsmSignal::ComboChained { step } => {
                        tracing::debug!(actor = %id, step, "combo chained");
                    }
                    FsmSignal::ComboWindowOpened => {
                        let (controller, body) = actor.split();
                        if let Controller::Enemy(behavior) = controller {
                            behavior.on_combo_window(body, &self.config);
                        }
                    }
                    FsmSignal::HitboxOpened { heavy } => {
                        actor.weapon.open_hitbox(heavy);
                        threats.push(Threat {
                            attacker: id,
                            faction: actor.faction,
                            position: actor.position,
                        });
                    }
                    FsmSignal::HitboxClosed | FsmSignal::AttackFinished => {
                        actor.weapon.close_hitbox();
                    }
                    FsmSignal::FailsafeTriggered => {
                        actor.weapon.close_hitbox();
                        self.animation.cue(id, AnimationCue::Interrupt);
                    }
                    FsmSignal::BlockStarted => {
                        self.animation.cue(id, AnimationCue::Block { raised: true });
                    }
                    FsmSignal::BlockEnded => {
                        self.animation.cue(id, AnimationCue::Block { raised: false });
                    }
                    FsmSignal::Stunned { duration } => {
                        actor.weapon.close_hitbox();
                        self.animation.cue(id, AnimationCue::Stun { duration });
                        self.presentation.emit(
                            self.tick,
                            CombatEvent::Stunned {
                                actor: id,
                                duration,
                            },
                        );
                    }
                    FsmSignal::RollStarted { duration } => {
                        self.animation.cue(id, AnimationCue::Roll { duration });
                    }
                    FsmSignal::Died => {
                        actor.weapon.close_hitbox();
                        self.animation.cue(id, AnimationCue::Death);
                    }
                    FsmSignal::StunEnded | FsmSignal::RollEnded => {}
                }
            }
        }
    }

    /// Give nearby enemy controllers a chance to dodge freshly opened swings
    fn process_threats(&mut self, mut threats: Vec<Threat>) {
        while let Some(threat) = threats.pop() {
            for idx in 0..self.actors.len() {
                let actor = &mut self.actors[idx];
                if actor.id == threat.attacker
                    || actor.faction == threat.faction
                    || !actor.is_alive()
                    || ground_distance(actor.position, threat.position)
                        > self.config.behavior.incoming_attack_radius
                {
                    continue;
                }

                let (controller, body) = actor.split();
                let Controller::Enemy(behavior) = controller else {
                    continue;
                };
                if behavior.react_to_incoming_attack(body, threat.position, &mut self.movement, &self.config) {
                    tracing::debug!(actor = %actor.id, attacker = %threat.attacker, "dodged");
                    self.presentation.emit(
                        self.tick,
                        CombatEvent::Dodged {
                            actor: actor.id,
                            attacker: threat.attacker,
                        },
                    );
                    self.process_signals(idx, &mut threats);
                }
            }
        }
    }

    fn note_deaths(&mut self) {
        if self.player_defeated {
            return;
        }
        if self
            .actors
            .iter()
            .any(|actor| actor.is_player_controlled() && !actor.is_alive())
        {
            self.player_defeated = true;
            tracing::info!(tick = self.tick, "player defeated");
        }
    }

    fn despawn_expired(&mut self, dt: f32) {
        let mut expired = Vec::new();
        for actor in &mut self.actors {
            if actor.tick_despawn(dt) {
                expired.push(actor.id);
            }
        }
        if expired.is_empty() {
            return;
        }

        self.actors.retain(|actor| !expired.contains(&actor.id));
        for id in expired {
            self.movement.remove(id);
            self.animation.forget(id);
            tracing::debug!(actor = %id, "despawned");
            self.presentation.emit(self.tick, CombatEvent::Despawned { actor: id });
        }
    }
}
