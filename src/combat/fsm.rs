//! Combat state machine
//!
//! Every actor is always in exactly one `CombatState`. Requests from a
//! controller either change state, queue a combo follow-up, or are
//! rejected with a reason. Animation callbacks drive the swing timeline;
//! timers drive stuns, rolls and cooldowns. Transitions are reported as
//! `FsmSignal`s which the owner drains once per tick.
//!
//! Leaving Attacking for any reason closes the weapon hitbox.

use serde::{Deserialize, Serialize};

use crate::combat::resources::ResourcePool;
use crate::combat::stats::Stats;
use crate::core::config::{CombatConfig, TimingConfig};

/// Current combat state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum CombatState {
    #[default]
    Idle,
    Attacking { step: u8, heavy: bool },
    Blocking { parry_eligible: bool },
    Stunned { remaining: f32 },
    Rolling { remaining: f32 },
    Dead,
}

impl CombatState {
    pub fn name(&self) -> &'static str {
        match self {
            CombatState::Idle => "idle",
            CombatState::Attacking { .. } => "attacking",
            CombatState::Blocking { .. } => "blocking",
            CombatState::Stunned { .. } => "stunned",
            CombatState::Rolling { .. } => "rolling",
            CombatState::Dead => "dead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    Light,
    Heavy,
}

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    Dead,
    Stunned,
    Rolling,
    /// Another action is in progress
    Busy,
    Cooldown,
    InsufficientEnergy,
    /// Heavy swings cannot be chained into
    HeavyCannotCombo,
    NotBlocking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestOutcome {
    Accepted,
    /// Recorded as the next combo step, fires when the combo window opens
    Queued,
    Rejected(RejectReason),
}

impl RequestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RequestOutcome::Accepted)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, RequestOutcome::Rejected(_))
    }
}

/// Timeline callbacks delivered by the animation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationCallback {
    ComboWindowOpen,
    HitboxOpen,
    HitboxClose,
    AttackFinish,
}

/// Observable transitions, drained by the owner every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FsmSignal {
    AttackStarted {
        step: u8,
        heavy: bool,
        /// Expected swing length in seconds
        duration: f32,
        /// Playback speed multiplier for the swing animation
        speed: f32,
    },
    ComboChained { step: u8 },
    ComboWindowOpened,
    HitboxOpened { heavy: bool },
    HitboxClosed,
    AttackFinished,
    BlockStarted,
    BlockEnded,
    Stunned { duration: f32 },
    StunEnded,
    RollStarted { duration: f32 },
    RollEnded,
    Died,
    FailsafeTriggered,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Swing {
    step: u8,
    heavy: bool,
    elapsed: f32,
    duration: f32,
    combo_window_open: bool,
    hitbox_open: bool,
    queued: bool,
    /// Finish arrived before `min_attack_time`; applied once it passes
    finish_pending: bool,
}

/// Slack between the machine's swing clock and the animation clock
const FINISH_TOLERANCE: f32 = 0.05;

/// Swing length and animation speed for an attack at the given attack speed
pub fn swing_timing(heavy: bool, attack_speed: f32, timing: &TimingConfig) -> (f32, f32) {
    let speed = if heavy {
        attack_speed / 2.0 + 0.5
    } else {
        attack_speed
    }
    .max(0.05);
    let nominal = if heavy {
        timing.heavy_swing_duration
    } else {
        timing.light_swing_duration
    };
    (nominal / speed, speed)
}

#[derive(Debug, Clone, Default)]
pub struct CombatStateMachine {
    state: CombatState,
    swing: Option<Swing>,
    attack_cooldown: f32,
    block_cooldown: f32,
    roll_cooldown: f32,
    block_elapsed: f32,
    /// Time spent in the current Attacking or Stunned episode
    state_elapsed: f32,
    signals: Vec<FsmSignal>,
}

impl CombatStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == CombatState::Dead
    }

    pub fn is_idle(&self) -> bool {
        self.state == CombatState::Idle
    }

    pub fn is_attacking(&self) -> bool {
        matches!(self.state, CombatState::Attacking { .. })
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self.state, CombatState::Blocking { .. })
    }

    pub fn is_stunned(&self) -> bool {
        matches!(self.state, CombatState::Stunned { .. })
    }

    pub fn is_rolling(&self) -> bool {
        matches!(self.state, CombatState::Rolling { .. })
    }

    /// Whether locomotion input should be honored
    pub fn can_move(&self) -> bool {
        matches!(self.state, CombatState::Idle | CombatState::Blocking { .. })
    }

    pub fn is_invulnerable(&self, timing: &TimingConfig) -> bool {
        timing.roll_iframes && self.is_rolling()
    }

    pub fn hitbox_open(&self) -> bool {
        self.swing.map_or(false, |s| s.hitbox_open)
    }

    pub fn is_heavy_swing(&self) -> bool {
        self.swing.map_or(false, |s| s.heavy)
    }

    pub fn combo_window_open(&self) -> bool {
        self.swing.map_or(false, |s| s.combo_window_open)
    }

    pub fn has_queued_attack(&self) -> bool {
        self.swing.map_or(false, |s| s.queued)
    }

    pub fn swing_elapsed(&self) -> Option<f32> {
        self.swing.map(|s| s.elapsed)
    }

    /// Seconds since the guard went up, if blocking
    pub fn time_since_block_start(&self) -> Option<f32> {
        self.is_blocking().then_some(self.block_elapsed)
    }

    pub fn attack_cooldown(&self) -> f32 {
        self.attack_cooldown
    }

    pub fn roll_cooldown(&self) -> f32 {
        self.roll_cooldown
    }

    /// Take every signal emitted since the last drain
    pub fn drain_signals(&mut self) -> Vec<FsmSignal> {
        std::mem::take(&mut self.signals)
    }

    fn emit(&mut self, signal: FsmSignal) {
        self.signals.push(signal);
    }

    /// Shared refusals: dead, stunned and rolling actors take no new actions
    fn incapacitated(&self) -> Option<RejectReason> {
        match self.state {
            CombatState::Dead => Some(RejectReason::Dead),
            CombatState::Stunned { .. } => Some(RejectReason::Stunned),
            CombatState::Rolling { .. } => Some(RejectReason::Rolling),
            _ => None,
        }
    }

    // ===== ATTACKS =====

    pub fn request_attack(
        &mut self,
        kind: AttackKind,
        resources: &mut ResourcePool,
        stats: &Stats,
        config: &CombatConfig,
    ) -> RequestOutcome {
        if let Some(reason) = self.incapacitated() {
            return RequestOutcome::Rejected(reason);
        }

        match (self.state, kind) {
            (CombatState::Blocking { .. }, _) => RequestOutcome::Rejected(RejectReason::Busy),
            (CombatState::Attacking { .. }, AttackKind::Heavy) => {
                RequestOutcome::Rejected(RejectReason::Busy)
            }
            (CombatState::Attacking { heavy: true, .. }, AttackKind::Light) => {
                RequestOutcome::Rejected(RejectReason::HeavyCannotCombo)
            }
            (CombatState::Attacking { .. }, AttackKind::Light) => {
                let window_open = self.combo_window_open();
                if let Some(swing) = self.swing.as_mut() {
                    swing.queued = true;
                }
                if window_open {
                    if self.try_chain(resources, stats, config) {
                        RequestOutcome::Accepted
                    } else {
                        RequestOutcome::Rejected(RejectReason::InsufficientEnergy)
                    }
                } else {
                    RequestOutcome::Queued
                }
            }
            (CombatState::Idle, _) => {
                if self.attack_cooldown > 0.0 {
                    return RequestOutcome::Rejected(RejectReason::Cooldown);
                }
                let heavy = kind == AttackKind::Heavy;
                let cost = if heavy {
                    config.timing.heavy_attack_cost
                } else {
                    config.timing.light_attack_cost
                };
                if !resources.try_spend_energy(cost) {
                    return RequestOutcome::Rejected(RejectReason::InsufficientEnergy);
                }
                self.begin_swing(0, heavy, stats, config);
                RequestOutcome::Accepted
            }
            // Remaining states were refused above
            _ => RequestOutcome::Rejected(RejectReason::Busy),
        }
    }

    fn begin_swing(&mut self, step: u8, heavy: bool, stats: &Stats, config: &CombatConfig) {
        let (duration, speed) = swing_timing(heavy, stats.attack_speed(), &config.timing);
        self.state = CombatState::Attacking { step, heavy };
        self.swing = Some(Swing {
            step,
            heavy,
            elapsed: 0.0,
            duration,
            combo_window_open: false,
            hitbox_open: false,
            queued: false,
            finish_pending: false,
        });
        self.state_elapsed = 0.0;
        if heavy {
            self.attack_cooldown = 1.0 / stats.attack_speed().max(0.05)
                + config.timing.heavy_cooldown_bonus;
        }
        self.emit(FsmSignal::AttackStarted {
            step,
            heavy,
            duration,
            speed,
        });
    }

    /// Fire the queued follow-up into the next combo step
    fn try_chain(&mut self, resources: &mut ResourcePool, stats: &Stats, config: &CombatConfig) -> bool {
        let Some(swing) = self.swing else {
            return false;
        };
        if swing.heavy || !swing.queued {
            return false;
        }
        if !resources.try_spend_energy(config.timing.light_attack_cost) {
            if let Some(swing) = self.swing.as_mut() {
                swing.queued = false;
            }
            tracing::debug!("combo follow-up dropped: insufficient energy");
            return false;
        }

        if swing.hitbox_open {
            self.emit(FsmSignal::HitboxClosed);
        }
        let step = (swing.step + 1) % config.timing.combo_length.max(1);
        self.emit(FsmSignal::ComboChained { step });
        self.begin_swing(step, false, stats, config);
        true
    }

    fn finish_swing(&mut self, config: &CombatConfig) {
        if let Some(swing) = self.swing.take() {
            if swing.hitbox_open {
                self.emit(FsmSignal::HitboxClosed);
            }
        }
        self.state = CombatState::Idle;
        self.state_elapsed = 0.0;
        self.attack_cooldown = self.attack_cooldown.max(config.timing.attack_recovery);
        self.emit(FsmSignal::AttackFinished);
    }

    /// Drop any swing in progress without finishing it
    fn interrupt_swing(&mut self) {
        if let Some(swing) = self.swing.take() {
            if swing.hitbox_open {
                self.emit(FsmSignal::HitboxClosed);
            }
        }
    }

    /// Handle a timeline callback from the animation layer
    ///
    /// Callbacks that do not apply to the current state are ignored.
    pub fn on_callback(
        &mut self,
        callback: AnimationCallback,
        resources: &mut ResourcePool,
        stats: &Stats,
        config: &CombatConfig,
    ) {
        let Some(swing) = self.swing.as_mut() else {
            return;
        };

        match callback {
            AnimationCallback::ComboWindowOpen => {
                if swing.heavy || swing.combo_window_open {
                    return;
                }
                swing.combo_window_open = true;
                let queued = swing.queued;
                self.emit(FsmSignal::ComboWindowOpened);
                if queued {
                    self.try_chain(resources, stats, config);
                }
            }
            AnimationCallback::HitboxOpen => {
                if swing.hitbox_open {
                    return;
                }
                swing.hitbox_open = true;
                let heavy = swing.heavy;
                self.emit(FsmSignal::HitboxOpened { heavy });
            }
            AnimationCallback::HitboxClose => {
                if !swing.hitbox_open {
                    return;
                }
                swing.hitbox_open = false;
                self.emit(FsmSignal::HitboxClosed);
            }
            AnimationCallback::AttackFinish => {
                if swing.elapsed < config.timing.min_attack_time {
                    // A swing shorter than the minimum finishes for real; anything
                    // earlier than its own length is left over from the previous clip
                    if swing.elapsed + FINISH_TOLERANCE >= swing.duration {
                        swing.finish_pending = true;
                    } else {
                        tracing::debug!(elapsed = swing.elapsed, "ignoring stale attack finish");
                    }
                    return;
                }
                self.finish_swing(config);
            }
        }
    }

    // ===== BLOCK =====

    pub fn request_block(&mut self) -> RequestOutcome {
        if let Some(reason) = self.incapacitated() {
            return RequestOutcome::Rejected(reason);
        }
        match self.state {
            CombatState::Idle if self.block_cooldown > 0.0 => {
                RequestOutcome::Rejected(RejectReason::Cooldown)
            }
            CombatState::Idle => {
                self.state = CombatState::Blocking {
                    parry_eligible: true,
                };
                self.block_elapsed = 0.0;
                self.emit(FsmSignal::BlockStarted);
                RequestOutcome::Accepted
            }
            _ => RequestOutcome::Rejected(RejectReason::Busy),
        }
    }

    pub fn release_block(&mut self, config: &CombatConfig) -> RequestOutcome {
        if !self.is_blocking() {
            return RequestOutcome::Rejected(RejectReason::NotBlocking);
        }
        self.end_block(config);
        self.state = CombatState::Idle;
        RequestOutcome::Accepted
    }

    fn end_block(&mut self, config: &CombatConfig) {
        self.block_cooldown = config.timing.block_cooldown;
        self.block_elapsed = 0.0;
        self.emit(FsmSignal::BlockEnded);
    }

    // ===== ROLL =====

    pub fn request_roll(&mut self, config: &CombatConfig) -> RequestOutcome {
        if let Some(reason) = self.incapacitated() {
            return RequestOutcome::Rejected(reason);
        }
        if self.is_attacking() {
            return RequestOutcome::Rejected(RejectReason::Busy);
        }
        if self.roll_cooldown > 0.0 {
            return RequestOutcome::Rejected(RejectReason::Cooldown);
        }
        if self.is_blocking() {
            self.end_block(config);
        }

        let duration = config.timing.roll_duration;
        self.state = CombatState::Rolling { remaining: duration };
        self.roll_cooldown = config.timing.roll_cooldown;
        self.emit(FsmSignal::RollStarted { duration });
        RequestOutcome::Accepted
    }

    /// Lock-on is a camera concern; the machine only vetoes it
    pub fn request_lock_on(&self) -> RequestOutcome {
        match self.incapacitated() {
            Some(reason) => RequestOutcome::Rejected(reason),
            None => RequestOutcome::Accepted,
        }
    }

    // ===== FORCED TRANSITIONS =====

    /// Force a stun, interrupting any attack or block
    ///
    /// Stunning a stunned actor extends the stun to the longer remaining
    /// duration. Returns false if the actor is dead.
    pub fn stun(&mut self, duration: f32, config: &CombatConfig) -> bool {
        match self.state {
            CombatState::Dead => return false,
            CombatState::Stunned { remaining } => {
                self.state = CombatState::Stunned {
                    remaining: remaining.max(duration),
                };
                return true;
            }
            CombatState::Blocking { .. } => self.end_block(config),
            _ => {}
        }

        self.interrupt_swing();
        self.state = CombatState::Stunned { remaining: duration };
        self.state_elapsed = 0.0;
        self.emit(FsmSignal::Stunned { duration });
        true
    }

    /// Enter Dead. Terminal; later requests are all refused.
    pub fn kill(&mut self) {
        if self.is_dead() {
            return;
        }
        self.interrupt_swing();
        self.state = CombatState::Dead;
        self.attack_cooldown = 0.0;
        self.block_cooldown = 0.0;
        self.roll_cooldown = 0.0;
        self.emit(FsmSignal::Died);
    }

    // ===== TIMERS =====

    pub fn tick(&mut self, dt: f32, config: &CombatConfig) {
        self.attack_cooldown = (self.attack_cooldown - dt).max(0.0);
        self.block_cooldown = (self.block_cooldown - dt).max(0.0);
        self.roll_cooldown = (self.roll_cooldown - dt).max(0.0);

        match self.state {
            CombatState::Attacking { .. } => {
                let mut finish_now = false;
                if let Some(swing) = self.swing.as_mut() {
                    swing.elapsed += dt;
                    finish_now = swing.finish_pending
                        && swing.elapsed >= config.timing.min_attack_time;
                }
                self.state_elapsed += dt;
                if finish_now {
                    self.finish_swing(config);
                } else if self.state_elapsed >= config.timing.failsafe_duration {
                    tracing::warn!(
                        elapsed = self.state_elapsed,
                        "attack never finished, forcing idle"
                    );
                    self.emit(FsmSignal::FailsafeTriggered);
                    self.finish_swing(config);
                }
            }
            CombatState::Blocking { .. } => {
                self.block_elapsed += dt;
                self.state = CombatState::Blocking {
                    parry_eligible: self.block_elapsed <= config.defense.parry_window,
                };
            }
            CombatState::Stunned { remaining } => {
                let remaining = remaining - dt;
                self.state_elapsed += dt;
                if remaining <= 0.0 || self.state_elapsed >= config.timing.failsafe_duration {
                    if remaining > 0.0 {
                        tracing::warn!(remaining, "stun exceeded failsafe, forcing idle");
                        self.emit(FsmSignal::FailsafeTriggered);
                    }
                    self.state = CombatState::Idle;
                    self.state_elapsed = 0.0;
                    self.emit(FsmSignal::StunEnded);
                } else {
                    self.state = CombatState::Stunned { remaining };
                }
            }
            CombatState::Rolling { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.state = CombatState::Idle;
                    self.emit(FsmSignal::RollEnded);
                } else {
                    self.state = CombatState::Rolling { remaining };
                }
            }
            CombatState::Idle | CombatState::Dead => {}
        }
    }
}
