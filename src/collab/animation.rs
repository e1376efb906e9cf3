//! Animation driver - plays cues and reports timeline callbacks
//!
//! In an engine the callbacks come from events authored on the swing
//! clips. Headless, `TimelineAnimator` fires them at fixed fractions of
//! the swing duration the state machine reported.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::fsm::AnimationCallback;
use crate::core::config::TimingConfig;
use crate::core::types::ActorId;

/// What the combat core asks the animation layer to play
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimationCue {
    Attack {
        step: u8,
        heavy: bool,
        duration: f32,
        speed: f32,
    },
    /// Abandon whatever swing was playing
    Interrupt,
    Block { raised: bool },
    Roll { duration: f32 },
    Stun { duration: f32 },
    Death,
}

pub trait AnimationDriver {
    fn cue(&mut self, actor: ActorId, cue: AnimationCue);

    /// Advance an actor's playback and collect callbacks that fired, in order
    fn advance(&mut self, actor: ActorId, dt: f32) -> Vec<AnimationCallback>;

    fn forget(&mut self, _actor: ActorId) {}
}

/// Plays nothing and never calls back
///
/// For hosts that deliver callbacks themselves through the arena.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAnimator;

impl AnimationDriver for SilentAnimator {
    fn cue(&mut self, _actor: ActorId, _cue: AnimationCue) {}

    fn advance(&mut self, _actor: ActorId, _dt: f32) -> Vec<AnimationCallback> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default)]
struct Timeline {
    clock: f32,
    /// Pending callbacks sorted by fire time
    pending: Vec<(f32, AnimationCallback)>,
}

/// Self-timed swing timeline
#[derive(Debug, Clone)]
pub struct TimelineAnimator {
    hitbox_open_at: f32,
    hitbox_close_at: f32,
    combo_window_at: f32,
    timelines: AHashMap<ActorId, Timeline>,
}

impl TimelineAnimator {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            hitbox_open_at: timing.hitbox_open_at,
            hitbox_close_at: timing.hitbox_close_at,
            combo_window_at: timing.combo_window_at,
            timelines: AHashMap::new(),
        }
    }

    pub fn is_playing(&self, actor: ActorId) -> bool {
        self.timelines
            .get(&actor)
            .map_or(false, |timeline| !timeline.pending.is_empty())
    }
}

impl AnimationDriver for TimelineAnimator {
    fn cue(&mut self, actor: ActorId, cue: AnimationCue) {
        let timeline = self.timelines.entry(actor).or_default();
        timeline.clock = 0.0;
        timeline.pending.clear();

        if let AnimationCue::Attack {
            heavy, duration, ..
        } = cue
        {
            timeline
                .pending
                .push((duration * self.hitbox_open_at, AnimationCallback::HitboxOpen));
            timeline
                .pending
                .push((duration * self.hitbox_close_at, AnimationCallback::HitboxClose));
            if !heavy {
                timeline.pending.push((
                    duration * self.combo_window_at,
                    AnimationCallback::ComboWindowOpen,
                ));
            }
            timeline.pending.push((duration, AnimationCallback::AttackFinish));
            timeline
                .pending
                .sort_by(|a, b| a.0.total_cmp(&b.0));
        }
    }

    fn advance(&mut self, actor: ActorId, dt: f32) -> Vec<AnimationCallback> {
        let Some(timeline) = self.timelines.get_mut(&actor) else {
            return Vec::new();
        };
        timeline.clock += dt;

        let due = timeline
            .pending
            .iter()
            .take_while(|(at, _)| *at <= timeline.clock)
            .count();
        timeline.pending.drain(..due).map(|(_, cb)| cb).collect()
    }

    fn forget(&mut self, actor: ActorId) {
        self.timelines.remove(&actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attack(heavy: bool) -> AnimationCue {
        AnimationCue::Attack {
            step: 0,
            heavy,
            duration: 1.0,
            speed: 1.0,
        }
    }

    #[test]
    fn test_light_timeline_order() {
        let mut animator = TimelineAnimator::new(&TimingConfig::default());
        let id = ActorId(1);
        animator.cue(id, attack(false));

        let mut fired = Vec::new();
        for _ in 0..60 {
            fired.extend(animator.advance(id, 0.02));
        }
        assert_eq!(
            fired,
            vec![
                AnimationCallback::HitboxOpen,
                AnimationCallback::HitboxClose,
                AnimationCallback::ComboWindowOpen,
                AnimationCallback::AttackFinish,
            ]
        );
        assert!(!animator.is_playing(id));
    }

    #[test]
    fn test_heavy_timeline_has_no_combo_window() {
        let mut animator = TimelineAnimator::new(&TimingConfig::default());
        let id = ActorId(1);
        animator.cue(id, attack(true));
        let fired = animator.advance(id, 2.0);
        assert!(!fired.contains(&AnimationCallback::ComboWindowOpen));
        assert_eq!(fired.last(), Some(&AnimationCallback::AttackFinish));
    }

    #[test]
    fn test_interrupt_clears_pending() {
        let mut animator = TimelineAnimator::new(&TimingConfig::default());
        let id = ActorId(1);
        animator.cue(id, attack(false));
        animator.advance(id, 0.1);
        animator.cue(id, AnimationCue::Interrupt);
        assert!(animator.advance(id, 2.0).is_empty());
    }
}
