//! Ports to the engine layers the combat core drives but does not own
//!
//! Each port is a trait plus a headless implementation used by the arena
//! runner and the tests.

pub mod animation;
pub mod movement;
pub mod presentation;

pub use animation::{AnimationCue, AnimationDriver, SilentAnimator, TimelineAnimator};
pub use movement::{KinematicMovement, MovementProvider};
pub use presentation::PresentationSink;
