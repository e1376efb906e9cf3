//! Enemy AI
//!
//! One behavior controller per enemy actor. Controllers issue requests to
//! their actor's state machine and intents to the movement provider; they
//! never mutate combat state directly.

pub mod behavior;

pub use behavior::{dodge_chance, BehaviorMode, EnemyBehavior, TargetView};
