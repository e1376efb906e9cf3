//! Arena Combat - real-time melee combat resolution and enemy behavior

pub mod actor;
pub mod ai;
pub mod arena;
pub mod collab;
pub mod combat;
pub mod core;
pub mod input;
