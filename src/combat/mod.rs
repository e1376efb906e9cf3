//! Combat resolution
//!
//! Stats and resource pools, the per-actor state machine, and the pipeline
//! that turns a weapon contact into a parry, a block or damage.

pub mod constants;
pub mod damage;
pub mod defense;
pub mod events;
pub mod fsm;
pub mod impact;
pub mod resources;
pub mod stats;
pub mod weapon;

pub use damage::{mitigate, raw_damage, resolve_contact, ContactOutcome, IgnoreReason};
pub use defense::{resolve_defense, DefenseOutcome, DefenseQuery, DefenseVerdict};
pub use events::{CombatEvent, EventLog, LoggedEvent};
pub use fsm::{
    AnimationCallback, AttackKind, CombatState, CombatStateMachine, FsmSignal, RejectReason,
    RequestOutcome,
};
pub use impact::Impact;
pub use resources::{DamageApplied, ResourcePool};
pub use stats::{StatType, Stats};
pub use weapon::{Weapon, WeaponProfile};
