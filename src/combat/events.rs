//! Combat events reported to the presentation layer

use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, Tick};

/// Something the player should see or hear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CombatEvent {
    Hit {
        attacker: ActorId,
        defender: ActorId,
        damage: f32,
        heavy: bool,
        guard_broken: bool,
    },
    Blocked {
        attacker: ActorId,
        defender: ActorId,
        energy_spent: f32,
    },
    Parried {
        attacker: ActorId,
        defender: ActorId,
    },
    GuardBroken {
        attacker: ActorId,
        defender: ActorId,
    },
    Stunned {
        actor: ActorId,
        duration: f32,
    },
    Dodged {
        actor: ActorId,
        attacker: ActorId,
    },
    Death {
        actor: ActorId,
        killer: Option<ActorId>,
    },
    HealthChanged {
        actor: ActorId,
        current: f32,
        max: f32,
    },
    EnergyChanged {
        actor: ActorId,
        current: f32,
        max: f32,
    },
    Despawned {
        actor: ActorId,
    },
}

impl CombatEvent {
    /// Actor the event is primarily about
    pub fn subject(&self) -> ActorId {
        match self {
            CombatEvent::Hit { defender, .. }
            | CombatEvent::Blocked { defender, .. }
            | CombatEvent::Parried { defender, .. }
            | CombatEvent::GuardBroken { defender, .. } => *defender,
            CombatEvent::Stunned { actor, .. }
            | CombatEvent::Dodged { actor, .. }
            | CombatEvent::Death { actor, .. }
            | CombatEvent::HealthChanged { actor, .. }
            | CombatEvent::EnergyChanged { actor, .. }
            | CombatEvent::Despawned { actor } => *actor,
        }
    }
}

/// An event stamped with the tick it happened on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub tick: Tick,
    pub event: CombatEvent,
}

/// In-memory record of every event, in emission order
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<LoggedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tick: Tick, event: CombatEvent) {
        self.events.push(LoggedEvent { tick, event });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CombatEvent> {
        self.events.iter().map(|logged| &logged.event)
    }

    /// Count events matching a predicate
    pub fn count(&self, predicate: impl Fn(&CombatEvent) -> bool) -> usize {
        self.iter().filter(|event| predicate(event)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_counts() {
        let mut log = EventLog::new();
        log.push(
            1,
            CombatEvent::Parried {
                attacker: ActorId(2),
                defender: ActorId(1),
            },
        );
        log.push(2, CombatEvent::Despawned { actor: ActorId(2) });

        assert_eq!(log.len(), 2);
        assert_eq!(
            log.count(|e| matches!(e, CombatEvent::Parried { .. })),
            1
        );
        assert_eq!(log.events[0].event.subject(), ActorId(1));
    }

    #[test]
    fn test_events_serialize_with_kind_tag() {
        let event = CombatEvent::Death {
            actor: ActorId(3),
            killer: Some(ActorId(1)),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"death\""));
    }
}
