//! Presentation sink - where combat events go to be shown

use crate::combat::events::{CombatEvent, EventLog};
use crate::core::types::Tick;

pub trait PresentationSink {
    fn emit(&mut self, tick: Tick, event: CombatEvent);
}

impl PresentationSink for EventLog {
    fn emit(&mut self, tick: Tick, event: CombatEvent) {
        self.push(tick, event);
    }
}

impl<S: PresentationSink + ?Sized> PresentationSink for &mut S {
    fn emit(&mut self, tick: Tick, event: CombatEvent) {
        (**self).emit(tick, event);
    }
}
