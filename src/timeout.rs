use crate::scheduler::{Scheduler, TimerId};
use std::{cell::Cell, rc::Rc, time::Duration};

#[derive(Default)]
struct TimeoutState {
    armed: Cell<Option<TimerId>>,
    generation: Cell<u64>,
}

/// A one-shot timer that can be re-armed. Starting it again replaces the
/// previous callback, dropping it cancels whatever is still armed.
pub struct Timeout {
    scheduler: Rc<dyn Scheduler>,
    state: Rc<TimeoutState>,
}

impl Timeout {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            state: Rc::new(TimeoutState::default()),
        }
    }

    pub fn start(&self, delay: Duration, function: impl FnOnce() + 'static) {
        self.cancel();
        let generation = self.state.generation.get() + 1;
        self.state.generation.set(generation);
        let state = self.state.clone();
        let id = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if state.generation.get() == generation {
                    state.armed.set(None);
                }
                function();
            }),
        );
        self.state.armed.set(Some(id));
    }

    pub fn cancel(&self) {
        if let Some(id) = self.state.armed.take() {
            self.scheduler.cancel(id);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state.armed.get().is_some()
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Periodically calls a function until stopped or dropped.
pub struct Interval {
    scheduler: Rc<dyn Scheduler>,
    id: Cell<Option<TimerId>>,
}

impl Interval {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            id: Cell::new(None),
        }
    }

    pub fn start(&self, interval: Duration, function: impl FnMut() + 'static) {
        self.stop();
        let function = Box::new(function);
        let id = self.scheduler.schedule_repeating(interval, function);
        self.id.set(Some(id));
    }

    pub fn stop(&self) {
        if let Some(id) = self.id.take() {
            self.scheduler.cancel(id);
        }
    }

    pub fn is_running(&self) -> bool {
        self.id.get().is_some()
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.stop();
    }
}
