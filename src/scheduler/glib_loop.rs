use super::{Scheduler, TimerId};
use glib::{Continue, SourceId};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
    time::Duration,
};

/// Schedules timers on the thread default glib main context.
///
/// Sources are forgotten once a one-shot timer fired so a late `cancel`
/// never touches a destroyed glib source.
pub struct GlibScheduler {
    next_id: Cell<u64>,
    sources: Rc<RefCell<HashMap<TimerId, SourceId>>>,
}

impl GlibScheduler {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            sources: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    fn next_id(&self) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        id
    }
}

impl Default for GlibScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for GlibScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id();
        let sources = self.sources.clone();
        let source = glib::timeout_add_local_once(delay, move || {
            sources.borrow_mut().remove(&id);
            callback();
        });
        self.sources.borrow_mut().insert(id, source);
        id
    }

    fn schedule_repeating(&self, interval: Duration, mut callback: Box<dyn FnMut()>) -> TimerId {
        let id = self.next_id();
        let source = glib::timeout_add_local(interval, move || {
            callback();
            Continue(true)
        });
        self.sources.borrow_mut().insert(id, source);
        id
    }

    fn cancel(&self, id: TimerId) {
        let source = self.sources.borrow_mut().remove(&id);
        if let Some(source) = source {
            source.remove();
        }
    }
}

impl Drop for GlibScheduler {
    fn drop(&mut self) {
        for (_, source) in self.sources.borrow_mut().drain() {
            source.remove();
        }
    }
}
