use super::{Scheduler, TimerId};
use std::{
    cell::{Cell, RefCell},
    time::Duration,
};

enum Task {
    Once(Box<dyn FnOnce()>),
    Repeating {
        interval: Duration,
        callback: Box<dyn FnMut()>,
    },
}

struct Entry {
    id: TimerId,
    due: Duration,
    task: Task,
}

/// A scheduler driven by a virtual clock.
///
/// Nothing fires until [`advance`](ManualScheduler::advance) is called, which
/// moves the clock forward and runs every timer that became due, in order of
/// their due time.
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    entries: RefCell<Vec<Entry>>,
    // The repeating timer whose callback is currently running, it is not in
    // `entries` while it runs.
    running: Cell<Option<TimerId>>,
    running_cancelled: Cell<bool>,
    fired: Cell<usize>,
}

impl ManualScheduler {
    /// Smallest interval used for repeating timers.
    const MIN_INTERVAL: Duration = Duration::from_millis(1);

    pub fn new() -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
            running: Cell::new(None),
            running_cancelled: Cell::new(false),
            fired: Cell::new(0),
        }
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.borrow().iter().any(|e| e.id == id)
    }

    /// Total number of timer callbacks run so far.
    pub fn fired(&self) -> usize {
        self.fired.get()
    }

    fn next_id(&self) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        id
    }

    fn take_next_due(&self, until: Duration) -> Option<Entry> {
        let mut entries = self.entries.borrow_mut();
        let index = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.id.0))
            .map(|(i, _)| i)?;
        Some(entries.remove(index))
    }

    /// Advances the clock by `by`, running all timers that become due.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;
        while let Some(entry) = self.take_next_due(target) {
            self.now.set(entry.due);
            self.fired.set(self.fired.get() + 1);
            match entry.task {
                Task::Once(callback) => callback(),
                Task::Repeating {
                    interval,
                    mut callback,
                } => {
                    self.running.set(Some(entry.id));
                    self.running_cancelled.set(false);
                    callback();
                    self.running.set(None);
                    if !self.running_cancelled.get() {
                        self.entries.borrow_mut().push(Entry {
                            id: entry.id,
                            due: entry.due + interval,
                            task: Task::Repeating { interval, callback },
                        });
                    }
                }
            }
        }
        self.now.set(target);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id();
        self.entries.borrow_mut().push(Entry {
            id,
            due: self.now.get() + delay,
            task: Task::Once(callback),
        });
        id
    }

    fn schedule_repeating(&self, interval: Duration, callback: Box<dyn FnMut()>) -> TimerId {
        let id = self.next_id();
        let interval = interval.max(Self::MIN_INTERVAL);
        self.entries.borrow_mut().push(Entry {
            id,
            due: self.now.get() + interval,
            task: Task::Repeating { interval, callback },
        });
        id
    }

    fn cancel(&self, id: TimerId) {
        if self.running.get() == Some(id) {
            self.running_cancelled.set(true);
        }
        self.entries.borrow_mut().retain(|e| e.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn log_to(log: &Rc<RefCell<Vec<&'static str>>>, what: &'static str) -> Box<dyn FnOnce()> {
        let log = log.clone();
        Box::new(move || log.borrow_mut().push(what))
    }

    #[test]
    fn fires_in_due_order() {
        let s = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        s.schedule(Duration::from_millis(30), log_to(&log, "c"));
        s.schedule(Duration::from_millis(10), log_to(&log, "a"));
        s.schedule(Duration::from_millis(20), log_to(&log, "b"));
        s.advance_ms(15);
        assert_eq!(*log.borrow(), ["a"]);
        s.advance_ms(100);
        assert_eq!(*log.borrow(), ["a", "b", "c"]);
        assert_eq!(s.pending(), 0);
        assert_eq!(s.now(), Duration::from_millis(115));
    }

    #[test]
    fn cancel_is_idempotent() {
        let s = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = s.schedule(Duration::from_millis(10), log_to(&log, "x"));
        s.cancel(id);
        s.cancel(id);
        s.advance_ms(20);
        assert!(log.borrow().is_empty());
        let id = s.schedule(Duration::from_millis(10), log_to(&log, "y"));
        s.advance_ms(20);
        s.cancel(id);
        assert_eq!(*log.borrow(), ["y"]);
    }

    #[test]
    fn repeating_until_cancelled_from_inside() {
        let s = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));
        let id = Rc::new(Cell::new(None));
        let (c, i, weak) = (count.clone(), id.clone(), Rc::downgrade(&s));
        id.set(Some(s.schedule_repeating(
            Duration::from_millis(10),
            Box::new(move || {
                c.set(c.get() + 1);
                if c.get() == 3 {
                    if let (Some(s), Some(id)) = (weak.upgrade(), i.get()) {
                        s.cancel(id);
                    }
                }
            }),
        )));
        s.advance_ms(100);
        assert_eq!(count.get(), 3);
        assert_eq!(s.pending(), 0);
    }
}
