//! Debounced two-way synchronisation between a [`Source`] and a [`Sink`].
//!
//! Changes of the source are shown on the sink right away. User input on the
//! sink is buffered as a pending write and committed to the source once the
//! input pauses for the debounce delay, so a drag produces one device write
//! instead of one per motion event. While a source value is being displayed
//! the suppression flag is set, any input the sink produces during that time
//! is an echo of the display update and is ignored.

use crate::{
    error::report_callback_failure,
    range::same_value,
    scheduler::Scheduler,
    signal::HandlerId,
    sink::{Sink, UserInput},
    source::Source,
    timeout::Timeout,
};
use std::{
    cell::Cell,
    panic::{catch_unwind, AssertUnwindSafe},
    rc::{Rc, Weak},
    time::Duration,
};

/// Debounce delay used by the sliders unless configured otherwise.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SyncState {
    /// No write is waiting.
    Idle,
    /// A pending write will be committed when the debounce timer fires.
    PendingCommit,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WriteMode {
    /// Buffer input and write after it pauses for the given delay.
    Debounced(Duration),
    /// Write every input right away, for discrete gestures like scroll
    /// notches that are coarse already.
    Immediate,
}

/// Sets the flag for as long as it lives. Clearing happens in `drop` so the
/// flag is also cleared when the display update panics.
struct Suppression<'a>(&'a Cell<bool>);

impl<'a> Suppression<'a> {
    /// Returns `None` if the flag is already set.
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for Suppression<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

struct Inner {
    source: Rc<dyn Source>,
    sink: Rc<dyn Sink>,
    mode: WriteMode,
    timer: Timeout,
    pending: Cell<Option<f64>>,
    suppressed: Cell<bool>,
    enabled: Cell<bool>,
    writes: Cell<usize>,
}

impl Inner {
    /// Updates the enabled state from the source, dropping any pending write
    /// if the device went away.
    fn check_available(&self) -> bool {
        let available = self.source.is_available() && self.source.range().is_usable();
        if available != self.enabled.get() {
            log::debug!(
                "{}: device {}",
                self.source.name(),
                if available { "available" } else { "unavailable" }
            );
            self.enabled.set(available);
            self.sink.set_enabled(available);
        }
        if !available {
            self.discard();
        }
        available
    }

    fn discard(&self) {
        self.timer.cancel();
        self.pending.set(None);
    }

    /// Shows `value` on the sink with the suppression flag set.
    fn display(&self, value: f64) {
        let _suppression = match Suppression::acquire(&self.suppressed) {
            Some(suppression) => suppression,
            None => {
                log::trace!("{}: display of {value} suppressed", self.source.name());
                return;
            }
        };
        let range = self.source.range();
        if let Some(normalized) = range.normalize(value) {
            self.sink.display(range.clamp(value), normalized);
        }
    }

    fn on_source_changed(&self, value: f64) {
        if self.check_available() {
            self.display(value);
        }
    }

    fn on_user_input(self: &Rc<Self>, input: UserInput) {
        if self.suppressed.get() {
            log::trace!("{}: ignoring echoed input {input:?}", self.source.name());
            return;
        }
        if !self.enabled.get() {
            return;
        }
        let proposed = match input {
            UserInput::Absolute(value) => value,
            UserInput::Delta(delta) => self.base_value() + delta,
        };
        let proposed = self.source.range().clamp(proposed);
        match self.mode {
            WriteMode::Immediate => self.write_if_changed(proposed),
            WriteMode::Debounced(delay) => {
                self.pending.set(Some(proposed));
                if let UserInput::Delta(_) = input {
                    // Scroll controls have no position of their own.
                    self.display(proposed);
                }
                let weak: Weak<Self> = Rc::downgrade(self);
                self.timer.start(delay, move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.commit();
                    }
                });
            }
        }
    }

    /// The value relative input applies to: the pending value if a write is
    /// waiting, otherwise the source value.
    fn base_value(&self) -> f64 {
        self.pending.get().unwrap_or_else(|| self.source.value())
    }

    fn commit(&self) {
        if let Some(value) = self.pending.take() {
            if self.enabled.get() {
                self.write_if_changed(value);
            }
        }
    }

    fn write_if_changed(&self, value: f64) {
        let value = self.source.quantize(value);
        if same_value(value, self.source.value()) {
            log::trace!("{}: skipping redundant write of {value}", self.source.name());
            return;
        }
        log::trace!("{}: writing {value}", self.source.name());
        self.writes.set(self.writes.get() + 1);
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.source.set_value(value))) {
            report_callback_failure("set_value", &*payload);
        }
    }
}

/// Keeps one sink and one source in sync, see the [module docs](self).
///
/// Dropping it cancels a pending write and disconnects from both sides.
pub struct DebouncedSync {
    inner: Rc<Inner>,
    source_handler: HandlerId,
    sink_handler: HandlerId,
}

impl DebouncedSync {
    pub fn new(
        source: Rc<dyn Source>,
        sink: Rc<dyn Sink>,
        scheduler: Rc<dyn Scheduler>,
        mode: WriteMode,
    ) -> Self {
        let inner = Rc::new(Inner {
            source: source.clone(),
            sink: sink.clone(),
            mode,
            timer: Timeout::new(scheduler),
            pending: Cell::new(None),
            suppressed: Cell::new(false),
            enabled: Cell::new(true),
            writes: Cell::new(0),
        });
        if inner.check_available() {
            inner.display(source.value());
        }
        let weak = Rc::downgrade(&inner);
        let source_handler = source.connect_changed(Box::new(move |value| {
            if let Some(inner) = weak.upgrade() {
                inner.on_source_changed(value);
            }
        }));
        let weak = Rc::downgrade(&inner);
        let sink_handler = sink.connect_input(Box::new(move |input| {
            if let Some(inner) = weak.upgrade() {
                inner.on_user_input(input);
            }
        }));
        Self {
            inner,
            source_handler,
            sink_handler,
        }
    }

    /// Creates a sync that writes after input pauses for `delay`.
    pub fn debounced(
        source: Rc<dyn Source>,
        sink: Rc<dyn Sink>,
        scheduler: Rc<dyn Scheduler>,
        delay: Duration,
    ) -> Self {
        Self::new(source, sink, scheduler, WriteMode::Debounced(delay))
    }

    /// Creates a sync that writes every input right away.
    pub fn immediate(
        source: Rc<dyn Source>,
        sink: Rc<dyn Sink>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self::new(source, sink, scheduler, WriteMode::Immediate)
    }

    pub fn state(&self) -> SyncState {
        if self.inner.pending.get().is_some() {
            SyncState::PendingCommit
        } else {
            SyncState::Idle
        }
    }

    pub fn mode(&self) -> WriteMode {
        self.inner.mode
    }

    pub fn pending_value(&self) -> Option<f64> {
        self.inner.pending.get()
    }

    pub fn is_suppressed(&self) -> bool {
        self.inner.suppressed.get()
    }

    /// Whether the source is available, an unavailable source makes the
    /// control inert.
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Number of writes issued to the source.
    pub fn writes(&self) -> usize {
        self.inner.writes.get()
    }

    /// Feeds input as if the sink had produced it, for gestures the sink
    /// does not report itself.
    pub fn handle_input(&self, input: UserInput) {
        self.inner.on_user_input(input);
    }

    /// Commits a pending write now instead of waiting for the timer.
    pub fn flush(&self) {
        self.inner.timer.cancel();
        self.inner.commit();
    }

    /// Drops a pending write without committing it.
    pub fn cancel(&self) {
        self.inner.discard();
    }

    /// Re-reads the source and updates the sink, used when the device behind
    /// the source was replaced.
    pub fn resync(&self) {
        if self.inner.check_available() {
            self.inner.display(self.inner.source.value());
        }
    }

    pub fn source(&self) -> &Rc<dyn Source> {
        &self.inner.source
    }
}

impl Drop for DebouncedSync {
    fn drop(&mut self) {
        self.inner.discard();
        self.inner.source.disconnect(self.source_handler);
        self.inner.sink.disconnect_input(self.sink_handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        range::ValueRange,
        scheduler::ManualScheduler,
        testing::{MockSource, RecordingSink},
    };

    fn setup(value: f64) -> (Rc<MockSource>, Rc<RecordingSink>, Rc<ManualScheduler>) {
        (
            MockSource::new("volume", value, ValueRange::PERCENT),
            RecordingSink::new(),
            Rc::new(ManualScheduler::new()),
        )
    }

    fn slider(
        source: &Rc<MockSource>,
        sink: &Rc<RecordingSink>,
        scheduler: &Rc<ManualScheduler>,
    ) -> DebouncedSync {
        DebouncedSync::debounced(
            source.clone(),
            sink.clone(),
            scheduler.clone(),
            DEFAULT_DEBOUNCE,
        )
    }

    #[test]
    fn construction_displays_source_value() {
        let (source, sink, scheduler) = setup(40.0);
        let sync = DebouncedSync::debounced(source, sink.clone(), scheduler, DEFAULT_DEBOUNCE);
        assert_eq!(sink.last_displayed(), Some((40.0, 0.4)));
        assert_eq!(sync.state(), SyncState::Idle);
        assert!(sink.is_enabled());
    }

    #[test]
    fn rapid_input_produces_one_write() {
        let (source, sink, scheduler) = setup(50.0);
        let sync = slider(&source, &sink, &scheduler);
        for v in [55.0, 60.0, 65.0, 70.0, 75.0] {
            sink.drag(v);
            assert_eq!(sync.state(), SyncState::PendingCommit);
            scheduler.advance_ms(30);
        }
        assert!(source.writes().is_empty());
        assert_eq!(sync.pending_value(), Some(75.0));
        scheduler.advance_ms(100);
        assert_eq!(source.writes(), [75.0]);
        assert_eq!(sync.state(), SyncState::Idle);
        assert_eq!(sync.writes(), 1);
    }

    #[test]
    fn own_write_echo_does_not_write_again() {
        let (source, sink, scheduler) = setup(50.0);
        let _sync = slider(&source, &sink, &scheduler);
        sink.set_echo_input(true);
        sink.drag(80.0);
        scheduler.advance_ms(100);
        assert_eq!(source.writes(), [80.0]);
        // The mock echoes the change, the sink displays 80 and echoes that
        // display as input, which must be ignored.
        assert_eq!(sink.last_displayed(), Some((80.0, 0.8)));
        scheduler.advance_ms(1000);
        assert_eq!(source.writes(), [80.0]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn redundant_write_is_skipped() {
        let (source, sink, scheduler) = setup(50.0);
        let sync = slider(&source, &sink, &scheduler);
        sink.drag(70.0);
        sink.drag(50.0);
        scheduler.advance_ms(100);
        assert!(source.writes().is_empty());
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn external_change_catching_up_with_pending_value() {
        let (source, sink, scheduler) = setup(50.0);
        let _sync = slider(&source, &sink, &scheduler);
        sink.drag(60.0);
        source.external_change(60.0);
        scheduler.advance_ms(100);
        assert!(source.writes().is_empty());
    }

    #[test]
    fn input_is_clamped() {
        let (source, sink, scheduler) = setup(50.0);
        let _sync = slider(&source, &sink, &scheduler);
        sink.drag(140.0);
        scheduler.advance_ms(100);
        sink.drag(-20.0);
        scheduler.advance_ms(100);
        assert_eq!(source.writes(), [100.0, 0.0]);
    }

    #[test]
    fn scroll_deltas_accumulate_on_pending_value() {
        let (source, sink, scheduler) = setup(50.0);
        let _sync = slider(&source, &sink, &scheduler);
        sink.scroll(5.0);
        sink.scroll(5.0);
        sink.scroll(5.0);
        assert_eq!(sink.last_displayed(), Some((65.0, 0.65)));
        scheduler.advance_ms(100);
        assert_eq!(source.writes(), [65.0]);
    }

    #[test]
    fn immediate_mode_writes_each_step() {
        let (source, sink, scheduler) = setup(2.0);
        let sync = DebouncedSync::immediate(source.clone(), sink.clone(), scheduler.clone());
        sink.scroll(-5.0);
        assert_eq!(source.writes(), [0.0]);
        sink.scroll(-5.0);
        // Already at the minimum.
        assert_eq!(source.writes(), [0.0]);
        sink.scroll(5.0);
        assert_eq!(source.writes(), [0.0, 5.0]);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn drop_cancels_pending_write() {
        let (source, sink, scheduler) = setup(50.0);
        let sync = slider(&source, &sink, &scheduler);
        sink.drag(90.0);
        drop(sync);
        assert_eq!(scheduler.pending(), 0);
        scheduler.advance_ms(500);
        assert!(source.writes().is_empty());
        assert_eq!(source.handler_count(), 0);
        assert_eq!(sink.handler_count(), 0);
    }

    #[test]
    fn flush_and_cancel() {
        let (source, sink, scheduler) = setup(50.0);
        let sync = slider(&source, &sink, &scheduler);
        sink.drag(30.0);
        sync.flush();
        assert_eq!(source.writes(), [30.0]);
        sink.drag(20.0);
        sync.cancel();
        assert_eq!(sync.state(), SyncState::Idle);
        scheduler.advance_ms(500);
        assert_eq!(source.writes(), [30.0]);
    }

    #[test]
    fn unavailable_source_is_inert() {
        let source = MockSource::unavailable("brightness", ValueRange::new(0.0, 255.0));
        let sink = RecordingSink::new();
        let scheduler = Rc::new(ManualScheduler::new());
        let sync = slider(&source, &sink, &scheduler);
        sink.drag(100.0);
        sink.scroll(5.0);
        scheduler.advance_ms(500);
        assert_eq!(source.reads(), 0);
        assert!(source.writes().is_empty());
        assert!(sink.displayed().is_empty());
        assert!(!sink.is_enabled());
        assert!(!sync.is_enabled());
    }

    #[test]
    fn non_positive_max_is_inert() {
        let source = MockSource::new("brightness", 10.0, ValueRange::new(0.0, -1.0));
        let sink = RecordingSink::new();
        let scheduler = Rc::new(ManualScheduler::new());
        let _sync = DebouncedSync::immediate(source.clone(), sink.clone(), scheduler);
        sink.scroll(5.0);
        assert_eq!(source.reads(), 0);
        assert!(source.writes().is_empty());
        assert!(!sink.is_enabled());
    }

    #[test]
    fn device_disappearing_drops_pending_write() {
        let (source, sink, scheduler) = setup(50.0);
        let sync = slider(&source, &sink, &scheduler);
        sink.drag(70.0);
        source.set_available(false);
        assert!(!sink.is_enabled());
        assert_eq!(sync.state(), SyncState::Idle);
        scheduler.advance_ms(500);
        assert!(source.writes().is_empty());
        source.set_available(true);
        assert!(sink.is_enabled());
        assert_eq!(sink.last_displayed(), Some((50.0, 0.5)));
    }

    #[test]
    fn suppression_cleared_after_panicking_display() {
        let (source, sink, scheduler) = setup(50.0);
        let sync = slider(&source, &sink, &scheduler);
        sink.fail_next_display();
        source.external_change(30.0);
        assert!(!sync.is_suppressed());
        sink.drag(90.0);
        scheduler.advance_ms(100);
        assert_eq!(source.writes(), [90.0]);
    }
}
