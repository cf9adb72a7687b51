//! In-memory sources and sinks for exercising controls without devices.
//!
//! Used by the tests and by the `simulate` command.

use crate::{
    range::ValueRange,
    signal::{HandlerId, Signal},
    sink::{Sink, UserInput},
    source::Source,
};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// A source backed by a plain value that records every write.
pub struct MockSource {
    name: String,
    value: Cell<f64>,
    range: Cell<ValueRange>,
    available: Cell<bool>,
    echo: Cell<bool>,
    reads: Cell<usize>,
    writes: RefCell<Vec<f64>>,
    changed: Signal<f64>,
}

impl MockSource {
    pub fn new(name: &str, value: f64, range: ValueRange) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            value: Cell::new(value),
            range: Cell::new(range),
            available: Cell::new(true),
            echo: Cell::new(true),
            reads: Cell::new(0),
            writes: RefCell::new(Vec::new()),
            changed: Signal::new("changed"),
        })
    }

    pub fn unavailable(name: &str, range: ValueRange) -> Rc<Self> {
        let this = Self::new(name, 0.0, range);
        this.available.set(false);
        this
    }

    /// Whether writes are applied and announced right away, like a device
    /// that reports its new state. Enabled by default.
    pub fn set_echo(&self, echo: bool) {
        self.echo.set(echo);
    }

    /// Simulates a change made by something else, e.g. a hardware key.
    pub fn external_change(&self, value: f64) {
        self.value.set(value);
        self.changed.emit(&value);
    }

    /// Simulates the device appearing or disappearing.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
        self.changed.emit(&self.value.get());
    }

    pub fn set_range(&self, range: ValueRange) {
        self.range.set(range);
    }

    pub fn writes(&self) -> Vec<f64> {
        self.writes.borrow().clone()
    }

    /// Number of `value()` calls.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn current(&self) -> f64 {
        self.value.get()
    }

    pub fn handler_count(&self) -> usize {
        self.changed.handler_count()
    }
}

impl Source for MockSource {
    fn value(&self) -> f64 {
        self.reads.set(self.reads.get() + 1);
        self.value.get()
    }

    fn set_value(&self, value: f64) {
        self.writes.borrow_mut().push(value);
        if self.echo.get() {
            self.external_change(value);
        }
    }

    fn connect_changed(&self, callback: Box<dyn Fn(f64)>) -> HandlerId {
        self.changed.connect(move |v| callback(*v))
    }

    fn disconnect(&self, id: HandlerId) {
        self.changed.disconnect(id);
    }

    fn is_available(&self) -> bool {
        self.available.get()
    }

    fn range(&self) -> ValueRange {
        self.range.get()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A sink that records what it was asked to display and lets tests play
/// the user.
pub struct RecordingSink {
    displayed: RefCell<Vec<(f64, f64)>>,
    enabled: Cell<bool>,
    echo_input: Cell<bool>,
    fail_display: Cell<bool>,
    input: Signal<UserInput>,
}

impl RecordingSink {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            displayed: RefCell::new(Vec::new()),
            enabled: Cell::new(true),
            echo_input: Cell::new(false),
            fail_display: Cell::new(false),
            input: Signal::new("user-input"),
        })
    }

    /// Makes every display update come back as user input, the way toolkit
    /// sliders emit their value-changed signal for programmatic changes.
    pub fn set_echo_input(&self, echo: bool) {
        self.echo_input.set(echo);
    }

    /// Makes the next `display` call panic.
    pub fn fail_next_display(&self) {
        self.fail_display.set(true);
    }

    pub fn drag(&self, value: f64) {
        self.input.emit(&UserInput::Absolute(value));
    }

    pub fn scroll(&self, delta: f64) {
        self.input.emit(&UserInput::Delta(delta));
    }

    pub fn displayed(&self) -> Vec<(f64, f64)> {
        self.displayed.borrow().clone()
    }

    pub fn last_displayed(&self) -> Option<(f64, f64)> {
        self.displayed.borrow().last().copied()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn handler_count(&self) -> usize {
        self.input.handler_count()
    }
}

impl Sink for RecordingSink {
    fn display(&self, value: f64, normalized: f64) {
        if self.fail_display.replace(false) {
            panic!("display of {value} failed");
        }
        self.displayed.borrow_mut().push((value, normalized));
        if self.echo_input.get() {
            self.input.emit(&UserInput::Absolute(value));
        }
    }

    fn connect_input(&self, callback: Box<dyn Fn(UserInput)>) -> HandlerId {
        self.input.connect(move |input| callback(*input))
    }

    fn disconnect_input(&self, id: HandlerId) {
        self.input.disconnect(id);
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }
}
