use crate::{range::ValueRange, signal::HandlerId};

/// An external, independently changing value such as a stream volume or the
/// screen brightness.
///
/// Sources are shared between every control that watches them, so all
/// methods take `&self` and implementations use interior mutability.
pub trait Source {
    /// The current value. May change at any time for reasons outside our
    /// control.
    fn value(&self) -> f64;

    /// Asks the device to adopt `value`. This is best-effort: failures are
    /// logged by the implementation and never reported to the caller.
    fn set_value(&self, value: f64);

    /// The value the device would actually store for `value`, for devices
    /// with integer steps.
    fn quantize(&self, value: f64) -> f64 {
        value
    }

    /// Registers a callback that runs whenever the value changes, whatever
    /// the cause, including our own writes.
    fn connect_changed(&self, callback: Box<dyn Fn(f64)>) -> HandlerId;

    fn disconnect(&self, id: HandlerId);

    /// Whether the underlying device exists.
    fn is_available(&self) -> bool;

    fn range(&self) -> ValueRange;

    /// Short name used in log messages.
    fn name(&self) -> &str;
}
