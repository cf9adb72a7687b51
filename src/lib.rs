//! Volume and brightness controls for a desktop shell.
//!
//! The core of the crate is [`sync::DebouncedSync`], which keeps a UI control
//! (a [`sink::Sink`]) and a device value (a [`source::Source`]) in step
//! without feedback loops or redundant device writes. The device services in
//! [`audio`] and [`brightness`] provide the sources, [`controls`] wires them
//! to sinks the way the bar and the control panel use them.

pub mod audio;
pub mod brightness;
pub mod cfg;
pub mod config;
pub mod controls;
pub mod error;
pub mod indicator;
pub mod logging;
pub mod paths;
pub mod range;
pub mod scheduler;
pub mod signal;
pub mod sink;
pub mod source;
pub mod sync;
pub mod testing;
pub mod timeout;

pub type AnyResult<T> = Result<T, Box<dyn std::error::Error>>;
