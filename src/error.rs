use std::{any::Any, cell::RefCell, io};

/// Failures reported by the audio and brightness backends.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("I/O error on {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("invalid value in {path}: {value:?}")]
    Parse { path: String, value: String },
    #[error("no such mixer element: {0}")]
    MissingElement(String),
    #[error("no default {0} device")]
    NoDevice(&'static str),
    #[cfg(feature = "my_alsa")]
    #[error("ALSA: {0}")]
    Alsa(#[from] alsa::Error),
    #[cfg(feature = "pulse")]
    #[error("PulseAudio: {0}")]
    Pulse(String),
}

pub trait LogError<T> {
    fn log_error(self) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogError<T> for Result<T, E> {
    /// Turn a result into an option, logging the error if it was one.
    fn log_error(self) -> Option<T> {
        match self {
            Ok(x) => Some(x),
            Err(e) => {
                log::error!("{e}");
                None
            }
        }
    }
}

pub trait LogNone<T> {
    fn log_none(self, msg: &str) -> Option<T>;
}

impl<T> LogNone<T> for Option<T> {
    /// Logs the given error message if the option is `None`.
    fn log_none(self, msg: &str) -> Self {
        if self.is_none() {
            log::error!("{msg}");
        }
        self
    }
}

/// A callback that panicked while a signal was being emitted.
#[derive(Clone, Debug)]
pub struct CallbackFailure {
    /// Name of the signal the callback was connected to.
    pub signal: &'static str,
    pub message: String,
}

type FailureHook = Box<dyn Fn(&CallbackFailure)>;

thread_local! {
    static FAILURE_HOOK: RefCell<Option<FailureHook>> = RefCell::new(None);
}

/// Installs an observer for callback failures on the current thread,
/// replacing the previous one.
pub fn set_failure_hook(hook: impl Fn(&CallbackFailure) + 'static) {
    FAILURE_HOOK.with(|h| *h.borrow_mut() = Some(Box::new(hook)));
}

pub fn clear_failure_hook() {
    FAILURE_HOOK.with(|h| *h.borrow_mut() = None);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Logs a panic caught inside a signal handler and forwards it to the
/// failure hook, if one is installed.
pub fn report_callback_failure(signal: &'static str, payload: &(dyn Any + Send)) {
    let failure = CallbackFailure {
        signal,
        message: panic_message(payload),
    };
    log::error!(
        "callback for signal '{}' panicked: {}",
        failure.signal,
        failure.message
    );
    FAILURE_HOOK.with(|h| {
        // The hook is taken out while it runs so it may replace itself.
        let hook = h.borrow_mut().take();
        if let Some(hook) = hook {
            hook(&failure);
            let mut slot = h.borrow_mut();
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn hook_receives_failures() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        set_failure_hook(move |f| seen2.borrow_mut().push(f.clone()));
        report_callback_failure("changed", &"boom");
        report_callback_failure("changed", &String::from("bang"));
        clear_failure_hook();
        report_callback_failure("changed", &42);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].message, "boom");
        assert_eq!(seen[1].message, "bang");
    }

    #[test]
    fn log_none_keeps_value() {
        assert_eq!(Some(3).log_none("missing"), Some(3));
        assert_eq!(None::<i32>.log_none("missing"), None);
        assert_eq!(Err::<i32, _>("nope").log_error(), None);
    }
}
