use crate::error::report_callback_failure;
use std::{
    cell::{Cell, RefCell},
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
};

/// Identifies a connected callback so it can be disconnected again.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct HandlerId(u64);

type Callback<T> = Rc<dyn Fn(&T)>;

/// A list of callbacks invoked with a value whenever the signal is emitted.
///
/// A panicking callback does not stop the remaining callbacks from running,
/// the panic is caught and reported through
/// [`report_callback_failure`](crate::error::report_callback_failure).
pub struct Signal<T> {
    name: &'static str,
    next_id: Cell<u64>,
    callbacks: RefCell<Vec<(HandlerId, Callback<T>)>>,
}

impl<T> Signal<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: Cell::new(0),
            callbacks: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn connect(&self, callback: impl Fn(&T) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.callbacks.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    /// Removes a callback, returns `false` if it was not connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut callbacks = self.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|(handler, _)| *handler != id);
        callbacks.len() != before
    }

    pub fn emit(&self, value: &T) {
        // Callbacks may connect or disconnect handlers, so iterate a snapshot.
        let snapshot: Vec<Callback<T>> = self
            .callbacks
            .borrow()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(value))) {
                report_callback_failure(self.name, &*payload);
            }
        }
    }

    pub fn clear(&self) {
        self.callbacks.borrow_mut().clear();
    }

    pub fn handler_count(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panicking_callback_does_not_stop_others() {
        let signal = Signal::<i32>::new("test");
        let hits = Rc::new(Cell::new(0));
        signal.connect(|_| panic!("first callback fails"));
        let h = hits.clone();
        signal.connect(move |v| h.set(h.get() + *v));
        signal.emit(&2);
        signal.emit(&3);
        assert_eq!(hits.get(), 5);
    }

    #[test]
    fn disconnect() {
        let signal = Signal::<()>::new("test");
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = signal.connect(move |_| h.set(h.get() + 1));
        signal.emit(&());
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(&());
        assert_eq!(hits.get(), 1);
        assert_eq!(signal.handler_count(), 0);
    }

    #[test]
    fn callback_may_disconnect_itself() {
        let signal = Rc::new(Signal::<()>::new("test"));
        let id = Rc::new(Cell::new(None));
        let (s, i) = (Rc::downgrade(&signal), id.clone());
        id.set(Some(signal.connect(move |_| {
            if let (Some(s), Some(id)) = (s.upgrade(), i.get()) {
                s.disconnect(id);
            }
        })));
        signal.emit(&());
        assert_eq!(signal.handler_count(), 0);
    }
}
