use crate::signal::HandlerId;

/// Input coming from a UI control.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum UserInput {
    /// The control was dragged to this value.
    Absolute(f64),
    /// A scroll gesture moved the value by this amount.
    Delta(f64),
}

/// A UI control that shows a value and produces user input.
pub trait Sink {
    /// Updates what the control shows. Must not produce user input itself,
    /// though a toolkit may still echo it, which is what the suppression
    /// flag in [`DebouncedSync`](crate::sync::DebouncedSync) is for.
    fn display(&self, value: f64, normalized: f64);

    fn connect_input(&self, callback: Box<dyn Fn(UserInput)>) -> HandlerId;

    fn disconnect_input(&self, id: HandlerId);

    /// Disabled controls are inert, the shell usually hides them.
    fn set_enabled(&self, enabled: bool);
}

/// Direction of a scroll event as reported by the toolkit.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Scroll {
    Up,
    Down,
    Left,
    Right,
    /// Touchpad scrolling with continuous deltas.
    Smooth { dx: f64, dy: f64 },
}

impl Scroll {
    /// Turns a scroll event into a step of `step` units: up (negative `dy`
    /// for smooth scrolling) increases, down decreases, anything else is
    /// ignored.
    pub fn to_delta(self, step: f64) -> Option<f64> {
        match self {
            Self::Up => Some(step),
            Self::Down => Some(-step),
            Self::Smooth { dy, .. } if dy < 0.0 => Some(step),
            Self::Smooth { dy, .. } if dy > 0.0 => Some(-step),
            _ => None,
        }
    }

    /// The smooth scroll deltas as they are: scrolling up or right increases
    /// by the distance scrolled. Discrete notches give `None`.
    pub fn to_raw_delta(self) -> Option<f64> {
        match self {
            Self::Smooth { dx, dy } if dx != 0.0 || dy != 0.0 => Some(dx - dy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_directions() {
        assert_eq!(Scroll::Up.to_delta(5.0), Some(5.0));
        assert_eq!(Scroll::Down.to_delta(5.0), Some(-5.0));
        assert_eq!(Scroll::Smooth { dx: 0.0, dy: -0.3 }.to_delta(5.0), Some(5.0));
        assert_eq!(Scroll::Smooth { dx: 0.0, dy: 1.2 }.to_delta(5.0), Some(-5.0));
        assert_eq!(Scroll::Smooth { dx: 2.0, dy: 0.0 }.to_delta(5.0), None);
        assert_eq!(Scroll::Left.to_delta(5.0), None);
    }

    #[test]
    fn raw_scroll_deltas() {
        assert_eq!(Scroll::Smooth { dx: 0.0, dy: -1.5 }.to_raw_delta(), Some(1.5));
        assert_eq!(Scroll::Smooth { dx: 2.0, dy: 0.0 }.to_raw_delta(), Some(2.0));
        assert_eq!(Scroll::Smooth { dx: -1.0, dy: 0.5 }.to_raw_delta(), Some(-1.5));
        assert_eq!(Scroll::Smooth { dx: 0.0, dy: 0.0 }.to_raw_delta(), None);
        assert_eq!(Scroll::Up.to_raw_delta(), None);
    }
}
