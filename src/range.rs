use std::fmt::Display;

/// Values closer than this are considered equal when deciding whether a
/// write would change anything.
pub const VALUE_EPSILON: f64 = 1e-6;

/// Returns whether two controllable values are the same for the purpose of
/// skipping redundant writes.
pub fn same_value(a: f64, b: f64) -> bool {
    (a - b).abs() < VALUE_EPSILON
}

/// Inclusive range `[min, max]` of a controllable value.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const PERCENT: ValueRange = ValueRange {
        min: 0.0,
        max: 100.0,
    };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range whose maximum is not positive (or not a number) describes a
    /// device we know nothing about, controls for it stay disabled.
    pub fn is_usable(&self) -> bool {
        self.max > 0.0 && self.max > self.min && self.min.is_finite() && self.max.is_finite()
    }

    /// Clamps the given value into the range
    pub fn clamp(&self, x: f64) -> f64 {
        if x < self.min {
            self.min
        } else if x > self.max {
            self.max
        } else {
            x
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }

    /// Maps `x` into `[0, 1]`, `None` if the range is not usable.
    pub fn normalize(&self, x: f64) -> Option<f64> {
        if !self.is_usable() {
            return None;
        }
        Some((self.clamp(x) - self.min) / (self.max - self.min))
    }

    /// Whole percentage of `x` within the range, `0` for unusable ranges.
    pub fn percent(&self, x: f64) -> u8 {
        self.normalize(x).map(|n| (n * 100.0) as u8).unwrap_or(0)
    }
}

impl Display for ValueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..={}]", self.min, self.max)
    }
}

/// A requested change of a value: `50` sets it, `+5` and `-5` move it.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Adjustment {
    Set(f64),
    By(f64),
}

impl Adjustment {
    /// The value this adjustment leads to from `current`, clamped to `range`.
    pub fn apply(self, current: f64, range: &ValueRange) -> f64 {
        range.clamp(match self {
            Self::Set(value) => value,
            Self::By(delta) => current + delta,
        })
    }
}

impl std::str::FromStr for Adjustment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches('%');
        let number = |n: &str| {
            n.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("invalid value: {s} (expected N, +N or -N)"))
        };
        if let Some(delta) = s.strip_prefix('+') {
            Ok(Self::By(number(delta)?))
        } else if let Some(delta) = s.strip_prefix('-') {
            Ok(Self::By(-number(delta)?))
        } else {
            Ok(Self::Set(number(s)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_and_normalize() {
        let r = ValueRange::new(0.0, 200.0);
        assert_eq!(r.clamp(-3.0), 0.0);
        assert_eq!(r.clamp(250.0), 200.0);
        assert_eq!(r.clamp(17.5), 17.5);
        assert_eq!(r.normalize(50.0), Some(0.25));
        assert_eq!(r.percent(199.0), 99);
    }

    #[test]
    fn non_positive_max_is_unusable() {
        for r in [
            ValueRange::new(0.0, 0.0),
            ValueRange::new(0.0, -1.0),
            ValueRange::new(0.0, f64::NAN),
        ] {
            assert!(!r.is_usable(), "{r}");
            assert_eq!(r.normalize(10.0), None);
            assert_eq!(r.percent(10.0), 0);
        }
    }

    #[test]
    fn adjustments() {
        let r = ValueRange::PERCENT;
        assert_eq!("40".parse(), Ok(Adjustment::Set(40.0)));
        assert_eq!("+5".parse(), Ok(Adjustment::By(5.0)));
        assert_eq!("-7.5%".parse(), Ok(Adjustment::By(-7.5)));
        assert!("loud".parse::<Adjustment>().is_err());
        assert!("+".parse::<Adjustment>().is_err());
        assert_eq!(Adjustment::By(10.0).apply(95.0, &r), 100.0);
        assert_eq!(Adjustment::By(-10.0).apply(5.0, &r), 0.0);
        assert_eq!(Adjustment::Set(150.0).apply(5.0, &r), 100.0);
    }
}
