use std::fmt::{Debug, Formatter};

use derive_more::{From, FromStr};

use crate::quantity::temperature::Celsius;

/// Temperature step of the planner state space.
#[must_use]
#[derive(Copy, Clone, From, FromStr)]
#[from(Celsius)]
pub struct Quantum(pub Celsius);

impl Debug for Quantum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Default for Quantum {
    fn default() -> Self {
        Self(Celsius(0.1))
    }
}

/// Discrete temperature expressed in quanta above the scale floor.
#[must_use]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct TemperatureLevel(pub usize);

impl Debug for TemperatureLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Buckets the temperatures between `floor` and `ceiling` into the discrete levels.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct TemperatureScale {
    floor: Celsius,
    quantum: Quantum,
    max_level: TemperatureLevel,
}

impl TemperatureScale {
    /// Absorbs the floating point noise before rounding down.
    const EPSILON: f64 = 1e-9;

    #[expect(clippy::cast_possible_truncation)]
    #[expect(clippy::cast_sign_loss)]
    pub fn new(floor: Celsius, ceiling: Celsius, quantum: Quantum) -> Self {
        debug_assert!(floor <= ceiling);
        debug_assert!(quantum.0.0 > 0.0);
        let max_level = ((ceiling - floor) / quantum.0 - Self::EPSILON).ceil().max(0.0) as usize;
        Self { floor, quantum, max_level: TemperatureLevel(max_level) }
    }

    pub const fn max_level(&self) -> TemperatureLevel {
        self.max_level
    }

    /// Convert the temperature to the level, rounding **down**.
    ///
    /// Out-of-range temperatures are clamped.
    #[expect(clippy::cast_possible_truncation)]
    #[expect(clippy::cast_sign_loss)]
    pub fn quantize(&self, temperature: Celsius) -> TemperatureLevel {
        let level = ((temperature - self.floor) / self.quantum.0 + Self::EPSILON).floor();
        TemperatureLevel((level.max(0.0) as usize).min(self.max_level.0))
    }
}
