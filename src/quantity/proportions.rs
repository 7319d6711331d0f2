quantity!(
    /// Heating level as a percentage of the heater power.
    Percent, via: u16, suffix: "%", precision: 0
);

impl Percent {
    pub const HUNDRED: Self = Self(100);

    /// Convert the percentage into `0.0..=1.0`.
    pub fn to_proportion(self) -> f64 {
        0.01 * f64::from(self.0)
    }

    pub const fn is_off(self) -> bool {
        self.0 == 0
    }
}
