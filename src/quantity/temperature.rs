quantity!(Celsius, via: f64, suffix: "°C", precision: 1);

impl Celsius {
    /// Linear interpolation between two temperatures, `proportion` is expected in `0.0..=1.0`.
    pub fn lerp(self, other: Self, proportion: f64) -> Self {
        self + (other - self) * proportion
    }
}
