quantity!(Kilowatts, via: f64, suffix: "kW", precision: 2);

quantity!(
    /// National grid scale power, used for the demand and wind generation forecasts.
    Gigawatts, via: f64, suffix: "GW", precision: 2
);

impl Gigawatts {
    pub const fn from_megawatts(megawatts: f64) -> Self {
        Self(megawatts / 1000.0)
    }
}
