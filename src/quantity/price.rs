quantity!(
    /// Unit rate in pence per kilowatt-hour.
    KilowattHourPrice, via: f64, suffix: "p/kWh", precision: 2
);
