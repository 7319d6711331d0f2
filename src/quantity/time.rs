use chrono::TimeDelta;

quantity!(Hours, via: f64, suffix: "h", precision: 1);

impl From<TimeDelta> for Hours {
    fn from(time_delta: TimeDelta) -> Self {
        Self(time_delta.as_seconds_f64() / 3600.0)
    }
}

impl From<Hours> for TimeDelta {
    #[expect(clippy::cast_possible_truncation)]
    fn from(hours: Hours) -> Self {
        Self::milliseconds((hours.0 * 3_600_000.0).round() as i64)
    }
}
