use std::fmt::{Debug, Formatter};

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeDelta};

use crate::{prelude::*, quantity::time::Hours};

/// Local time on the date, the earlier one when the clocks go back.
pub fn local_at(date: NaiveDate, time: NaiveTime) -> Result<DateTime<Local>> {
    date.and_time(time)
        .and_local_timezone(Local)
        .earliest()
        .with_context(|| format!("no local {time} on {date}"))
}

/// 23:00 on the date, when the next day's prices start.
pub fn tonight(date: NaiveDate) -> Result<DateTime<Local>> {
    local_at(date, NaiveTime::MIN + TimeDelta::hours(23))
}

/// Half-open time interval `[start, end)`.
#[must_use]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Interval {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Interval {
    pub const fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn duration(self) -> TimeDelta {
        self.end - self.start
    }

    #[must_use]
    pub fn hours(self) -> Hours {
        Hours::from(self.duration())
    }

    #[must_use]
    pub fn contains(self, time: DateTime<Local>) -> bool {
        (self.start <= time) && (time < self.end)
    }

    /// Middle of the interval, used to sample continuous forecasts.
    #[must_use]
    pub fn midpoint(self) -> DateTime<Local> {
        self.start + self.duration() / 2
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn contains_is_half_open() {
        let start = Local.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap();
        let interval = Interval::new(start, start + TimeDelta::minutes(30));
        assert!(interval.contains(start));
        assert!(interval.contains(start + TimeDelta::minutes(29)));
        assert!(!interval.contains(start + TimeDelta::minutes(30)));
        assert_eq!(interval.hours(), Hours(0.5));
        assert_eq!(interval.midpoint(), start + TimeDelta::minutes(15));
    }

    #[test]
    fn local_at_ok() -> Result {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let time = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        assert_eq!(local_at(date, time)?, Local.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap());
        assert_eq!(tonight(date)?, local_at(date, time)?);
        Ok(())
    }
}
