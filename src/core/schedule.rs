use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::{core::step::Step, ops::Interval, quantity::proportions::Percent};

/// Manual timer setting: heat at the level within the interval.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timer {
    pub interval: Interval,
    pub heating_level: Percent,
}

impl Display for Timer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}–{} @ {}",
            self.interval.start.format("%H:%M"),
            self.interval.end.format("%H:%M"),
            self.heating_level,
        )
    }
}

/// Group consecutive heating steps of the same level into timers.
pub fn timers(steps: &[Step]) -> Vec<Timer> {
    steps
        .iter()
        .map(|step| Timer { interval: step.interval, heating_level: step.heating_level })
        .filter(|timer| !timer.heating_level.is_off())
        .coalesce(|lhs, rhs| {
            let is_adjacent = lhs.interval.end == rhs.interval.start;
            if is_adjacent && (lhs.heating_level == rhs.heating_level) {
                Ok(Timer {
                    interval: Interval::new(lhs.interval.start, rhs.interval.end),
                    heating_level: lhs.heating_level,
                })
            } else {
                Err((lhs, rhs))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeDelta, TimeZone};

    use super::*;
    use crate::{
        core::{comfort::Requirement, conditions::Conditions, thermal::Building},
        quantity::{
            power::Kilowatts,
            price::KilowattHourPrice,
            temperature::Celsius,
            thermal::{Conductance, HeatCapacity},
        },
    };

    #[test]
    fn timers_ok() {
        let building = Building::builder()
            .heat_capacity(HeatCapacity(1.0))
            .conductance(Conductance(0.1))
            .heater_power(Kilowatts(2.0))
            .build();
        let requirement = Requirement { minimum: None, maximum: Celsius(30.0) };
        let start = Local.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap();
        let steps: Vec<Step> = [0, 100, 100, 0, 50, 100]
            .into_iter()
            .enumerate()
            .map(|(index, heating_level)| {
                let index = i64::try_from(index).unwrap();
                let conditions = Conditions {
                    interval: Interval::new(
                        start + TimeDelta::minutes(30 * index),
                        start + TimeDelta::minutes(30 * (index + 1)),
                    ),
                    price: KilowattHourPrice(10.0),
                    outdoor_temperature: Celsius(5.0),
                };
                Step::simulate(
                    &building,
                    &conditions,
                    requirement,
                    Percent(heating_level),
                    Celsius(20.0),
                )
            })
            .collect();
        let timers = timers(&steps);
        assert_eq!(timers.len(), 3);
        assert_eq!(timers[0].to_string(), "23:30–00:30 @ 100 %");
        assert_eq!(timers[1].to_string(), "01:00–01:30 @ 50 %");
        assert_eq!(timers[2].to_string(), "01:30–02:00 @ 100 %");
    }
}
