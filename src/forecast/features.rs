use std::f64::consts::TAU;

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Timelike, Utc, Weekday};

use crate::{history::History, quantity::price::KilowattHourPrice};

pub const N_FEATURES: usize = 7;

/// Model input columns, in order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "demand",
    "wind",
    "previous_day_price",
    "previous_day_mean",
    "weekend",
    "time_of_day_sin",
    "time_of_day_cos",
];

/// The previous day must be nearly complete to be representative.
const MIN_PREVIOUS_DAY_SLOTS: usize = 40;

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Features(pub [f64; N_FEATURES]);

impl Features {
    /// Build the features of the slot starting at `at`, [`None`] when any input is missing.
    pub fn at(history: &History, at: DateTime<Utc>) -> Option<Self> {
        let demand = history.demand.get(&at)?;
        let wind = history.wind.get(&at)?;
        let previous_day_price = history.prices.get(&(at - TimeDelta::days(1)))?;
        let previous_day_mean = previous_day_mean(history, at)?;
        let weekend = if matches!(at.weekday(), Weekday::Sat | Weekday::Sun) { 1.0 } else { 0.0 };
        let phase = TAU * f64::from(at.num_seconds_from_midnight()) / 86400.0;
        Some(Self([
            demand.0,
            wind.0,
            previous_day_price.0,
            previous_day_mean.0,
            weekend,
            phase.sin(),
            phase.cos(),
        ]))
    }
}

/// Mean price over the previous UTC calendar day.
fn previous_day_mean(history: &History, at: DateTime<Utc>) -> Option<KilowattHourPrice> {
    let day_start = at.date_naive().and_time(NaiveTime::MIN).and_utc();
    let prices: Vec<KilowattHourPrice> = history
        .prices
        .range(day_start - TimeDelta::days(1)..day_start)
        .map(|(_, price)| *price)
        .collect();
    if prices.len() < MIN_PREVIOUS_DAY_SLOTS {
        return None;
    }
    #[expect(clippy::cast_precision_loss)]
    let n_prices = prices.len() as f64;
    Some(prices.into_iter().sum::<KilowattHourPrice>() / n_prices)
}
