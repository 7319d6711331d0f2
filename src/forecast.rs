//! Price forecast from the grid demand and wind generation forecasts.

mod features;
mod model;

use chrono::{Local, NaiveDate, TimeDelta};
use itertools::Itertools;

pub use self::model::Model;
use self::features::Features;
use crate::{
    history::History,
    ops::Interval,
    prelude::*,
    quantity::{Zero, price::KilowattHourPrice},
};

pub const MAX_HORIZON: TimeDelta = TimeDelta::days(7);

const SLOT: TimeDelta = TimeDelta::minutes(30);

/// Predict the prices slot by slot after the last known price.
///
/// Predictions are fed back as the previous-day prices, so the forecast extends as long as
/// the grid forecasts do, but no further than the horizon.
#[instrument(skip_all)]
pub fn forecast(
    model: &Model,
    history: &History,
    horizon: TimeDelta,
) -> Result<Vec<(Interval, KilowattHourPrice)>> {
    let last_price_at = history.last_price_at().context("no known prices to forecast from")?;
    let until = last_price_at + horizon.min(MAX_HORIZON);
    info!(%last_price_at, %until, "forecasting…");

    let mut history = history.clone();
    let mut forecast = Vec::new();
    let mut at = last_price_at + SLOT;
    while at <= until {
        let Some(features) = Features::at(&history, at) else {
            debug!(%at, "features are not available");
            break;
        };
        let price = model.predict(&features);
        history.prices.insert(at, price);
        let start = at.with_timezone(&Local);
        forecast.push((Interval::new(start, start + SLOT), price));
        at += SLOT;
    }

    ensure!(!forecast.is_empty(), "no grid forecasts after {last_price_at}, fetch them first");
    info!(len = forecast.len(), "forecasted");
    Ok(forecast)
}

/// Daily price range of a forecast.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub min: KilowattHourPrice,
    pub mean: KilowattHourPrice,
    pub max: KilowattHourPrice,
}

/// Summarize the prices per local date.
pub fn summarize_daily(prices: &[(Interval, KilowattHourPrice)]) -> Vec<DailySummary> {
    prices
        .iter()
        .chunk_by(|(interval, _)| interval.start.date_naive())
        .into_iter()
        .map(|(date, group)| {
            let prices = group.map(|(_, price)| *price).collect_vec();
            #[expect(clippy::cast_precision_loss)]
            let n_prices = prices.len() as f64;
            DailySummary {
                date,
                min: prices.iter().copied().min().unwrap_or(KilowattHourPrice::ZERO),
                mean: prices.iter().copied().sum::<KilowattHourPrice>() / n_prices,
                max: prices.iter().copied().max().unwrap_or(KilowattHourPrice::ZERO),
            }
        })
        .collect()
}
