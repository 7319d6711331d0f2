//! Accumulated prices and grid forecasts, the training data of the price forecaster.

use std::{collections::BTreeMap, fs, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{
    prelude::*,
    quantity::{power::Gigawatts, price::KilowattHourPrice},
};

pub type Series<V> = BTreeMap<DateTime<Utc>, V>;

#[must_use]
#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct History {
    /// Half-hourly unit rates including VAT, keyed by the slot start.
    #[serde_as(as = "Vec<(_, _)>")]
    #[serde(default)]
    pub prices: Series<KilowattHourPrice>,

    /// Half-hour average national demand.
    #[serde_as(as = "Vec<(_, _)>")]
    #[serde(default)]
    pub demand: Series<Gigawatts>,

    /// Half-hour wind generation.
    #[serde_as(as = "Vec<(_, _)>")]
    #[serde(default)]
    pub wind: Series<Gigawatts>,
}

impl History {
    /// Read the history, a missing file is an empty history.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            warn!("history does not exist yet, starting from scratch");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).context("failed to read the history")?;
        let history: Self = toml::from_str(&text).context("failed to parse the history")?;
        info!(
            n_prices = history.prices.len(),
            n_demand = history.demand.len(),
            n_wind = history.wind.len(),
            "loaded",
        );
        Ok(history)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn write_to(&self, path: &Path) -> Result {
        info!("saving…");
        let text = toml::to_string(self).context("failed to serialize the history")?;
        fs::write(path, text).context("failed to write the history")
    }

    /// Merge the new points over the old ones.
    pub fn merge<V>(
        series: &mut Series<V>,
        points: impl IntoIterator<Item = (DateTime<Utc>, V)>,
    ) -> usize {
        let mut n_merged = 0;
        for (time, value) in points {
            series.insert(time, value);
            n_merged += 1;
        }
        n_merged
    }

    /// The latest known price slot start.
    #[must_use]
    pub fn last_price_at(&self) -> Option<DateTime<Utc>> {
        self.prices.last_key_value().map(|(time, _)| *time)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    #[test]
    fn merge_overwrites() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap();
        let mut history = History::default();
        History::merge(
            &mut history.prices,
            [(start, KilowattHourPrice(10.0)), (start + TimeDelta::minutes(30), KilowattHourPrice(11.0))],
        );
        let n_merged = History::merge(&mut history.prices, [(start, KilowattHourPrice(12.0))]);
        assert_eq!(n_merged, 1);
        assert_eq!(history.prices.len(), 2);
        assert_eq!(history.prices[&start], KilowattHourPrice(12.0));
        assert_eq!(history.last_price_at(), Some(start + TimeDelta::minutes(30)));
    }

    #[test]
    fn toml_round_trip_ok() -> Result {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap();
        let mut history = History::default();
        History::merge(&mut history.prices, [(start, KilowattHourPrice(-1.5))]);
        History::merge(&mut history.wind, [(start, Gigawatts(12.25))]);
        let text = toml::to_string(&history)?;
        let history: History = toml::from_str(&text)?;
        assert_eq!(history.prices[&start], KilowattHourPrice(-1.5));
        assert_eq!(history.wind[&start], Gigawatts(12.25));
        assert!(history.demand.is_empty());
        Ok(())
    }

    #[test]
    fn read_missing_ok() -> Result {
        let history = History::read_from(Path::new("/nonexistent/history.toml"))?;
        assert!(history.prices.is_empty());
        Ok(())
    }
}
