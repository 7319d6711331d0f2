//! National Grid ESO day-ahead forecasts.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use csv::{ReaderBuilder, StringRecord};
use itertools::Itertools;
use reqwest::Client;

use crate::{api::client, prelude::*, quantity::power::Gigawatts};

const DEMAND_URL: &str = "https://api.nationalgrideso.com/dataset/633daec6-3e70-444a-88b0-c4cef9419d40/resource/7c0411cd-2714-4bb5-a408-adb065edf34d/download/ng-demand-14da-hh.csv";
const WIND_URL: &str = "https://api.nationalgrideso.com/dataset/2f134a4e-92e5-43b8-96c3-0dd7d92fcc52/resource/93c3048e-1dab-4057-a2a9-417540583929/download/14dawindforecast.csv";

pub type Series = Vec<(DateTime<Utc>, Gigawatts)>;

pub struct Api {
    client: Client,
}

impl Api {
    pub fn new() -> Result<Self> {
        Ok(Self { client: client::try_new()? })
    }

    /// Fetch the 14-day half-hourly national demand forecast.
    #[instrument(skip_all)]
    pub async fn get_demand_forecast(&self) -> Result<Series> {
        info!("fetching demand forecast…");
        let series = parse_demand(&self.get_text(DEMAND_URL).await?)?;
        info!(len = series.len(), "fetched");
        Ok(series)
    }

    /// Fetch the 14-day half-hourly wind generation forecast.
    #[instrument(skip_all)]
    pub async fn get_wind_forecast(&self) -> Result<Series> {
        info!("fetching wind forecast…");
        let series = parse_wind(&self.get_text(WIND_URL).await?)?;
        info!(len = series.len(), "fetched");
        Ok(series)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to download `{url}`"))?
            .error_for_status()?
            .text()
            .await
            .context("failed to read the forecast")
    }
}

/// Demand readings are instantaneous, so the half-hour average is estimated as the mean of the
/// two endpoints.
fn parse_demand(text: &str) -> Result<Series> {
    let readings: Vec<(DateTime<Utc>, f64)> = records(text)?
        .iter()
        .map(|record| -> Result<(DateTime<Utc>, f64)> {
            let time = parse_time(field(record, 2)?, "%Y-%m-%dT%H:%M:%S")?;
            Ok((time, parse_megawatts(field(record, 3)?)?))
        })
        .collect::<Result<_>>()?;
    let series = readings
        .into_iter()
        .tuple_windows()
        .map(|((time, start), (_, end))| (time, Gigawatts::from_megawatts(0.5 * (start + end))))
        .collect();
    ensure_half_hourly(series)
}

fn parse_wind(text: &str) -> Result<Series> {
    let series = records(text)?
        .iter()
        .map(|record| -> Result<(DateTime<Utc>, Gigawatts)> {
            let time = parse_time(field(record, 0)?, "%Y-%m-%dT%H:%M:%SZ")?;
            Ok((time, Gigawatts::from_megawatts(parse_megawatts(field(record, 4)?)?)))
        })
        .collect::<Result<_>>()?;
    ensure_half_hourly(series)
}

fn records(text: &str) -> Result<Vec<StringRecord>> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
        .records()
        .collect::<Result<_, _>>()
        .context("malformed CSV")
}

fn field(record: &StringRecord, index: usize) -> Result<&str> {
    record.get(index).with_context(|| format!("missing column #{index} in `{record:?}`"))
}

fn parse_time(value: &str, format: &str) -> Result<DateTime<Utc>> {
    Ok(NaiveDateTime::parse_from_str(value.trim(), format)
        .with_context(|| format!("invalid timestamp: `{value}`"))?
        .and_utc())
}

fn parse_megawatts(value: &str) -> Result<f64> {
    value.trim().parse().with_context(|| format!("invalid power: `{value}`"))
}

fn ensure_half_hourly(series: Series) -> Result<Series> {
    if let Some(((time, _), _)) = series
        .iter()
        .tuple_windows()
        .find(|((lhs, _), (rhs, _))| *rhs - *lhs != TimeDelta::minutes(30))
    {
        bail!("the forecast is not half-hourly after {time}");
    }
    Ok(series)
}
