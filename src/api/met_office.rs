//! Met Office DataHub site-specific forecast.

use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_with::serde_as;

use crate::{api::client, prelude::*, quantity::temperature::Celsius};

const BASE_URL: &str = "https://data.hub.api.metoffice.gov.uk/sitespecific/v0/point";

#[derive(Copy, Clone, Debug)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

pub struct Api {
    client: Client,
    api_key: String,
}

impl Api {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self { client: client::try_new()?, api_key })
    }

    /// Fetch the hourly forecast, extended with the coarser three-hourly one.
    #[instrument(skip_all, fields(latitude = location.latitude, longitude = location.longitude))]
    pub async fn get_temperature_forecast(&self, location: Location) -> Result<TemperatureForecast> {
        info!("fetching temperature forecast…");
        let hourly = self.get_time_series::<HourlyEntry>("hourly", location).await?;
        let three_hourly = self.get_time_series::<ThreeHourlyEntry>("three-hourly", location).await?;
        let forecast = TemperatureForecast::merge(hourly, three_hourly);
        info!(len = forecast.0.len(), "fetched");
        Ok(forecast)
    }

    async fn get_time_series<T: for<'de> Deserialize<'de>>(
        &self,
        resolution: &str,
        location: Location,
    ) -> Result<Vec<T>> {
        let url = Url::parse_with_params(
            &format!("{BASE_URL}/{resolution}"),
            &[
                ("includeLocationName", "true".to_string()),
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
            ],
        )?;
        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .send()
            .await
            .context("failed to call the Met Office API")?
            .error_for_status()
            .context("Met Office API returned an error")?
            .json::<Response<T>>()
            .await
            .context("failed to deserialize the Met Office response")?;
        Ok(response
            .features
            .into_iter()
            .next()
            .context("the Met Office response has no features")?
            .properties
            .time_series)
    }
}

/// Outdoor temperatures sorted by time.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct TemperatureForecast(pub Vec<(DateTime<Utc>, Celsius)>);

impl TemperatureForecast {
    fn merge(hourly: Vec<HourlyEntry>, three_hourly: Vec<ThreeHourlyEntry>) -> Self {
        let mut points: Vec<(DateTime<Utc>, Celsius)> =
            hourly.into_iter().map(|entry| (entry.time.0, entry.screen_temperature)).collect();
        points.sort_by_key(|(time, _)| *time);
        let last_hourly = points.last().map(|(time, _)| *time);
        points.extend(
            three_hourly
                .into_iter()
                .filter(|entry| last_hourly.is_none_or(|last_hourly| entry.time.0 > last_hourly))
                .map(|entry| {
                    (entry.time.0, entry.min_screen_air_temp.lerp(entry.max_screen_air_temp, 0.5))
                }),
        );
        points.sort_by_key(|(time, _)| *time);
        Self(points)
    }

    /// Linearly interpolated temperature, [`None`] outside the forecast.
    #[must_use]
    pub fn at(&self, time: DateTime<Local>) -> Option<Celsius> {
        let time = time.with_timezone(&Utc);
        let index = self.0.partition_point(|(point_time, _)| *point_time <= time);
        if index == 0 {
            return None;
        }
        let (start_time, start) = self.0[index - 1];
        if start_time == time {
            return Some(start);
        }
        let (end_time, end) = *self.0.get(index)?;
        let proportion = (time - start_time).as_seconds_f64() / (end_time - start_time).as_seconds_f64();
        Some(start.lerp(end, proportion))
    }
}

/// Met Office timestamps lack the seconds: `2025-01-01T12:00Z`.
#[derive(Copy, Clone, Debug)]
struct Time(DateTime<Utc>);

impl FromStr for Time {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%MZ")?.and_utc()))
    }
}

#[derive(Deserialize)]
struct Response<T> {
    features: Vec<Feature<T>>,
}

#[derive(Deserialize)]
struct Feature<T> {
    properties: Properties<T>,
}

#[derive(Deserialize)]
struct Properties<T> {
    #[serde(rename = "timeSeries")]
    time_series: Vec<T>,
}

#[serde_as]
#[derive(Deserialize)]
struct HourlyEntry {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    time: Time,

    #[serde(rename = "screenTemperature")]
    screen_temperature: Celsius,
}

#[serde_as]
#[derive(Deserialize)]
struct ThreeHourlyEntry {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    time: Time,

    #[serde(rename = "maxScreenAirTemp")]
    max_screen_air_temp: Celsius,

    #[serde(rename = "minScreenAirTemp")]
    min_screen_air_temp: Celsius,
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn forecast() -> Result<TemperatureForecast> {
        let hourly: Response<HourlyEntry> = serde_json::from_str(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-0.1, 51.5, 11.0] },
                    "properties": {
                        "location": { "name": "London" },
                        "modelRunDate": "2025-01-01T10:00Z",
                        "timeSeries": [
                            { "time": "2025-01-01T11:00Z", "screenTemperature": 6.0, "feelsLikeTemperature": 3.1 },
                            { "time": "2025-01-01T12:00Z", "screenTemperature": 8.0, "feelsLikeTemperature": 5.0 }
                        ]
                    }
                }]
            }"#,
        )?;
        let three_hourly: Response<ThreeHourlyEntry> = serde_json::from_str(
            r#"{
                "features": [{
                    "properties": {
                        "timeSeries": [
                            { "time": "2025-01-01T12:00Z", "maxScreenAirTemp": 20.0, "minScreenAirTemp": 10.0 },
                            { "time": "2025-01-01T15:00Z", "maxScreenAirTemp": 7.0, "minScreenAirTemp": 3.0 }
                        ]
                    }
                }]
            }"#,
        )?;
        Ok(TemperatureForecast::merge(
            hourly.features.into_iter().next().unwrap().properties.time_series,
            three_hourly.features.into_iter().next().unwrap().properties.time_series,
        ))
    }

    #[test]
    fn merge_appends_three_hourly_tail() -> Result {
        let forecast = forecast()?;
        assert_eq!(forecast.0.len(), 3);
        assert_eq!(forecast.0[2], (Utc.with_ymd_and_hms(2025, 1, 1, 15, 0, 0).unwrap(), Celsius(5.0)));
        Ok(())
    }

    #[test]
    fn at_interpolates() -> Result {
        let forecast = forecast()?;
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 11, 0, 0).unwrap().with_timezone(&Local);
        assert_eq!(forecast.at(start), Some(Celsius(6.0)));
        assert_abs_diff_eq!(forecast.at(start + TimeDelta::minutes(30)).unwrap().0, 7.0);
        assert_abs_diff_eq!(forecast.at(start + TimeDelta::hours(2)).unwrap().0, 7.0, epsilon = 1e-9);
        assert_eq!(forecast.at(start - TimeDelta::minutes(1)), None);
        assert_eq!(forecast.at(start + TimeDelta::hours(5)), None);
        Ok(())
    }

    #[tokio::test]
    #[ignore = "makes the API request"]
    async fn get_temperature_forecast_ok() -> Result {
        let api_key = std::env::var("MET_OFFICE_API_KEY")?;
        let forecast = Api::new(api_key)?
            .get_temperature_forecast(Location { latitude: 51.5, longitude: -0.1 })
            .await?;
        assert!(!forecast.0.is_empty());
        Ok(())
    }
}
