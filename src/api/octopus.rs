use chrono::{DateTime, Local, SecondsFormat, TimeDelta, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    api::client,
    ops::Interval,
    prelude::*,
    quantity::{energy::KilowattHours, price::KilowattHourPrice},
};

const BASE_URL: &str = "https://api.octopus.energy/v1";

/// Published unit rate of a half-hour slot.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct UnitRate {
    pub interval: Interval,
    pub including_vat: KilowattHourPrice,
    pub excluding_vat: KilowattHourPrice,
}

/// Electricity tariff coordinates.
#[derive(Clone, Debug)]
pub struct Tariff {
    /// Product code, for example `AGILE-FLEX-22-11-25`.
    pub product_code: String,

    /// Grid supply point group, a single letter from `A` to `P`.
    pub region: String,
}

impl Tariff {
    fn unit_rates_url(&self) -> String {
        format!(
            "{BASE_URL}/products/{product}/electricity-tariffs/E-1R-{product}-{region}/standard-unit-rates/",
            product = self.product_code,
            region = self.region,
        )
    }
}

/// Smart meter coordinates.
#[derive(Clone, Debug)]
pub struct Meter {
    pub mpan: String,
    pub serial_number: String,
}

impl Meter {
    fn consumption_url(&self) -> String {
        format!(
            "{BASE_URL}/electricity-meter-points/{}/meters/{}/consumption/",
            self.mpan, self.serial_number,
        )
    }
}

pub struct Api {
    client: Client,

    /// Needed only for the consumption.
    api_key: Option<String>,
}

impl Api {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Ok(Self { client: client::try_new()?, api_key })
    }

    /// Fetch the unit rates within the period, sorted by the slot start.
    #[instrument(skip_all, fields(product_code = %tariff.product_code, region = %tariff.region))]
    pub async fn get_unit_rates(&self, tariff: &Tariff, period: Interval) -> Result<Vec<UnitRate>> {
        info!(?period, "fetching unit rates…");
        let url = with_period(&tariff.unit_rates_url(), period)?;
        let mut rates: Vec<UnitRate> = self
            .get_paginated::<UnitRateRow>(url, false)
            .await?
            .into_iter()
            .map(UnitRate::from)
            .collect();
        rates.sort_by_key(|rate| rate.interval.start);
        rates.dedup_by_key(|rate| rate.interval.start);
        info!(n_rates = rates.len(), "fetched");
        Ok(rates)
    }

    /// Fetch the half-hourly consumption within the period, sorted by the slot start.
    #[instrument(skip_all, fields(mpan = %meter.mpan))]
    pub async fn get_consumption(
        &self,
        meter: &Meter,
        period: Interval,
    ) -> Result<Vec<(Interval, KilowattHours)>> {
        info!(?period, "fetching consumption…");
        let url = with_period(&meter.consumption_url(), period)?;
        let mut consumption: Vec<(Interval, KilowattHours)> = self
            .get_paginated::<ConsumptionRow>(url, true)
            .await?
            .into_iter()
            .map(|row| (row.interval(), KilowattHours(row.consumption)))
            .collect();
        consumption.sort_by_key(|(interval, _)| interval.start);
        consumption.dedup_by_key(|(interval, _)| interval.start);
        info!(n_readings = consumption.len(), "fetched");
        Ok(consumption)
    }

    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: Url,
        authenticate: bool,
    ) -> Result<Vec<T>> {
        let mut next = Some(url);
        let mut results = Vec::new();
        while let Some(url) = next {
            debug!(%url, "requesting…");
            let mut request = self.client.get(url);
            if authenticate {
                let api_key = self.api_key.as_deref().context("Octopus API key is not set")?;
                request = request.basic_auth(api_key, None::<&str>);
            }
            let page = request
                .send()
                .await
                .context("failed to call the Octopus API")?
                .error_for_status()
                .context("Octopus API returned an error")?
                .json::<Page<T>>()
                .await
                .context("failed to deserialize the Octopus API response")?;
            results.extend(page.results);
            next = page.next.as_deref().map(Url::parse).transpose().context("invalid next page URL")?;
        }
        Ok(results)
    }
}

fn with_period(url: &str, period: Interval) -> Result<Url> {
    let format = |time: DateTime<Local>| {
        time.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true)
    };
    Url::parse_with_params(
        url,
        &[
            ("page_size", "1500".to_string()),
            ("period_from", format(period.start)),
            ("period_to", format(period.end)),
        ],
    )
    .with_context(|| format!("invalid URL: `{url}`"))
}

#[derive(Deserialize)]
struct Page<T> {
    next: Option<String>,
    results: Vec<T>,
}

#[derive(Deserialize)]
struct UnitRateRow {
    value_exc_vat: f64,
    value_inc_vat: f64,
    valid_from: DateTime<Local>,
    valid_to: Option<DateTime<Local>>,
}

impl From<UnitRateRow> for UnitRate {
    fn from(row: UnitRateRow) -> Self {
        let valid_to = row.valid_to.unwrap_or(row.valid_from + TimeDelta::minutes(30));
        Self {
            interval: Interval::new(row.valid_from, valid_to),
            including_vat: KilowattHourPrice(row.value_inc_vat),
            excluding_vat: KilowattHourPrice(row.value_exc_vat),
        }
    }
}

#[derive(Deserialize)]
struct ConsumptionRow {
    consumption: f64,
    interval_start: DateTime<Local>,
    interval_end: Option<DateTime<Local>>,
}

impl ConsumptionRow {
    fn interval(&self) -> Interval {
        Interval::new(
            self.interval_start,
            self.interval_end.unwrap_or(self.interval_start + TimeDelta::minutes(30)),
        )
    }
}
