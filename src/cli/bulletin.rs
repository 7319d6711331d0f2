use std::{collections::BTreeMap, time::Instant};

use chrono::{Local, NaiveTime, TimeDelta};
use clap::Parser;
use itertools::Itertools;

use crate::{
    bulletin::{Bulletin, Email, Mailer},
    cli::{
        heartbeat::HeartbeatArgs,
        octopus::{AccountArgs, TariffArgs},
        smtp::SmtpArgs,
        store::{HistoryArgs, ModelArgs, merge_prices, update_grid_forecasts},
    },
    forecast::{MAX_HORIZON, forecast},
    history::History,
    ops::{Interval, local_at, tonight},
    prelude::*,
    quantity::price::KilowattHourPrice,
    usage::{Period, Spend},
};

#[derive(Parser)]
pub struct BulletinArgs {
    /// Print the email instead of sending it.
    #[clap(long)]
    dry_run: bool,

    #[clap(flatten)]
    tariff: TariffArgs,

    #[clap(flatten)]
    account: AccountArgs,

    #[clap(flatten)]
    smtp: SmtpArgs,

    #[clap(flatten)]
    history: HistoryArgs,

    #[clap(flatten)]
    model: ModelArgs,

    #[clap(flatten)]
    heartbeat: HeartbeatArgs,
}

impl BulletinArgs {
    /// Send the bulletin, or the error report when composing it fails.
    pub async fn run(self) -> Result {
        let start_instant = Instant::now();
        match self.compose(start_instant).await {
            Ok(email) => {
                self.deliver(&email).await?;
                self.heartbeat.send().await;
                Ok(())
            }
            Err(error) => {
                error!("failed to compose the bulletin: {error:#}");
                if let Err(delivery_error) = self.deliver(&Email::error(&error)).await {
                    error!("failed to report the error: {delivery_error:#}");
                }
                Err(error)
            }
        }
    }

    async fn deliver(&self, email: &Email) -> Result {
        if self.dry_run {
            println!("{email}");
            return Ok(());
        }
        let settings = self.smtp.settings().context(
            "SMTP settings are incomplete, set the host, password, sender and recipient",
        )?;
        Mailer::new(&settings)?.send(email).await
    }

    #[instrument(skip_all)]
    async fn compose(&self, start_instant: Instant) -> Result<Email> {
        let today = Local::now().date_naive();
        let tomorrow = today + TimeDelta::days(1);
        let octopus = self.account.new_client()?;
        let tariff = self.tariff.tariff();

        let upcoming = Interval::new(tonight(today)?, tonight(tomorrow)?);
        let rates = octopus.get_unit_rates(&tariff, upcoming).await?;
        ensure!(!rates.is_empty(), "prices from 23:00 tonight are not published yet");
        let prices = rates.iter().map(|rate| (rate.interval, rate.including_vat)).collect_vec();

        let periods = self.account.billing().periods(today);
        let first_date = periods.iter().map(|period| period.start).min().unwrap_or(today);
        let usage_period =
            Interval::new(local_at(first_date, NaiveTime::MIN)?, local_at(today, NaiveTime::MIN)?);
        let consumption = octopus.get_consumption(&self.account.meter(), usage_period).await?;
        let past_rates = octopus.get_unit_rates(&tariff, usage_period).await?;
        let prices_excluding_vat: BTreeMap<_, KilowattHourPrice> =
            past_rates.iter().map(|rate| (rate.interval.start, rate.excluding_vat)).collect();
        let usage = periods
            .into_iter()
            .map(|period| -> Result<(Period, Spend)> {
                let spend =
                    Spend::calculate(&consumption, &prices_excluding_vat, period.interval()?)?;
                info!(period.name, ?spend, "calculated");
                Ok((period, spend))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut history = self.history.read()?;
        merge_prices(&mut history, &past_rates);
        merge_prices(&mut history, &rates);
        let forecast = self.forecast(&mut history).await;
        self.history.write(&history)?;

        Bulletin::builder()
            .date(today)
            .usage(&usage)
            .prices(&prices)
            .forecast(forecast.as_deref())
            .elapsed(start_instant.elapsed())
            .build()
            .to_email()
    }

    /// The forecast is optional: its failure goes into the bulletin.
    async fn forecast(&self, history: &mut History) -> Result<Vec<(Interval, KilowattHourPrice)>> {
        let result = match update_grid_forecasts(history).await {
            Ok(()) => self.model.read().and_then(|model| forecast(&model, history, MAX_HORIZON)),
            Err(error) => Err(error),
        };
        if let Err(error) = &result {
            warn!("the forecast is unavailable: {error:#}");
        }
        result
    }
}
