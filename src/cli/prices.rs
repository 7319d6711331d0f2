use chrono::{DurationRound, Local, TimeDelta};
use clap::Parser;
use itertools::Itertools;

use crate::{
    api::octopus,
    cli::octopus::TariffArgs,
    core::window::find_cheapest_standard,
    ops::Interval,
    prelude::*,
    tables::{build_prices_table, build_windows_table},
};

#[derive(Parser)]
pub struct PricesArgs {
    #[clap(flatten)]
    tariff: TariffArgs,
}

impl PricesArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let now = Local::now().duration_trunc(TimeDelta::minutes(30))?;
        let prices = octopus::Api::new(None)?
            .get_unit_rates(&self.tariff.tariff(), Interval::new(now, now + TimeDelta::days(2)))
            .await?
            .into_iter()
            .map(|rate| (rate.interval, rate.including_vat))
            .collect_vec();
        ensure!(!prices.is_empty(), "no prices are published from {now}");

        println!("{}", build_prices_table(&prices));
        println!("{}", build_windows_table(&find_cheapest_standard(&prices)));
        Ok(())
    }
}
