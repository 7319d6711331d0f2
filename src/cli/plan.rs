use std::path::PathBuf;

use chrono::{DurationRound, Local, TimeDelta};
use clap::Parser;
use itertools::Itertools;

use crate::{
    api::octopus,
    cli::{heartbeat::HeartbeatArgs, octopus::TariffArgs, weather::WeatherArgs},
    config::BuildingConfig,
    core::{
        baseline::OnDemand,
        conditions::Conditions,
        options::{heating_options, successive_ends},
        planner::Planner,
        schedule::timers,
    },
    ops::{Interval, tonight},
    prelude::*,
    quantity::temperature::Celsius,
    tables::{build_options_table, build_steps_table, build_timers_table},
};

#[derive(Parser)]
pub struct PlanArgs {
    #[clap(long = "building", env = "BUILDING_PATH", default_value = "building.toml")]
    building_path: PathBuf,

    /// Current indoor temperature.
    #[clap(
        long = "initial-temperature",
        env = "INITIAL_TEMPERATURE",
        allow_negative_numbers = true
    )]
    initial_temperature: Celsius,

    /// Start at the current slot instead of 23:00 tonight.
    #[clap(long)]
    now: bool,

    /// Also plan for successively longer horizons, this much apart.
    #[clap(long, env = "OPTIONS_EVERY", default_value = "6h")]
    options_every: humantime::Duration,

    #[clap(flatten)]
    tariff: TariffArgs,

    #[clap(flatten)]
    weather: WeatherArgs,

    #[clap(flatten)]
    heartbeat: HeartbeatArgs,
}

impl PlanArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let config = BuildingConfig::read_from(&self.building_path)?;

        let now = Local::now();
        let start = if self.now {
            now.duration_trunc(TimeDelta::minutes(30))?
        } else {
            tonight(now.date_naive())?
        };
        let rates = octopus::Api::new(None)?
            .get_unit_rates(&self.tariff.tariff(), Interval::new(start, start + TimeDelta::days(2)))
            .await?;
        ensure!(!rates.is_empty(), "prices from {start} are not published yet");
        ensure!(
            rates.iter().tuple_windows().all(|(lhs, rhs)| lhs.interval.end == rhs.interval.start),
            "the published prices have gaps",
        );

        let outdoor = self.weather.outdoor().await?;
        let conditions = rates
            .iter()
            .map(|rate| Conditions {
                interval: rate.interval,
                price: rate.including_vat,
                outdoor_temperature: outdoor.at(rate.interval.midpoint()),
            })
            .collect_vec();

        let planner = Planner::builder()
            .conditions(&conditions)
            .building(&config.building)
            .comfort(&config.comfort)
            .heating_levels(&config.planner.heating_levels)
            .quantum(config.planner.quantum())
            .switch_on_penalty(config.planner.switch_on_penalty)
            .build();
        let plan = planner
            .plan(self.initial_temperature)
            .context("no heating plan keeps the comfort bounds")?;
        let baseline = OnDemand::builder()
            .conditions(&conditions)
            .building(&config.building)
            .comfort(&config.comfort)
            .heating_levels(&config.planner.heating_levels)
            .build()
            .plan(self.initial_temperature);
        if !baseline.is_feasible() {
            warn!("heating on demand does not keep the comfort bounds, the saving is overstated");
        }

        println!("{}", build_steps_table(&plan.steps));
        println!("{}", build_timers_table(&timers(&plan.steps)));
        println!("{}", plan.with_baseline(&baseline));

        let horizon = Interval::new(
            rates.first().map_or(start, |rate| rate.interval.start),
            rates.last().map_or(start, |rate| rate.interval.end),
        );
        let ends = successive_ends(horizon, TimeDelta::from_std(self.options_every.into())?);
        println!(
            "{}",
            build_options_table(&heating_options(&planner, self.initial_temperature, &ends)),
        );

        self.heartbeat.send().await;
        Ok(())
    }
}
