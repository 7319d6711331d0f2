use chrono::{DurationRound, Local, TimeDelta};
use clap::Parser;

use crate::{
    api::octopus,
    cli::{
        heartbeat::HeartbeatArgs,
        octopus::TariffArgs,
        store::{HistoryArgs, ModelArgs, merge_prices, update_grid_forecasts},
    },
    forecast::Model,
    ops::Interval,
    prelude::*,
    tables::build_model_table,
};

#[derive(Parser)]
pub struct TrainArgs {
    /// Fetch the prices over this period before training, for example `90d`.
    #[clap(long = "backfill", env = "BACKFILL")]
    backfill: Option<humantime::Duration>,

    /// Fetch the latest grid forecasts before training.
    #[clap(long)]
    update: bool,

    #[clap(flatten)]
    tariff: TariffArgs,

    #[clap(flatten)]
    history: HistoryArgs,

    #[clap(flatten)]
    model: ModelArgs,

    #[clap(flatten)]
    heartbeat: HeartbeatArgs,
}

impl TrainArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let mut history = self.history.read()?;

        if let Some(backfill) = self.backfill {
            let now = Local::now().duration_trunc(TimeDelta::minutes(30))?;
            let since = now - TimeDelta::from_std(backfill.into())?;
            let rates = octopus::Api::new(None)?
                .get_unit_rates(&self.tariff.tariff(), Interval::new(since, now + TimeDelta::days(2)))
                .await?;
            merge_prices(&mut history, &rates);
        }
        if self.update {
            update_grid_forecasts(&mut history).await?;
        }
        if self.backfill.is_some() || self.update {
            self.history.write(&history)?;
        }

        let model = Model::train(&history)?;
        self.model.write(&model)?;
        println!("{}", build_model_table(&model));
        info!(model.n_samples, model.mean_absolute_error, "trained");

        self.heartbeat.send().await;
        Ok(())
    }
}
