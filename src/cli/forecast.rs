use chrono::TimeDelta;
use clap::Parser;

use crate::{
    cli::store::{HistoryArgs, ModelArgs, update_grid_forecasts},
    forecast::{forecast, summarize_daily},
    prelude::*,
    tables::{build_daily_forecast_table, build_prices_table},
};

#[derive(Parser)]
pub struct ForecastArgs {
    /// How far after the last known price to forecast, at most a week.
    #[clap(long, env = "FORECAST_HORIZON", default_value = "7d")]
    horizon: humantime::Duration,

    /// Fetch the latest grid forecasts first.
    #[clap(long)]
    update: bool,

    /// Print every half-hour, not only the daily summary.
    #[clap(long)]
    verbose: bool,

    #[clap(flatten)]
    history: HistoryArgs,

    #[clap(flatten)]
    model: ModelArgs,
}

impl ForecastArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let model = self.model.read()?;
        let mut history = self.history.read()?;
        if self.update {
            update_grid_forecasts(&mut history).await?;
            self.history.write(&history)?;
        }

        let prices = forecast(&model, &history, TimeDelta::from_std(self.horizon.into())?)?;
        if self.verbose {
            println!("{}", build_prices_table(&prices));
        }
        println!("{}", build_daily_forecast_table(&summarize_daily(&prices)));
        Ok(())
    }
}
