use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;

use crate::{
    api::{national_grid, octopus::UnitRate},
    forecast::Model,
    history::History,
    prelude::*,
};

#[derive(Parser)]
pub struct HistoryArgs {
    #[clap(id = "history_path", long = "history", env = "HISTORY_PATH", default_value = "history.toml")]
    path: PathBuf,
}

impl HistoryArgs {
    pub fn read(&self) -> Result<History> {
        History::read_from(&self.path)
    }

    pub fn write(&self, history: &History) -> Result {
        history.write_to(&self.path)
    }
}

#[derive(Parser)]
pub struct ModelArgs {
    #[clap(id = "model_path", long = "model", env = "FORECAST_MODEL_PATH", default_value = "forecast-model.toml")]
    path: PathBuf,
}

impl ModelArgs {
    pub fn read(&self) -> Result<Model> {
        Model::read_from(&self.path)
    }

    pub fn write(&self, model: &Model) -> Result {
        model.write_to(&self.path)
    }
}

/// Merge the published prices including VAT.
pub fn merge_prices(history: &mut History, rates: &[UnitRate]) {
    let n_merged = History::merge(
        &mut history.prices,
        rates.iter().map(|rate| (rate.interval.start.with_timezone(&Utc), rate.including_vat)),
    );
    info!(n_merged, "merged the prices");
}

/// Fetch and merge the latest grid demand and wind forecasts.
#[instrument(skip_all)]
pub async fn update_grid_forecasts(history: &mut History) -> Result {
    let api = national_grid::Api::new()?;
    let demand = api.get_demand_forecast().await?;
    let wind = api.get_wind_forecast().await?;
    let n_demand = History::merge(&mut history.demand, demand);
    let n_wind = History::merge(&mut history.wind, wind);
    info!(n_demand, n_wind, "merged the grid forecasts");
    Ok(())
}
