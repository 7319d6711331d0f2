mod bulletin;
mod forecast;
mod heartbeat;
mod octopus;
mod plan;
mod prices;
mod smtp;
mod store;
mod train;
mod weather;

use clap::{Parser, Subcommand};

use crate::{
    cli::{
        bulletin::BulletinArgs,
        forecast::ForecastArgs,
        plan::PlanArgs,
        prices::PricesArgs,
        train::TrainArgs,
    },
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch tomorrow's prices, summarize the spend, forecast, and email the bulletin.
    #[clap(name = "bulletin")]
    Bulletin(Box<BulletinArgs>),

    /// Find the cheapest heating schedule that keeps the house comfortable.
    #[clap(name = "plan")]
    Plan(Box<PlanArgs>),

    /// Fit the price forecast model on the accumulated history.
    #[clap(name = "train")]
    Train(Box<TrainArgs>),

    /// Print the price forecast.
    #[clap(name = "forecast")]
    Forecast(Box<ForecastArgs>),

    /// Print the upcoming prices and the cheapest windows.
    #[clap(name = "prices")]
    Prices(Box<PricesArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Bulletin(args) => args.run().await,
            Self::Plan(args) => args.run().await,
            Self::Train(args) => args.run().await,
            Self::Forecast(args) => args.run().await,
            Self::Prices(args) => args.run().await,
        }
    }
}
