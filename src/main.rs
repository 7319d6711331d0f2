#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod bulletin;
mod cli;
mod config;
mod core;
mod forecast;
mod history;
mod ops;
mod prelude;
mod quantity;
mod tables;
mod usage;

use clap::{Parser, crate_version};

use crate::{cli::Args, prelude::*};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    Args::parse().command.run().await?;

    info!("done!");
    Ok(())
}
