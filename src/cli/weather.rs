use chrono::{DateTime, Local};
use clap::Parser;

use crate::{
    api::met_office::{self, Location, TemperatureForecast},
    prelude::*,
    quantity::temperature::Celsius,
};

#[derive(Parser)]
pub struct WeatherArgs {
    /// Met Office DataHub site-specific forecast API key.
    #[clap(long = "met-office-api-key", env = "MET_OFFICE_API_KEY")]
    api_key: Option<String>,

    #[clap(long, env = "LATITUDE", default_value = "51.5", allow_negative_numbers = true)]
    latitude: f64,

    #[clap(long, env = "LONGITUDE", default_value = "-0.12", allow_negative_numbers = true)]
    longitude: f64,

    /// Used without the API key and beyond the forecast.
    #[clap(
        long = "outdoor-temperature",
        env = "OUTDOOR_TEMPERATURE",
        default_value = "5",
        allow_negative_numbers = true
    )]
    fallback: Celsius,
}

/// Outdoor temperature source.
pub struct Outdoor {
    forecast: Option<TemperatureForecast>,
    fallback: Celsius,
}

impl Outdoor {
    pub fn at(&self, time: DateTime<Local>) -> Celsius {
        self.forecast.as_ref().and_then(|forecast| forecast.at(time)).unwrap_or(self.fallback)
    }
}

impl WeatherArgs {
    pub async fn outdoor(&self) -> Result<Outdoor> {
        let forecast = match &self.api_key {
            Some(api_key) => Some(
                met_office::Api::new(api_key.clone())?
                    .get_temperature_forecast(Location {
                        latitude: self.latitude,
                        longitude: self.longitude,
                    })
                    .await?,
            ),
            None => {
                warn!(%self.fallback, "no Met Office API key, assuming a constant outdoor temperature");
                None
            }
        };
        Ok(Outdoor { forecast, fallback: self.fallback })
    }
}
