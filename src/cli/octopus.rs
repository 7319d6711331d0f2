use chrono::NaiveDate;
use clap::Parser;

use crate::{
    api::octopus::{self, Meter, Tariff},
    prelude::*,
    usage::Billing,
};

#[derive(Parser)]
pub struct TariffArgs {
    #[clap(long = "product-code", env = "OCTOPUS_PRODUCT_CODE", default_value = "AGILE-FLEX-22-11-25")]
    product_code: String,

    /// Grid supply point group letter.
    #[clap(long = "region", env = "OCTOPUS_REGION", default_value = "A")]
    region: String,
}

impl TariffArgs {
    pub fn tariff(&self) -> Tariff {
        Tariff { product_code: self.product_code.clone(), region: self.region.clone() }
    }
}

#[derive(Parser)]
pub struct AccountArgs {
    #[clap(long = "octopus-api-key", env = "OCTOPUS_API_KEY")]
    api_key: String,

    /// Meter point administration number.
    #[clap(long = "mpan", env = "OCTOPUS_MPAN")]
    mpan: String,

    #[clap(long = "meter-serial-number", env = "OCTOPUS_METER_SERIAL_NUMBER")]
    serial_number: String,

    /// Day of the month the bill is issued on.
    #[clap(long = "bill-day", env = "OCTOPUS_BILL_DAY", default_value = "1")]
    bill_day: u32,

    /// Date the tariff started, for example `2024-03-15`.
    #[clap(long = "join-date", env = "OCTOPUS_JOIN_DATE")]
    join_date: NaiveDate,
}

impl AccountArgs {
    pub fn new_client(&self) -> Result<octopus::Api> {
        octopus::Api::new(Some(self.api_key.clone()))
    }

    pub fn meter(&self) -> Meter {
        Meter { mpan: self.mpan.clone(), serial_number: self.serial_number.clone() }
    }

    pub const fn billing(&self) -> Billing {
        Billing { bill_day: self.bill_day, join_date: self.join_date }
    }
}
