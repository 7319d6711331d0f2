//! Daily email with the upcoming prices, recent spend and the price forecast.

mod mailer;

use std::{
    fmt::{Display, Formatter, Write},
    time::Duration,
};

use bon::Builder;
use chrono::NaiveDate;

pub use self::mailer::{Mailer, SmtpSettings};
use crate::{
    core::window::find_cheapest_standard,
    forecast::summarize_daily,
    ops::Interval,
    prelude::*,
    quantity::price::KilowattHourPrice,
    usage::{Period, Spend},
};

const SLOTS_PER_DAY: usize = 48;

#[must_use]
pub struct Email {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<EmailAttachment>,
}

#[must_use]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: &'static str,
    pub content: Vec<u8>,
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Subject: {}", self.subject)?;
        for attachment in &self.attachments {
            writeln!(f, "Attachment: {} ({} bytes)", attachment.filename, attachment.content.len())?;
        }
        writeln!(f)?;
        write!(f, "{}", self.body)
    }
}

impl Email {
    /// Notify about the failed bulletin.
    pub fn error(error: &Error) -> Self {
        Self {
            subject: "Agile Octopus Bulletin Error".to_string(),
            body: format!("The bulletin encountered an error:\r\n\r\n\t{error:#}\r\n"),
            attachments: Vec::new(),
        }
    }
}

#[derive(Builder)]
pub struct Bulletin<'a> {
    date: NaiveDate,

    /// Spend per reporting period.
    usage: &'a [(Period, Spend)],

    /// Published prices from 23:00 tonight.
    prices: &'a [(Interval, KilowattHourPrice)],

    /// Forecast, or the reason it is unavailable.
    forecast: Result<&'a [(Interval, KilowattHourPrice)], &'a Error>,

    /// Time the calculations took.
    elapsed: Duration,
}

impl Bulletin<'_> {
    pub fn to_email(&self) -> Result<Email> {
        let mut attachments = Vec::new();
        if let Ok(forecast) = self.forecast
            && !forecast.is_empty()
        {
            attachments.push(EmailAttachment {
                filename: "price_forecast.csv".to_string(),
                content_type: "text/csv",
                content: prices_csv(self.prices.iter().chain(forecast))?,
            });
        }
        Ok(Email {
            subject: format!("Agile Octopus Bulletin ({})", self.date.format("%Y-%m-%d")),
            body: self.body(),
            attachments,
        })
    }

    fn body(&self) -> String {
        let mut body = format!("Agile Octopus Bulletin {}\n\n\n", self.date.format("%Y-%m-%d"));
        body.push_str("Consumption (excluding standing charge) as of 00:00 this morning:\n");
        body.push_str(&consumption_paragraph(self.usage));
        body.push('\n');
        body.push_str(&cheapest_windows_paragraph(self.prices));
        body.push('\n');
        body.push_str("The Agile Octopus electricity rates from 23:00 tonight are as follows:\n");
        body.push_str(&prices_list(self.prices));
        if self.prices.len() != SLOTS_PER_DAY {
            let _ = writeln!(
                body,
                "\nNote: the clocks change tonight, so there are {} half-hour slots instead of {SLOTS_PER_DAY}.",
                self.prices.len(),
            );
        }
        body.push('\n');
        body.push_str(&forecast_paragraph(self.forecast));
        let _ = write!(
            body,
            "\n\nCalculations took {:.2} seconds.\n",
            self.elapsed.as_secs_f64(),
        );
        body
    }
}

fn consumption_paragraph(usage: &[(Period, Spend)]) -> String {
    let mut paragraph = String::new();
    for (period, spend) in usage {
        let average_price = spend
            .average_price()
            .map_or_else(|| "-.--".to_string(), |price| format!("{:.2}", price.0));
        let _ = writeln!(
            paragraph,
            "{:<20}{:.3}kWh for {:.4} ({average_price}p/kWh)",
            period.name,
            spend.energy.0,
            spend.cost.pounds(),
        );
    }
    paragraph
}

fn cheapest_windows_paragraph(prices: &[(Interval, KilowattHourPrice)]) -> String {
    let mut paragraph = String::new();
    for window in find_cheapest_standard(prices) {
        let _ = writeln!(
            paragraph,
            "The cheapest {} hour window starts at {} (average {:.2}p/kWh)",
            window.interval.hours().0,
            window.interval.start.format("%H:%M"),
            window.mean_price.0,
        );
    }
    paragraph
}

fn prices_list(prices: &[(Interval, KilowattHourPrice)]) -> String {
    let mut list = String::new();
    for (interval, price) in prices {
        let _ = writeln!(
            list,
            "{}    {:>5.2}    {}",
            interval.start.format("%H:%M"),
            price.0,
            price_bar(*price),
        );
    }
    list
}

/// Logarithmic ASCII bar: `+` for positive prices, `-` for negative ones.
#[expect(clippy::cast_possible_truncation)]
#[expect(clippy::cast_sign_loss)]
fn price_bar(price: KilowattHourPrice) -> String {
    let length = 1 + (20.0 * (0.1 * price.0.abs()).ln_1p()) as usize;
    if price.0 > 0.0 {
        "+".repeat(length)
    } else if price.0 < 0.0 {
        "-".repeat(length)
    } else {
        String::new()
    }
}

fn forecast_paragraph(forecast: Result<&[(Interval, KilowattHourPrice)], &Error>) -> String {
    match forecast {
        Ok(forecast) => {
            let mut paragraph = String::from("Price forecast (min / mean / max, p/kWh):\n");
            for day in summarize_daily(forecast) {
                let _ = writeln!(
                    paragraph,
                    "{}    {:>6.2}  {:>6.2}  {:>6.2}",
                    day.date.format("%a %Y-%m-%d"),
                    day.min.0,
                    day.mean.0,
                    day.max.0,
                );
            }
            paragraph
        }
        Err(error) => format!("The price forecast is unavailable: {error:#}\n"),
    }
}

fn prices_csv<'a>(
    prices: impl IntoIterator<Item = &'a (Interval, KilowattHourPrice)>,
) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["start", "end", "price"])?;
    for (interval, price) in prices {
        writer.write_record([
            interval.start.to_rfc3339(),
            interval.end.to_rfc3339(),
            format!("{:.2}", price.0),
        ])?;
    }
    writer.into_inner().context("failed to write the CSV")
}
