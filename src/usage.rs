//! Consumption and spend over the recent billing periods.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeDelta};

use crate::{
    ops::{Interval, local_at},
    prelude::*,
    quantity::{currency::Pence, energy::KilowattHours, price::KilowattHourPrice},
};

const VAT: f64 = 1.05;

/// Named reporting period, ending at local midnight this morning.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Period {
    pub name: &'static str,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Billing configuration.
#[derive(Copy, Clone, Debug)]
pub struct Billing {
    /// Day of month on which a new bill starts.
    pub bill_day: u32,

    /// Date the tariff started.
    pub join_date: NaiveDate,
}

impl Billing {
    /// Reporting periods for the bulletin sent on `today`; each start is clamped to the join date.
    pub fn periods(self, today: NaiveDate) -> Vec<Period> {
        let yesterday = today - TimeDelta::days(1);
        let monday = today
            - TimeDelta::days(1 + i64::from((today.weekday().num_days_from_monday() + 6) % 7));
        let bill_start = self.last_bill_start(today);
        let january_bill_start = day_in_month(bill_start.year(), 1, self.bill_day);
        [
            ("Yesterday", yesterday),
            ("Since Monday", monday),
            ("Since last bill", bill_start),
            ("Since January bill", january_bill_start),
            ("All time", self.join_date),
        ]
        .into_iter()
        .map(|(name, start)| Period { name, start: start.max(self.join_date), end: today })
        .collect()
    }

    /// Start of the current bill, excluding today.
    fn last_bill_start(self, today: NaiveDate) -> NaiveDate {
        if today.day() > self.bill_day {
            day_in_month(today.year(), today.month(), self.bill_day)
        } else {
            let last_month = today.with_day(1).unwrap_or(today) - TimeDelta::days(1);
            day_in_month(last_month.year(), last_month.month(), self.bill_day)
        }
    }
}

/// The day in the month, clamped to the month length.
fn day_in_month(year: i32, month: u32, day: u32) -> NaiveDate {
    (1..=day.max(1))
        .rev()
        .find_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .unwrap_or_default()
}

impl Period {
    /// Local time interval of the period.
    pub fn interval(self) -> Result<Interval> {
        Ok(Interval::new(local_midnight(self.start)?, local_midnight(self.end)?))
    }
}

fn local_midnight(date: NaiveDate) -> Result<DateTime<Local>> {
    local_at(date, NaiveTime::MIN)
}

/// Energy used and its cost.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Spend {
    pub energy: KilowattHours,

    /// Cost including VAT.
    pub cost: Pence,
}

impl Spend {
    /// Reproduce the supplier rounding: consumption and price are rounded to 2 decimals, their
    /// product is rounded to 2 decimals, and VAT is applied to the total.
    ///
    /// Prices must exclude VAT.
    pub fn calculate(
        consumption: &[(Interval, KilowattHours)],
        prices_excluding_vat: &BTreeMap<DateTime<Local>, KilowattHourPrice>,
        period: Interval,
    ) -> Result<Self> {
        let mut spend = Self::default();
        let mut cost = 0.0;
        let consumption =
            consumption.iter().filter(|(interval, _)| period.contains(interval.start));
        for (interval, energy) in consumption {
            let price = prices_excluding_vat
                .get(&interval.start)
                .with_context(|| format!("no price for the consumption at {}", interval.start))?;
            spend.energy += *energy;
            cost += round_to_cents(round_to_cents(energy.0) * round_to_cents(price.0));
        }
        spend.cost = Pence(VAT * cost);
        Ok(spend)
    }

    /// Average price, [`None`] when no energy has been used.
    #[must_use]
    pub fn average_price(&self) -> Option<KilowattHourPrice> {
        (self.energy.0 != 0.0).then(|| self.cost / self.energy)
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn billing() -> Billing {
        Billing { bill_day: 15, join_date: date(2024, 6, 10) }
    }

    #[test]
    fn periods_ok() {
        // Thursday:
        let periods = billing().periods(date(2025, 3, 20));
        let starts: Vec<NaiveDate> = periods.iter().map(|period| period.start).collect();
        assert_eq!(
            starts,
            [
                date(2025, 3, 19),
                date(2025, 3, 17),
                date(2025, 3, 15),
                date(2025, 1, 15),
                date(2024, 6, 10),
            ],
        );
        assert!(periods.iter().all(|period| period.end == date(2025, 3, 20)));
    }

    #[test]
    fn since_monday_on_monday_is_a_week() {
        let periods = billing().periods(date(2025, 3, 17));
        assert_eq!(periods[1].start, date(2025, 3, 10));
    }

    #[test]
    fn bill_day_itself_starts_from_last_month() {
        let periods = billing().periods(date(2025, 3, 15));
        assert_eq!(periods[2].start, date(2025, 2, 15));

        let periods = billing().periods(date(2025, 1, 10));
        assert_eq!(periods[2].start, date(2024, 12, 15));
        assert_eq!(periods[3].start, date(2024, 6, 10));
    }

    #[test]
    fn clamped_to_join_date() {
        let billing = Billing { bill_day: 1, join_date: date(2025, 3, 19) };
        let periods = billing.periods(date(2025, 3, 20));
        assert_eq!(periods[1].start, date(2025, 3, 19));
        assert_eq!(periods[3].start, date(2025, 3, 19));
    }

    #[test]
    fn bill_day_clamped_to_month_length() {
        let billing = Billing { bill_day: 31, join_date: date(2020, 1, 1) };
        let periods = billing.periods(date(2025, 3, 20));
        assert_eq!(periods[2].start, date(2025, 2, 28));
    }

    #[test]
    fn spend_rounding_ok() -> Result {
        let start = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let slot = |index: i32| {
            Interval::new(
                start + TimeDelta::minutes(30) * index,
                start + TimeDelta::minutes(30) * (index + 1),
            )
        };
        let consumption = [(slot(0), KilowattHours(0.126)), (slot(1), KilowattHours(1.004))];
        let prices = BTreeMap::from([
            (slot(0).start, KilowattHourPrice(20.004)),
            (slot(1).start, KilowattHourPrice(-2.5)),
        ]);
        let period = Interval::new(start, start + TimeDelta::days(1));
        let spend = Spend::calculate(&consumption, &prices, period)?;
        assert_abs_diff_eq!(spend.energy.0, 1.13, epsilon = 1e-9);
        // 0.13 × 20.00 = 2.60, 1.00 × −2.50 = −2.50:
        assert_abs_diff_eq!(spend.cost.0, 1.05 * 0.10, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn spend_ignores_outside_period() -> Result {
        let start = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let interval = Interval::new(start - TimeDelta::minutes(30), start);
        let spend = Spend::calculate(
            &[(interval, KilowattHours(1.0))],
            &BTreeMap::new(),
            Interval::new(start, start + TimeDelta::days(1)),
        )?;
        assert_eq!(spend, Spend::default());
        assert_eq!(spend.average_price(), None);
        Ok(())
    }

    #[test]
    fn spend_without_price_fails() {
        let start = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let interval = Interval::new(start, start + TimeDelta::minutes(30));
        let result = Spend::calculate(
            &[(interval, KilowattHours(1.0))],
            &BTreeMap::new(),
            Interval::new(start, start + TimeDelta::days(1)),
        );
        assert!(result.is_err());
    }
}
