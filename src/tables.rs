use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{options::HeatingOption, schedule::Timer, step::Step, window::Window},
    forecast::{DailySummary, Model},
    ops::Interval,
    quantity::{Zero, currency::Pence, energy::KilowattHours, price::KilowattHourPrice},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn mean_price(prices: impl ExactSizeIterator<Item = KilowattHourPrice>) -> KilowattHourPrice {
    #[expect(clippy::cast_precision_loss)]
    let n_prices = prices.len() as f64;
    if n_prices == 0.0 {
        KilowattHourPrice::ZERO
    } else {
        prices.sum::<KilowattHourPrice>() / n_prices
    }
}

fn price_color(price: KilowattHourPrice, mean_price: KilowattHourPrice) -> Color {
    if price < KilowattHourPrice::ZERO {
        Color::Cyan
    } else if price >= mean_price {
        Color::Red
    } else {
        Color::Green
    }
}

pub fn build_steps_table(steps: &[Step]) -> Table {
    let mean_price = mean_price(steps.iter().map(|step| step.price));

    let mut table = new_table();
    table.set_header(vec![
        "Date", "Start", "End", "Price", "Outdoor", "Minimum", "Level", "Before", "After", "Energy",
        "Cost",
    ]);
    for step in steps {
        table.add_row(vec![
            Cell::new(step.interval.start.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(step.interval.start.format("%H:%M")),
            Cell::new(step.interval.end.format("%H:%M")).add_attribute(Attribute::Dim),
            Cell::new(step.price)
                .set_alignment(CellAlignment::Right)
                .fg(price_color(step.price, mean_price)),
            Cell::new(step.outdoor_temperature)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            match step.requirement.minimum {
                Some(minimum) => Cell::new(minimum).set_alignment(CellAlignment::Right),
                None => Cell::new("grace").add_attribute(Attribute::Dim),
            },
            Cell::new(step.heating_level).set_alignment(CellAlignment::Right).fg(
                if step.heating_level.is_off() { Color::DarkGrey } else { Color::DarkYellow },
            ),
            Cell::new(step.temperature_before)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(step.temperature_after).set_alignment(CellAlignment::Right).fg(
                if step.is_compliant() { Color::Reset } else { Color::Red },
            ),
            Cell::new(step.energy).set_alignment(CellAlignment::Right),
            Cell::new(step.cost).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_timers_table(timers: &[Timer]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Timer"]);
    for timer in timers {
        table.add_row(vec![
            Cell::new(timer.interval.start.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(timer).add_attribute(Attribute::Bold),
        ]);
    }
    table
}

pub fn build_options_table(options: &[HeatingOption]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Until",
        "Cost",
        "Marginal cost",
        "Energy",
        "Marginal energy",
        "Useful energy",
        "Marginal useful",
    ]);
    let (mut cost, mut energy, mut useful_energy) =
        (Pence::ZERO, KilowattHours::ZERO, KilowattHours::ZERO);
    for option in options {
        table.add_row(vec![
            Cell::new(option.until.format("%a %H:%M")).add_attribute(Attribute::Bold),
            Cell::new(option.cost.pounds()).set_alignment(CellAlignment::Right),
            Cell::new((option.cost - cost).pounds())
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(option.energy).set_alignment(CellAlignment::Right),
            Cell::new(option.energy - energy)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(option.useful_energy).set_alignment(CellAlignment::Right),
            Cell::new(option.useful_energy - useful_energy)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
        ]);
        (cost, energy, useful_energy) = (option.cost, option.energy, option.useful_energy);
    }
    table
}

pub fn build_prices_table(prices: &[(Interval, KilowattHourPrice)]) -> Table {
    let mean_price = mean_price(prices.iter().map(|(_, price)| *price));

    let mut table = new_table();
    table.set_header(vec!["Date", "Start", "End", "Price"]);
    for (interval, price) in prices {
        table.add_row(vec![
            Cell::new(interval.start.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(interval.start.format("%H:%M")),
            Cell::new(interval.end.format("%H:%M")).add_attribute(Attribute::Dim),
            Cell::new(price)
                .set_alignment(CellAlignment::Right)
                .fg(price_color(*price, mean_price)),
        ]);
    }
    table
}

pub fn build_windows_table(windows: &[Window]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Duration", "Start", "End", "Mean price"]);
    for window in windows {
        table.add_row(vec![
            Cell::new(format!("{:.1} h", window.interval.hours().0))
                .set_alignment(CellAlignment::Right),
            Cell::new(window.interval.start.format("%H:%M")).add_attribute(Attribute::Bold),
            Cell::new(window.interval.end.format("%H:%M")).add_attribute(Attribute::Dim),
            Cell::new(window.mean_price).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_daily_forecast_table(summaries: &[DailySummary]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Minimum", "Mean", "Maximum"]);
    for summary in summaries {
        table.add_row(vec![
            Cell::new(summary.date.format("%a %b %d")),
            Cell::new(summary.min).set_alignment(CellAlignment::Right).fg(Color::Green),
            Cell::new(summary.mean).set_alignment(CellAlignment::Right),
            Cell::new(summary.max).set_alignment(CellAlignment::Right).fg(Color::Red),
        ]);
    }
    table
}

pub fn build_model_table(model: &Model) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Feature", "Coefficient"]);
    for (feature, coefficient) in model.features.iter().zip(&model.coefficients) {
        table.add_row(vec![
            Cell::new(feature),
            Cell::new(format!("{coefficient:+.4}")).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("intercept").add_attribute(Attribute::Dim),
        Cell::new(format!("{:+.4}", model.intercept)).set_alignment(CellAlignment::Right),
    ]);
    table
}
