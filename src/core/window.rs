use std::cmp::Ordering;

use chrono::TimeDelta;

use crate::{
    ops::Interval,
    quantity::{Zero, price::KilowattHourPrice},
};

/// Contiguous run of slots.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Window {
    pub interval: Interval,
    pub mean_price: KilowattHourPrice,
}

/// Window durations of the daily report, in half-hours.
const STANDARD_HALF_HOURS: [i32; 8] = [1, 2, 3, 4, 5, 6, 8, 12];

/// Cheapest windows of the standard durations from half an hour to six hours.
///
/// Durations longer than the available prices are skipped.
pub fn find_cheapest_standard(prices: &[(Interval, KilowattHourPrice)]) -> Vec<Window> {
    STANDARD_HALF_HOURS
        .into_iter()
        .filter_map(|half_hours| find_cheapest(prices, TimeDelta::minutes(30) * half_hours))
        .collect()
}

/// Find the cheapest gapless window of exactly the given duration.
///
/// Ties prefer the later window.
pub fn find_cheapest(
    prices: &[(Interval, KilowattHourPrice)],
    duration: TimeDelta,
) -> Option<Window> {
    (0..prices.len())
        .filter_map(|start_index| window_at(&prices[start_index..], duration))
        .fold(None, |best: Option<Window>, window| match best {
            Some(best) if best.mean_price < window.mean_price => Some(best),
            _ => Some(window),
        })
}

fn window_at(prices: &[(Interval, KilowattHourPrice)], duration: TimeDelta) -> Option<Window> {
    let start = prices.first()?.0.start;
    let mut end = start;
    let mut total_price = KilowattHourPrice::ZERO;
    let mut n_slots = 0_u32;
    for (interval, price) in prices {
        if interval.start != end {
            return None;
        }
        end = interval.end;
        total_price += *price;
        n_slots += 1;
        match (end - start).cmp(&duration) {
            Ordering::Less => {}
            Ordering::Equal => {
                return Some(Window {
                    interval: Interval::new(start, end),
                    mean_price: total_price / f64::from(n_slots),
                });
            }
            Ordering::Greater => return None,
        }
    }
    None
}
