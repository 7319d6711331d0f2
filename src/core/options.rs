//! Cheapest heating for successively longer horizons.

use chrono::{DateTime, Local, TimeDelta};

use crate::{
    core::planner::Planner,
    ops::Interval,
    prelude::*,
    quantity::{currency::Pence, energy::KilowattHours, temperature::Celsius},
};

#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct HeatingOption {
    /// The comfort is kept until this time.
    pub until: DateTime<Local>,

    pub cost: Pence,
    pub energy: KilowattHours,

    /// Energy that a perfect thermostat would need till then.
    pub useful_energy: KilowattHours,
}

/// Ends every `step` from the horizon start, the last one being the horizon end.
pub fn successive_ends(horizon: Interval, step: TimeDelta) -> Vec<DateTime<Local>> {
    let mut ends = Vec::new();
    if step > TimeDelta::zero() {
        let mut end = horizon.start + step;
        while end < horizon.end {
            ends.push(end);
            end += step;
        }
    }
    if horizon.end > horizon.start {
        ends.push(horizon.end);
    }
    ends
}

/// Plan until each of the ends.
///
/// Ends without a feasible plan are skipped.
#[instrument(skip_all)]
pub fn heating_options(
    planner: &Planner<'_>,
    initial_temperature: Celsius,
    ends: &[DateTime<Local>],
) -> Vec<HeatingOption> {
    ends.iter()
        .filter_map(|until| {
            let planner = planner.until(*until);
            match planner.plan(initial_temperature) {
                Ok(plan) => Some(HeatingOption {
                    until: *until,
                    cost: plan.cost(),
                    energy: plan.energy(),
                    useful_energy: planner.useful_energy(initial_temperature),
                }),
                Err(error) => {
                    warn!(%until, "{error:#}");
                    None
                }
            }
        })
        .collect()
}
