use chrono::{DateTime, Local, NaiveTime, TimeDelta};
use serde::Deserialize;

use crate::{
    core::conditions::Conditions,
    prelude::*,
    quantity::{temperature::Celsius, time::Hours},
};

/// Indoor temperature bounds.
#[must_use]
#[derive(Clone, Debug, Deserialize)]
pub struct Comfort {
    /// Applies at all times outside the grace period.
    pub minimum: Celsius,

    /// Applies during the occupied windows instead of the minimum.
    pub target: Celsius,

    /// States above this are not explored, except when already there.
    pub maximum: Celsius,

    #[serde(default)]
    pub occupied: Vec<Occupancy>,

    /// Leading part of the plan without the lower bound.
    #[serde(default)]
    pub grace_period: Hours,
}

/// Local clock-time window `[from, until)`, may wrap midnight.
#[must_use]
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct Occupancy {
    pub from: NaiveTime,
    pub until: NaiveTime,
}

impl Occupancy {
    pub fn contains(self, time: NaiveTime) -> bool {
        if self.from <= self.until {
            (self.from <= time) && (time < self.until)
        } else {
            (time >= self.from) || (time < self.until)
        }
    }
}

/// Bounds on the temperature at a particular instant.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    /// [`None`] within the grace period.
    pub minimum: Option<Celsius>,

    pub maximum: Celsius,
}

impl Requirement {
    pub fn is_met_by(self, temperature: Celsius) -> bool {
        self.minimum.is_none_or(|minimum| temperature >= minimum)
    }
}

impl Comfort {
    pub fn validate(&self) -> Result {
        ensure!(
            self.minimum <= self.target,
            "comfort target ({}) must not be below the minimum ({})",
            self.target,
            self.minimum,
        );
        ensure!(
            self.target <= self.maximum,
            "comfort maximum ({}) must not be below the target ({})",
            self.maximum,
            self.target,
        );
        ensure!(self.grace_period.0 >= 0.0, "grace period must not be negative");
        Ok(())
    }

    /// Requirement on the temperature at the given instant of a plan starting at `plan_start`.
    pub fn requirement_at(&self, at: DateTime<Local>, plan_start: DateTime<Local>) -> Requirement {
        let grace_end = plan_start + TimeDelta::from(self.grace_period);
        let minimum = if at < grace_end {
            None
        } else if self.is_occupied_at(at.time()) {
            Some(self.target)
        } else {
            Some(self.minimum)
        };
        Requirement { minimum, maximum: self.maximum }
    }

    /// Requirements at the end of each slot.
    pub fn requirements(&self, conditions: &[Conditions]) -> Vec<Requirement> {
        let Some(plan_start) = conditions.first().map(|conditions| conditions.interval.start) else {
            return Vec::new();
        };
        conditions
            .iter()
            .map(|conditions| self.requirement_at(conditions.interval.end, plan_start))
            .collect()
    }

    fn is_occupied_at(&self, time: NaiveTime) -> bool {
        self.occupied.iter().any(|occupancy| occupancy.contains(time))
    }
}
