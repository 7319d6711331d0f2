use bon::Builder;

use crate::{
    core::{comfort::Comfort, conditions::Conditions, plan::Plan, step::Step, thermal::Building},
    quantity::{proportions::Percent, temperature::Celsius},
};

/// Heat only when needed: at each slot, the lowest level that keeps the requirement.
///
/// Used as the reference point for the planner savings.
#[derive(Builder)]
pub struct OnDemand<'a> {
    conditions: &'a [Conditions],
    building: &'a Building,
    comfort: &'a Comfort,

    /// Allowed heating levels in ascending order.
    heating_levels: &'a [Percent],
}

impl OnDemand<'_> {
    pub fn plan(self, initial_temperature: Celsius) -> Plan {
        let requirements = self.comfort.requirements(self.conditions);
        let mut temperature = initial_temperature;
        let steps = self
            .conditions
            .iter()
            .zip(requirements)
            .filter_map(|(conditions, requirement)| {
                let candidates: Vec<Step> = self
                    .heating_levels
                    .iter()
                    .map(|heating_level| {
                        Step::simulate(
                            self.building,
                            conditions,
                            requirement,
                            *heating_level,
                            temperature,
                        )
                    })
                    .collect();
                let step = candidates
                    .iter()
                    .find(|step| step.is_admissible() && step.is_compliant())
                    .or_else(|| candidates.iter().rev().find(|step| step.is_admissible()))
                    .or_else(|| candidates.first())
                    .copied()?;
                temperature = step.temperature_after;
                Some(step)
            })
            .collect();
        Plan { steps }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeDelta, TimeZone};

    use super::*;
    use crate::{
        ops::Interval,
        quantity::{
            power::Kilowatts,
            price::KilowattHourPrice,
            thermal::{Conductance, HeatCapacity},
            time::Hours,
        },
    };

    #[test]
    fn heats_only_when_needed() {
        let start = Local.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap();
        let conditions: Vec<Conditions> = (0..4)
            .map(|index| Conditions {
                interval: Interval::new(
                    start + TimeDelta::minutes(30 * index),
                    start + TimeDelta::minutes(30 * (index + 1)),
                ),
                price: KilowattHourPrice(10.0),
                outdoor_temperature: Celsius(10.0),
            })
            .collect();
        let building = Building::builder()
            .heat_capacity(HeatCapacity(1.0))
            .conductance(Conductance(0.1))
            .heater_power(Kilowatts(8.0))
            .build();
        let comfort = Comfort {
            minimum: Celsius(20.0),
            target: Celsius(20.0),
            maximum: Celsius(25.0),
            occupied: Vec::new(),
            grace_period: Hours(0.0),
        };
        let plan = OnDemand::builder()
            .conditions(&conditions)
            .building(&building)
            .comfort(&comfort)
            .heating_levels(&[Percent(0), Percent(100)])
            .build()
            .plan(Celsius(21.0));
        let levels: Vec<Percent> = plan.steps.iter().map(|step| step.heating_level).collect();
        assert_eq!(levels, [Percent(0), Percent(100), Percent(0), Percent(0)]);
        assert!(plan.is_compliant());
    }
}
