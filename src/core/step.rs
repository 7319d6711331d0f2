use crate::{
    core::{comfort::Requirement, conditions::Conditions, thermal::Building},
    ops::Interval,
    quantity::{
        currency::Pence,
        energy::KilowattHours,
        price::KilowattHourPrice,
        proportions::Percent,
        temperature::Celsius,
    },
};

/// Single-slot heating plan step.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Step {
    pub interval: Interval,
    pub price: KilowattHourPrice,
    pub outdoor_temperature: Celsius,
    pub requirement: Requirement,
    pub heating_level: Percent,
    pub temperature_before: Celsius,
    pub temperature_after: Celsius,
    pub energy: KilowattHours,

    /// Cost of this single step.
    pub cost: Pence,
}

impl Step {
    pub fn simulate(
        building: &Building,
        conditions: &Conditions,
        requirement: Requirement,
        heating_level: Percent,
        temperature_before: Celsius,
    ) -> Self {
        let duration = conditions.interval.hours();
        let energy = building.energy(heating_level, duration);
        Self {
            interval: conditions.interval,
            price: conditions.price,
            outdoor_temperature: conditions.outdoor_temperature,
            requirement,
            heating_level,
            temperature_before,
            temperature_after: building.simulate(
                temperature_before,
                conditions.outdoor_temperature,
                heating_level,
                duration,
            ),
            energy,
            cost: energy * conditions.price,
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.requirement.is_met_by(self.temperature_after)
    }

    /// Heating must not push the temperature above the maximum, while switching off is always
    /// allowed.
    pub fn is_admissible(&self) -> bool {
        self.heating_level.is_off() || (self.temperature_after <= self.requirement.maximum)
    }
}
