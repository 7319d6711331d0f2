use bon::Builder;
use serde::Deserialize;

use crate::{
    prelude::*,
    quantity::{
        Zero,
        energy::KilowattHours,
        power::Kilowatts,
        proportions::Percent,
        temperature::Celsius,
        thermal::{Conductance, HeatCapacity},
        time::Hours,
    },
};

/// Single thermal mass building model.
#[must_use]
#[derive(Copy, Clone, Debug, Builder, Deserialize)]
pub struct Building {
    pub heat_capacity: HeatCapacity,

    /// Heat loss to outdoors per degree of difference.
    pub conductance: Conductance,

    /// Heater power at the 100% level.
    pub heater_power: Kilowatts,

    /// Free heat from occupants, cooking, appliances.
    #[serde(default)]
    #[builder(default)]
    pub incidental_gain: Kilowatts,
}

impl Building {
    pub fn validate(&self) -> Result {
        ensure!(self.heat_capacity.0 > 0.0, "heat capacity must be positive");
        ensure!(self.conductance.0 >= 0.0, "conductance must not be negative");
        ensure!(self.heater_power >= Kilowatts::ZERO, "heater power must not be negative");
        ensure!(self.incidental_gain >= Kilowatts::ZERO, "incidental gain must not be negative");
        Ok(())
    }

    /// Indoor temperature after heating at the given level for the given duration.
    ///
    /// The building relaxes exponentially towards the outdoor temperature, while the heater
    /// and the incidental gains add heat at a constant rate:
    ///
    /// ```text
    /// T' = A + (T − A)·exp(−k·Δt / C) + (ℓ·P + G)·Δt / C
    /// ```
    pub fn simulate(
        &self,
        initial: Celsius,
        outdoor: Celsius,
        heating_level: Percent,
        duration: Hours,
    ) -> Celsius {
        let decay = (-self.conductance.relaxation_rate(self.heat_capacity) * duration.0).exp();
        let heat = (self.heater_power * heating_level.to_proportion() + self.incidental_gain)
            * duration;
        outdoor + (initial - outdoor) * decay + heat / self.heat_capacity
    }

    /// Energy that the heater draws from the grid.
    pub fn energy(&self, heating_level: Percent, duration: Hours) -> KilowattHours {
        self.heater_power * heating_level.to_proportion() * duration
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn building() -> Building {
        Building::builder()
            .heat_capacity(HeatCapacity(1.0))
            .conductance(Conductance(0.1))
            .heater_power(Kilowatts(8.0))
            .build()
    }

    #[test]
    fn cools_towards_outdoors() {
        let after = building().simulate(Celsius(21.0), Celsius(10.0), Percent(0), Hours(0.5));
        assert_abs_diff_eq!(after.0, 10.0 + 11.0 * (-0.05_f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn heats_at_fixed_rate() {
        let building = building();
        let off = building.simulate(Celsius(21.0), Celsius(10.0), Percent(0), Hours(0.5));
        let half = building.simulate(Celsius(21.0), Celsius(10.0), Percent(50), Hours(0.5));
        let full = building.simulate(Celsius(21.0), Celsius(10.0), Percent::HUNDRED, Hours(0.5));
        assert_abs_diff_eq!((half - off).0, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!((full - off).0, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn monotone_in_initial_temperature() {
        let building = building();
        let colder = building.simulate(Celsius(18.0), Celsius(5.0), Percent(50), Hours(0.5));
        let warmer = building.simulate(Celsius(19.0), Celsius(5.0), Percent(50), Hours(0.5));
        assert!(colder < warmer);
    }

    #[test]
    fn energy_ok() {
        assert_abs_diff_eq!(building().energy(Percent(50), Hours(0.5)).0, 2.0);
    }

    #[test]
    fn validate_rejects_zero_heat_capacity() {
        let building = Building { heat_capacity: HeatCapacity(0.0), ..building() };
        assert!(building.validate().is_err());
    }
}
