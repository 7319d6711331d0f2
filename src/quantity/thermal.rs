//! Building thermal properties.

use crate::quantity::{energy::KilowattHours, temperature::Celsius};

quantity!(
    /// Energy needed to raise the temperature by one degree.
    HeatCapacity, via: f64, suffix: "kWh/°C", precision: 2
);

quantity!(
    /// Heat loss power per degree of the indoor-outdoor difference.
    Conductance, via: f64, suffix: "kW/°C", precision: 3
);

implement_div!(KilowattHours, HeatCapacity, Celsius);
implement_mul!(HeatCapacity, Celsius, KilowattHours);

impl Conductance {
    /// Exponential relaxation rate of the indoor temperature, per hour.
    pub fn relaxation_rate(self, heat_capacity: HeatCapacity) -> f64 {
        self.0 / heat_capacity.0
    }
}
