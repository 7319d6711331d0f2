use crate::{
    ops::Interval,
    quantity::{price::KilowattHourPrice, temperature::Celsius},
};

/// Known inputs of a single slot.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Conditions {
    pub interval: Interval,
    pub price: KilowattHourPrice,
    pub outdoor_temperature: Celsius,
}
