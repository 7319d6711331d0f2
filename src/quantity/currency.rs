use std::fmt::{Display, Formatter};

use crate::quantity::{energy::KilowattHours, price::KilowattHourPrice};

quantity!(Pence, via: f64, suffix: "p", precision: 2);

implement_div!(Pence, KilowattHours, KilowattHourPrice);

impl Pence {
    pub const fn pounds(self) -> Pounds {
        Pounds(self)
    }
}

/// Display adapter for the amounts that are better read in pounds.
pub struct Pounds(Pence);

impl Display for Pounds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match f.precision() {
            Some(precision) => write!(f, "£{:.*}", precision, self.0.0 / 100.0),
            None => write!(f, "£{:.2}", self.0.0 / 100.0),
        }
    }
}
