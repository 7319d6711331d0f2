use crate::quantity::{currency::Pence, power::Kilowatts, price::KilowattHourPrice, time::Hours};

quantity!(KilowattHours, via: f64, suffix: "kWh", precision: 3);

implement_mul!(Kilowatts, Hours, KilowattHours);
implement_mul!(KilowattHours, KilowattHourPrice, Pence);
implement_div!(KilowattHours, Hours, Kilowatts);
