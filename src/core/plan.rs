use std::fmt::{Display, Formatter};

use comfy_table::{Attribute, Cell, Color, Table, modifiers, presets};

use crate::{
    core::step::Step,
    quantity::{currency::Pence, energy::KilowattHours},
};

/// Heating plan: one step per slot.
#[must_use]
#[derive(Clone, Debug)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn cost(&self) -> Pence {
        self.steps.iter().map(|step| step.cost).sum()
    }

    pub fn energy(&self) -> KilowattHours {
        self.steps.iter().map(|step| step.energy).sum()
    }

    pub fn is_compliant(&self) -> bool {
        self.steps.iter().all(Step::is_compliant)
    }

    /// Every step keeps both comfort bounds.
    pub fn is_feasible(&self) -> bool {
        self.steps.iter().all(|step| step.is_admissible() && step.is_compliant())
    }

    /// Number of times the heater switches on, assuming it is off before the first step.
    pub fn n_heating_periods(&self) -> usize {
        let mut is_heating = false;
        self.steps
            .iter()
            .filter(|step| {
                let switches_on = !is_heating && !step.heating_level.is_off();
                is_heating = !step.heating_level.is_off();
                switches_on
            })
            .count()
    }

    pub fn with_baseline(&self, baseline: &Self) -> Summary {
        Summary {
            cost: self.cost(),
            energy: self.energy(),
            n_heating_periods: self.n_heating_periods(),
            baseline_cost: baseline.cost(),
            baseline_energy: baseline.energy(),
        }
    }
}

#[must_use]
pub struct Summary {
    pub cost: Pence,
    pub energy: KilowattHours,
    pub n_heating_periods: usize,

    /// Cost of heating on demand.
    pub baseline_cost: Pence,

    pub baseline_energy: KilowattHours,
}

impl Summary {
    pub fn saving(&self) -> Pence {
        self.baseline_cost - self.cost
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
            .enforce_styling()
            .set_header(vec![
                Cell::from("Saving"),
                Cell::from("Cost"),
                Cell::from("Energy"),
                Cell::from("Heating periods"),
                Cell::from("On-demand cost"),
                Cell::from("On-demand energy"),
            ])
            .add_row(vec![
                Cell::from(self.saving().pounds()).add_attribute(Attribute::Bold).fg(
                    if self.saving() >= Pence(0.0) { Color::Green } else { Color::Red },
                ),
                Cell::from(self.cost.pounds()),
                Cell::from(self.energy),
                Cell::from(self.n_heating_periods),
                Cell::from(self.baseline_cost.pounds()),
                Cell::from(self.baseline_energy),
            ]);
        write!(f, "{table}")
    }
}
