//! Building file: thermal parameters, comfort bounds and planner settings.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    core::{comfort::Comfort, temperature_level::Quantum, thermal::Building},
    prelude::*,
    quantity::{Zero, currency::Pence, proportions::Percent, temperature::Celsius},
};

#[must_use]
#[derive(Clone, Debug, Deserialize)]
pub struct BuildingConfig {
    pub building: Building,
    pub comfort: Comfort,

    #[serde(default)]
    pub planner: PlannerConfig,
}

#[must_use]
#[derive(Clone, Debug, Deserialize)]
pub struct PlannerConfig {
    /// Heater settings to choose from, `0` being off.
    #[serde(default = "PlannerConfig::default_heating_levels")]
    pub heating_levels: Vec<Percent>,

    /// Temperature resolution of the search.
    #[serde(default = "PlannerConfig::default_quantum")]
    pub quantum: Celsius,

    /// Added to the cost of every switch-on.
    #[serde(default = "PlannerConfig::default_switch_on_penalty")]
    pub switch_on_penalty: Pence,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            heating_levels: Self::default_heating_levels(),
            quantum: Self::default_quantum(),
            switch_on_penalty: Self::default_switch_on_penalty(),
        }
    }
}

impl PlannerConfig {
    fn default_heating_levels() -> Vec<Percent> {
        vec![Percent(0), Percent::HUNDRED]
    }

    fn default_quantum() -> Celsius {
        Quantum::default().0
    }

    const fn default_switch_on_penalty() -> Pence {
        Pence(5.0)
    }

    pub fn quantum(&self) -> Quantum {
        Quantum(self.quantum)
    }
}

impl BuildingConfig {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).context("failed to read the building file")?;
        let config = Self::from_toml(&text)?;
        info!(?config.building, "loaded");
        Ok(config)
    }

    fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("failed to parse the building file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result {
        self.building.validate().context("invalid building")?;
        self.comfort.validate().context("invalid comfort")?;
        ensure!(!self.planner.heating_levels.is_empty(), "at least one heating level is required");
        ensure!(
            self.planner.heating_levels.iter().all(|level| *level <= Percent::HUNDRED),
            "heating levels must not exceed 100%",
        );
        ensure!(self.planner.quantum.0 > 0.0, "planner quantum must be positive");
        ensure!(
            self.planner.switch_on_penalty >= Pence::ZERO,
            "switch-on penalty must not be negative",
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::{power::Kilowatts, time::Hours};

    #[test]
    fn sample_ok() -> Result {
        let config = BuildingConfig::from_toml(include_str!("../building.toml"))?;
        assert_eq!(config.building.heater_power, Kilowatts(3.0));
        assert_eq!(config.comfort.grace_period, Hours(1.0));
        assert_eq!(config.comfort.occupied.len(), 2);
        assert_eq!(config.planner.heating_levels, [Percent(0), Percent(50), Percent::HUNDRED]);
        assert_eq!(config.planner.switch_on_penalty, Pence(5.0));
        Ok(())
    }

    #[test]
    fn planner_defaults_ok() -> Result {
        let config = BuildingConfig::from_toml(
            r#"
            [building]
            heat_capacity = 10.0
            conductance = 0.2
            heater_power = 2.0

            [comfort]
            minimum = 16.0
            target = 20.0
            maximum = 23.0
            "#,
        )?;
        assert_eq!(config.planner.heating_levels, [Percent(0), Percent::HUNDRED]);
        assert_eq!(config.planner.quantum, Celsius(0.1));
        assert_eq!(config.planner.switch_on_penalty, Pence(5.0));
        Ok(())
    }

    #[test]
    fn negative_switch_on_penalty_fails() {
        let result = BuildingConfig::from_toml(
            r#"
            [building]
            heat_capacity = 10.0
            conductance = 0.2
            heater_power = 2.0

            [comfort]
            minimum = 16.0
            target = 20.0
            maximum = 23.0

            [planner]
            switch_on_penalty = -1.0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn invalid_comfort_fails() {
        let result = BuildingConfig::from_toml(
            r#"
            [building]
            heat_capacity = 10.0
            conductance = 0.2
            heater_power = 2.0

            [comfort]
            minimum = 21.0
            target = 20.0
            maximum = 23.0
            "#,
        );
        assert!(result.is_err());
    }
}
