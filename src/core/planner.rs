use std::time::Instant;

use bon::{Builder, bon};
use chrono::{DateTime, Local};
use derive_more::{Display, Error};
use itertools::Itertools;

use crate::{
    core::{
        comfort::{Comfort, Requirement},
        conditions::Conditions,
        plan::Plan,
        solution_space::{Decision, Solution, SolutionSpace, StateKey},
        step::Step,
        temperature_level::{Quantum, TemperatureScale},
        thermal::Building,
    },
    prelude::*,
    quantity::{
        Zero,
        currency::Pence,
        energy::KilowattHours,
        proportions::Percent,
        temperature::Celsius,
    },
};

/// Comfort requirements cannot be met even when heating at full power.
#[derive(Debug, Display, Error)]
#[display(
    "comfort cannot be maintained: {required} is required by {}, but at most {achievable} is reachable",
    at.format("%a %H:%M")
)]
pub struct Infeasible {
    pub at: DateTime<Local>,
    pub required: Celsius,
    pub achievable: Celsius,
}

#[derive(Builder, Clone, Copy)]
pub struct Planner<'a> {
    conditions: &'a [Conditions],
    building: &'a Building,
    comfort: &'a Comfort,

    /// Allowed heating levels, `0%` being off.
    heating_levels: &'a [Percent],

    /// Width of the temperature buckets.
    #[builder(default)]
    quantum: Quantum,

    /// Extra cost of every switch-on, so that a new heating period must save at least this much.
    #[builder(default)]
    switch_on_penalty: Pence,
}

#[bon]
impl Planner<'_> {
    /// Find the cheapest heating plan that keeps the comfort requirements.
    ///
    /// Works forwards from the initial temperature. The paths carry their exact temperatures, and
    /// at each slot boundary a path is dropped only when another one in the same temperature
    /// bucket and heater state is at most as expensive and at least as warm. The buckets merely
    /// bound the front sizes.
    ///
    /// Equal costs prefer the warmer path, which makes flat prices defer the heat.
    #[instrument(skip_all)]
    pub fn plan(&self, initial_temperature: Celsius) -> Result<Plan, Infeasible> {
        let start_instant = Instant::now();

        let heating_levels = self.heating_levels.iter().copied().sorted().dedup().collect_vec();
        let requirements = self.comfort.requirements(self.conditions);
        let scale = self.scale(initial_temperature);
        info!(
            ?self.quantum,
            ?self.switch_on_penalty,
            max_level = ?scale.max_level(),
            n_intervals = self.conditions.len(),
            "planning…",
        );

        let mut solutions = SolutionSpace::new(self.conditions.len(), scale.max_level());
        solutions.offer(
            0,
            StateKey { level: scale.quantize(initial_temperature), is_heating: false },
            Solution::initial(initial_temperature),
        );

        // Going forwards:
        for (interval_index, (conditions, requirement)) in
            self.conditions.iter().zip(&requirements).enumerate()
        {
            self.optimize_step()
                .solutions(&mut solutions)
                .scale(&scale)
                .heating_levels(&heating_levels)
                .interval_index(interval_index)
                .conditions(conditions)
                .requirement(*requirement)
                .call();
        }

        let Some(schedule) =
            solutions.best_final().and_then(|final_ref| solutions.backtrack(final_ref))
        else {
            let infeasible = self.diagnose(initial_temperature, &requirements, &heating_levels);
            warn!(?infeasible.at, ?infeasible.required, ?infeasible.achievable, "infeasible");
            return Err(infeasible);
        };
        let plan = self.replay(initial_temperature, &requirements, &schedule);
        info!(
            elapsed = ?start_instant.elapsed(),
            cost = ?plan.cost(),
            n_heating_periods = plan.n_heating_periods(),
            "planned",
        );
        Ok(plan)
    }

    /// Same planner with the horizon cut at the given time.
    pub fn until(&self, end: DateTime<Local>) -> Self {
        let n_intervals =
            self.conditions.iter().take_while(|conditions| conditions.interval.end <= end).count();
        Self { conditions: &self.conditions[..n_intervals], ..*self }
    }

    /// Energy that a perfect thermostat with an unlimited heater would need to keep the comfort
    /// requirements: just enough heat at the end of each slot to meet the minimum.
    pub fn useful_energy(&self, initial_temperature: Celsius) -> KilowattHours {
        let mut temperature = initial_temperature;
        self.conditions
            .iter()
            .zip(self.comfort.requirements(self.conditions))
            .map(|(conditions, requirement)| {
                let free = self.building.simulate(
                    temperature,
                    conditions.outdoor_temperature,
                    Percent(0),
                    conditions.interval.hours(),
                );
                match requirement.minimum {
                    Some(minimum) if free < minimum => {
                        temperature = minimum;
                        self.building.heat_capacity * (minimum - free)
                    }
                    _ => {
                        temperature = free;
                        KilowattHours::ZERO
                    }
                }
            })
            .sum()
    }

    /// The lowest bucket is the coldest of the initial and outdoor temperatures, because heating
    /// never cools the building. The highest is the warmer of the initial temperature and the
    /// comfort maximum, warmer temperatures share the top bucket.
    fn scale(&self, initial_temperature: Celsius) -> TemperatureScale {
        let floor = self
            .conditions
            .iter()
            .map(|conditions| conditions.outdoor_temperature)
            .chain([initial_temperature])
            .min()
            .unwrap_or(initial_temperature);
        let ceiling = initial_temperature.max(self.comfort.maximum).max(floor);
        TemperatureScale::new(floor, ceiling, self.quantum)
    }

    /// Extend every solution at the slot start with every heating level that keeps both comfort
    /// bounds.
    #[builder]
    fn optimize_step(
        &self,
        solutions: &mut SolutionSpace,
        scale: &TemperatureScale,
        heating_levels: &[Percent],
        interval_index: usize,
        conditions: &Conditions,
        requirement: Requirement,
    ) {
        let solutions_before = solutions
            .solutions(interval_index)
            .map(|(solution_ref, solution)| (solution_ref, *solution))
            .collect_vec();
        for (previous, solution) in solutions_before {
            for heating_level in heating_levels {
                let step = Step::simulate(
                    self.building,
                    conditions,
                    requirement,
                    *heating_level,
                    solution.temperature,
                );
                if !step.is_admissible() || !step.is_compliant() {
                    continue;
                }
                let is_heating = !heating_level.is_off();
                let penalty = if is_heating && !previous.key.is_heating {
                    self.switch_on_penalty
                } else {
                    Pence::ZERO
                };
                solutions.offer(
                    interval_index + 1,
                    StateKey { level: scale.quantize(step.temperature_after), is_heating },
                    Solution {
                        cost: solution.cost + step.cost + penalty,
                        temperature: step.temperature_after,
                        decision: Some(Decision { heating_level: *heating_level, previous }),
                    },
                );
            }
        }
    }

    /// Simulate the chosen schedule from the exact initial temperature.
    ///
    /// Repeats the very same arithmetic as the search, so the steps match the found solution.
    fn replay(
        &self,
        initial_temperature: Celsius,
        requirements: &[Requirement],
        schedule: &[Percent],
    ) -> Plan {
        let mut temperature = initial_temperature;
        let steps = self
            .conditions
            .iter()
            .zip(requirements)
            .zip(schedule)
            .map(|((conditions, requirement), heating_level)| {
                let step = Step::simulate(
                    self.building,
                    conditions,
                    *requirement,
                    *heating_level,
                    temperature,
                );
                temperature = step.temperature_after;
                step
            })
            .collect();
        Plan { steps }
    }

    /// Heat as much as allowed from the start, and find the first slot that still misses its
    /// requirement.
    ///
    /// When only the maximum is to blame, the tightest slot is reported.
    fn diagnose(
        &self,
        initial_temperature: Celsius,
        requirements: &[Requirement],
        heating_levels: &[Percent],
    ) -> Infeasible {
        let mut temperature = initial_temperature;
        let steps = self
            .conditions
            .iter()
            .zip(requirements)
            .filter_map(|(conditions, requirement)| {
                let candidates = heating_levels
                    .iter()
                    .map(|heating_level| {
                        Step::simulate(
                            self.building,
                            conditions,
                            *requirement,
                            *heating_level,
                            temperature,
                        )
                    })
                    .collect_vec();
                let step = candidates
                    .iter()
                    .rev()
                    .find(|step| step.is_admissible())
                    .or_else(|| candidates.first())
                    .copied()?;
                temperature = step.temperature_after;
                Some(step)
            })
            .collect_vec();
        steps
            .iter()
            .find(|step| !step.is_compliant())
            .or_else(|| {
                steps
                    .iter()
                    .filter(|step| step.requirement.minimum.is_some())
                    .min_by_key(|step| {
                        step.temperature_after - step.requirement.minimum.unwrap_or_default()
                    })
            })
            .map_or_else(
                || Infeasible {
                    at: self.conditions.last().map_or_else(Local::now, |it| it.interval.end),
                    required: self.comfort.minimum,
                    achievable: temperature,
                },
                |step| Infeasible {
                    at: step.interval.end,
                    required: step.requirement.minimum.unwrap_or(self.comfort.minimum),
                    achievable: step.temperature_after,
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;

    use approx::assert_abs_diff_eq;
    use chrono::{NaiveTime, TimeDelta, TimeZone};

    use super::*;
    use crate::{
        core::{baseline::OnDemand, comfort::Occupancy},
        ops::Interval,
        quantity::{
            power::Kilowatts,
            price::KilowattHourPrice,
            thermal::{Conductance, HeatCapacity},
            time::Hours,
        },
    };

    const LEVELS: [Percent; 2] = [Percent(0), Percent(100)];
    const MODULATING_LEVELS: [Percent; 3] = [Percent(0), Percent(50), Percent(100)];

    fn conditions_at(prices: &[f64], outdoor_temperature: Celsius) -> Vec<Conditions> {
        let start = Local.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap();
        (0..)
            .zip(prices)
            .map(|(index, price)| Conditions {
                interval: Interval::new(
                    start + TimeDelta::minutes(30 * index),
                    start + TimeDelta::minutes(30 * (index + 1)),
                ),
                price: KilowattHourPrice(*price),
                outdoor_temperature,
            })
            .collect()
    }

    fn conditions(prices: &[f64]) -> Vec<Conditions> {
        conditions_at(prices, Celsius(10.0))
    }

    fn building() -> Building {
        Building::builder()
            .heat_capacity(HeatCapacity(1.0))
            .conductance(Conductance(0.1))
            .heater_power(Kilowatts(8.0))
            .build()
    }

    fn comfort() -> Comfort {
        Comfort {
            minimum: Celsius(20.0),
            target: Celsius(20.0),
            maximum: Celsius(25.0),
            occupied: Vec::new(),
            grace_period: Hours(0.0),
        }
    }

    /// Same as the sample `building.toml`.
    fn sample_building() -> Building {
        Building {
            heat_capacity: HeatCapacity(12.0),
            conductance: Conductance(0.25),
            heater_power: Kilowatts(3.0),
            incidental_gain: Kilowatts(0.2),
        }
    }

    fn sample_comfort() -> Comfort {
        Comfort {
            minimum: Celsius(16.0),
            target: Celsius(20.0),
            maximum: Celsius(23.0),
            occupied: Vec::new(),
            grace_period: Hours(0.0),
        }
    }

    fn levels(plan: &Plan) -> Vec<Percent> {
        plan.steps.iter().map(|step| step.heating_level).collect()
    }

    fn plan_with(
        conditions: &[Conditions],
        building: &Building,
        comfort: &Comfort,
        heating_levels: &[Percent],
        initial_temperature: Celsius,
    ) -> Result<Plan, Infeasible> {
        Planner::builder()
            .conditions(conditions)
            .building(building)
            .comfort(comfort)
            .heating_levels(heating_levels)
            .build()
            .plan(initial_temperature)
    }

    fn baseline_with(
        conditions: &[Conditions],
        building: &Building,
        comfort: &Comfort,
        heating_levels: &[Percent],
        initial_temperature: Celsius,
    ) -> Plan {
        OnDemand::builder()
            .conditions(conditions)
            .building(building)
            .comfort(comfort)
            .heating_levels(heating_levels)
            .build()
            .plan(initial_temperature)
    }

    fn plan(
        conditions: &[Conditions],
        building: &Building,
        comfort: &Comfort,
    ) -> Result<Plan, Infeasible> {
        plan_with(conditions, building, comfort, &LEVELS, Celsius(21.0))
    }

    fn baseline(conditions: &[Conditions], building: &Building, comfort: &Comfort) -> Plan {
        baseline_with(conditions, building, comfort, &LEVELS, Celsius(21.0))
    }

    #[test]
    fn flat_prices_reproduce_baseline() -> Result {
        let (conditions, building, comfort) = (conditions(&[10.0; 4]), building(), comfort());
        let plan = plan(&conditions, &building, &comfort)?;
        let baseline = baseline(&conditions, &building, &comfort);
        assert_eq!(levels(&plan), levels(&baseline));
        assert_eq!(levels(&plan), [Percent(0), Percent(100), Percent(0), Percent(0)]);
        assert_abs_diff_eq!(plan.cost().0, 40.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn preheats_in_cheap_slot() -> Result {
        let (conditions, building, comfort) =
            (conditions(&[1.0, 100.0, 100.0, 100.0]), building(), comfort());
        let plan = plan(&conditions, &building, &comfort)?;
        assert_eq!(levels(&plan), [Percent(100), Percent(0), Percent(0), Percent(0)]);
        assert_abs_diff_eq!(plan.cost().0, 4.0, epsilon = 1e-9);

        let baseline = baseline(&conditions, &building, &comfort);
        assert_abs_diff_eq!(baseline.cost().0, 400.0, epsilon = 1e-9);
        assert!(plan.with_baseline(&baseline).saving() > Pence(0.0));
        Ok(())
    }

    #[test]
    fn long_flat_horizon_matches_on_demand() -> Result {
        let conditions = conditions_at(&[20.0; 96], Celsius(5.0));
        let (building, comfort) = (sample_building(), sample_comfort());

        let plan = plan_with(&conditions, &building, &comfort, &LEVELS, Celsius(20.0))?;
        let baseline = baseline_with(&conditions, &building, &comfort, &LEVELS, Celsius(20.0));
        assert!(baseline.is_feasible());
        assert_eq!(levels(&plan), levels(&baseline));
        assert_abs_diff_eq!(plan.cost().0, baseline.cost().0, epsilon = 1e-9);

        let plan = plan_with(&conditions, &building, &comfort, &MODULATING_LEVELS, Celsius(20.0))?;
        let baseline =
            baseline_with(&conditions, &building, &comfort, &MODULATING_LEVELS, Celsius(20.0));
        assert!(baseline.is_feasible());
        assert!(plan.cost() <= baseline.cost() + Pence(1e-9));
        assert!(plan.is_feasible());
        assert!(plan.steps.iter().all(|step| {
            step.heating_level.is_off() || step.temperature_after <= comfort.maximum
        }));
        Ok(())
    }

    #[test]
    fn never_worse_than_on_demand() -> Result {
        let buildings = [
            Building {
                heat_capacity: HeatCapacity(8.0),
                conductance: Conductance(0.15),
                heater_power: Kilowatts(2.0),
                incidental_gain: Kilowatts(0.0),
            },
            sample_building(),
            Building {
                heat_capacity: HeatCapacity(15.0),
                conductance: Conductance(0.3),
                heater_power: Kilowatts(4.0),
                incidental_gain: Kilowatts(0.1),
            },
        ];
        let comfort = sample_comfort();
        let mut n_checked = 0;

        for building in &buildings {
            for n_intervals in [48_u32, 96] {
                let flat = vec![20.0; n_intervals as usize];
                let sine = (0..n_intervals)
                    .map(|index| 20.0 + 15.0 * (TAU * f64::from(index) / 48.0).sin())
                    .collect_vec();
                let cheap_night = (0..n_intervals)
                    .map(|index| if index % 48 < 14 { 7.5 } else { 28.0 })
                    .collect_vec();

                for (prices, is_flat) in [(&flat, true), (&sine, false), (&cheap_night, false)] {
                    for outdoor_temperature in [Celsius(5.0), Celsius(10.0)] {
                        let conditions = conditions_at(prices, outdoor_temperature);
                        let mut costs = Vec::new();

                        for heating_levels in [&LEVELS[..], &MODULATING_LEVELS[..]] {
                            let baseline = baseline_with(
                                &conditions,
                                building,
                                &comfort,
                                heating_levels,
                                Celsius(18.0),
                            );
                            if !baseline.is_feasible() {
                                continue;
                            }
                            let plan = plan_with(
                                &conditions,
                                building,
                                &comfort,
                                heating_levels,
                                Celsius(18.0),
                            )?;
                            assert!(plan.is_feasible());
                            assert!(plan.cost() <= baseline.cost() + Pence(1e-9));
                            if is_flat && heating_levels.len() == 2 {
                                assert_eq!(levels(&plan), levels(&baseline));
                            }
                            costs.push(plan.cost());
                            n_checked += 1;
                        }

                        // More levels can only help:
                        if let [on_off, modulating] = costs[..] {
                            assert!(modulating <= on_off + Pence(1e-9));
                        }
                    }
                }
            }
        }

        assert!(n_checked >= 24);
        Ok(())
    }

    #[test]
    fn preheats_before_occupancy() -> Result {
        let prices = (0..48).map(|index| if index < 14 { 7.5 } else { 28.0 }).collect_vec();
        let conditions = conditions_at(&prices, Celsius(10.0));
        let building = sample_building();
        let comfort = Comfort {
            target: Celsius(18.0),
            occupied: vec![Occupancy {
                from: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                until: NaiveTime::from_hms_opt(22, 30, 0).unwrap(),
            }],
            grace_period: Hours(1.0),
            ..sample_comfort()
        };

        let baseline =
            baseline_with(&conditions, &building, &comfort, &MODULATING_LEVELS, Celsius(18.0));
        assert!(!baseline.is_feasible());

        let plan = plan_with(&conditions, &building, &comfort, &MODULATING_LEVELS, Celsius(18.0))?;
        assert!(plan.is_feasible());
        assert_eq!(plan.steps[35].interval.end.time(), NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(plan.steps[35].requirement.minimum, Some(Celsius(18.0)));
        Ok(())
    }

    #[test]
    fn switch_on_penalty_merges_heating_periods() -> Result {
        let conditions = conditions_at(&[20.0; 48], Celsius(10.0));
        let (building, comfort) = (sample_building(), sample_comfort());
        let plan = plan_with(&conditions, &building, &comfort, &LEVELS, Celsius(16.5))?;
        let merged = Planner::builder()
            .conditions(&conditions)
            .building(&building)
            .comfort(&comfort)
            .heating_levels(&LEVELS)
            .switch_on_penalty(Pence(5.0))
            .build()
            .plan(Celsius(16.5))?;
        assert!(merged.is_feasible());
        assert!(merged.n_heating_periods() < plan.n_heating_periods());
        assert_eq!(merged.n_heating_periods(), 2);

        // Same energy, only regrouped:
        assert_abs_diff_eq!(plan.cost().0, 540.0, epsilon = 1e-9);
        assert_abs_diff_eq!(merged.cost().0, 540.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn until_cuts_horizon() -> Result {
        let (conditions, building, comfort) =
            (conditions(&[1.0, 100.0, 100.0, 100.0]), building(), comfort());
        let planner = Planner::builder()
            .conditions(&conditions)
            .building(&building)
            .comfort(&comfort)
            .heating_levels(&LEVELS)
            .build();
        let plan = planner.until(conditions[1].interval.end).plan(Celsius(21.0))?;
        assert_eq!(plan.steps.len(), 2);
        assert!(planner.until(conditions[0].interval.start).plan(Celsius(21.0))?.steps.is_empty());
        Ok(())
    }

    #[test]
    fn reports_infeasible() {
        let conditions = conditions(&[10.0; 4]);
        let building =
            Building { conductance: Conductance(0.2), heater_power: Kilowatts(1.0), ..building() };
        let comfort = comfort();
        let infeasible = Planner::builder()
            .conditions(&conditions)
            .building(&building)
            .comfort(&comfort)
            .heating_levels(&LEVELS)
            .build()
            .plan(Celsius(20.0))
            .unwrap_err();
        assert_eq!(infeasible.at, conditions[0].interval.end);
        assert_eq!(infeasible.required, Celsius(20.0));
        assert_abs_diff_eq!(
            infeasible.achievable.0,
            10.0 + 10.0 * (-0.1_f64).exp() + 0.5,
            epsilon = 1e-9,
        );
        assert!(infeasible.to_string().starts_with("comfort cannot be maintained: 20.0 °C"));
    }

    #[test]
    fn grace_period_allows_cold_start() -> Result {
        let conditions = conditions(&[10.0; 4]);
        let building = building();
        let comfort = Comfort { grace_period: Hours(1.0), ..comfort() };
        let plan = Planner::builder()
            .conditions(&conditions)
            .building(&building)
            .comfort(&comfort)
            .heating_levels(&LEVELS)
            .build()
            .plan(Celsius(15.0))?;
        assert!(plan.is_compliant());
        assert!(plan.steps[0].requirement.minimum.is_none());
        assert!(plan.steps[2].temperature_after >= Celsius(20.0));
        Ok(())
    }

    #[test]
    fn trace_never_violates_minimum() -> Result {
        let prices = [23.1, 7.4, 35.0, 12.2, 4.9, 28.3, 19.0, 2.5, 31.7, 15.6, 9.8, 26.4];
        let conditions = conditions(&prices);
        let building = Building {
            heat_capacity: HeatCapacity(2.5),
            conductance: Conductance(0.15),
            heater_power: Kilowatts(6.0),
            incidental_gain: Kilowatts(0.2),
        };
        let comfort = Comfort {
            occupied: vec![Occupancy {
                from: NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
                until: NaiveTime::from_hms_opt(3, 0, 0).unwrap(),
            }],
            minimum: Celsius(18.0),
            target: Celsius(21.0),
            ..comfort()
        };
        let plan = Planner::builder()
            .conditions(&conditions)
            .building(&building)
            .comfort(&comfort)
            .heating_levels(&[Percent(100), Percent(0), Percent(50)])
            .build()
            .plan(Celsius(19.0))?;
        assert_eq!(plan.steps.len(), prices.len());
        assert!(plan.is_compliant());
        assert!(plan.steps[3].temperature_after >= Celsius(21.0));
        Ok(())
    }

    #[test]
    fn empty_horizon_ok() -> Result {
        let plan = plan(&[], &building(), &comfort())?;
        assert!(plan.steps.is_empty());
        Ok(())
    }
}
