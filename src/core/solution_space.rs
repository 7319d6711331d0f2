use std::cmp::{Ordering, Reverse};

use crate::{
    core::temperature_level::TemperatureLevel,
    quantity::{Zero, currency::Pence, proportions::Percent, temperature::Celsius},
};

/// Planner state at a slot boundary.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StateKey {
    /// Bucket of the exact temperature.
    pub level: TemperatureLevel,

    /// Whether the heater was on in the previous slot.
    pub is_heating: bool,
}

/// Position of a solution within its boundary.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SolutionRef {
    pub key: StateKey,
    pub index: usize,
}

#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Solution {
    /// Cumulative cost since the start of the horizon – the optimization target.
    ///
    /// Includes the switch-on penalties.
    pub cost: Pence,

    /// Exact temperature in this state.
    pub temperature: Celsius,

    /// Last decision that led to this solution.
    ///
    /// The initial solution has [`None`] here.
    pub decision: Option<Decision>,
}

impl Solution {
    pub const fn initial(temperature: Celsius) -> Self {
        Self { cost: Pence::ZERO, temperature, decision: None }
    }

    /// Cheaper first, then warmer.
    pub fn cmp_rank(&self, other: &Self) -> Ordering {
        (self.cost, Reverse(self.temperature)).cmp(&(other.cost, Reverse(other.temperature)))
    }

    /// At most as expensive while at least as warm.
    fn dominates(&self, other: &Self) -> bool {
        (self.cost <= other.cost) && (self.temperature >= other.temperature)
    }
}

#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Decision {
    pub heating_level: Percent,
    pub previous: SolutionRef,
}

/// Non-dominated solutions for each `(slot boundary, state)`.
///
/// Within a state, the solutions form a Pareto front over the cost and the temperature.
pub struct SolutionSpace {
    /// Temperature dimension size.
    max_level: TemperatureLevel,

    /// Time dimension size: the number of slots plus the initial boundary.
    n_boundaries: usize,

    /// Flattened 3D array of the fronts, empty for unreachable states.
    flat_matrix: Vec<Vec<Solution>>,
}

impl SolutionSpace {
    pub fn new(n_intervals: usize, max_level: TemperatureLevel) -> Self {
        let n_boundaries = n_intervals + 1;
        let flat_matrix = vec![Vec::new(); n_boundaries * Self::n_states(max_level)];
        Self { max_level, n_boundaries, flat_matrix }
    }

    pub fn get(&self, boundary: usize, solution_ref: SolutionRef) -> Option<&Solution> {
        self.flat_matrix[self.flat_index(boundary, solution_ref.key)].get(solution_ref.index)
    }

    /// Add the solution to the front, unless a known solution dominates it.
    ///
    /// Indices within a boundary are stable once nothing is offered to it anymore.
    pub fn offer(&mut self, boundary: usize, key: StateKey, solution: Solution) {
        let flat_index = self.flat_index(boundary, key);
        let front = &mut self.flat_matrix[flat_index];
        if front.iter().any(|known| known.dominates(&solution)) {
            return;
        }
        front.retain(|known| !solution.dominates(known));
        front.push(solution);
    }

    /// Reachable solutions at the given boundary.
    pub fn solutions(&self, boundary: usize) -> impl Iterator<Item = (SolutionRef, &Solution)> {
        let n_states = Self::n_states(self.max_level);
        self.flat_matrix[boundary * n_states..(boundary + 1) * n_states]
            .iter()
            .enumerate()
            .flat_map(|(state_index, front)| {
                let key = Self::state_key(state_index);
                front
                    .iter()
                    .enumerate()
                    .map(move |(index, solution)| (SolutionRef { key, index }, solution))
            })
    }

    /// Cheapest solution at the end of the horizon.
    pub fn best_final(&self) -> Option<SolutionRef> {
        self.solutions(self.n_boundaries - 1)
            .min_by(|(_, lhs), (_, rhs)| lhs.cmp_rank(rhs))
            .map(|(solution_ref, _)| solution_ref)
    }

    /// Follow the decisions back from the final solution, returning the heating levels in time
    /// order.
    pub fn backtrack(&self, final_ref: SolutionRef) -> Option<Vec<Percent>> {
        let mut solution_ref = final_ref;
        let mut heating_levels = Vec::with_capacity(self.n_boundaries - 1);
        for boundary in (1..self.n_boundaries).rev() {
            let decision = self.get(boundary, solution_ref)?.decision?;
            heating_levels.push(decision.heating_level);
            solution_ref = decision.previous;
        }
        heating_levels.reverse();
        Some(heating_levels)
    }

    const fn n_states(max_level: TemperatureLevel) -> usize {
        2 * (max_level.0 + 1)
    }

    const fn state_key(state_index: usize) -> StateKey {
        StateKey { level: TemperatureLevel(state_index / 2), is_heating: state_index % 2 == 1 }
    }

    /// Convert the indices into the respective index in the flattened array.
    #[must_use]
    fn flat_index(&self, boundary: usize, key: StateKey) -> usize {
        debug_assert!(boundary < self.n_boundaries, "boundary is out of bounds ({boundary})");
        debug_assert!(key.level <= self.max_level);
        boundary * Self::n_states(self.max_level) + 2 * key.level.0 + usize::from(key.is_heating)
    }
}
