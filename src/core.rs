pub mod baseline;
pub mod comfort;
pub mod conditions;
pub mod options;
pub mod plan;
pub mod planner;
pub mod schedule;
mod solution_space;
pub mod step;
pub mod temperature_level;
pub mod thermal;
pub mod window;
