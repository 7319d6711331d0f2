pub mod client;
pub mod met_office;
pub mod national_grid;
pub mod octopus;
