pub mod api;
pub mod config;
pub mod emissions;
pub mod mailer;
pub mod model;
pub mod recommendation;
pub mod storage;

pub use config::Config;
pub use emissions::{calculate_breakdown, calculate_total_carbon_footprint, CarbonFootprintResult};
pub use model::CalculationData;
