//! Emissions estimation model
//!
//! Four pure category estimators and the aggregator that sums them. All
//! figures are kilograms of CO2-equivalent per year. Nothing here validates
//! input: NaN and infinity flow straight through to the total.

pub mod consumption;
pub mod food;
pub mod housing;
pub mod transportation;

pub use consumption::calculate_consumption_emissions;
pub use food::calculate_food_emissions;
pub use housing::calculate_housing_emissions;
pub use transportation::calculate_transportation_emissions;

use crate::model::CalculationData;
use serde::{Deserialize, Serialize};

pub const GLOBAL_AVERAGE_KG: f64 = 4000.0;
pub const US_AVERAGE_KG: f64 = 16000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonFootprintResult {
    #[serde(alias = "carbonFootprint", alias = "totalFootprint")]
    pub total: f64,
    pub housing: f64,
    pub transportation: f64,
    pub food: f64,
    pub consumption: f64,
}

impl CarbonFootprintResult {
    pub fn is_finite(&self) -> bool {
        [
            self.total,
            self.housing,
            self.transportation,
            self.food,
            self.consumption,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Category name and value pairs, in reporting order.
    pub fn categories(&self) -> [(&'static str, f64); 4] {
        [
            ("Housing", self.housing),
            ("Transportation", self.transportation),
            ("Food", self.food),
            ("Consumption", self.consumption),
        ]
    }
}

/// Sum of the four category estimators.
pub fn calculate_total_carbon_footprint(data: &CalculationData) -> f64 {
    calculate_breakdown(data).total
}

/// Runs every category estimator and keeps the sub-totals alongside the total.
pub fn calculate_breakdown(data: &CalculationData) -> CarbonFootprintResult {
    let housing = calculate_housing_emissions(&data.housing);
    let transportation = calculate_transportation_emissions(&data.transportation);
    let food = calculate_food_emissions(&data.food);
    let consumption = calculate_consumption_emissions(&data.consumption);

    CarbonFootprintResult {
        total: housing + transportation + food + consumption,
        housing,
        transportation,
        food,
        consumption,
    }
}

/// Reference footprints returned with every calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub global: f64,
    pub us: f64,
}

impl Default for Averages {
    fn default() -> Self {
        Self {
            global: GLOBAL_AVERAGE_KG,
            us: US_AVERAGE_KG,
        }
    }
}

/// A footprint expressed as a percentage of each reference average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintComparison {
    pub percent_of_global: f64,
    pub percent_of_us: f64,
}

impl FootprintComparison {
    pub fn new(total: f64) -> Self {
        let averages = Averages::default();
        Self {
            percent_of_global: total / averages.global * 100.0,
            percent_of_us: total / averages.us * 100.0,
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{:.0}% of the global average and {:.0}% of the US average",
            self.percent_of_global, self.percent_of_us
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::sample_data;

    #[test]
    fn test_total_carbon_footprint() {
        let total = calculate_total_carbon_footprint(&sample_data());
        assert!((total - 15941.75).abs() < 1e-9, "got {total}");
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let result = calculate_breakdown(&sample_data());
        let sum = result.housing + result.transportation + result.food + result.consumption;
        assert_eq!(result.total, sum);
        assert_eq!(result.consumption, 800.0);
        assert!(result.is_finite());
    }

    #[test]
    fn test_calculation_is_repeatable() {
        let data = sample_data();
        assert_eq!(calculate_breakdown(&data), calculate_breakdown(&data));
    }

    #[test]
    fn test_nan_reaches_total() {
        let mut data = sample_data();
        data.transportation.public_transit.bus_miles = f64::NAN;
        let result = calculate_breakdown(&data);
        assert!(result.total.is_nan());
        assert!(result.housing.is_finite());
        assert!(!result.is_finite());
    }

    #[test]
    fn test_infinity_reaches_total() {
        let mut data = sample_data();
        data.transportation.car.fuel_efficiency = 0.0;
        assert!(calculate_total_carbon_footprint(&data).is_infinite());
    }

    #[test]
    fn test_comparison_against_averages() {
        let comparison = FootprintComparison::new(8000.0);
        assert_eq!(comparison.percent_of_global, 200.0);
        assert_eq!(comparison.percent_of_us, 50.0);
        assert_eq!(
            comparison.describe(),
            "200% of the global average and 50% of the US average"
        );
    }

    #[test]
    fn test_result_accepts_total_alias() {
        let result: CarbonFootprintResult = serde_json::from_value(serde_json::json!({
            "carbonFootprint": 100.0,
            "housing": 10.0,
            "transportation": 20.0,
            "food": 30.0,
            "consumption": 40.0
        }))
        .unwrap();
        assert_eq!(result.total, 100.0);
    }
}
