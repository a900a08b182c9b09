use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric fields absent from a payload read as NaN so the estimators see
/// exactly what the caller sent. `CalculationData::validate` rejects them.
fn missing() -> f64 {
    f64::NAN
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationData {
    pub housing: HousingInput,
    pub transportation: TransportationInput,
    pub food: FoodInput,
    pub consumption: ConsumptionInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingInput {
    /// Dwelling type, e.g. "apartment". Not used by the estimator yet.
    #[serde(rename = "type", default)]
    pub dwelling_type: String,
    /// Occupant count. Not used by the estimator yet.
    #[serde(rename = "size", default)]
    pub occupants: Option<u32>,
    pub energy: EnergyUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyUsage {
    /// kWh per year
    #[serde(default = "missing")]
    pub electricity: f64,
    /// therms per year
    #[serde(default = "missing")]
    pub natural_gas: f64,
    /// gallons per year
    #[serde(default = "missing")]
    pub heating_oil: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportationInput {
    pub car: CarUsage,
    pub public_transit: PublicTransitUsage,
    pub flights: FlightCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarUsage {
    #[serde(default = "missing")]
    pub miles_driven: f64,
    /// miles per gallon
    #[serde(default = "missing")]
    pub fuel_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTransitUsage {
    #[serde(default = "missing")]
    pub bus_miles: f64,
    #[serde(default = "missing")]
    pub train_miles: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightCounts {
    #[serde(default = "missing")]
    pub short_haul: f64,
    #[serde(default = "missing")]
    pub long_haul: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodInput {
    #[serde(default)]
    pub diet_type: String,
    #[serde(default)]
    pub waste_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionInput {
    #[serde(default)]
    pub shopping_habits: String,
    #[serde(default)]
    pub recycling_habits: String,
}

/// A field that failed boundary validation, named by its JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProblem {
    pub field: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

impl CalculationData {
    /// Checks the numeric inputs before they reach the estimators.
    ///
    /// The estimators deliberately do not guard against NaN or a zero fuel
    /// efficiency, so this is the only place such input is turned into a
    /// client error. Every problem is reported, not just the first.
    pub fn validate(&self) -> Result<(), Vec<FieldProblem>> {
        let mut problems = Vec::new();

        let amounts = [
            ("housing.energy.electricity", self.housing.energy.electricity),
            ("housing.energy.naturalGas", self.housing.energy.natural_gas),
            ("housing.energy.heatingOil", self.housing.energy.heating_oil),
            (
                "transportation.car.milesDriven",
                self.transportation.car.miles_driven,
            ),
            (
                "transportation.publicTransit.busMiles",
                self.transportation.public_transit.bus_miles,
            ),
            (
                "transportation.publicTransit.trainMiles",
                self.transportation.public_transit.train_miles,
            ),
            (
                "transportation.flights.shortHaul",
                self.transportation.flights.short_haul,
            ),
            (
                "transportation.flights.longHaul",
                self.transportation.flights.long_haul,
            ),
        ];

        for (field, value) in amounts {
            if !value.is_finite() {
                problems.push(FieldProblem {
                    field,
                    reason: "must be a number",
                });
            } else if value < 0.0 {
                problems.push(FieldProblem {
                    field,
                    reason: "must not be negative",
                });
            }
        }

        let flights = [
            (
                "transportation.flights.shortHaul",
                self.transportation.flights.short_haul,
            ),
            (
                "transportation.flights.longHaul",
                self.transportation.flights.long_haul,
            ),
        ];

        for (field, count) in flights {
            if count.is_finite() && count >= 0.0 && count.fract() != 0.0 {
                problems.push(FieldProblem {
                    field,
                    reason: "must be a whole number",
                });
            }
        }

        let efficiency = self.transportation.car.fuel_efficiency;
        if !efficiency.is_finite() {
            problems.push(FieldProblem {
                field: "transportation.car.fuelEfficiency",
                reason: "must be a number",
            });
        } else if efficiency <= 0.0 {
            problems.push(FieldProblem {
                field: "transportation.car.fuelEfficiency",
                reason: "must be greater than zero",
            });
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}
