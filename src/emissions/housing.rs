use crate::model::HousingInput;

/// kg CO2e per kWh of grid electricity
pub const ELECTRICITY_KG_PER_KWH: f64 = 0.42;
/// kg CO2e per therm of natural gas
pub const NATURAL_GAS_KG_PER_THERM: f64 = 5.3;
/// kg CO2e per gallon of heating oil
pub const HEATING_OIL_KG_PER_GALLON: f64 = 10.15;

/// Annual household energy emissions in kg CO2e.
///
/// Only the energy figures contribute. Dwelling type and occupant count are
/// carried on the input but do not change the result.
pub fn calculate_housing_emissions(housing: &HousingInput) -> f64 {
    let energy = &housing.energy;
    energy.electricity * ELECTRICITY_KG_PER_KWH
        + energy.natural_gas * NATURAL_GAS_KG_PER_THERM
        + energy.heating_oil * HEATING_OIL_KG_PER_GALLON
}
