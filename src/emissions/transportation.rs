use crate::model::TransportationInput;

/// kg CO2e per gallon of gasoline burned
pub const GASOLINE_KG_PER_GALLON: f64 = 8.89;
pub const BUS_KG_PER_MILE: f64 = 0.059;
pub const TRAIN_KG_PER_MILE: f64 = 0.041;
/// kg CO2e per short-haul flight
pub const SHORT_HAUL_KG_PER_FLIGHT: f64 = 1100.0;
/// kg CO2e per long-haul flight
pub const LONG_HAUL_KG_PER_FLIGHT: f64 = 4400.0;

/// Annual transportation emissions in kg CO2e.
///
/// A zero fuel efficiency yields infinity. Rejecting it is the caller's job.
pub fn calculate_transportation_emissions(transportation: &TransportationInput) -> f64 {
    let car = &transportation.car;
    let transit = &transportation.public_transit;
    let flights = &transportation.flights;

    let gallons = car.miles_driven / car.fuel_efficiency;

    gallons * GASOLINE_KG_PER_GALLON
        + transit.bus_miles * BUS_KG_PER_MILE
        + transit.train_miles * TRAIN_KG_PER_MILE
        + flights.short_haul * SHORT_HAUL_KG_PER_FLIGHT
        + flights.long_haul * LONG_HAUL_KG_PER_FLIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::sample_data;

    #[test]
    fn test_transportation_emissions() {
        let transportation = sample_data().transportation;
        let emissions = calculate_transportation_emissions(&transportation);
        // (10000 / 25) * 8.89 + 1000 * 0.059 + 500 * 0.041 + 2 * 1100 + 1 * 4400
        assert!((emissions - 10235.5).abs() < 1e-9, "got {emissions}");
    }

    #[test]
    fn test_zero_fuel_efficiency_is_not_masked() {
        let mut transportation = sample_data().transportation;
        transportation.car.fuel_efficiency = 0.0;
        let emissions = calculate_transportation_emissions(&transportation);
        assert!(emissions.is_infinite() && emissions.is_sign_positive());
    }

    #[test]
    fn test_no_driving_with_zero_efficiency_is_nan() {
        let mut transportation = sample_data().transportation;
        transportation.car.miles_driven = 0.0;
        transportation.car.fuel_efficiency = 0.0;
        assert!(calculate_transportation_emissions(&transportation).is_nan());
    }

    #[test]
    fn test_flights_only() {
        let mut transportation = sample_data().transportation;
        transportation.car.miles_driven = 0.0;
        transportation.public_transit.bus_miles = 0.0;
        transportation.public_transit.train_miles = 0.0;
        transportation.flights.short_haul = 3.0;
        transportation.flights.long_haul = 2.0;
        assert_eq!(calculate_transportation_emissions(&transportation), 12100.0);
    }
}
