use crate::model::FoodInput;

pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DietType {
    MeatHeavy,
    Average,
    Vegetarian,
    Vegan,
}

impl DietType {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "meat-heavy" => Some(DietType::MeatHeavy),
            "average" => Some(DietType::Average),
            "vegetarian" => Some(DietType::Vegetarian),
            "vegan" => Some(DietType::Vegan),
            _ => None,
        }
    }

    /// kg CO2e per day
    pub fn factor(self) -> f64 {
        match self {
            DietType::MeatHeavy => 3.3,
            DietType::Average => 2.5,
            DietType::Vegetarian => 1.7,
            DietType::Vegan => 1.5,
        }
    }

    /// Unrecognized labels are treated as an average diet.
    pub fn factor_for(label: &str) -> f64 {
        Self::from_label(label)
            .unwrap_or(DietType::Average)
            .factor()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasteLevel {
    Low,
    Average,
    High,
}

impl WasteLevel {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "low" => Some(WasteLevel::Low),
            "average" => Some(WasteLevel::Average),
            "high" => Some(WasteLevel::High),
            _ => None,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            WasteLevel::Low => 0.9,
            WasteLevel::Average => 1.0,
            WasteLevel::High => 1.1,
        }
    }

    pub fn factor_for(label: &str) -> f64 {
        Self::from_label(label)
            .unwrap_or(WasteLevel::Average)
            .factor()
    }
}

/// Annual food emissions in kg CO2e.
pub fn calculate_food_emissions(food: &FoodInput) -> f64 {
    let diet_factor = DietType::factor_for(&food.diet_type);
    let waste_factor = WasteLevel::factor_for(&food.waste_level);
    DAYS_PER_YEAR * diet_factor * waste_factor
}
