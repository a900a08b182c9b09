use crate::model::ConsumptionInput;

/// kg CO2e per year for an average shopper who recycles some of their waste
pub const BASELINE_CONSUMPTION_KG: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShoppingHabits {
    Minimal,
    Average,
    Frequent,
}

impl ShoppingHabits {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "minimal" => Some(ShoppingHabits::Minimal),
            "average" => Some(ShoppingHabits::Average),
            "frequent" => Some(ShoppingHabits::Frequent),
            _ => None,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            ShoppingHabits::Minimal => 0.5,
            ShoppingHabits::Average => 1.0,
            ShoppingHabits::Frequent => 1.5,
        }
    }

    pub fn factor_for(label: &str) -> f64 {
        Self::from_label(label).map_or(1.0, Self::factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecyclingHabits {
    Nothing,
    Partial,
    Most,
    All,
}

impl RecyclingHabits {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "none" => Some(RecyclingHabits::Nothing),
            "some" => Some(RecyclingHabits::Partial),
            "most" => Some(RecyclingHabits::Most),
            "all" => Some(RecyclingHabits::All),
            _ => None,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            RecyclingHabits::Nothing => 1.2,
            RecyclingHabits::Partial => 1.0,
            RecyclingHabits::Most => 0.8,
            RecyclingHabits::All => 0.6,
        }
    }

    pub fn factor_for(label: &str) -> f64 {
        Self::from_label(label).map_or(1.0, Self::factor)
    }
}

/// Annual emissions from shopping and waste in kg CO2e.
pub fn calculate_consumption_emissions(consumption: &ConsumptionInput) -> f64 {
    let shopping_factor = ShoppingHabits::factor_for(&consumption.shopping_habits);
    let recycling_factor = RecyclingHabits::factor_for(&consumption.recycling_habits);
    BASELINE_CONSUMPTION_KG * shopping_factor * recycling_factor
}
