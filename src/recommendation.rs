use crate::config::RecommendationsConfig;
use crate::emissions::{GLOBAL_AVERAGE_KG, US_AVERAGE_KG};
use crate::model::CalculationData;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shown to the user whenever a recommendation could not be generated.
pub const AI_FALLBACK_MESSAGE: &str = "Unable to generate AI analysis at this time.";

const SYSTEM_PROMPT: &str = "You are an environmental consultant. Give concise, practical advice \
     for reducing a household's carbon footprint. Reply in plain text with at most five suggestions.";

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Recommendation API returned status {0}")]
    Status(u16),
    #[error("Recommendation API returned no text")]
    EmptyResponse,
}

/// Produces free-text advice for a computed footprint.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn recommend(
        &self,
        total_footprint: f64,
        data: &CalculationData,
    ) -> Result<String, RecommendationError>;
}

/// Client for an OpenAI-compatible chat completion endpoint.
pub struct ChatRecommender {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatRecommender {
    pub fn new(api_base: &str, api_key: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("EcoViz/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key,
            model,
        }
    }

    /// Reads the API key from the environment variable named in the config.
    pub fn from_config(config: &RecommendationsConfig) -> Result<Self, RecommendationError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| RecommendationError::MissingApiKey(config.api_key_env.clone()))?;

        Ok(Self::new(
            &config.api_base,
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_seconds),
        ))
    }
}

#[async_trait]
impl RecommendationService for ChatRecommender {
    async fn recommend(
        &self,
        total_footprint: f64,
        data: &CalculationData,
    ) -> Result<String, RecommendationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(total_footprint, data),
                },
            ],
            max_tokens: 300,
        };

        log::debug!("Requesting recommendation from {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecommendationError::Status(status.as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .map(|choice| choice.message.content.trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or(RecommendationError::EmptyResponse)
    }
}

/// Describes the household to the model in plain language.
pub fn build_prompt(total_footprint: f64, data: &CalculationData) -> String {
    let housing = &data.housing;
    let transportation = &data.transportation;

    let mut prompt = format!(
        "A household's estimated carbon footprint is {:.2} kg CO2e per year. \
         The global average is {:.0} kg and the US average is {:.0} kg.\n\n",
        total_footprint, GLOBAL_AVERAGE_KG, US_AVERAGE_KG
    );

    prompt.push_str("Household details:\n");
    prompt.push_str(&format!(
        "- Housing: {} for {} occupant(s); {} kWh electricity, {} therms natural gas, {} gallons heating oil per year\n",
        if housing.dwelling_type.is_empty() {
            "unspecified dwelling"
        } else {
            housing.dwelling_type.as_str()
        },
        housing
            .occupants
            .map(|n| n.to_string())
            .unwrap_or_else(|| "an unknown number of".to_string()),
        housing.energy.electricity,
        housing.energy.natural_gas,
        housing.energy.heating_oil
    ));
    prompt.push_str(&format!(
        "- Transportation: {} miles driven at {} mpg, {} bus miles, {} train miles, {} short-haul and {} long-haul flights\n",
        transportation.car.miles_driven,
        transportation.car.fuel_efficiency,
        transportation.public_transit.bus_miles,
        transportation.public_transit.train_miles,
        transportation.flights.short_haul,
        transportation.flights.long_haul
    ));
    prompt.push_str(&format!(
        "- Food: {} diet, {} food waste\n",
        data.food.diet_type, data.food.waste_level
    ));
    prompt.push_str(&format!(
        "- Consumption: {} shopping, recycles {}\n\n",
        data.consumption.shopping_habits, data.consumption.recycling_habits
    ));
    prompt.push_str("Suggest the most effective ways for this household to reduce its footprint.");

    prompt
}
