use super::{error::ApiError, AppState};
use crate::emissions::{calculate_breakdown, Averages, CarbonFootprintResult};
use crate::model::CalculationData;
use crate::recommendation::AI_FALLBACK_MESSAGE;
use crate::storage::CalculationRecord;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CALCULATION_STORED_MESSAGE: &str = "Carbon footprint calculation stored successfully";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub user_id: Option<String>,
    pub data: Option<CalculationData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub user_id: String,
    pub calculation_id: Uuid,
    pub carbon_footprint: f64,
    pub breakdown: CarbonFootprintResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
    pub averages: Averages,
    pub message: String,
}

pub async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CalculateResponse>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        log::debug!("Rejected calculation payload: {}", rejection.body_text());
        ApiError::BadRequest {
            message: "Invalid request body".to_string(),
            details: vec![rejection.body_text()],
        }
    })?;

    let (user_id, data) = match (request.user_id, request.data) {
        (Some(user_id), Some(data)) if !user_id.trim().is_empty() => (user_id, data),
        _ => return Err(ApiError::missing_fields()),
    };

    if let Err(problems) = data.validate() {
        return Err(ApiError::BadRequest {
            message: "Invalid calculation data".to_string(),
            details: problems.iter().map(|p| p.to_string()).collect(),
        });
    }

    let breakdown = calculate_breakdown(&data);
    if !breakdown.is_finite() {
        log::warn!("Footprint for {user_id} overflowed, rejecting calculation");
        return Err(ApiError::BadRequest {
            message: "Invalid calculation data".to_string(),
            details: vec!["calculated footprint is too large".to_string()],
        });
    }
    log::debug!(
        "Footprint for {user_id}: {:.2} kg CO2e (housing {:.2}, transportation {:.2}, food {:.2}, consumption {:.2})",
        breakdown.total,
        breakdown.housing,
        breakdown.transportation,
        breakdown.food,
        breakdown.consumption
    );

    let ai_analysis = match &state.recommender {
        Some(recommender) => match recommender.recommend(breakdown.total, &data).await {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("AI analysis failed for {user_id}: {e}");
                Some(AI_FALLBACK_MESSAGE.to_string())
            }
        },
        None => None,
    };

    let record = CalculationRecord::new(user_id, breakdown, data, ai_analysis);

    if let Err(e) = state.store.put(&record).await {
        log::error!("Error storing calculation {}: {e}", record.calculation_id);
        return Err(ApiError::Internal("Failed to store calculation"));
    }

    log::info!(
        "Stored calculation {} for user {}",
        record.calculation_id,
        record.user_id
    );

    Ok((
        StatusCode::CREATED,
        Json(CalculateResponse {
            user_id: record.user_id,
            calculation_id: record.calculation_id,
            carbon_footprint: breakdown.total,
            breakdown,
            ai_analysis: record.ai_analysis,
            averages: Averages::default(),
            message: CALCULATION_STORED_MESSAGE.to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{post_json, read_json, test_state, FailingStore, StubRecommender};
    use crate::api::router;
    use crate::model::fixtures::sample_json;
    use crate::storage::CalculationStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_calculate_stores_and_returns_footprint() {
        let (state, store) = test_state();
        let api = router(state);

        let response = post_json(
            api,
            "/calculate",
            serde_json::json!({ "userId": "12345", "data": sample_json() }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: CalculateResponse = read_json(response).await;
        assert_eq!(body.user_id, "12345");
        assert!((body.carbon_footprint - 15941.75).abs() < 0.5);
        assert_eq!(body.message, CALCULATION_STORED_MESSAGE);
        assert_eq!(body.averages.global, 4000.0);
        assert_eq!(body.averages.us, 16000.0);
        assert!(body.ai_analysis.is_none());

        let stored = store.list_for_user("12345", 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].calculation_id, body.calculation_id);
    }

    #[tokio::test]
    async fn test_calculate_includes_ai_analysis() {
        let (mut state, _store) = test_state();
        state.recommender = Some(Arc::new(StubRecommender::replying("Fly less.")));

        let response = post_json(
            router(state),
            "/calculate",
            serde_json::json!({ "userId": "12345", "data": sample_json() }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: CalculateResponse = read_json(response).await;
        assert_eq!(body.ai_analysis.as_deref(), Some("Fly less."));
    }

    #[tokio::test]
    async fn test_ai_failure_uses_fallback() {
        let (mut state, _store) = test_state();
        state.recommender = Some(Arc::new(StubRecommender::failing()));

        let response = post_json(
            router(state),
            "/calculate",
            serde_json::json!({ "userId": "12345", "data": sample_json() }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: CalculateResponse = read_json(response).await;
        assert_eq!(body.ai_analysis.as_deref(), Some(AI_FALLBACK_MESSAGE));
    }

    #[tokio::test]
    async fn test_missing_user_id_is_rejected() {
        let (state, store) = test_state();

        let response = post_json(
            router(state),
            "/calculate",
            serde_json::json!({ "data": sample_json() }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "Missing required fields");
        assert!(store.list_for_user("12345", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_section_is_rejected() {
        let (state, _store) = test_state();
        let mut data = sample_json();
        data.as_object_mut().unwrap().remove("consumption");

        let response = post_json(
            router(state),
            "/calculate",
            serde_json::json!({ "userId": "12345", "data": data }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_zero_fuel_efficiency_is_rejected() {
        let (state, _store) = test_state();
        let mut data = sample_json();
        data["transportation"]["car"]["fuelEfficiency"] = serde_json::json!(0);

        let response = post_json(
            router(state),
            "/calculate",
            serde_json::json!({ "userId": "12345", "data": data }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "Invalid calculation data");
        assert_eq!(
            body["details"][0],
            "transportation.car.fuelEfficiency must be greater than zero"
        );
    }

    #[tokio::test]
    async fn test_unknown_diet_still_calculates() {
        let (state, _store) = test_state();
        let mut data = sample_json();
        data["food"]["dietType"] = serde_json::json!("keto");

        let response = post_json(
            router(state),
            "/calculate",
            serde_json::json!({ "userId": "12345", "data": data }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: CalculateResponse = read_json(response).await;
        assert!((body.breakdown.food - 821.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal_error() {
        let (mut state, _store) = test_state();
        state.store = Arc::new(FailingStore);

        let response = post_json(
            router(state),
            "/calculate",
            serde_json::json!({ "userId": "12345", "data": sample_json() }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "Failed to store calculation");
    }

    #[tokio::test]
    async fn test_overflowing_footprint_is_rejected() {
        let (state, store) = test_state();
        let api = router(state);
        let mut data = sample_json();
        data["housing"]["energy"]["heatingOil"] = serde_json::json!(1e308);

        let response = post_json(
            api.clone(),
            "/calculate",
            serde_json::json!({ "userId": "u1", "data": data }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "Invalid calculation data");
        assert!(store.list_for_user("u1", 10).await.unwrap().is_empty());

        let response = crate::api::test_support::get(api, "/calculations/u1").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
