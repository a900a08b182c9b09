use super::{error::ApiError, AppState};
use crate::storage::CalculationRecord;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationHistoryResponse {
    pub user_id: String,
    pub calculations: Vec<CalculationRecord>,
}

pub async fn calculation_history_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<CalculationHistoryResponse>, ApiError> {
    let calculations = state
        .store
        .list_for_user(&user_id, HISTORY_LIMIT)
        .await
        .map_err(|e| {
            log::error!("Error loading calculations for {user_id}: {e}");
            ApiError::Internal("Failed to load calculations")
        })?;

    Ok(Json(CalculationHistoryResponse {
        user_id,
        calculations,
    }))
}
