use super::{error::ApiError, AppState};
use crate::emissions::CarbonFootprintResult;
use crate::mailer::{is_valid_email, MailError};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

pub const EMAIL_SENT_MESSAGE: &str = "Email sent successfully";

#[derive(Debug, Deserialize)]
pub struct SendEmailResultsRequest {
    pub email: Option<String>,
    pub results: Option<CarbonFootprintResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendEmailResultsResponse {
    pub message: String,
}

pub async fn send_email_results_handler(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailResultsRequest>, JsonRejection>,
) -> Result<Json<SendEmailResultsResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest {
        message: "Invalid request body".to_string(),
        details: vec![rejection.body_text()],
    })?;

    let (email, results) = match (request.email, request.results) {
        (Some(email), Some(results)) => (email.trim().to_string(), results),
        _ => return Err(ApiError::missing_fields()),
    };

    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    if !results.is_finite() {
        return Err(ApiError::bad_request("Results must contain finite numbers"));
    }

    match state.mailer.send_results(&email, &results).await {
        Ok(()) => {
            log::info!("Sent results email to {email}");
            Ok(Json(SendEmailResultsResponse {
                message: EMAIL_SENT_MESSAGE.to_string(),
            }))
        }
        Err(MailError::InvalidRecipient(_)) => Err(ApiError::bad_request("Invalid email address")),
        Err(e) => {
            log::error!("Error sending results email to {email}: {e}");
            Err(ApiError::Internal("Failed to send email"))
        }
    }
}
