use crate::config::Config;
use crate::mailer::{transport_from_config, ResultsMailer};
use crate::recommendation::{ChatRecommender, RecommendationService};
use crate::storage::{CalculationStore, SqliteStore};
use anyhow::Context;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub mod calculate;
pub mod email_results;
pub mod error;
pub mod history;

pub use error::ApiError;

pub const WELCOME_MESSAGE: &str = "Welcome to the EcoViz API";

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CalculationStore>,
    /// `None` when AI recommendations are switched off.
    pub recommender: Option<Arc<dyn RecommendationService>>,
    pub mailer: Arc<ResultsMailer>,
}

impl AppState {
    /// Wires up the collaborators named in the config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = SqliteStore::open(&config.storage.database_path).with_context(|| {
            format!(
                "Failed to open calculation store at {}",
                config.storage.database_path
            )
        })?;

        let recommender: Option<Arc<dyn RecommendationService>> =
            if config.recommendations.enabled {
                let recommender = ChatRecommender::from_config(&config.recommendations)?;
                log::info!(
                    "AI recommendations enabled using model {}",
                    config.recommendations.model
                );
                Some(Arc::new(recommender))
            } else {
                log::info!("AI recommendations disabled");
                None
            };

        let mailer = ResultsMailer::new(
            transport_from_config(&config.email),
            config.email.from_address.clone(),
        );

        Ok(Self {
            store: Arc::new(store),
            recommender,
            mailer: Arc::new(mailer),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/calculate", post(calculate::calculate_handler))
        .route(
            "/send-email-results",
            post(email_results::send_email_results_handler),
        )
        .route(
            "/calculations/:user_id",
            get(history::calculation_history_handler),
        )
        .with_state(state)
        .merge(health_router())
}

pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

pub async fn health_handler() -> String {
    "healthy".to_string()
}

fn health_router() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Serves the API until `shutdown` resolves.
pub async fn serve<F>(address: &str, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(address).await?;
    log::info!(
        "Carbon Footprint Calculation Service listening at http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    log::info!("Server stopped");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::{get, post_json, read_json, test_state};
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_welcome() {
        let (state, _store) = test_state();
        let response = get(router(state), "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        assert_eq!(body["message"], WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn test_health_check() {
        let (state, _store) = test_state();
        let response = get(router(state), "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"healthy");
    }

    #[tokio::test]
    async fn test_not_found() {
        let (state, _store) = test_state();
        let response = get(router(state), "/does-not-exist").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (state, _store) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/calculate")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from("{ not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_json(response).await;
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_empty_user_id_is_rejected() {
        let (state, _store) = test_state();
        let response = post_json(
            router(state),
            "/calculate",
            json!({ "userId": "  ", "data": crate::model::fixtures::sample_json() }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_state_from_default_config() {
        let mut config = Config::default();
        config.storage.database_path = ":memory:".to_string();

        let state = AppState::from_config(&config).unwrap();
        assert!(state.recommender.is_none());
    }

    #[test]
    fn test_enabled_recommendations_need_api_key() {
        let mut config = Config::default();
        config.storage.database_path = ":memory:".to_string();
        config.recommendations.enabled = true;
        config.recommendations.api_key_env = "ECOVIZ_TEST_KEY_THAT_IS_NEVER_SET".to_string();

        assert!(AppState::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_serve_shuts_down() {
        let (state, _store) = test_state();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            serve("127.0.0.1:0", state, async {
                let _ = rx.await;
            })
            .await
        });

        tx.send(()).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }
}
