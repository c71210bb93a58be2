//! REST endpoints for the oracle: predictions, analytics and reference lists.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::error::PredictionError;
use crate::oracle::{Prediction, PredictionRequest, PredictionService, ReferenceData};
use crate::questionnaire::{QuestionnaireRouteState, SessionRegistry, questionnaire_routes};
use crate::store::{ClientInfo, PredictionRecord, PredictionStore};

pub const API_VERSION: &str = "1.0.0";

const DEFAULT_RECENT_LIMIT: usize = 20;
const MAX_RECENT_LIMIT: usize = 100;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<dyn PredictionService>,
    /// Analytics sink (None if the database could not be opened).
    pub store: Option<Arc<dyn PredictionStore>>,
    pub reference: Arc<ReferenceData>,
}

impl AppState {
    /// Predict, then record the outcome in the background.
    ///
    /// The response never waits on the store and a failed save is only logged.
    pub async fn predict(
        &self,
        request: PredictionRequest,
        client: ClientInfo,
    ) -> Result<Prediction, PredictionError> {
        let outcome = self.oracle.predict(request).await?;

        if let Some(store) = &self.store {
            let store = Arc::clone(store);
            let record = PredictionRecord::new(&outcome, &client);
            tokio::spawn(async move {
                match store.save_prediction(&record).await {
                    Ok(id) => info!(prediction_id = %id, "💾 Prediction saved"),
                    Err(e) => warn!(error = %e, "Failed to save prediction, continuing"),
                }
            });
        }

        Ok(outcome.prediction)
    }
}

/// Client address and agent from proxy headers.
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let defaults = ClientInfo::default();
    ClientInfo {
        ip_address: header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .or_else(|| header("x-real-ip").map(str::to_string))
            .unwrap_or(defaults.ip_address),
        user_agent: header("user-agent")
            .map(str::to_string)
            .unwrap_or(defaults.user_agent),
    }
}

/// Map a prediction failure to a 400 with a `{"detail": ...}` body.
///
/// Every oracle step has a static fallback, so the only failures left are
/// bad inputs.
pub fn prediction_error_response(e: &PredictionError) -> (StatusCode, Json<Value>) {
    warn!(error = %e, "Prediction rejected");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"detail": format!("🔮 {e}")})),
    )
}

/// CORS for the given origins; unparsable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

/// Build the full router: oracle API, questionnaire API and CORS.
pub fn app_router(state: AppState, sessions: Arc<SessionRegistry>, cors_origins: &[String]) -> Router {
    let questionnaire = questionnaire_routes(QuestionnaireRouteState {
        sessions,
        app: state.clone(),
    });
    api_routes(state)
        .merge(questionnaire)
        .layer(cors_layer(cors_origins))
}

/// Build the oracle REST routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/predict", post(predict))
        .route("/api/test-ai", get(test_ai))
        .route("/api/stats", get(stats))
        .route("/api/recent-predictions", get(recent_predictions))
        .route("/api/universities", get(universities))
        .route("/api/careers", get(careers))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "🔮 The Oracle is awake and ready to reveal destinies",
        "version": API_VERSION,
    }))
}

// ── Predictions ─────────────────────────────────────────────────────────

async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PredictionRequest>,
) -> impl IntoResponse {
    match state.predict(request, client_info(&headers)).await {
        Ok(prediction) => (StatusCode::OK, Json(json!(prediction))),
        Err(e) => prediction_error_response(&e),
    }
}

async fn test_ai(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.oracle.test_connection().await)
}

// ── Analytics ───────────────────────────────────────────────────────────

async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let Some(store) = &state.store else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Unable to fetch statistics"})),
        );
    };
    match store.prediction_stats().await {
        Ok(stats) => (StatusCode::OK, Json(json!(stats))),
        Err(e) => {
            error!(error = %e, "Failed to get stats");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Unable to fetch statistics"})),
            )
        }
    }
}

#[derive(Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

async fn recent_predictions(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> impl IntoResponse {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);
    let predictions = match &state.store {
        Some(store) => store.recent_predictions(limit).await.unwrap_or_else(|e| {
            error!(error = %e, "Failed to get recent predictions");
            Vec::new()
        }),
        None => Vec::new(),
    };
    Json(json!({"predictions": predictions}))
}

// ── Reference lists ─────────────────────────────────────────────────────

async fn universities(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({"universities": state.reference.university_names()}))
}

async fn careers(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({"careers": state.reference.career_names()}))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::oracle::Oracle;
    use crate::store::LibSqlStore;

    async fn state(with_store: bool) -> AppState {
        let reference = Arc::new(ReferenceData::default());
        let store: Option<Arc<dyn PredictionStore>> = if with_store {
            Some(Arc::new(LibSqlStore::new_memory().await.unwrap()))
        } else {
            None
        };
        AppState {
            oracle: Arc::new(Oracle::new(None, Arc::clone(&reference))),
            store,
            reference,
        }
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn predict_request(body: Value) -> Request<Body> {
        Request::post("/api/predict")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "10.0.0.1, 10.0.0.2")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn client_info_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_info(&headers), ClientInfo::default());

        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.9"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8"));
        let info = client_info(&headers);
        assert_eq!(info.ip_address, "192.168.1.9");
        assert_eq!(info.user_agent, "curl/8");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 1.2.3.4 , 5.6.7.8"));
        assert_eq!(client_info(&headers).ip_address, "1.2.3.4");
    }

    #[tokio::test]
    async fn health_reports_version() {
        let app = api_routes(state(false).await);
        let resp = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], "1.0.0");
    }

    #[tokio::test]
    async fn predict_rejects_invalid_age() {
        let app = api_routes(state(false).await);
        let resp = app
            .oneshot(predict_request(json!({
                "name": "Alex", "age": 12, "country": "USA",
                "college": "MIT", "aspiration": "Doctor"
            })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["detail"].as_str().unwrap().starts_with("🔮 The Oracle requires valid inputs"));
    }

    #[test]
    fn incomplete_answers_are_bad_requests() {
        use crate::error::QuestionnaireError;
        use crate::questionnaire::QuestionId;

        let err = PredictionError::from(QuestionnaireError::MissingAnswer(QuestionId::Age));
        let (status, Json(body)) = prediction_error_response(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("🔮 Questionnaire error: Completed answers are missing"));
    }

    #[tokio::test]
    async fn predict_saves_in_background() {
        let state = state(true).await;
        let store = state.store.clone().unwrap();
        let app = api_routes(state);
        let resp = app
            .oneshot(predict_request(json!({
                "name": "alex", "age": 25, "country": "USA",
                "college": "Harvard University", "aspiration": "doctor"
            })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["college_tier"], "S+");
        assert_eq!(json["predicted_lifetime_nw"], 3_200_000.0);

        let mut saved = Vec::new();
        for _ in 0..50 {
            saved = store.recent_predictions(10).await.unwrap();
            if !saved.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "Alex");
        assert_eq!(saved[0].aspiration, "Doctor");
    }

    #[tokio::test]
    async fn stats_without_store_is_unavailable() {
        let app = api_routes(state(false).await);
        let resp = app
            .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn recent_predictions_without_store_is_empty() {
        let app = api_routes(state(false).await);
        let resp = app
            .oneshot(
                Request::get("/api/recent-predictions?limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(resp).await, json!({"predictions": []}));
    }

    #[tokio::test]
    async fn careers_default_list() {
        let app = api_routes(state(false).await);
        let resp = app
            .oneshot(Request::get("/api/careers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["careers"][0], "Software Engineer");
        assert_eq!(json["careers"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let app = api_routes(state(false).await).layer(cors_layer(&["http://localhost:3000".to_string()]));
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/predict")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
    }
}
