// Route exports
pub mod swipes;
pub mod users;

use actix_web::{error, http::StatusCode, web, HttpResponse};
use std::sync::Arc;
use crate::core::{Discovery, EngineError, SwipeEngine};
use crate::models::ErrorResponse;
use crate::services::{Store, StoreError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub engine: SwipeEngine,
    pub discovery: Discovery,
    pub max_discover_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, max_serialization_retries: u32, max_discover_limit: usize) -> Self {
        Self {
            engine: SwipeEngine::new(store.clone(), max_serialization_retries),
            discovery: Discovery::new(store.clone()),
            store,
            max_discover_limit,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(users::configure)
            .configure(swipes::configure),
    );
}

impl error::ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::DuplicateSwipe { .. } => StatusCode::CONFLICT,
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Storage(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error, message) = match self {
            EngineError::DuplicateSwipe { .. } => ("duplicate_swipe", self.to_string()),
            EngineError::Validation(_) => ("validation_failed", self.to_string()),
            EngineError::NotFound(_) => ("not_found", self.to_string()),
            // Storage details stay in the logs
            EngineError::Storage(_) => ("internal_error", "An unexpected error occurred.".to_string()),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error.to_string(),
            message,
            status_code: self.status_code().as_u16(),
        })
    }
}

/// JSON body for payload errors
pub fn bad_request(error: &str, message: String) -> error::Error {
    error::InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ErrorResponse {
            error: error.to_string(),
            message,
            status_code: 400,
        }),
    )
    .into()
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    bad_request("invalid_json", format!("Invalid JSON: {}", err))
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    bad_request("invalid_query", format!("Invalid query: {}", err))
}
