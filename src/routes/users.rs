use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::auth::{AuthContext, JwtAuth};
use crate::core::EngineError;
use crate::models::{CreateUserRequest, CreateUserResponse, ErrorResponse, HealthResponse, UserId};
use crate::routes::AppState;

/// Configure user and health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/user/create", web::post().to(create_user))
        .route("/user/{id}", web::get().to(get_user));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Register a user
///
/// POST /api/v1/user/create
///
/// Request body:
/// ```json
/// {
///   "name": "string",
///   "age": 30,
///   "gender": "string",
///   "latitude": 51.5074,
///   "longitude": -0.1278
/// }
/// ```
async fn create_user(
    state: web::Data<AppState>,
    auth: web::Data<JwtAuth>,
    req: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, EngineError> {
    if let Err(errors) = req.validate() {
        return Err(EngineError::Validation(errors.to_string()));
    }
    req.validate_location().map_err(EngineError::Validation)?;

    let user = state.store.create_user(req.into_inner().into()).await?;

    let token = match auth.issue(user.id) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to issue token for user {}: {}", user.id, e);
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "token_issue_failed".to_string(),
                message: "Failed to issue token".to_string(),
                status_code: 500,
            }));
        }
    };

    tracing::info!("Registered user {}", user.id);

    Ok(HttpResponse::Created().json(CreateUserResponse { user, token }))
}

/// Lightweight profile of any user
///
/// GET /api/v1/user/{id}
async fn get_user(
    state: web::Data<AppState>,
    _auth: AuthContext,
    path: web::Path<UserId>,
) -> Result<HttpResponse, EngineError> {
    let id = path.into_inner();

    let user = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| EngineError::user_not_found(id))?;

    Ok(HttpResponse::Ok().json(user.profile()))
}
