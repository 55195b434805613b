use actix_web::{web, HttpResponse};
use crate::auth::AuthContext;
use crate::core::EngineError;
use crate::models::{DiscoverParams, DiscoverResponse, MatchesResponse, SwipeHistoryResponse, SwipeRequest, SwipeResponse};
use crate::routes::AppState;

/// Configure swipe, discovery and match routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/swipe", web::post().to(swipe))
        .route("/discover", web::get().to(discover))
        .route("/swipes", web::get().to(swipe_history))
        .route("/matches", web::get().to(matches));
}

/// Record a swipe
///
/// POST /api/v1/swipe
///
/// Request body:
/// ```json
/// {
///   "targetUserId": 42,
///   "preference": "YES|NO"
/// }
/// ```
///
/// Responds 409 when the caller already swiped the target.
async fn swipe(
    state: web::Data<AppState>,
    auth: AuthContext,
    req: web::Json<SwipeRequest>,
) -> Result<HttpResponse, EngineError> {
    let outcome = state
        .engine
        .execute(&auth, req.target_user_id, req.preference)
        .await?;

    Ok(HttpResponse::Ok().json(SwipeResponse::from(outcome)))
}

/// Discovery feed
///
/// GET /api/v1/discover?age={age}&gender={gender}&orderBy={attractiveness_score|distance}&limit={n}
async fn discover(
    state: web::Data<AppState>,
    auth: AuthContext,
    query: web::Query<DiscoverParams>,
) -> Result<HttpResponse, EngineError> {
    // Rejected before any store access
    let filter = query
        .into_inner()
        .into_filter(state.max_discover_limit)
        .map_err(EngineError::Validation)?;

    tracing::info!("Discovering candidates for user {} ({:?})", auth.user_id(), filter);

    let results = state.discovery.discover(&auth, &filter).await?;

    Ok(HttpResponse::Ok().json(DiscoverResponse {
        total_results: results.len(),
        results,
    }))
}

/// Caller's swipe history, newest first
///
/// GET /api/v1/swipes
async fn swipe_history(
    state: web::Data<AppState>,
    auth: AuthContext,
) -> Result<HttpResponse, EngineError> {
    let swipes = state.store.swipes_by_actor(auth.user_id()).await?;

    Ok(HttpResponse::Ok().json(SwipeHistoryResponse {
        user_id: auth.user_id(),
        count: swipes.len(),
        swipes,
    }))
}

/// Caller's mutual matches
///
/// GET /api/v1/matches
async fn matches(
    state: web::Data<AppState>,
    auth: AuthContext,
) -> Result<HttpResponse, EngineError> {
    let matches = state.store.mutual_matches(auth.user_id()).await?;

    Ok(HttpResponse::Ok().json(MatchesResponse {
        user_id: auth.user_id(),
        count: matches.len(),
        matches,
    }))
}
