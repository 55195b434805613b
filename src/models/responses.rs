use serde::{Deserialize, Serialize};
use crate::models::domain::{Candidate, Profile, Swipe, SwipeOutcome, User, UserId};

/// Response for the swipe endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    pub matched: bool,
    #[serde(rename = "matchID", skip_serializing_if = "Option::is_none")]
    pub match_id: Option<UserId>,
    #[serde(rename = "matchedUser", skip_serializing_if = "Option::is_none")]
    pub matched_user: Option<Profile>,
}

impl From<SwipeOutcome> for SwipeResponse {
    fn from(outcome: SwipeOutcome) -> Self {
        Self {
            matched: outcome.matched,
            match_id: outcome.match_id(),
            matched_user: outcome.matched_user,
        }
    }
}

/// Response for the discovery endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub results: Vec<Candidate>,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
}

/// Response for registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub user: User,
    pub token: String,
}

/// Caller's swipe history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeHistoryResponse {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub swipes: Vec<Swipe>,
    pub count: usize,
}

/// Caller's mutual matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub matches: Vec<Profile>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
