// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Candidate, DiscoveryFilter, Location, NewUser, OrderBy, Preference, Profile, Swipe, SwipeOutcome, User, UserId};
pub use requests::{CreateUserRequest, DiscoverParams, SwipeRequest};
pub use responses::{CreateUserResponse, DiscoverResponse, ErrorResponse, HealthResponse, MatchesResponse, SwipeHistoryResponse, SwipeResponse};
