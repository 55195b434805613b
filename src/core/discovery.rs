use std::sync::Arc;
use crate::auth::AuthContext;
use crate::core::{distance::distance_between, error::EngineError};
use crate::models::{Candidate, DiscoveryFilter, Location, OrderBy, User};
use crate::services::Store;

/// Builds the discovery feed for a requester
///
/// # Pipeline Stages
/// 1. Candidate fetch: everyone except the requester and already-swiped
///    targets, narrowed by the age and gender filters (in the store)
/// 2. Distance from the requester's stored location
/// 3. Ordering and optional truncation
#[derive(Clone)]
pub struct Discovery {
    store: Arc<dyn Store>,
}

impl Discovery {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Discovery feed for the authenticated user. Read-only.
    pub async fn discover(
        &self,
        auth: &AuthContext,
        filter: &DiscoveryFilter,
    ) -> Result<Vec<Candidate>, EngineError> {
        let requester = self
            .store
            .find_user(auth.user_id())
            .await?
            .ok_or_else(|| EngineError::user_not_found(auth.user_id()))?;

        let users = self.store.query_candidates(requester.id, filter).await?;
        let fetched = users.len();

        let candidates = rank_candidates(&requester.location, users, filter.order_by, filter.limit);

        tracing::debug!(
            requester = requester.id,
            fetched,
            returned = candidates.len(),
            order_by = ?filter.order_by,
            "Built discovery feed"
        );

        Ok(candidates)
    }
}

/// Attach distances and order the candidates
///
/// `AttractivenessScore` sorts by score descending and `Distance` by computed
/// distance ascending; both sorts are stable. Without an ordering the fetch
/// order is kept as is.
pub fn rank_candidates(
    origin: &Location,
    users: Vec<User>,
    order_by: Option<OrderBy>,
    limit: Option<usize>,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = users
        .into_iter()
        .map(|user| Candidate {
            distance_from_me: distance_between(origin, &user.location),
            id: user.id,
            name: user.name,
            age: user.age,
            gender: user.gender,
            attractiveness_score: user.attractiveness_score,
        })
        .collect();

    match order_by {
        Some(OrderBy::AttractivenessScore) => {
            candidates.sort_by(|a, b| b.attractiveness_score.cmp(&a.attractiveness_score));
        }
        Some(OrderBy::Distance) => {
            candidates.sort_by(|a, b| a.distance_from_me.total_cmp(&b.distance_from_me));
        }
        None => {}
    }

    if let Some(limit) = limit {
        candidates.truncate(limit);
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_user(id: i64, lat: f64, lon: f64, score: i64) -> User {
        User {
            id,
            name: format!("User {}", id),
            age: 30,
            gender: "Female".to_string(),
            location: Location::new(lat, lon),
            attractiveness_score: score,
        }
    }

    fn origin() -> Location {
        Location::new(40.7128, -74.0060) // New York
    }

    fn sample() -> Vec<User> {
        vec![
            create_user(1, 51.5074, -0.1278, 3), // London
            create_user(2, 40.72, -74.01, 0),    // ~1km
            create_user(3, 34.0522, -118.2437, 9), // Los Angeles
            create_user(4, 41.5, -74.0, 3),      // ~90km
        ]
    }

    #[test]
    fn test_distance_ordering_non_decreasing() {
        let ranked = rank_candidates(&origin(), sample(), Some(OrderBy::Distance), None);

        let ids: Vec<i64> = ranked.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
        for pair in ranked.windows(2) {
            assert!(pair[0].distance_from_me <= pair[1].distance_from_me);
        }
    }

    #[test]
    fn test_score_ordering_non_increasing_and_stable() {
        let ranked = rank_candidates(&origin(), sample(), Some(OrderBy::AttractivenessScore), None);

        let ids: Vec<i64> = ranked.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2]);
        for pair in ranked.windows(2) {
            assert!(pair[0].attractiveness_score >= pair[1].attractiveness_score);
        }
    }

    #[test]
    fn test_unordered_keeps_fetch_order() {
        let ranked = rank_candidates(&origin(), sample(), None, None);
        let ids: Vec<i64> = ranked.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_distances_are_attached() {
        let ranked = rank_candidates(&origin(), sample(), None, None);
        let london = &ranked[0];
        assert!((london.distance_from_me - 5_570_000.0).abs() < 55_700.0);
    }

    #[test]
    fn test_limit_applies_after_ordering() {
        let ranked = rank_candidates(&origin(), sample(), Some(OrderBy::Distance), Some(2));
        let ids: Vec<i64> = ranked.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_candidates(&origin(), vec![], Some(OrderBy::Distance), Some(5)).is_empty());
    }
}
