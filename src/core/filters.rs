use std::collections::HashSet;
use crate::models::{DiscoveryFilter, User, UserId};

/// A user is a candidate iff it is not the requester and was not swiped yet
#[inline]
pub fn is_unswiped_candidate(user: &User, requester: UserId, swiped: &HashSet<UserId>) -> bool {
    user.id != requester && !swiped.contains(&user.id)
}

/// Check a user against the optional discovery filters
///
/// Age is an exact match. Gender is an exact match ignoring case.
#[inline]
pub fn matches_filter(user: &User, filter: &DiscoveryFilter) -> bool {
    if let Some(age) = filter.age {
        if user.age != age {
            return false;
        }
    }

    if let Some(gender) = &filter.gender {
        if user.gender.to_lowercase() != gender.to_lowercase() {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    fn create_user(id: UserId, age: i32, gender: &str) -> User {
        User {
            id,
            name: format!("User {}", id),
            age,
            gender: gender.to_string(),
            location: Location::new(40.7128, -74.0060),
            attractiveness_score: 0,
        }
    }

    #[test]
    fn test_no_filter_matches_everyone() {
        let filter = DiscoveryFilter::default();
        assert!(matches_filter(&create_user(1, 25, "Male"), &filter));
        assert!(matches_filter(&create_user(2, 61, "Other"), &filter));
    }

    #[test]
    fn test_age_is_exact_match() {
        let filter = DiscoveryFilter {
            age: Some(30),
            ..Default::default()
        };

        assert!(matches_filter(&create_user(1, 30, "Female"), &filter));
        assert!(!matches_filter(&create_user(2, 29, "Female"), &filter));
        assert!(!matches_filter(&create_user(3, 31, "Female"), &filter));
    }

    #[test]
    fn test_gender_ignores_case() {
        let filter = DiscoveryFilter {
            gender: Some("female".to_string()),
            ..Default::default()
        };

        assert!(matches_filter(&create_user(1, 30, "Female"), &filter));
        assert!(matches_filter(&create_user(2, 30, "FEMALE"), &filter));
        assert!(!matches_filter(&create_user(3, 30, "Male"), &filter));
        assert!(!matches_filter(&create_user(4, 30, "Female "), &filter));
    }

    #[test]
    fn test_candidate_excludes_self_and_swiped() {
        let swiped: HashSet<UserId> = [2, 3].into_iter().collect();

        assert!(!is_unswiped_candidate(&create_user(1, 30, "Male"), 1, &swiped));
        assert!(!is_unswiped_candidate(&create_user(2, 30, "Male"), 1, &swiped));
        assert!(is_unswiped_candidate(&create_user(4, 30, "Male"), 1, &swiped));
    }
}
