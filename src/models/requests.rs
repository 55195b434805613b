use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{DiscoveryFilter, Location, NewUser, OrderBy, Preference, UserId};

/// Request to record a swipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeRequest {
    #[serde(alias = "target_user_id", rename = "targetUserId")]
    pub target_user_id: UserId,
    pub preference: Preference,
}

/// Raw query string of the discovery endpoint
///
/// Everything arrives as text so a malformed value becomes a validation
/// error instead of a generic query rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoverParams {
    pub age: Option<String>,
    pub gender: Option<String>,
    #[serde(alias = "order_by", rename = "orderBy")]
    pub order_by: Option<String>,
    pub limit: Option<String>,
}

impl DiscoverParams {
    /// Parse and validate into a filter. Empty values count as absent.
    pub fn into_filter(self, max_limit: usize) -> Result<DiscoveryFilter, String> {
        let age = match non_empty(self.age) {
            Some(raw) => {
                let age: i32 = raw
                    .parse()
                    .map_err(|_| format!("Invalid age parameter: {:?}", raw))?;
                if age < 0 {
                    return Err(format!("Invalid age parameter: {:?}", raw));
                }
                Some(age)
            }
            None => None,
        };

        let order_by = non_empty(self.order_by)
            .map(|raw| raw.parse::<OrderBy>())
            .transpose()?;

        let limit = match non_empty(self.limit) {
            Some(raw) => {
                let limit: usize = raw
                    .parse()
                    .map_err(|_| format!("Invalid limit parameter: {:?}", raw))?;
                if limit == 0 || limit > max_limit {
                    return Err(format!("limit must be between 1 and {}", max_limit));
                }
                Some(limit)
            }
            None => None,
        };

        Ok(DiscoveryFilter {
            age,
            gender: non_empty(self.gender),
            order_by,
            limit,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 18, max = 120))]
    pub age: i32,
    #[validate(length(min = 1, max = 50))]
    pub gender: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CreateUserRequest {
    /// Coordinate bounds check, run alongside `validate()`
    pub fn validate_location(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range [-90, 90]", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range [-180, 180]", self.longitude));
        }
        Ok(())
    }
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            name: req.name,
            age: req.age,
            gender: req.gender,
            location: Location::new(req.latitude, req.longitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(age: Option<&str>, gender: Option<&str>, order_by: Option<&str>) -> DiscoverParams {
        DiscoverParams {
            age: age.map(String::from),
            gender: gender.map(String::from),
            order_by: order_by.map(String::from),
            limit: None,
        }
    }

    #[test]
    fn test_empty_params_yield_default_filter() {
        let filter = DiscoverParams::default().into_filter(100).unwrap();
        assert_eq!(filter, DiscoveryFilter::default());

        let filter = params(Some(""), Some("  "), Some("")).into_filter(100).unwrap();
        assert_eq!(filter, DiscoveryFilter::default());
    }

    #[test]
    fn test_full_params() {
        let filter = params(Some("29"), Some("Female"), Some("distance"))
            .into_filter(100)
            .unwrap();

        assert_eq!(filter.age, Some(29));
        assert_eq!(filter.gender.as_deref(), Some("Female"));
        assert_eq!(filter.order_by, Some(OrderBy::Distance));
    }

    #[test]
    fn test_malformed_age_rejected() {
        assert!(params(Some("abc"), None, None).into_filter(100).is_err());
        assert!(params(Some("-3"), None, None).into_filter(100).is_err());
        assert!(params(Some("2.5"), None, None).into_filter(100).is_err());
    }

    #[test]
    fn test_unknown_order_rejected() {
        assert!(params(None, None, Some("age")).into_filter(100).is_err());
    }

    #[test]
    fn test_limit_bounds() {
        let mut p = DiscoverParams::default();
        p.limit = Some("0".to_string());
        assert!(p.clone().into_filter(50).is_err());

        p.limit = Some("51".to_string());
        assert!(p.clone().into_filter(50).is_err());

        p.limit = Some("50".to_string());
        assert_eq!(p.into_filter(50).unwrap().limit, Some(50));
    }

    #[test]
    fn test_create_user_validation() {
        let valid = CreateUserRequest {
            name: "Ada".to_string(),
            age: 30,
            gender: "Female".to_string(),
            latitude: 51.5,
            longitude: -0.12,
        };
        assert!(valid.validate().is_ok());
        assert!(valid.validate_location().is_ok());

        let mut bad = valid.clone();
        bad.latitude = 95.0;
        assert!(bad.validate_location().is_err());

        let mut bad = valid.clone();
        bad.longitude = f64::NAN;
        assert!(bad.validate_location().is_err());

        let mut bad = valid.clone();
        bad.age = 12;
        assert!(bad.validate().is_err());

        let mut bad = valid;
        bad.name = String::new();
        assert!(bad.validate().is_err());
    }
}
