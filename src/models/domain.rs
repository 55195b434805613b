use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary key of a user row
pub type UserId = i64;

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Stored user with location and popularity counter
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub age: i32,
    pub gender: String,
    #[sqlx(flatten)]
    pub location: Location,
    #[serde(rename = "attractivenessScore")]
    pub attractiveness_score: i64,
}

impl User {
    /// Lightweight projection returned for matches and lookups
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            name: self.name.clone(),
            age: self.age,
            gender: self.gender.clone(),
        }
    }
}

/// Registration data handed over by the account collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub location: Location,
}

/// Public identity of a user, without location or score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    pub age: i32,
    pub gender: String,
}

/// Decision one user records about another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "swipe_preference", rename_all = "UPPERCASE")]
pub enum Preference {
    #[serde(rename = "YES", alias = "yes", alias = "Yes")]
    Yes,
    #[serde(rename = "NO", alias = "no", alias = "No")]
    No,
}

impl Preference {
    pub fn is_yes(self) -> bool {
        matches!(self, Preference::Yes)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preference::Yes => "YES",
            Preference::No => "NO",
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(Preference::Yes),
            "NO" => Ok(Preference::No),
            other => Err(format!("preference must be YES or NO, got {:?}", other)),
        }
    }
}

/// Immutable record of a single swipe
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Swipe {
    pub id: i64,
    #[serde(rename = "userId")]
    pub actor_id: UserId,
    #[serde(rename = "targetUserId")]
    pub target_id: UserId,
    pub preference: Preference,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Result of a committed swipe transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub swipe_id: i64,
    pub matched: bool,
    pub matched_user: Option<Profile>,
}

impl SwipeOutcome {
    pub fn match_id(&self) -> Option<UserId> {
        self.matched_user.as_ref().map(|p| p.id)
    }
}

/// Ordering applied to the discovery feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    AttractivenessScore,
    Distance,
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attractiveness_score" => Ok(OrderBy::AttractivenessScore),
            "distance" => Ok(OrderBy::Distance),
            other => Err(format!(
                "orderBy must be attractiveness_score or distance, got {:?}",
                other
            )),
        }
    }
}

/// Optional filters and ordering for a discovery request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryFilter {
    /// Exact age match, not a range
    pub age: Option<i32>,
    /// Case-insensitive exact gender match
    pub gender: Option<String>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

/// Entry of the discovery feed. Coordinates are never exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: UserId,
    pub name: String,
    pub age: i32,
    pub gender: String,
    #[serde(rename = "distanceFromMe")]
    pub distance_from_me: f64,
    #[serde(rename = "attractivenessScore")]
    pub attractiveness_score: i64,
}
