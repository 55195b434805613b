//! Kindred Match - swipe/match transaction engine for the Kindred dating app
//!
//! This library records swipes, detects mutual matches atomically, keeps the
//! attractiveness score in step, and builds the geo-ranked discovery feed.

pub mod auth;
pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use auth::{AuthContext, JwtAuth};
pub use core::{haversine_distance, Discovery, EngineError, SwipeEngine};
pub use models::{Candidate, DiscoveryFilter, OrderBy, Preference, Profile, SwipeOutcome, User};
pub use services::{MemoryStore, PostgresStore, Store, StoreError};
