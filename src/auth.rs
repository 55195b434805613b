use actix_web::{dev::Payload, error, http::header, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use thiserror::Error;
use crate::models::{ErrorResponse, UserId};

/// Authenticated principal, handed explicitly to the engine entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    user_id: UserId,
}

impl AuthContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Errors that can occur while authenticating a request
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Authorization header must be a Bearer token")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Token subject is not a user id")]
    InvalidSubject,

    #[error("Authentication is not configured")]
    NotConfigured,
}

impl error::ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: "unauthorized".to_string(),
            message: self.to_string(),
            status_code: self.status_code().as_u16(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// HS256 token issuer and verifier
#[derive(Clone)]
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtAuth {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Issue a token for a freshly registered user
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<AuthContext, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        let user_id = data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidSubject)?;

        Ok(AuthContext::new(user_id))
    }
}

impl FromRequest for AuthContext {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthContext, AuthError> {
    let auth = req
        .app_data::<web::Data<JwtAuth>>()
        .ok_or(AuthError::NotConfigured)?;

    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MalformedHeader)?;

    auth.verify(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_issue_then_verify() {
        let auth = JwtAuth::new("secret", 3600);
        let token = auth.issue(42).unwrap();
        assert_eq!(auth.verify(&token).unwrap().user_id(), 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtAuth::new("secret", 3600).issue(42).unwrap();
        let err = JwtAuth::new("other", 3600).verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_oversized_ttl_saturates() {
        let auth = JwtAuth::new("secret", u64::MAX);
        assert_eq!(auth.ttl_secs, i64::MAX);

        let token = auth.issue(7).unwrap();
        assert_eq!(auth.verify(&token).unwrap().user_id(), 7);
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = JwtAuth {
            ttl_secs: -3600,
            ..JwtAuth::new("secret", 0)
        };
        let token = auth.issue(42).unwrap();
        assert!(auth.verify(&token).is_err());
    }

    #[test]
    fn test_extractor_reads_bearer_header() {
        let auth = JwtAuth::new("secret", 3600);
        let token = auth.issue(7).unwrap();

        let req = TestRequest::default()
            .app_data(web::Data::new(auth))
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_http_request();

        assert_eq!(authenticate(&req).unwrap(), AuthContext::new(7));
    }

    #[test]
    fn test_extractor_rejects_missing_and_malformed() {
        let auth = web::Data::new(JwtAuth::new("secret", 3600));

        let req = TestRequest::default().app_data(auth.clone()).to_http_request();
        assert!(matches!(authenticate(&req), Err(AuthError::MissingToken)));

        let req = TestRequest::default()
            .app_data(auth)
            .insert_header((header::AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert!(matches!(authenticate(&req), Err(AuthError::MalformedHeader)));
    }
}
