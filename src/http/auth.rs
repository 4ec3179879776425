use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

use super::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID); tokens minted as `{ "id": 42 }` are accepted too
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    pub sub: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    #[serde(default)]
    pub iat: usize,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number subject, got {}",
            other
        ))),
    }
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret for signing/verifying tokens
    pub jwt_secret: String,
    /// Token expiration time in minutes
    pub token_expiration_minutes: i64,
}

/// Authentication error
#[derive(Debug, PartialEq)]
pub enum AuthError {
    /// No usable bearer token on the request
    MissingToken,
    /// Token failed verification or has expired
    InvalidToken,
    /// Some other error
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Missing or invalid JWT token" })),
            )
                .into_response(),
            AuthError::InvalidToken => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Invalid or expired JWT token" })),
            )
                .into_response(),
            AuthError::Other(err) => {
                error!("Auth error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Authenticated caller, placed in request extensions by [`require_auth`]
#[derive(Debug, Clone)]
pub struct JwtAuth {
    pub claims: Claims,
}

impl JwtAuth {
    pub fn user_id(&self) -> &str {
        &self.claims.sub
    }
}

/// Pull the bearer token out of the Authorization header
pub fn extract_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::MissingToken)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    Ok(token.to_string())
}

/// Auth service for token operations
pub struct AuthService {
    config: Arc<AuthConfig>,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Mint a token for `user_id`
    pub fn generate_token(&self, user_id: &str, name: Option<String>) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.config.token_expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            name,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Other(format!("Failed to generate token: {}", e)))
    }

    /// Validate a JWT token
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|token_data| token_data.claims)
        .map_err(|e| {
            debug!("JWT validation error: {:?}", e);
            AuthError::InvalidToken
        })
    }
}

/// Middleware rejecting requests without a valid bearer token
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(req.headers())?;
    let claims = state.auth_service.validate_token(&token)?;

    req.extensions_mut().insert(JwtAuth { claims });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_expiration_minutes: 60,
        })
    }

    #[test]
    fn test_token_round_trip() {
        let service = service();
        let token = service.generate_token("user-42", Some("Ada".to_string())).unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service().generate_token("user-42", None).unwrap();
        let other = AuthService::new(AuthConfig {
            jwt_secret: "another-secret".to_string(),
            token_expiration_minutes: 60,
        });
        assert_eq!(other.validate_token(&token).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let expired = AuthService::new(AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_expiration_minutes: -10,
        });
        let token = expired.generate_token("user-42", None).unwrap();
        assert_eq!(service().validate_token(&token).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_numeric_id_claim() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp() as usize;
        let token = encode(
            &Header::default(),
            &json!({ "id": 7, "exp": exp }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert_eq!(service().validate_token(&token).unwrap().sub, "7");
    }

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers).unwrap_err(), AuthError::MissingToken);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers).unwrap_err(), AuthError::MissingToken);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&headers).unwrap_err(), AuthError::MissingToken);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }
}
