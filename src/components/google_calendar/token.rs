use crate::error::{google_calendar_error, AppResult};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{error, info};
use url::Url;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// OAuth2 client for obtaining users' calendar access tokens
#[derive(Clone)]
pub struct OAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    client: Client,
}

impl OAuthClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            client: Client::new(),
        }
    }

    /// Consent page URL; offline access so the callback also yields a refresh token
    pub fn authorization_url(&self) -> AppResult<String> {
        let url = Url::parse_with_params(
            AUTH_ENDPOINT,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", CALENDAR_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| google_calendar_error(&format!("Failed to build auth URL: {}", e)))?;

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> AppResult<Value> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let token = self.request_token(&params, "exchange code").await?;
        info!("Exchanged authorization code for calendar tokens");
        Ok(with_expiry(token))
    }

    /// Refresh an expired access token
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<Value> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let new_token = self.request_token(&params, "refresh token").await?;

        // Google omits the refresh token on refresh; carry the old one forward
        let mut token = with_expiry(new_token);
        if token.get("refresh_token").is_none() {
            token["refresh_token"] = json!(refresh_token);
        }
        Ok(token)
    }

    async fn request_token(&self, params: &[(&str, &str)], action: &str) -> AppResult<Value> {
        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(params)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            error!("OAuth {} failed: HTTP {}", action, status);
            return Err(google_calendar_error(&format!(
                "Failed to {}: HTTP {} - {}",
                action, status, error_body
            )));
        }

        let token: Value = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse token response: {}", e)))?;

        if token.get("access_token").is_none() {
            return Err(google_calendar_error(
                "Token response missing 'access_token' field",
            ));
        }

        Ok(token)
    }
}

/// Add an absolute `expires_at` next to Google's relative `expires_in`
fn with_expiry(mut token: Value) -> Value {
    let expires_in = token
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(3600);
    token["expires_at"] = json!(Utc::now().timestamp() + expires_in);
    token
}
