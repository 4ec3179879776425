use crate::error::{config_error, env_error, AppResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::collections::HashMap;
use std::env;
use std::fs;

/// Default language model used for intent extraction
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Timezone assumed for relative date phrases when none is configured
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Main configuration structure for the service
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenAI API key
    pub openai_api_key: String,
    /// OpenAI chat model name
    pub openai_model: String,
    /// Secret shared with the identity service for JWT verification
    pub jwt_secret: String,
    /// Lifetime of tokens minted by this service, in minutes
    pub token_expiration_minutes: i64,
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Redirect URI registered for the OAuth consent flow
    pub google_redirect_uri: String,
    /// Calendar that events are written to
    pub google_calendar_id: String,
    /// Redis connection string
    pub redis_url: String,
    /// IANA timezone used to pin "today" and to read offset-less timestamps
    pub timezone: String,
    /// HTTP port
    pub port: u16,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY").map_err(|_| env_error("OPENAI_API_KEY"))?;
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| env_error("JWT_SECRET"))?;
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;
        let google_redirect_uri =
            env::var("GOOGLE_REDIRECT_URI").map_err(|_| env_error("GOOGLE_REDIRECT_URI"))?;

        let openai_model =
            env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());
        let google_calendar_id =
            env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| "primary".to_string());
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());

        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| config_error("Invalid PORT format"))?,
            Err(_) => 5000,
        };

        let token_expiration_minutes = match env::var("TOKEN_EXPIRATION_MINUTES") {
            Ok(value) => value
                .parse::<i64>()
                .map_err(|_| config_error("Invalid TOKEN_EXPIRATION_MINUTES format"))?,
            Err(_) => 60,
        };

        // Initialize default components
        let mut components = HashMap::new();
        components.insert("google_calendar".to_string(), true);

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string("config/components.toml") {
            let file_components = toml::from_str::<HashMap<String, bool>>(&content)?;
            for (key, value) in file_components {
                components.insert(key, value);
            }
        }

        let config = Config {
            openai_api_key,
            openai_model,
            jwt_secret,
            token_expiration_minutes,
            google_client_id,
            google_client_secret,
            google_redirect_uri,
            google_calendar_id,
            redis_url,
            timezone,
            port,
            components,
        };

        // Fail early on an unknown timezone
        config.tz()?;

        Ok(config)
    }

    /// Parsed timezone
    pub fn tz(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Invalid timezone: {}", self.timezone)))
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }
}
