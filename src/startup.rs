use planmate::components::google_calendar::{GoogleCalendar, OAuthClient, SyncedCalendar};
use planmate::components::storage::{ConversationLog, EventStore, InMemoryStore, RedisStore};
use planmate::components::ComponentManager;
use planmate::config::Config;
use planmate::error::{config_error, Error};
use planmate::http::auth::{AuthConfig, AuthService};
use planmate::http::{self, AppState};
use planmate::intent::{IntentResolver, OpenAiModel};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::shutdown;

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Connect to Redis, or keep everything in memory when it is unreachable
async fn connect_storage(redis_url: &str) -> (Arc<dyn ConversationLog>, Arc<dyn EventStore>) {
    match RedisStore::connect(redis_url).await {
        Ok(store) => {
            info!("Connected to Redis successfully");
            let store = Arc::new(store);
            let log: Arc<dyn ConversationLog> = store.clone();
            let events: Arc<dyn EventStore> = store;
            (log, events)
        }
        Err(e) => {
            error!("Failed to connect to Redis: {}", e);
            info!("Using in-memory storage as fallback");
            let store = Arc::new(InMemoryStore::new());
            let log: Arc<dyn ConversationLog> = store.clone();
            let events: Arc<dyn EventStore> = store;
            (log, events)
        }
    }
}

/// Wire the services together and serve the HTTP API until shutdown
pub async fn start_server(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let settings = config.read().await.clone();
    let timezone = settings.tz()?;

    let (log, events) = connect_storage(&settings.redis_url).await;

    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(GoogleCalendar::new());
    component_manager.init_all().await?;

    let calendar_handle = match component_manager.get::<GoogleCalendar>() {
        Some(component) => component.get_handle().await,
        None => None,
    };
    let Some(calendar_handle) = calendar_handle else {
        return Err(config_error("Google Calendar component is not available").into());
    };

    let calendar = Arc::new(SyncedCalendar::new(calendar_handle, events));
    let model = Arc::new(OpenAiModel::new(
        &settings.openai_api_key,
        settings.openai_model.clone(),
    ));
    info!("Using language model {}", model.model());

    let resolver = Arc::new(IntentResolver::new(
        model,
        calendar.clone(),
        log.clone(),
        timezone,
    ));

    let state = AppState {
        resolver,
        calendar,
        log,
        auth_service: Arc::new(AuthService::new(AuthConfig {
            jwt_secret: settings.jwt_secret.clone(),
            token_expiration_minutes: settings.token_expiration_minutes,
        })),
        oauth: Arc::new(OAuthClient::new(
            settings.google_client_id.clone(),
            settings.google_client_secret.clone(),
            settings.google_redirect_uri.clone(),
        )),
    };
    let app = http::router(state);

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    let component_manager = Arc::new(component_manager);
    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components).await;
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::from)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_recv.await;
            info!("Received shutdown signal, stopping server...");
        })
        .await
        .map_err(Error::from)?;

    Ok(())
}
