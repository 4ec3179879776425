use crate::config::Config;
use crate::error::AppResult;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

pub mod google_calendar;
pub mod storage;

pub use google_calendar::GoogleCalendarHandle;

/// A long-running part of the service with an explicit start and stop
#[async_trait]
pub trait Component: Send + Sync + Any {
    /// Key used in `config/components.toml`
    fn name(&self) -> &'static str;

    async fn init(&self, config: Arc<RwLock<Config>>) -> AppResult<()>;

    async fn shutdown(&self) -> AppResult<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Owns every registered component and drives their lifecycle
pub struct ComponentManager {
    components: Vec<Box<dyn Component>>,
    config: Arc<RwLock<Config>>,
}

impl ComponentManager {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            components: Vec::new(),
            config,
        }
    }

    pub fn register<T: Component>(&mut self, component: T) {
        info!("Registering component: {}", component.name());
        self.components.push(Box::new(component));
    }

    /// Start the enabled components. A component that fails to start is
    /// logged and left uninitialized; the rest still start.
    pub async fn init_all(&self) -> AppResult<()> {
        for component in &self.components {
            let name = component.name();
            if !self.config.read().await.is_component_enabled(name) {
                info!("Component {} is disabled, skipping", name);
                continue;
            }

            match component.init(Arc::clone(&self.config)).await {
                Ok(()) => info!("Component {} initialized", name),
                Err(e) => error!("Error initializing component {}: {:?}", name, e),
            }
        }

        Ok(())
    }

    /// Stop every component, in registration order
    pub async fn shutdown_all(&self) -> AppResult<()> {
        info!("Shutting down {} component(s)", self.components.len());

        for component in &self.components {
            if let Err(e) = component.shutdown().await {
                error!("Error shutting down component {}: {:?}", component.name(), e);
            }
        }

        Ok(())
    }

    pub fn get_component_by_name(&self, name: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// The registered component of type `T`
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<T>())
    }
}
