//! Service-registry collaborator.
//!
//! Registration protocols are out of scope; the server only needs to honour
//! the `registry.enabled` flag and report the state on the health endpoint.
//! [`NoopDiscoveryClient`] is the only client shipped.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RegistryConfig;

/// Instance announced to a discovery server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    pub name: String,
    pub address: String,
}

#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    async fn register(&self, instance: &ServiceInstance) -> anyhow::Result<()>;

    async fn deregister(&self, instance: &ServiceInstance) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

/// Accepts every call and talks to nobody
#[derive(Debug, Default)]
pub struct NoopDiscoveryClient;

#[async_trait]
impl DiscoveryClient for NoopDiscoveryClient {
    async fn register(&self, _instance: &ServiceInstance) -> anyhow::Result<()> {
        Ok(())
    }

    async fn deregister(&self, _instance: &ServiceInstance) -> anyhow::Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationState {
    /// `registry.enabled = false`
    Disabled,
    Pending,
    Registered,
    Deregistered,
    Failed,
}

impl RegistrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::Disabled => "disabled",
            RegistrationState::Pending => "pending",
            RegistrationState::Registered => "registered",
            RegistrationState::Deregistered => "deregistered",
            RegistrationState::Failed => "failed",
        }
    }
}

/// Registration lifecycle around a [`DiscoveryClient`]
#[derive(Clone)]
pub struct Registry {
    client: Arc<dyn DiscoveryClient>,
    enabled: bool,
    state: Arc<RwLock<RegistrationState>>,
}

impl Registry {
    pub fn new(client: Arc<dyn DiscoveryClient>, config: &RegistryConfig) -> Self {
        let state = if config.enabled {
            RegistrationState::Pending
        } else {
            RegistrationState::Disabled
        };
        Self {
            client,
            enabled: config.enabled,
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(Arc::new(NoopDiscoveryClient), config)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn client_name(&self) -> &'static str {
        self.client.name()
    }

    pub fn state(&self) -> RegistrationState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or(RegistrationState::Failed)
    }

    fn set_state(&self, state: RegistrationState) {
        if let Ok(mut guard) = self.state.write() {
            *guard = state;
        }
    }

    /// Announce the instance. A failure is logged and recorded, never fatal.
    pub async fn register(&self, instance: &ServiceInstance) {
        if !self.enabled {
            info!("Service registry disabled, skipping registration");
            return;
        }

        match self.client.register(instance).await {
            Ok(()) => {
                info!(
                    client = self.client.name(),
                    service = %instance.name,
                    address = %instance.address,
                    "Registered with service registry"
                );
                self.set_state(RegistrationState::Registered);
            }
            Err(e) => {
                warn!(client = self.client.name(), error = %e, "Service registration failed");
                self.set_state(RegistrationState::Failed);
            }
        }
    }

    pub async fn deregister(&self, instance: &ServiceInstance) {
        if self.state() != RegistrationState::Registered {
            return;
        }

        match self.client.deregister(instance).await {
            Ok(()) => {
                info!(client = self.client.name(), "Deregistered from service registry");
                self.set_state(RegistrationState::Deregistered);
            }
            Err(e) => {
                warn!(client = self.client.name(), error = %e, "Service deregistration failed");
                self.set_state(RegistrationState::Failed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingClient {
        registered: AtomicUsize,
        deregistered: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DiscoveryClient for CountingClient {
        async fn register(&self, _instance: &ServiceInstance) -> anyhow::Result<()> {
            self.registered.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("registry down");
            }
            Ok(())
        }

        async fn deregister(&self, _instance: &ServiceInstance) -> anyhow::Result<()> {
            self.deregistered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn instance() -> ServiceInstance {
        ServiceInstance {
            name: "confhub-rs".to_string(),
            address: "127.0.0.1:8888".to_string(),
        }
    }

    #[tokio::test]
    async fn test_disabled_registry_skips_client() {
        let client = Arc::new(CountingClient::default());
        let registry = Registry::new(client.clone(), &RegistryConfig { enabled: false });

        registry.register(&instance()).await;
        registry.deregister(&instance()).await;

        assert_eq!(client.registered.load(Ordering::SeqCst), 0);
        assert_eq!(client.deregistered.load(Ordering::SeqCst), 0);
        assert_eq!(registry.state(), RegistrationState::Disabled);
    }

    #[tokio::test]
    async fn test_register_then_deregister() {
        let client = Arc::new(CountingClient::default());
        let registry = Registry::new(client.clone(), &RegistryConfig { enabled: true });
        assert_eq!(registry.state(), RegistrationState::Pending);

        registry.register(&instance()).await;
        assert_eq!(registry.state(), RegistrationState::Registered);

        registry.deregister(&instance()).await;
        assert_eq!(registry.state(), RegistrationState::Deregistered);
        assert_eq!(client.registered.load(Ordering::SeqCst), 1);
        assert_eq!(client.deregistered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_registration_is_recorded() {
        let client = Arc::new(CountingClient {
            fail: true,
            ..CountingClient::default()
        });
        let registry = Registry::new(client.clone(), &RegistryConfig { enabled: true });

        registry.register(&instance()).await;
        registry.deregister(&instance()).await;

        assert_eq!(registry.state(), RegistrationState::Failed);
        assert_eq!(client.deregistered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_noop_client_by_default() {
        let registry = Registry::from_config(&RegistryConfig::default());
        assert!(registry.is_enabled());
        assert_eq!(registry.client_name(), "noop");
    }
}
