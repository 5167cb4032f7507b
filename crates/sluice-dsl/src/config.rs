//! # App Configuration
//!
//! Shared defaults an app applies to its pipelines during synthesis:
//! Kafka brokers, runtime knobs, Kubernetes deployment settings, and the
//! plugin set. Built through [`AppConfig::builder`], which validates the
//! plugin list and the runtime knobs.

use std::fmt;
use std::sync::Arc;

use fxhash::FxHashSet;
use sluice_core::Plugin;
use thiserror::Error;

/// Errors raised while building an [`AppConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Two configured plugins share a name.
    #[error("Duplicate plugin name '{name}' in config.plugins")]
    DuplicatePlugin {
        /// The repeated name.
        name: String,
    },

    /// The batch size is zero.
    #[error("runtime.batch_size must be a positive number")]
    InvalidBatchSize,
}

/// Kafka connection defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KafkaDefaults {
    /// Broker list, e.g. `kafka:9092`.
    pub bootstrap_servers: Option<String>,
}

/// Runtime tuning defaults, carried for the deployment tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeDefaults {
    /// Rows per execution batch.
    pub batch_size: Option<u32>,
    /// Default checkpoint interval, e.g. `30s`.
    pub checkpoint_interval: Option<String>,
}

/// Kubernetes deployment defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubernetesDefaults {
    /// Target namespace.
    pub namespace: Option<String>,
    /// Container image.
    pub image: Option<String>,
}

/// Validated app-wide configuration.
#[derive(Clone, Default)]
pub struct AppConfig {
    /// Kafka connection defaults.
    pub kafka: Option<KafkaDefaults>,
    /// Runtime tuning defaults.
    pub runtime: Option<RuntimeDefaults>,
    /// Kubernetes deployment defaults.
    pub kubernetes: Option<KubernetesDefaults>,
    /// Plugins applied to every synthesis using this config.
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl AppConfig {
    /// Starts a new config builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("kafka", &self.kafka)
            .field("runtime", &self.runtime)
            .field("kubernetes", &self.kubernetes)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Staged [`AppConfig`] builder.
#[derive(Default)]
pub struct AppConfigBuilder {
    kafka: Option<KafkaDefaults>,
    runtime: Option<RuntimeDefaults>,
    kubernetes: Option<KubernetesDefaults>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl AppConfigBuilder {
    /// Sets the default Kafka broker list.
    #[must_use]
    pub fn bootstrap_servers(mut self, servers: impl Into<String>) -> Self {
        self.kafka
            .get_or_insert_with(KafkaDefaults::default)
            .bootstrap_servers = Some(servers.into());
        self
    }

    /// Sets the runtime batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.runtime
            .get_or_insert_with(RuntimeDefaults::default)
            .batch_size = Some(batch_size);
        self
    }

    /// Sets the default checkpoint interval.
    #[must_use]
    pub fn checkpoint_interval(mut self, interval: impl Into<String>) -> Self {
        self.runtime
            .get_or_insert_with(RuntimeDefaults::default)
            .checkpoint_interval = Some(interval.into());
        self
    }

    /// Sets the Kubernetes namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.kubernetes
            .get_or_insert_with(KubernetesDefaults::default)
            .namespace = Some(namespace.into());
        self
    }

    /// Sets the container image.
    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.kubernetes
            .get_or_insert_with(KubernetesDefaults::default)
            .image = Some(image.into());
        self
    }

    /// Appends a plugin.
    #[must_use]
    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Validates and builds the config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicatePlugin`] when two plugins share a
    /// name and [`ConfigError::InvalidBatchSize`] for a zero batch size.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let mut seen = FxHashSet::default();
        for plugin in &self.plugins {
            if !seen.insert(plugin.name().to_string()) {
                return Err(ConfigError::DuplicatePlugin {
                    name: plugin.name().to_string(),
                });
            }
        }

        if let Some(runtime) = &self.runtime {
            if runtime.batch_size == Some(0) {
                return Err(ConfigError::InvalidBatchSize);
            }
        }

        Ok(AppConfig {
            kafka: self.kafka,
            runtime: self.runtime,
            kubernetes: self.kubernetes,
            plugins: self.plugins,
        })
    }
}
