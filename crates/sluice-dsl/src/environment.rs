//! # Deployment Environments
//!
//! An [`Environment`] describes one deployment target: shared infra
//! defaults plus per-pipeline overrides. [`resolve_environment`] collapses
//! an environment into the effective overrides for a single pipeline,
//! layering infra defaults, wildcard entries, and named entries in that
//! order so the most specific setting wins.

use sluice_core::FxIndexMap;

use crate::config::{KafkaDefaults, KubernetesDefaults};

/// Overrides an environment applies to one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOverrides {
    /// Override for the pipeline's parallelism.
    pub parallelism: Option<u32>,
    /// Override for the target namespace.
    pub namespace: Option<String>,
}

/// One deployment target.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Environment name, e.g. `staging`.
    pub name: String,
    /// Kafka defaults for this environment.
    pub kafka: Option<KafkaDefaults>,
    /// Kubernetes defaults for this environment.
    pub kubernetes: Option<KubernetesDefaults>,
    /// Per-pipeline overrides keyed by pipeline name. The key `*` applies
    /// to every pipeline and is layered under named entries.
    pub pipelines: FxIndexMap<String, PipelineOverrides>,
}

/// Effective settings for one pipeline in one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedOverrides {
    /// Kafka broker list.
    pub bootstrap_servers: Option<String>,
    /// Kubernetes namespace.
    pub namespace: Option<String>,
    /// Pipeline parallelism.
    pub parallelism: Option<u32>,
}

/// Resolves the effective overrides for `pipeline_name` in `env`.
///
/// Infra defaults seed the result, then the `*` entry, then the entry
/// matching `pipeline_name`. Later layers overwrite only the settings
/// they actually carry.
#[must_use]
pub fn resolve_environment(pipeline_name: &str, env: &Environment) -> ResolvedOverrides {
    let mut resolved = ResolvedOverrides::default();

    if let Some(kafka) = &env.kafka {
        resolved.bootstrap_servers = kafka.bootstrap_servers.clone();
    }
    if let Some(kubernetes) = &env.kubernetes {
        resolved.namespace = kubernetes.namespace.clone();
    }

    for key in ["*", pipeline_name] {
        let Some(overrides) = env.pipelines.get(key) else {
            continue;
        };
        if let Some(parallelism) = overrides.parallelism {
            resolved.parallelism = Some(parallelism);
        }
        if let Some(namespace) = &overrides.namespace {
            resolved.namespace = Some(namespace.clone());
        }
    }

    resolved
}
