//! # App Synthesis
//!
//! [`synthesize_app`] turns an app's pipeline roots into deployable
//! artifacts. Per pipeline it layers the configuration cascade onto the
//! root props, propagates shared Kafka brokers into source and sink
//! nodes, re-resolves plugin component kinds, and runs the plugin tree
//! transformers. Plugin component registrations are scoped to the call;
//! the session registry is restored before returning.

use std::fmt;
use std::sync::Arc;

use sluice_core::operator::PipelineProps;
use sluice_core::tree::{map_tree, rekind_tree};
use sluice_core::{
    resolve_plugins, AfterSynthHookContext, Children, ConstructNode, NodeKind, OperatorProps,
    PipelineArtifact, Plugin, PropValue, ResolvedPluginChain, SynthHookContext, SynthSession,
};
use tracing::info;

use crate::config::AppConfig;
use crate::environment::{resolve_environment, Environment};
use crate::error::SynthError;

/// Options for [`synthesize_app`].
#[derive(Default)]
pub struct SynthOptions {
    /// App-wide configuration cascaded onto every pipeline.
    pub config: Option<AppConfig>,
    /// Deployment environment supplying per-pipeline overrides.
    pub env: Option<Environment>,
    /// Plugins for this synthesis, run after any config plugins.
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl fmt::Debug for SynthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthOptions")
            .field("config", &self.config)
            .field("env", &self.env.as_ref().map(|env| &env.name))
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A synthesized app: its name and pipeline artifacts.
#[derive(Debug, Clone)]
pub struct AppSynthResult {
    /// App name.
    pub app_name: String,
    /// Synthesized pipelines, in authoring order.
    pub pipelines: Vec<PipelineArtifact>,
}

/// Synthesizes an app from its pipeline roots.
///
/// Children that are not `Pipeline` nodes are ignored. Config plugins
/// run before option plugins. `before_synth` hooks observe the authored
/// roots; `after_synth` hooks additionally observe the finished
/// artifacts.
///
/// # Errors
///
/// Returns [`SynthError::Plugin`] when the combined plugin set fails to
/// resolve.
pub fn synthesize_app(
    session: &mut SynthSession,
    name: &str,
    children: impl Into<Children>,
    options: &SynthOptions,
) -> Result<AppSynthResult, SynthError> {
    let pipelines: Vec<Arc<ConstructNode>> = children
        .into()
        .flatten()
        .into_iter()
        .filter(|node| node.kind == NodeKind::Pipeline)
        .collect();

    let mut combined: Vec<Arc<dyn Plugin>> = Vec::new();
    if let Some(config) = &options.config {
        combined.extend(config.plugins.iter().cloned());
    }
    combined.extend(options.plugins.iter().cloned());

    let chain = if combined.is_empty() {
        ResolvedPluginChain::empty()
    } else {
        resolve_plugins(&combined)?
    };

    let snapshot = session.component_snapshot();
    if chain.has_components() {
        session.register_chain(&chain);
    }

    chain.before_synth(&SynthHookContext {
        app_name: name,
        pipelines: &pipelines,
    });

    let mut artifacts = Vec::with_capacity(pipelines.len());
    for pipeline in &pipelines {
        let mut tree = apply_config_cascade(pipeline, options);
        tree = propagate_bootstrap_servers(&tree, options.config.as_ref());
        if chain.has_components() {
            tree = rekind_tree(session, &tree);
        }
        tree = chain.transform_tree(session, tree);

        artifacts.push(PipelineArtifact {
            name: pipeline_name(&tree),
            tree,
        });
    }

    chain.after_synth(&AfterSynthHookContext {
        app_name: name,
        pipelines: &pipelines,
        results: &artifacts,
    });

    session.restore_components(snapshot);

    info!(app = name, pipelines = artifacts.len(), "synthesized app");

    Ok(AppSynthResult {
        app_name: name.to_string(),
        pipelines: artifacts,
    })
}

/// Fills unset pipeline props from the config and the environment.
///
/// Config settings apply first, then environment overrides. Both fill
/// only what the pipeline left unset, so explicit props always win.
fn apply_config_cascade(
    pipeline: &Arc<ConstructNode>,
    options: &SynthOptions,
) -> Arc<ConstructNode> {
    let OperatorProps::Pipeline(props) = &pipeline.props else {
        return Arc::clone(pipeline);
    };

    let mut merged: PipelineProps = props.clone();

    let config_namespace = options
        .config
        .as_ref()
        .and_then(|config| config.kubernetes.as_ref())
        .and_then(|kubernetes| kubernetes.namespace.clone());
    if merged.namespace.is_none() {
        merged.namespace = config_namespace;
    }

    if let Some(env) = &options.env {
        let overrides = resolve_environment(&props.name, env);
        if merged.bootstrap_servers.is_none() {
            merged.bootstrap_servers = overrides.bootstrap_servers;
        }
        if merged.namespace.is_none() {
            merged.namespace = overrides.namespace;
        }
        if merged.parallelism.is_none() {
            merged.parallelism = overrides.parallelism;
        }
    }

    if merged == *props {
        return Arc::clone(pipeline);
    }

    Arc::new(ConstructNode {
        id: pipeline.id.clone(),
        kind: pipeline.kind,
        props: OperatorProps::Pipeline(merged),
        children: pipeline.children.clone(),
    })
}

/// Injects the config broker list into Kafka sources and sinks that do
/// not carry their own.
fn propagate_bootstrap_servers(
    root: &Arc<ConstructNode>,
    config: Option<&AppConfig>,
) -> Arc<ConstructNode> {
    let Some(brokers) = config
        .and_then(|config| config.kafka.as_ref())
        .and_then(|kafka| kafka.bootstrap_servers.as_deref())
    else {
        return Arc::clone(root);
    };

    map_tree(root, &mut |node| {
        let props = match &node.props {
            OperatorProps::KafkaSource(source) if source.bootstrap_servers.is_none() => {
                let mut source = source.clone();
                source.bootstrap_servers = Some(brokers.to_string());
                OperatorProps::KafkaSource(source)
            }
            OperatorProps::KafkaSink(sink) if sink.bootstrap_servers.is_none() => {
                let mut sink = sink.clone();
                sink.bootstrap_servers = Some(brokers.to_string());
                OperatorProps::KafkaSink(sink)
            }
            _ => return node,
        };
        Arc::new(ConstructNode {
            id: node.id.clone(),
            kind: node.kind,
            props,
            children: node.children.clone(),
        })
    })
}

/// Resolves the artifact name from a transformed pipeline root.
///
/// Plugin transformers may replace the root with a custom component, so
/// a `name` prop in the bag is honored. Anything else falls back to the
/// node id.
fn pipeline_name(tree: &Arc<ConstructNode>) -> String {
    match &tree.props {
        OperatorProps::Pipeline(props) => props.name.clone(),
        OperatorProps::Custom(custom) => match custom.props.get("name") {
            Some(PropValue::Str(name)) => name.clone(),
            _ => tree.id.to_string(),
        },
        _ => tree.id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::components::{console_sink, kafka_sink, kafka_source, pipeline};
    use crate::environment::PipelineOverrides;
    use sluice_core::operator::{ConsoleSinkProps, KafkaSinkProps, KafkaSourceProps};
    use sluice_core::{FieldDefinition, FxIndexMap, SchemaDefinition};

    fn order_schema() -> SchemaDefinition {
        SchemaDefinition::builder()
            .field("id", FieldDefinition::bigint())
            .build()
            .unwrap()
    }

    fn pipeline_props(name: &str) -> PipelineProps {
        PipelineProps {
            name: name.to_string(),
            mode: None,
            parallelism: None,
            checkpoint: None,
            state_backend: None,
            state_ttl: None,
            restart_strategy: None,
            namespace: None,
            bootstrap_servers: None,
        }
    }

    fn source_props(topic: &str) -> KafkaSourceProps {
        KafkaSourceProps {
            topic: topic.to_string(),
            bootstrap_servers: None,
            format: None,
            schema: order_schema(),
            watermark: None,
            startup_mode: None,
            consumer_group: None,
            parallelism: None,
        }
    }

    struct RecordingPlugin {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Plugin for RecordingPlugin {
        fn name(&self) -> &str {
            "recorder"
        }

        fn before_synth(&self, context: &SynthHookContext<'_>) {
            self.log.lock().unwrap().push(format!(
                "before:{}:{}",
                context.app_name,
                context.pipelines.len()
            ));
        }

        fn after_synth(&self, context: &AfterSynthHookContext<'_>) {
            self.log
                .lock()
                .unwrap()
                .push(format!("after:{}", context.results.len()));
        }
    }

    struct ComponentPlugin;

    impl Plugin for ComponentPlugin {
        fn name(&self) -> &str {
            "components"
        }

        fn component_kinds(&self) -> Vec<(String, NodeKind)> {
            vec![("Enrich".to_string(), NodeKind::Source)]
        }
    }

    #[test]
    fn test_cascade_fills_unset_pipeline_settings() {
        let mut session = SynthSession::new();
        let root = pipeline(&mut session, pipeline_props("orders"), ()).unwrap();

        let config = AppConfig::builder().namespace("streaming").build().unwrap();
        let mut overrides = FxIndexMap::default();
        overrides.insert(
            "*".to_string(),
            PipelineOverrides {
                parallelism: Some(4),
                namespace: None,
            },
        );
        let env = Environment {
            name: "staging".to_string(),
            kafka: None,
            kubernetes: None,
            pipelines: overrides,
        };
        let options = SynthOptions {
            config: Some(config),
            env: Some(env),
            plugins: vec![],
        };

        let result = synthesize_app(&mut session, "shop", root, &options).unwrap();
        let OperatorProps::Pipeline(props) = &result.pipelines[0].tree.props else {
            panic!("expected pipeline props");
        };

        assert_eq!(props.namespace.as_deref(), Some("streaming"));
        assert_eq!(props.parallelism, Some(4));
    }

    #[test]
    fn test_cascade_keeps_explicit_settings() {
        let mut session = SynthSession::new();
        let mut explicit = pipeline_props("orders");
        explicit.namespace = Some("custom".to_string());
        let root = pipeline(&mut session, explicit, ()).unwrap();

        let config = AppConfig::builder().namespace("streaming").build().unwrap();
        let options = SynthOptions {
            config: Some(config),
            env: None,
            plugins: vec![],
        };

        let result = synthesize_app(&mut session, "shop", root, &options).unwrap();
        let OperatorProps::Pipeline(props) = &result.pipelines[0].tree.props else {
            panic!("expected pipeline props");
        };

        assert_eq!(props.namespace.as_deref(), Some("custom"));
    }

    #[test]
    fn test_bootstrap_servers_propagate_to_kafka_nodes() {
        let mut session = SynthSession::new();
        let sink = kafka_sink(
            &mut session,
            None,
            KafkaSinkProps {
                topic: "totals".to_string(),
                bootstrap_servers: Some("own:9092".to_string()),
                format: None,
                key_by: vec![],
                parallelism: None,
            },
            (),
        );
        let source = kafka_source(&mut session, None, source_props("orders"), sink);
        let root = pipeline(&mut session, pipeline_props("orders"), source).unwrap();

        let config = AppConfig::builder()
            .bootstrap_servers("kafka:9092")
            .build()
            .unwrap();
        let options = SynthOptions {
            config: Some(config),
            env: None,
            plugins: vec![],
        };

        let result = synthesize_app(&mut session, "shop", root, &options).unwrap();
        let source = &result.pipelines[0].tree.children[0];
        let OperatorProps::KafkaSource(resolved_source) = &source.props else {
            panic!("expected source props");
        };
        let OperatorProps::KafkaSink(resolved_sink) = &source.children[0].props else {
            panic!("expected sink props");
        };

        assert_eq!(
            resolved_source.bootstrap_servers.as_deref(),
            Some("kafka:9092")
        );
        assert_eq!(resolved_sink.bootstrap_servers.as_deref(), Some("own:9092"));
    }

    #[test]
    fn test_component_registrations_are_scoped() {
        let mut session = SynthSession::new();
        let root = pipeline(&mut session, pipeline_props("orders"), ()).unwrap();

        let options = SynthOptions {
            config: None,
            env: None,
            plugins: vec![Arc::new(ComponentPlugin)],
        };
        synthesize_app(&mut session, "shop", root, &options).unwrap();

        assert!(session.component_snapshot().is_empty());
    }

    #[test]
    fn test_hooks_observe_app_and_results() {
        let mut session = SynthSession::new();
        let root = pipeline(&mut session, pipeline_props("orders"), ()).unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let options = SynthOptions {
            config: None,
            env: None,
            plugins: vec![Arc::new(RecordingPlugin {
                log: Arc::clone(&log),
            })],
        };
        synthesize_app(&mut session, "shop", root, &options).unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.as_slice(), ["before:shop:1", "after:1"]);
    }

    #[test]
    fn test_non_pipeline_children_are_ignored() {
        let mut session = SynthSession::new();
        let stray = console_sink(&mut session, None, ConsoleSinkProps::default(), ());
        let root = pipeline(&mut session, pipeline_props("orders"), ()).unwrap();

        let result = synthesize_app(
            &mut session,
            "shop",
            vec![stray, root],
            &SynthOptions::default(),
        )
        .unwrap();

        assert_eq!(result.pipelines.len(), 1);
        assert_eq!(result.pipelines[0].name, "orders");
    }
}
