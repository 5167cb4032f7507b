//! # Test Helpers
//!
//! Unit-test entry points that mirror the synthesis flow for one
//! pipeline, without the app-level configuration cascade. [`synth`]
//! runs the plugin chain and lowers the result into a graph;
//! [`validate`] checks the authored tree and splits the diagnostics by
//! severity.

use std::sync::Arc;

use sluice_core::tree::rekind_tree;
use sluice_core::{
    resolve_plugins, ConstructNode, PipelineGraph, Plugin, ResolvedPluginChain, Severity,
    SynthSession, ValidationDiagnostic,
};

use crate::error::SynthError;

/// Outcome of [`synth`]: the transformed tree and its graph.
#[derive(Debug)]
pub struct SynthResult {
    /// Pipeline tree after component rekinding and plugin transforms.
    pub tree: Arc<ConstructNode>,
    /// Graph lowered from the transformed tree.
    pub graph: PipelineGraph,
}

/// Synthesizes a single pipeline for tests.
///
/// Applies plugin component kinds and tree transformers, then lowers
/// the result into a [`PipelineGraph`]. Component registrations are
/// scoped to the call.
///
/// # Errors
///
/// Returns [`SynthError::Plugin`] when the plugin set fails to resolve.
pub fn synth(
    session: &mut SynthSession,
    pipeline: &Arc<ConstructNode>,
    plugins: &[Arc<dyn Plugin>],
) -> Result<SynthResult, SynthError> {
    let chain = if plugins.is_empty() {
        ResolvedPluginChain::empty()
    } else {
        resolve_plugins(plugins)?
    };

    let snapshot = session.component_snapshot();
    if chain.has_components() {
        session.register_chain(&chain);
    }

    let mut tree = Arc::clone(pipeline);
    if chain.has_components() {
        tree = rekind_tree(session, &tree);
    }
    tree = chain.transform_tree(session, tree);

    let graph = PipelineGraph::from_tree(&tree);

    session.restore_components(snapshot);

    Ok(SynthResult { tree, graph })
}

/// Outcome of [`validate`]: diagnostics split by severity.
#[derive(Debug, Clone)]
pub struct ValidateResult {
    /// Findings that fail compilation.
    pub errors: Vec<ValidationDiagnostic>,
    /// Non-fatal findings.
    pub warnings: Vec<ValidationDiagnostic>,
}

/// Validates an authored pipeline tree for tests.
///
/// Lowers the tree exactly as authored, with no plugin transforms, and
/// runs the builtin structural checks plus any plugin validators.
///
/// # Errors
///
/// Returns [`SynthError::Plugin`] when the plugin set fails to resolve.
pub fn validate(
    pipeline: &Arc<ConstructNode>,
    plugins: &[Arc<dyn Plugin>],
) -> Result<ValidateResult, SynthError> {
    let chain = if plugins.is_empty() {
        ResolvedPluginChain::empty()
    } else {
        resolve_plugins(plugins)?
    };

    let graph = PipelineGraph::from_tree(pipeline);
    let diagnostics = graph.validate_with_plugins(pipeline, &chain);

    let (errors, warnings) = diagnostics
        .into_iter()
        .partition(|diagnostic| diagnostic.severity == Severity::Error);

    Ok(ValidateResult { errors, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{console_sink, custom, kafka_source, pipeline};
    use sluice_core::operator::{
        ConsoleSinkProps, CustomProps, KafkaSourceProps, PipelineProps, PropBag,
    };
    use sluice_core::{FieldDefinition, NodeKind, SchemaDefinition};

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

    struct EnrichPlugin;

    impl Plugin for EnrichPlugin {
        fn name(&self) -> &str {
            "enrich"
        }

        fn component_kinds(&self) -> Vec<(String, NodeKind)> {
            vec![("Enrich".to_string(), NodeKind::Source)]
        }
    }

    struct WarningPlugin;

    impl Plugin for WarningPlugin {
        fn name(&self) -> &str {
            "warn"
        }

        fn validate(
            &self,
            _tree: &Arc<ConstructNode>,
            _existing: &[ValidationDiagnostic],
        ) -> Vec<ValidationDiagnostic> {
            vec![ValidationDiagnostic::warning("missing watermark")]
        }
    }

    #[test]
    fn test_synth_lowers_the_tree() {
        let mut session = SynthSession::new();
        let sink = console_sink(&mut session, None, ConsoleSinkProps::default(), ());
        let source = kafka_source(&mut session, None, source_props("orders"), sink);
        let root = pipeline(&mut session, pipeline_props("orders"), source).unwrap();

        let result = synth(&mut session, &root, &[]).unwrap();

        assert_eq!(result.graph.node_count(), 3);
        assert!(Arc::ptr_eq(&result.tree, &root));
    }

    #[test]
    fn test_synth_rekinds_plugin_components() {
        let mut session = SynthSession::new();
        let node = custom(
            &mut session,
            CustomProps {
                component: "Enrich".to_string(),
                schema: None,
                props: PropBag::default(),
                parallelism: None,
            },
            (),
        );
        let root = pipeline(&mut session, pipeline_props("orders"), node).unwrap();

        let plugins: Vec<Arc<dyn Plugin>> = vec![Arc::new(EnrichPlugin)];
        let result = synth(&mut session, &root, &plugins).unwrap();

        assert_eq!(result.tree.children[0].kind, NodeKind::Source);
        assert!(session.component_snapshot().is_empty());
    }

    #[test]
    fn test_validate_reports_orphan_sources() {
        let mut session = SynthSession::new();
        let source = kafka_source(&mut session, None, source_props("orders"), ());
        let root = pipeline(&mut session, pipeline_props("orders"), source).unwrap();

        let result = validate(&root, &[]).unwrap();

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.starts_with("Orphan source"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_splits_plugin_warnings() {
        let mut session = SynthSession::new();
        let sink = console_sink(&mut session, None, ConsoleSinkProps::default(), ());
        let source = kafka_source(&mut session, None, source_props("orders"), sink);
        let root = pipeline(&mut session, pipeline_props("orders"), source).unwrap();

        let plugins: Vec<Arc<dyn Plugin>> = vec![Arc::new(WarningPlugin)];
        let result = validate(&root, &plugins).unwrap();

        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].message, "missing watermark");
    }
}
