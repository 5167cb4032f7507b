//! Sink constructors.

use std::sync::Arc;

use sluice_core::operator::{ConsoleSinkProps, KafkaSinkProps, OperatorProps};
use sluice_core::{Children, ConstructNode, SynthSession};

/// Builds a `KafkaSink` node. The id derives from the explicit `name`
/// or the topic, like [`kafka_source`](super::kafka_source).
pub fn kafka_sink(
    session: &mut SynthSession,
    name: Option<&str>,
    props: KafkaSinkProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    let hint = name.unwrap_or(&props.topic).to_string();
    session.element(OperatorProps::KafkaSink(props), Some(&hint), children)
}

/// Builds a `ConsoleSink` node. Unnamed sinks get the `console` id hint.
pub fn console_sink(
    session: &mut SynthSession,
    name: Option<&str>,
    props: ConsoleSinkProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    let hint = name.unwrap_or("console");
    session.element(OperatorProps::ConsoleSink(props), Some(hint), children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::NodeKind;

    #[test]
    fn test_kafka_sink_id_derives_from_topic() {
        let mut session = SynthSession::new();
        let props = KafkaSinkProps {
            topic: "order-totals".to_string(),
            bootstrap_servers: None,
            format: None,
            key_by: vec![],
            parallelism: None,
        };
        let node = kafka_sink(&mut session, None, props, ());

        assert_eq!(node.id.as_str(), "order_totals");
        assert_eq!(node.kind, NodeKind::Sink);
    }

    #[test]
    fn test_console_sink_defaults_its_hint() {
        let mut session = SynthSession::new();
        let first = console_sink(&mut session, None, ConsoleSinkProps::default(), ());
        let second = console_sink(&mut session, None, ConsoleSinkProps::default(), ());

        assert_eq!(first.id.as_str(), "console");
        assert_eq!(second.id.as_str(), "console_2");
    }
}
