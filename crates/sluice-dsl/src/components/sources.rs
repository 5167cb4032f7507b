//! Source constructors.

use std::sync::Arc;

use sluice_core::operator::{GeneratorSourceProps, KafkaSourceProps, OperatorProps};
use sluice_core::{Children, ConstructNode, SynthSession};

/// Builds a `KafkaSource` node.
///
/// The node id derives from the explicit `name` when given, otherwise
/// from the topic (sanitized to identifier form).
pub fn kafka_source(
    session: &mut SynthSession,
    name: Option<&str>,
    props: KafkaSourceProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    let hint = name.unwrap_or(&props.topic).to_string();
    session.element(OperatorProps::KafkaSource(props), Some(&hint), children)
}

/// Builds a `GeneratorSource` node. Unnamed generators get the
/// `generator` id hint.
pub fn generator_source(
    session: &mut SynthSession,
    name: Option<&str>,
    props: GeneratorSourceProps,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    let hint = name.unwrap_or("generator");
    session.element(OperatorProps::GeneratorSource(props), Some(hint), children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{FieldDefinition, NodeKind, SchemaDefinition};

    fn order_schema() -> SchemaDefinition {
        SchemaDefinition::builder()
            .field("id", FieldDefinition::bigint())
            .field("ts", FieldDefinition::timestamp(3))
            .build()
            .unwrap()
    }

    fn kafka_props(topic: &str) -> KafkaSourceProps {
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

    #[test]
    fn test_kafka_source_id_derives_from_topic() {
        let mut session = SynthSession::new();
        let node = kafka_source(&mut session, None, kafka_props("orders.raw-v2"), ());

        assert_eq!(node.id.as_str(), "orders_raw_v2");
        assert_eq!(node.kind, NodeKind::Source);
        assert_eq!(node.component(), "KafkaSource");
    }

    #[test]
    fn test_explicit_name_wins_over_topic() {
        let mut session = SynthSession::new();
        let node = kafka_source(&mut session, Some("orders"), kafka_props("orders.raw-v2"), ());

        assert_eq!(node.id.as_str(), "orders");
    }

    #[test]
    fn test_generator_defaults_its_hint() {
        let mut session = SynthSession::new();
        let props = GeneratorSourceProps {
            schema: order_schema(),
            rows_per_second: 100,
            max_rows: None,
            parallelism: None,
        };
        let node = generator_source(&mut session, None, props, ());

        assert_eq!(node.id.as_str(), "generator");
        assert_eq!(node.kind, NodeKind::Source);
    }
}
