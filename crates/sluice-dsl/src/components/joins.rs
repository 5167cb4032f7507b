//! Join constructors.
//!
//! Joins take their input nodes as explicit arguments. The inputs become
//! the node's leading children (in argument order) and their ids are
//! recorded in the stored props, so the plan compiler can tell the sides
//! apart when picking shuffle strategies.

use std::sync::Arc;

use sluice_core::operator::{
    IntervalBounds, IntervalJoinProps, JoinProps, JoinType, LookupAsyncSpec, LookupCacheSpec,
    LookupJoinProps, OperatorProps, TemporalJoinProps,
};
use sluice_core::{Children, ConstructNode, FxIndexMap, SynthSession};

/// Hash-join settings, minus the input wiring.
#[derive(Debug, Clone)]
pub struct JoinSpec {
    /// SQL join condition.
    pub on: String,
    /// Join flavor; inner when unset.
    pub join_type: Option<JoinType>,
    /// Join state time-to-live.
    pub state_ttl: Option<String>,
    /// Operator parallelism override.
    pub parallelism: Option<u32>,
}

/// Builds a `Join` node over two input streams.
pub fn join(
    session: &mut SynthSession,
    left: &Arc<ConstructNode>,
    right: &Arc<ConstructNode>,
    spec: JoinSpec,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    let props = JoinProps {
        left: left.id.clone(),
        right: right.id.clone(),
        on: spec.on,
        join_type: spec.join_type,
        state_ttl: spec.state_ttl,
        parallelism: spec.parallelism,
    };
    let kids = vec![Children::from(left), Children::from(right), children.into()];
    session.element(OperatorProps::Join(props), None, kids)
}

/// Temporal-join settings, minus the input wiring.
#[derive(Debug, Clone)]
pub struct TemporalJoinSpec {
    /// SQL join condition.
    pub on: String,
    /// Event-time column the version is resolved against.
    pub as_of: String,
    /// Operator parallelism override.
    pub parallelism: Option<u32>,
}

/// Builds a `TemporalJoin` node over a probe stream and a versioned
/// table. The temporal side's id is kept in the props; its edge is
/// broadcast by the plan compiler.
pub fn temporal_join(
    session: &mut SynthSession,
    stream: &Arc<ConstructNode>,
    temporal: &Arc<ConstructNode>,
    spec: TemporalJoinSpec,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    let props = TemporalJoinProps {
        stream: stream.id.clone(),
        temporal: temporal.id.clone(),
        on: spec.on,
        as_of: spec.as_of,
        parallelism: spec.parallelism,
    };
    let kids = vec![
        Children::from(stream),
        Children::from(temporal),
        children.into(),
    ];
    session.element(OperatorProps::TemporalJoin(props), None, kids)
}

/// Lookup-join settings, minus the input wiring.
#[derive(Debug, Clone)]
pub struct LookupJoinSpec {
    /// External table name.
    pub table: String,
    /// External system URL.
    pub url: String,
    /// SQL join condition.
    pub on: String,
    /// Projected columns from the lookup side.
    pub select: FxIndexMap<String, String>,
    /// Async lookup settings.
    pub lookup_async: Option<LookupAsyncSpec>,
    /// Cache settings.
    pub cache: Option<LookupCacheSpec>,
    /// Operator parallelism override.
    pub parallelism: Option<u32>,
}

/// Builds a `LookupJoin` node over a stream and an external table.
pub fn lookup_join(
    session: &mut SynthSession,
    input: &Arc<ConstructNode>,
    spec: LookupJoinSpec,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    let props = LookupJoinProps {
        input: input.id.clone(),
        table: spec.table,
        url: spec.url,
        on: spec.on,
        select: spec.select,
        lookup_async: spec.lookup_async,
        cache: spec.cache,
        parallelism: spec.parallelism,
    };
    let kids = vec![Children::from(input), children.into()];
    session.element(OperatorProps::LookupJoin(props), None, kids)
}

/// Interval-join settings, minus the input wiring.
#[derive(Debug, Clone)]
pub struct IntervalJoinSpec {
    /// SQL join condition.
    pub on: String,
    /// Relative event-time bounds.
    pub interval: IntervalBounds,
    /// Join flavor; inner when unset.
    pub join_type: Option<JoinType>,
    /// Operator parallelism override.
    pub parallelism: Option<u32>,
}

/// Builds an `IntervalJoin` node over two input streams.
pub fn interval_join(
    session: &mut SynthSession,
    left: &Arc<ConstructNode>,
    right: &Arc<ConstructNode>,
    spec: IntervalJoinSpec,
    children: impl Into<Children>,
) -> Arc<ConstructNode> {
    let props = IntervalJoinProps {
        left: left.id.clone(),
        right: right.id.clone(),
        on: spec.on,
        interval: spec.interval,
        join_type: spec.join_type,
        parallelism: spec.parallelism,
    };
    let kids = vec![Children::from(left), Children::from(right), children.into()];
    session.element(OperatorProps::IntervalJoin(props), None, kids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::filter;
    use sluice_core::operator::FilterProps;
    use sluice_core::NodeKind;

    fn leaf(session: &mut SynthSession, condition: &str) -> Arc<ConstructNode> {
        filter(
            session,
            FilterProps {
                condition: condition.to_string(),
                parallelism: None,
            },
            (),
        )
    }

    #[test]
    fn test_join_wires_inputs_as_leading_children() {
        let mut session = SynthSession::new();
        let left = leaf(&mut session, "l");
        let right = leaf(&mut session, "r");
        let downstream = leaf(&mut session, "d");

        let node = join(
            &mut session,
            &left,
            &right,
            JoinSpec {
                on: "l.id = r.id".to_string(),
                join_type: Some(JoinType::Left),
                state_ttl: Some("1h".to_string()),
                parallelism: None,
            },
            downstream,
        );

        assert_eq!(node.kind, NodeKind::Join);
        assert_eq!(node.children.len(), 3);
        assert_eq!(node.children[0].id, left.id);
        assert_eq!(node.children[1].id, right.id);

        let OperatorProps::Join(props) = &node.props else {
            panic!("expected join props");
        };
        assert_eq!(props.left, left.id);
        assert_eq!(props.right, right.id);
        assert_eq!(props.join_type, Some(JoinType::Left));
    }

    #[test]
    fn test_temporal_join_records_the_temporal_side() {
        let mut session = SynthSession::new();
        let stream = leaf(&mut session, "probe");
        let table = leaf(&mut session, "rates");

        let node = temporal_join(
            &mut session,
            &stream,
            &table,
            TemporalJoinSpec {
                on: "o.currency = r.currency".to_string(),
                as_of: "order_time".to_string(),
                parallelism: None,
            },
            (),
        );

        let OperatorProps::TemporalJoin(props) = &node.props else {
            panic!("expected temporal join props");
        };
        assert_eq!(props.stream, stream.id);
        assert_eq!(props.temporal, table.id);
        assert_eq!(node.children[1].id, table.id);
    }

    #[test]
    fn test_lookup_join_takes_a_single_input() {
        let mut session = SynthSession::new();
        let input = leaf(&mut session, "events");

        let node = lookup_join(
            &mut session,
            &input,
            LookupJoinSpec {
                table: "customers".to_string(),
                url: "postgres://db/crm".to_string(),
                on: "e.customer_id = c.id".to_string(),
                select: FxIndexMap::default(),
                lookup_async: None,
                cache: None,
                parallelism: None,
            },
            (),
        );

        assert_eq!(node.children.len(), 1);
        let OperatorProps::LookupJoin(props) = &node.props else {
            panic!("expected lookup join props");
        };
        assert_eq!(props.input, input.id);
        assert_eq!(props.table, "customers");
    }
}
