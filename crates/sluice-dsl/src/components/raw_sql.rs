//! SQL escape-hatch constructor.

use std::sync::Arc;

use sluice_core::operator::{OperatorProps, RawSqlProps};
use sluice_core::{Children, ConstructNode, SchemaDefinition, SynthSession};

use crate::error::BuildError;

/// Opaque-SQL settings, minus the input wiring.
#[derive(Debug, Clone)]
pub struct RawSqlSpec {
    /// SQL text, passed through unparsed.
    pub sql: String,
    /// Declared output schema.
    pub output_schema: SchemaDefinition,
    /// Operator parallelism override.
    pub parallelism: Option<u32>,
}

/// Builds a `RawSQL` node over one or more input streams. The inputs
/// become leading children and their ids are recorded in the props.
///
/// # Errors
///
/// Returns [`BuildError::RawSqlWithoutInputs`] when `inputs` is empty.
pub fn raw_sql(
    session: &mut SynthSession,
    inputs: &[Arc<ConstructNode>],
    spec: RawSqlSpec,
    children: impl Into<Children>,
) -> Result<Arc<ConstructNode>, BuildError> {
    if inputs.is_empty() {
        return Err(BuildError::RawSqlWithoutInputs);
    }

    let props = RawSqlProps {
        sql: spec.sql,
        output_schema: spec.output_schema,
        input_ids: inputs.iter().map(|node| node.id.clone()).collect(),
        parallelism: spec.parallelism,
    };
    let kids = vec![Children::from(inputs), children.into()];
    Ok(session.element(OperatorProps::RawSql(props), None, kids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::filter;
    use sluice_core::operator::FilterProps;
    use sluice_core::NodeKind;

    fn spec(sql: &str) -> RawSqlSpec {
        RawSqlSpec {
            sql: sql.to_string(),
            output_schema: SchemaDefinition::default(),
            parallelism: None,
        }
    }

    #[test]
    fn test_raw_sql_requires_inputs() {
        let mut session = SynthSession::new();
        let err = raw_sql(&mut session, &[], spec("SELECT 1"), ()).unwrap_err();
        assert_eq!(err.to_string(), "RawSQL requires at least one input stream");
    }

    #[test]
    fn test_raw_sql_records_input_ids_in_order() {
        let mut session = SynthSession::new();
        let a = filter(
            &mut session,
            FilterProps {
                condition: "a".to_string(),
                parallelism: None,
            },
            (),
        );
        let b = filter(
            &mut session,
            FilterProps {
                condition: "b".to_string(),
                parallelism: None,
            },
            (),
        );

        let node = raw_sql(
            &mut session,
            &[a.clone(), b.clone()],
            spec("SELECT * FROM a JOIN b USING (id)"),
            (),
        )
        .unwrap();

        assert_eq!(node.kind, NodeKind::RawSql);
        assert_eq!(node.children.len(), 2);
        let OperatorProps::RawSql(props) = &node.props else {
            panic!("expected raw sql props");
        };
        assert_eq!(props.input_ids, vec![a.id.clone(), b.id.clone()]);
    }
}
