//! Pattern-matching constructor.

use std::sync::Arc;

use sluice_core::operator::{MatchAfterStrategy, MatchRecognizeProps, OperatorProps};
use sluice_core::{Children, ConstructNode, FxIndexMap, SynthSession};

use crate::error::BuildError;

/// Pattern-matcher settings, minus the input wiring.
#[derive(Debug, Clone)]
pub struct MatchRecognizeSpec {
    /// Row pattern, e.g. `A B+ C`.
    pub pattern: String,
    /// Pattern variable definitions.
    pub define: FxIndexMap<String, String>,
    /// Output measure expressions.
    pub measures: FxIndexMap<String, String>,
    /// Post-match continuation strategy.
    pub after: Option<MatchAfterStrategy>,
    /// Partitioning columns.
    pub partition_by: Vec<String>,
    /// Ordering declaration, e.g. `ts ASC`.
    pub order_by: Option<String>,
    /// Operator parallelism override.
    pub parallelism: Option<u32>,
}

/// Builds a `MatchRecognize` node over an input stream. The input
/// becomes the leading child and its id is recorded in the props.
///
/// # Errors
///
/// Returns [`BuildError::MissingPattern`] for an empty pattern,
/// [`BuildError::MissingDefine`] with no pattern variables, and
/// [`BuildError::MissingMeasures`] with no output measures.
pub fn match_recognize(
    session: &mut SynthSession,
    input: &Arc<ConstructNode>,
    spec: MatchRecognizeSpec,
    children: impl Into<Children>,
) -> Result<Arc<ConstructNode>, BuildError> {
    if spec.pattern.is_empty() {
        return Err(BuildError::MissingPattern);
    }
    if spec.define.is_empty() {
        return Err(BuildError::MissingDefine);
    }
    if spec.measures.is_empty() {
        return Err(BuildError::MissingMeasures);
    }

    let props = MatchRecognizeProps {
        input: input.id.clone(),
        pattern: spec.pattern,
        define: spec.define,
        measures: spec.measures,
        after: spec.after,
        partition_by: spec.partition_by,
        order_by: spec.order_by,
        parallelism: spec.parallelism,
    };
    let kids = vec![Children::from(input), children.into()];
    Ok(session.element(OperatorProps::MatchRecognize(props), None, kids))
}
