//! Pipeline-root constructor.

use std::sync::Arc;

use sluice_core::operator::{OperatorProps, PipelineProps};
use sluice_core::{Children, ConstructNode, SynthSession};

use crate::error::BuildError;

/// Builds a `Pipeline` root node.
///
/// Mode, state backend and restart flavor are closed enums, so the only
/// construction check left is the checkpoint interval.
///
/// # Errors
///
/// Returns [`BuildError::MissingCheckpointInterval`] when a checkpoint
/// is declared with an empty interval.
pub fn pipeline(
    session: &mut SynthSession,
    props: PipelineProps,
    children: impl Into<Children>,
) -> Result<Arc<ConstructNode>, BuildError> {
    if let Some(checkpoint) = &props.checkpoint {
        if checkpoint.interval.is_empty() {
            return Err(BuildError::MissingCheckpointInterval);
        }
    }

    Ok(session.element(OperatorProps::Pipeline(props), None, children))
}
