//! # Plan Wire Format
//!
//! Binary encoding of [`ExecutionPlan`] for handoff to the runtime, built
//! on rkyv's aligned zero-copy archive format. Encoding is deterministic:
//! equal plans produce byte-identical output, so plan artifacts can be
//! content-addressed and diffed.

use rkyv::{rancor::Error as RkyvError, util::AlignedVec, Archive};
use thiserror::Error;
use tracing::debug;

use crate::model::ExecutionPlan;

/// Errors produced while moving plans across the wire boundary.
#[derive(Debug, Error)]
pub enum WireError {
    /// The plan could not be serialized.
    #[error("Failed to encode execution plan: {0}")]
    Encode(String),

    /// The bytes do not form a valid plan archive.
    #[error("Failed to decode execution plan: {0}")]
    Decode(String),
}

/// Serializes a plan into its binary wire form.
///
/// # Errors
///
/// Returns [`WireError::Encode`] when serialization fails.
pub fn encode_plan(plan: &ExecutionPlan) -> Result<AlignedVec, WireError> {
    let bytes =
        rkyv::to_bytes::<RkyvError>(plan).map_err(|e| WireError::Encode(e.to_string()))?;
    debug!(
        pipeline = %plan.pipeline_name,
        bytes = bytes.len(),
        "encoded execution plan"
    );
    Ok(bytes)
}

/// Deserializes a plan from its binary wire form.
///
/// The archive is validated before deserialization, so arbitrary input is
/// safe to feed here.
///
/// # Errors
///
/// Returns [`WireError::Decode`] when the bytes are not a valid plan.
pub fn decode_plan(bytes: &[u8]) -> Result<ExecutionPlan, WireError> {
    let archived = rkyv::access::<<ExecutionPlan as Archive>::Archived, RkyvError>(bytes)
        .map_err(|e| WireError::Decode(e.to_string()))?;
    rkyv::deserialize::<ExecutionPlan, RkyvError>(archived)
        .map_err(|e| WireError::Decode(e.to_string()))
}
