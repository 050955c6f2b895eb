//! Error types for octree construction and aggregation
//!
//! Build- and aggregate-time failures abort the current frame and carry
//! enough context (offending body, node index, depth) to diagnose.
//! Zero-distance and self-interaction during force evaluation are expected
//! geometric degeneracies and are skipped silently, never surfaced here.

use thiserror::Error;

use crate::simulation::states::NVec3;

/// Result type for octree operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors that can occur while building or aggregating the octree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// A body lies outside the root bounding cube. Fatal for this frame's
    /// build; the driver may skip the frame or clamp and retry.
    #[error("body {body} at ({x}, {y}, {z}) lies outside the universe cube")]
    OutOfBoundsBody { body: usize, x: f64, y: f64, z: f64 },

    /// An internal node aggregated to zero total mass. Signals a structural
    /// bug (an empty subtree reached aggregation) and is fatal to the frame.
    #[error("internal node {node} at depth {depth} aggregated to zero mass")]
    ZeroMassAggregate { node: usize, depth: usize },
}

impl TreeError {
    /// Build an out-of-bounds error from the body index and its position
    pub fn out_of_bounds(body: usize, pos: NVec3) -> Self {
        TreeError::OutOfBoundsBody {
            body,
            x: pos.x,
            y: pos.y,
            z: pos.z,
        }
    }
}
