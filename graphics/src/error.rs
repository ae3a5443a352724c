//! Graphics error types.

use passforge_core::dag::DagError;

use crate::graph::PassHandle;

/// Recoverable errors reported while planning a frame.
///
/// Configuration contract violations (a sampler used as a source slot, a
/// missing upstream pass, too many reflections) are not represented here:
/// they abort the build with a panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The graph contains a cyclic dependency.
    ///
    /// `passes` lists every pass that could not be ordered.
    #[error("render graph contains cyclic dependency through {} pass(es)", .passes.len())]
    CyclicDependency { passes: Vec<PassHandle> },

    /// A slot name did not match any known slot or sampler.
    #[error("unknown slot name: {0:?}")]
    UnknownSlot(String),
}

impl From<DagError> for GraphError {
    fn from(err: DagError) -> Self {
        match err {
            DagError::CyclicDependency { nodes } => Self::CyclicDependency { passes: nodes },
        }
    }
}
