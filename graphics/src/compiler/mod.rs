//! Render graph linearization.
//!
//! This module turns a bound [`RenderGraph`](crate::graph::RenderGraph) into
//! the executable [`RenderQueue`].
//!
//! # Design Philosophy
//!
//! The linearizer is intentionally simple. It performs:
//!
//! 1. **Topological Sort** - Order passes respecting dependencies, including
//!    the zero-payload ordering links the stereo duplicator inserts
//! 2. **Cycle Detection** - Validate the graph is a DAG
//! 3. **Filtering** - Drop passes that are not enqueued
//!
//! Bookkeeping passes (the sink, color picking, sky) stay in the graph
//! so that image lifetimes are computed over them, but they never reach the
//! queue.
//!
//! # Example
//!
//! ```ignore
//! use passforge_graphics::{Pass, PassKind, RenderGraph, ResourceLink, Slot};
//!
//! let mut graph = RenderGraph::new();
//! let opaque = graph.add_pass(Pass::new(PassKind::MainOpaque));
//! let blend = graph.add_pass(Pass::new(PassKind::MainBlend));
//! let sink = graph.add_pass(Pass::new(PassKind::Sink));
//! graph.connect(opaque, blend, ResourceLink::viewport(Slot::Color, Slot::Color));
//! graph.connect(blend, sink, ResourceLink::viewport(Slot::Screen, Slot::None));
//!
//! let queue = graph.compile()?;
//! assert_eq!(queue.passes(), &[opaque, blend]);
//! ```

use crate::error::GraphError;
use crate::graph::{PassHandle, RenderGraph};
use crate::profiling::profile_function;

/// The executable pass list of a frame.
///
/// Passes are executed sequentially in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderQueue {
    passes: Vec<PassHandle>,
}

impl RenderQueue {
    /// Create a queue with the given pass order.
    #[cfg(test)]
    pub(crate) fn new(passes: Vec<PassHandle>) -> Self {
        Self { passes }
    }

    /// Passes in execution order.
    pub fn passes(&self) -> &[PassHandle] {
        &self.passes
    }

    /// Get the number of passes in the queue.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Position of `pass` in the queue, if it is enqueued.
    pub fn position_of(&self, pass: PassHandle) -> Option<usize> {
        self.passes.iter().position(|&p| p == pass)
    }

    pub fn contains(&self, pass: PassHandle) -> bool {
        self.position_of(pass).is_some()
    }
}

/// Linearize a render graph into an execution queue.
///
/// # Returns
///
/// * `Ok(RenderQueue)` - Enqueued passes in dependency order
/// * `Err(GraphError::CyclicDependency)` - If the graph contains a cycle
pub fn compile(graph: &RenderGraph) -> Result<RenderQueue, GraphError> {
    profile_function!();

    let order = graph.dag().topological_order()?;
    let passes: Vec<PassHandle> = order
        .into_iter()
        .filter(|&h| graph.pass(h).enqueue())
        .collect();

    log::debug!(
        "linearized {} of {} passes into the render queue",
        passes.len(),
        graph.pass_count()
    );
    Ok(RenderQueue { passes })
}
