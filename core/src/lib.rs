//! # passforge core
//!
//! Domain-independent building blocks for the passforge render-pass planner:
//!
//! - [`dag`] - arena-backed directed multigraph with topological sort,
//!   reachability and node-set cloning
//! - [`dot`] - Graphviz rendering of a [`dag::Dag`]
//! - [`profiling`] - optional Tracy instrumentation macros

pub mod dag;
pub mod dot;
pub mod profiling;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core library version.
pub fn init() {
    log::info!("passforge core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
