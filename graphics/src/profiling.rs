//! Profiling support via Tracy.
//!
//! Re-exports the CPU profiling macros of [`passforge_core::profiling`]. Enable
//! the `profiling` feature to record the planner stages:
//!
//! ```bash
//! cargo bench -p passforge-graphics --features profiling
//! ```
//!
//! Without the feature every macro expands to nothing.

pub use passforge_core::profiling::*;
