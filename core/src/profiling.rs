//! Optional Tracy instrumentation for planner builds.
//!
//! Profiling is enabled with the `profiling` Cargo feature:
//!
//! ```toml
//! [dependencies]
//! passforge-core = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! Each planning stage opens a span so a rebuild can be inspected in the
//! Tracy timeline:
//!
//! ```ignore
//! use passforge_core::profiling::{profile_function, profile_scope};
//!
//! fn build() {
//!     profile_function!();
//!
//!     {
//!         profile_scope!("normalize_links");
//!         // ...
//!     }
//! }
//! ```
//!
//! With the feature disabled every macro expands to nothing.

#[cfg(feature = "profiling")]
pub use tracy_client::{self, Client, Span, span};

/// Open a profiling span that lasts until the end of the current scope.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Open a profiling span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Open a profiling span named after the enclosing function.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::profiling::span!();
    };
}

/// Open a function span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_function {
    () => {};
}

/// Send a message to Tracy's message log.
///
/// ```ignore
/// profile_message!("stereo branch cloned");
/// ```
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_message {
    ($msg:expr) => {
        if let Some(client) = $crate::profiling::Client::running() {
            client.message($msg, 0);
        }
    };
}

/// Send a message (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_message {
    ($msg:expr) => {
        let _ = $msg;
    };
}

pub use profile_function;
pub use profile_message;
pub use profile_scope;
