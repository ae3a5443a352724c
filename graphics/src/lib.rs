//! # passforge graphics
//!
//! Render-pass graph planner. For one frame configuration it assembles a DAG
//! of rendering passes, decides which pooled images each pass reads and
//! writes, and linearizes the graph into an execution queue.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderGraph`] - Passes connected by typed [`ResourceLink`]s
//! - [`assembler`] - Pipeline wiring for a [`SceneDescriptor`]
//! - [`normalizer`] - Link identity and filter consistency
//! - [`binder`] - Liveness-based image reuse over an [`ImagePool`]
//! - [`stereo`] - Left/right eye duplication
//! - [`debug_probe`] - On-screen view of an intermediate image
//! - [`compiler`] - The executable [`RenderQueue`]
//! - [`FramePlanner`] - All of the above in one call
//!
//! The planner never rasterizes anything. Image creation and draw-call
//! issuance belong to the caller.
//!
//! ## Example
//!
//! ```ignore
//! use passforge_graphics::{
//!     BuildConfig, DefaultPassCatalog, FramePlanner, SceneDescriptor, ShadowParams,
//! };
//!
//! let scene = SceneDescriptor::default().with_shadows(ShadowParams::default());
//! let config = BuildConfig::default();
//! let mut catalog = DefaultPassCatalog::new(&config);
//!
//! let frame = FramePlanner::build(&scene, &config, &mut catalog)?;
//! for &pass in frame.queue().passes() {
//!     println!("{}", frame.graph().pass(pass).label());
//! }
//! ```

pub mod assembler;
pub mod binder;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod debug_probe;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod normalizer;
pub mod planner;
pub mod pool;
pub mod profiling;
pub mod scene;
pub mod stereo;
pub mod types;

// Re-export main types for convenience
pub use catalog::{DefaultPassCatalog, PassBlueprint, PassCatalog};
pub use compiler::RenderQueue;
pub use config::{BuildConfig, DebugProbe};
pub use diagnostics::{BuildStage, Diagnostic, Diagnostics, Severity};
pub use error::GraphError;
pub use graph::{
    Eye, LinkHandle, LinkOrigin, Pass, PassContext, PassFlags, PassHandle, PassKind, PassParams,
    PostEffect, RenderGraph, ResourceLink,
};
pub use planner::{FrameGraph, FramePlanner};
pub use pool::{ImageDescriptor, ImageId, ImageKind, ImagePool, RenderTargetId};
pub use scene::{
    AntialiasingMethod, AntialiasingParams, BloomParams, Camera, CameraId, CameraProjection,
    CompositingParams, DofParams, GodRaysParams, MotionBlurParams, OutlineParams, ReflectionParams,
    RenderTexture, SceneDescriptor, ShadowParams, SkyParams, SsaoParams, StereoMode, WaterParams,
};
pub use stereo::StereoBranches;
pub use types::{Extent2d, Sampler, Slot, TextureFilter};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the graphics library version.
pub fn init() {
    log::info!("passforge graphics v{} initialized", VERSION);
}
