//! Cameras owned by a render graph.
//!
//! The planner never computes projection matrices. It only records which
//! projection a pass asked for and writes the attachment fields and pixel
//! size once images are bound.

use crate::graph::Eye;
use crate::pool::{ImageId, RenderTargetId};

/// Handle to a [`Camera`] in a [`RenderGraph`](crate::graph::RenderGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(u32);

impl CameraId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Projection requested by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraProjection {
    /// Scene camera.
    #[default]
    Perspective,
    /// Orthographic camera fitted to a region (shadow cascades, grass map).
    Orthographic,
    /// Six-face cubemap camera.
    Cube,
    /// Full-screen quad pass without a view transform.
    None,
}

/// Camera state the rasterizer reads after a build.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Camera {
    pub projection: CameraProjection,
    pub eye: Eye,
    pub width: u32,
    pub height: u32,
    pub color_attachment: Option<ImageId>,
    pub depth_attachment: Option<ImageId>,
    pub render_target: Option<RenderTargetId>,
}

impl Camera {
    pub fn new(projection: CameraProjection) -> Self {
        Self {
            projection,
            ..Default::default()
        }
    }

    /// Width divided by height, or 1 before the camera was sized.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
