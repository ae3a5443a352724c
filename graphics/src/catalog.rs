//! Pass catalog: the factory the assembler creates passes through.
//!
//! The assembler decides *which* passes exist and how they are wired. What a
//! pass of a given kind starts out as (flags, camera projection, internal
//! links) comes from a [`PassCatalog`]. Swapping the catalog changes pass
//! defaults without touching the wiring.

use crate::config::BuildConfig;
use crate::graph::{
    Eye, Pass, PassContext, PassFlags, PassHandle, PassKind, PassParams, PostEffect, RenderGraph,
    ResourceLink,
};
use crate::scene::{Camera, CameraProjection};
use crate::types::{Sampler, Slot};

/// A pass description that has not been added to a graph yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PassBlueprint {
    pub kind: PassKind,
    pub flags: PassFlags,
    pub subtype: Option<PostEffect>,
    pub params: PassParams,
    /// Camera the pass renders with, if any.
    pub camera: Option<CameraProjection>,
    /// Links living only inside the pass.
    pub internal_links: Vec<ResourceLink>,
}

impl PassBlueprint {
    /// Blueprint with the default flags of `kind` and nothing else.
    pub fn new(kind: PassKind) -> Self {
        Self {
            kind,
            flags: kind.info().flags,
            subtype: None,
            params: PassParams::None,
            camera: None,
            internal_links: Vec::new(),
        }
    }

    /// Add the pass, its camera and its internal links to `graph`.
    pub fn instantiate(self, graph: &mut RenderGraph) -> PassHandle {
        let camera = self.camera.map(|p| graph.add_camera(Camera::new(p)));
        let pass = graph.add_pass(Pass {
            kind: self.kind,
            flags: self.flags,
            subtype: self.subtype,
            params: self.params,
            camera,
            eye: Eye::Mono,
            internal_links: Vec::new(),
            context: PassContext::default(),
        });
        for link in self.internal_links {
            graph.add_internal_link(pass, link);
        }
        pass
    }
}

/// Factory for pass blueprints.
pub trait PassCatalog {
    /// Create the blueprint of a pass of `kind`.
    fn create(
        &mut self,
        kind: PassKind,
        subtype: Option<PostEffect>,
        params: PassParams,
    ) -> PassBlueprint;
}

/// Catalog with the stock pass definitions.
#[derive(Debug, Clone)]
pub struct DefaultPassCatalog {
    cubemap_size: u32,
    reflect_multiplier: f32,
}

impl DefaultPassCatalog {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            cubemap_size: config.cubemap_size,
            reflect_multiplier: config.reflect_multiplier,
        }
    }

    /// Projection of the camera a pass of `kind` renders with.
    pub fn projection(kind: PassKind) -> Option<CameraProjection> {
        use PassKind::*;
        match kind {
            ShadowCast | GrassMap => Some(CameraProjection::Orthographic),
            MainCubeReflect | Sky => Some(CameraProjection::Cube),
            ShadowReceive | DepthPack | Ssao | SsaoBlur | MainOpaque | MainBlend | MainXray
            | MainPlaneReflect | ColorPicking | ColorPickingXray | Wireframe | GodRays
            | LuminanceTrunced | Dof | OutlineMask | Velocity => {
                Some(CameraProjection::Perspective)
            }
            Sink => None,
            _ => Some(CameraProjection::None),
        }
    }

    fn internal_links(&self, kind: PassKind) -> Vec<ResourceLink> {
        match kind {
            PassKind::MainPlaneReflect => vec![ResourceLink::scaled(
                Slot::Depth,
                Slot::Depth,
                self.reflect_multiplier,
            )],
            PassKind::MainCubeReflect => {
                vec![ResourceLink::fixed(
                    Slot::Depth,
                    Slot::Depth,
                    self.cubemap_size,
                )]
            }
            PassKind::MotionBlur => {
                vec![ResourceLink::viewport(
                    Slot::Color,
                    Sampler::MotionBlurAccum,
                )]
            }
            PassKind::SmaaBlendingWeights => vec![
                ResourceLink::fixed(Slot::Color, Sampler::SearchTex, 1).linear(),
                ResourceLink::fixed(Slot::Color, Sampler::AreaTex, 1).linear(),
            ],
            PassKind::SmaaResolve => {
                vec![ResourceLink::viewport(Slot::Color, Sampler::ColorPrev).linear()]
            }
            _ => Vec::new(),
        }
    }
}

impl Default for DefaultPassCatalog {
    fn default() -> Self {
        Self::new(&BuildConfig::default())
    }
}

impl PassCatalog for DefaultPassCatalog {
    fn create(
        &mut self,
        kind: PassKind,
        subtype: Option<PostEffect>,
        params: PassParams,
    ) -> PassBlueprint {
        PassBlueprint {
            subtype,
            params,
            camera: Self::projection(kind),
            internal_links: self.internal_links(kind),
            ..PassBlueprint::new(kind)
        }
    }
}
