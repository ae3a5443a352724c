//! Render pass types.

use std::fmt;

use bitflags::bitflags;

use crate::pool::{ImageId, RenderTargetId};
use crate::scene::{
    AntialiasingParams, BloomParams, CameraId, CompositingParams, DofParams, GodRaysParams,
    MotionBlurParams, OutlineParams, ShadowParams, SkyParams, SsaoParams, StereoMode,
};

use super::link::LinkHandle;

bitflags! {
    /// Per-pass rendering switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PassFlags: u32 {
        /// The pass issues draw calls.
        const DO_RENDER = 1 << 0;
        /// The pass appears in the executable queue.
        const ENQUEUE = 1 << 1;
        const CLEAR_COLOR = 1 << 2;
        const CLEAR_DEPTH = 1 << 3;
        const DEPTH_TEST = 1 << 4;
        const BLEND = 1 << 5;
    }
}

impl Default for PassFlags {
    fn default() -> Self {
        Self::DO_RENDER | Self::ENQUEUE | Self::CLEAR_COLOR | Self::CLEAR_DEPTH | Self::DEPTH_TEST
    }
}

/// Every kind of pass the planner knows how to wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassKind {
    // Shadows and depth
    ShadowCast,
    ShadowReceive,
    DepthPack,
    GrassMap,
    Ssao,
    SsaoBlur,
    // Main scene
    MainOpaque,
    MainBlend,
    MainXray,
    MainPlaneReflect,
    MainCubeReflect,
    Refract,
    ColorPicking,
    ColorPickingXray,
    Wireframe,
    // God rays and bloom
    GodRays,
    GodRaysCombine,
    Luminance,
    AverageLuminance,
    LuminanceTrunced,
    BloomBlur,
    BloomCombine,
    // Post-processing
    MotionBlur,
    Postprocessing,
    Dof,
    OutlineMask,
    Outline,
    Compositing,
    // Antialiasing
    Antialiasing,
    SmaaEdgeDetection,
    SmaaBlendingWeights,
    SmaaNeighborhoodBlending,
    SmaaResolve,
    Velocity,
    // Output
    StereoCombine,
    Screen,
    Resolve,
    DebugView,
    Sky,
    Sink,
}

/// Static properties of a [`PassKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassInfo {
    /// Upper-case display name.
    pub name: &'static str,
    /// Flags a freshly created pass of this kind starts with.
    pub flags: PassFlags,
    /// Computed once and used by both eyes in stereo rendering.
    pub shared_only: bool,
    /// Whether the pass may draw images from the shared pool. Passes that
    /// may not get private storage that is never handed to anyone else.
    pub pooled: bool,
}

const DR: PassFlags = PassFlags::DO_RENDER;
const EN: PassFlags = PassFlags::ENQUEUE;
const CC: PassFlags = PassFlags::CLEAR_COLOR;
const CD: PassFlags = PassFlags::CLEAR_DEPTH;
const DT: PassFlags = PassFlags::DEPTH_TEST;
const BL: PassFlags = PassFlags::BLEND;

const fn info(name: &'static str, flags: PassFlags) -> PassInfo {
    PassInfo {
        name,
        flags,
        shared_only: false,
        pooled: true,
    }
}

const fn shared(name: &'static str, flags: PassFlags) -> PassInfo {
    PassInfo {
        shared_only: true,
        ..info(name, flags)
    }
}

const fn private(name: &'static str, flags: PassFlags) -> PassInfo {
    PassInfo {
        pooled: false,
        ..info(name, flags)
    }
}

impl PassKind {
    /// All pass kinds, in declaration order.
    pub const ALL: [PassKind; 40] = [
        Self::ShadowCast,
        Self::ShadowReceive,
        Self::DepthPack,
        Self::GrassMap,
        Self::Ssao,
        Self::SsaoBlur,
        Self::MainOpaque,
        Self::MainBlend,
        Self::MainXray,
        Self::MainPlaneReflect,
        Self::MainCubeReflect,
        Self::Refract,
        Self::ColorPicking,
        Self::ColorPickingXray,
        Self::Wireframe,
        Self::GodRays,
        Self::GodRaysCombine,
        Self::Luminance,
        Self::AverageLuminance,
        Self::LuminanceTrunced,
        Self::BloomBlur,
        Self::BloomCombine,
        Self::MotionBlur,
        Self::Postprocessing,
        Self::Dof,
        Self::OutlineMask,
        Self::Outline,
        Self::Compositing,
        Self::Antialiasing,
        Self::SmaaEdgeDetection,
        Self::SmaaBlendingWeights,
        Self::SmaaNeighborhoodBlending,
        Self::SmaaResolve,
        Self::Velocity,
        Self::StereoCombine,
        Self::Screen,
        Self::Resolve,
        Self::DebugView,
        Self::Sky,
        Self::Sink,
    ];

    /// Static properties of this kind.
    pub const fn info(self) -> PassInfo {
        match self {
            Self::ShadowCast => shared("SHADOW_CAST", DR.union(EN).union(CD).union(DT)),
            Self::ShadowReceive => {
                info("SHADOW_RECEIVE", DR.union(EN).union(CC).union(CD).union(DT))
            }
            Self::DepthPack => info("DEPTH_PACK", DR.union(EN).union(DT)),
            Self::GrassMap => shared("GRASS_MAP", DR.union(EN).union(CC).union(CD).union(DT)),
            Self::Ssao => info("SSAO", DR.union(EN)),
            Self::SsaoBlur => info("SSAO_BLUR", DR.union(EN)),
            Self::MainOpaque => info("MAIN_OPAQUE", DR.union(EN).union(CC).union(DT)),
            Self::MainBlend => info("MAIN_BLEND", DR.union(EN).union(DT).union(BL)),
            Self::MainXray => info("MAIN_XRAY", DR.union(EN).union(CD).union(DT).union(BL)),
            Self::MainPlaneReflect => private(
                "MAIN_PLANE_REFLECT",
                DR.union(EN).union(CC).union(CD).union(DT),
            ),
            Self::MainCubeReflect => shared(
                "MAIN_CUBE_REFLECT",
                DR.union(EN).union(CC).union(CD).union(DT),
            ),
            Self::Refract => info("REFRACT", DR.union(EN)),
            Self::ColorPicking => info("COLOR_PICKING", DR.union(CC).union(CD).union(DT)),
            Self::ColorPickingXray => info("COLOR_PICKING_XRAY", DR.union(CD).union(DT)),
            Self::Wireframe => info("WIREFRAME", EN.union(DT)),
            Self::GodRays => info("GOD_RAYS", DR.union(EN)),
            Self::GodRaysCombine => info("GOD_RAYS_COMBINE", DR.union(EN)),
            Self::Luminance => info("LUMINANCE", DR.union(EN).union(DT)),
            Self::AverageLuminance => info("AVERAGE_LUMINANCE", DR.union(EN).union(DT)),
            Self::LuminanceTrunced => info("LUMINANCE_TRUNCED", DR.union(EN).union(DT)),
            Self::BloomBlur => info("BLOOM_BLUR", DR.union(EN)),
            Self::BloomCombine => info("BLOOM", DR.union(EN).union(DT)),
            Self::MotionBlur => private("MOTION_BLUR", DR.union(EN)),
            Self::Postprocessing => info("POSTPROCESSING", DR.union(EN)),
            Self::Dof => info("DOF", DR.union(EN)),
            Self::OutlineMask => info("OUTLINE_MASK", DR.union(EN).union(CC).union(CD)),
            Self::Outline => info("OUTLINE", DR.union(EN).union(CC).union(CD)),
            Self::Compositing => info("COMPOSITING", DR.union(EN)),
            Self::Antialiasing => info("ANTIALIASING", DR.union(EN)),
            Self::SmaaEdgeDetection => info("SMAA_EDGE_DETECTION", DR.union(EN).union(CC)),
            Self::SmaaBlendingWeights => {
                info("SMAA_BLENDING_WEIGHT_CALCULATION", DR.union(EN).union(CC))
            }
            Self::SmaaNeighborhoodBlending => private("SMAA_NEIGHBORHOOD_BLENDING", DR.union(EN)),
            Self::SmaaResolve => private("SMAA_RESOLVE", DR.union(EN)),
            Self::Velocity => info("VELOCITY", DR.union(EN).union(DT)),
            Self::StereoCombine => info("STEREO", DR.union(EN).union(DT)),
            Self::Screen => info("SCREEN", DR.union(EN).union(DT)),
            Self::Resolve => info("RESOLVE", DR.union(EN)),
            Self::DebugView => info("DEBUG_VIEW", DR.union(EN)),
            Self::Sky => shared("SKY", DR),
            Self::Sink => info("SINK", PassFlags::empty()),
        }
    }

    pub const fn name(self) -> &'static str {
        self.info().name
    }

    pub const fn is_shared_only(self) -> bool {
        self.info().shared_only
    }

    pub const fn is_pooled(self) -> bool {
        self.info().pooled
    }

    /// Color picking passes render into their own targets and never reach
    /// the screen.
    pub const fn is_color_picking(self) -> bool {
        matches!(self, Self::ColorPicking | Self::ColorPickingXray)
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Variant of a generic post-processing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostEffect {
    XBlur,
    YBlur,
    XExtend,
    YExtend,
    Passthrough,
}

impl fmt::Display for PostEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::XBlur => "X_BLUR",
            Self::YBlur => "Y_BLUR",
            Self::XExtend => "X_EXTEND",
            Self::YExtend => "Y_EXTEND",
            Self::Passthrough => "NONE",
        };
        f.write_str(name)
    }
}

/// Feature parameters a pass was created with.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PassParams {
    #[default]
    None,
    ShadowCascade {
        index: u8,
        params: ShadowParams,
    },
    Reflection {
        index: u8,
    },
    Ssao(SsaoParams),
    Bloom(BloomParams),
    GodRays {
        params: GodRaysParams,
        step: f32,
    },
    GodRaysCombine(GodRaysParams),
    MotionBlur(MotionBlurParams),
    Dof(DofParams),
    Outline(OutlineParams),
    Compositing(CompositingParams),
    Antialiasing(AntialiasingParams),
    Stereo(StereoMode),
    Sky(SkyParams),
    RenderTexture {
        name: String,
    },
    DebugProbe {
        tapped: PassKind,
    },
}

/// Which eye a pass renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Eye {
    #[default]
    Mono,
    Left,
    Right,
}

/// Attachments and render target a pass was bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassContext {
    pub color_image: Option<ImageId>,
    pub depth_image: Option<ImageId>,
    pub render_target: Option<RenderTargetId>,
}

impl PassContext {
    /// A pass without attachments renders to the presentation surface.
    pub fn targets_surface(&self) -> bool {
        self.color_image.is_none() && self.depth_image.is_none()
    }
}

/// A pass in the render graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub kind: PassKind,
    pub flags: PassFlags,
    pub subtype: Option<PostEffect>,
    pub params: PassParams,
    pub camera: Option<CameraId>,
    pub eye: Eye,
    /// Links that live only while this pass executes.
    pub internal_links: Vec<LinkHandle>,
    pub context: PassContext,
}

impl Pass {
    /// Create a pass with the default flags of its kind.
    pub fn new(kind: PassKind) -> Self {
        Self {
            kind,
            flags: kind.info().flags,
            subtype: None,
            params: PassParams::None,
            camera: None,
            eye: Eye::Mono,
            internal_links: Vec::new(),
            context: PassContext::default(),
        }
    }

    /// Whether the pass is part of the executable queue.
    pub fn enqueue(&self) -> bool {
        self.flags.contains(PassFlags::ENQUEUE)
    }

    /// Display label, e.g. `POSTPROCESSING (X_BLUR)`.
    pub fn label(&self) -> String {
        match self.subtype {
            Some(effect) => format!("{} ({effect})", self.kind),
            None => self.kind.to_string(),
        }
    }
}
