//! Frame descriptors: which features a frame renders with.
//!
//! A [`SceneDescriptor`] is plain data. The presence of a parameter block
//! enables its feature; the assembler never looks at anything else.
//!
//! ```ignore
//! let scene = SceneDescriptor::new(Extent2d::new(1920, 1080))
//!     .with_shadows(ShadowParams::default())
//!     .with_bloom(BloomParams::default())
//!     .with_stereo(StereoMode::Anaglyph);
//! ```

mod camera;

pub use camera::{Camera, CameraId, CameraProjection};

use crate::types::Extent2d;

/// Cascaded shadow maps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    /// Number of cascades, each rendered by its own pass.
    pub cascades: u8,
    /// Side of each square shadow map, in pixels.
    pub resolution: u32,
    pub self_shadow_normal_offset: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            cascades: 1,
            resolution: 2048,
            self_shadow_normal_offset: 0.01,
        }
    }
}

/// Planar and cubemap reflections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReflectionParams {
    pub plane_reflections: u8,
    pub cube_reflections: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsaoParams {
    pub radius_increase: f32,
    pub hemisphere: bool,
    pub influence: f32,
    pub dist_factor: f32,
    pub samples: u32,
    /// Blur the mask with a depth-aware kernel.
    pub blur_depth: bool,
    pub blur_discard_value: f32,
}

impl Default for SsaoParams {
    fn default() -> Self {
        Self {
            radius_increase: 3.0,
            hemisphere: false,
            influence: 0.7,
            dist_factor: 0.0,
            samples: 16,
            blur_depth: false,
            blur_discard_value: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomParams {
    pub key: f32,
    pub edge_luminance: f32,
    pub blur: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            key: 0.2,
            edge_luminance: 1.0,
            blur: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GodRaysParams {
    pub intensity: f32,
    pub max_ray_length: f32,
    pub steps_per_pass: f32,
}

impl Default for GodRaysParams {
    fn default() -> Self {
        Self {
            intensity: 0.7,
            max_ray_length: 1.0,
            steps_per_pass: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionBlurParams {
    pub decay_threshold: f32,
    pub factor: f32,
}

impl Default for MotionBlurParams {
    fn default() -> Self {
        Self {
            decay_threshold: 0.01,
            factor: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DofParams {
    pub distance: f32,
    pub front: f32,
    pub rear: f32,
    pub power: f32,
}

impl Default for DofParams {
    fn default() -> Self {
        Self {
            distance: 10.0,
            front: 5.0,
            rear: 5.0,
            power: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineParams {
    pub color: [f32; 3],
    pub factor: f32,
}

impl Default for OutlineParams {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositingParams {
    pub brightness: f32,
    pub contrast: f32,
    pub exposure: f32,
    pub saturation: f32,
}

impl Default for CompositingParams {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 0.0,
            exposure: 1.0,
            saturation: 1.0,
        }
    }
}

/// Antialiasing technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AntialiasingMethod {
    Fxaa,
    /// Subpixel morphological AA; `temporal` adds a velocity pass and a
    /// resolve against the previous frame.
    Smaa {
        temporal: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AntialiasingParams {
    pub method: AntialiasingMethod,
}

impl Default for AntialiasingParams {
    fn default() -> Self {
        Self {
            method: AntialiasingMethod::Fxaa,
        }
    }
}

/// Water surface; enables the refraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterParams {
    pub refraction: bool,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self { refraction: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyParams {
    pub procedural_skydome: bool,
    pub use_as_environment_lighting: bool,
    pub color: [f32; 3],
}

impl Default for SkyParams {
    fn default() -> Self {
        Self {
            procedural_skydome: true,
            use_as_environment_lighting: true,
            color: [0.087, 0.255, 0.6],
        }
    }
}

/// How two eyes are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StereoMode {
    #[default]
    Mono,
    /// Red/cyan composite of two full-size views.
    Anaglyph,
    /// Side-by-side views for a head-mounted display.
    Hmd,
}

impl StereoMode {
    pub fn is_stereo(self) -> bool {
        self != Self::Mono
    }
}

/// Offscreen target the frame is rendered into instead of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTexture {
    pub name: String,
    pub size: Extent2d,
}

impl RenderTexture {
    pub fn new(name: impl Into<String>, size: Extent2d) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Features of one frame configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescriptor {
    pub viewport: Extent2d,
    pub shadows: Option<ShadowParams>,
    pub reflections: Option<ReflectionParams>,
    pub ssao: Option<SsaoParams>,
    pub bloom: Option<BloomParams>,
    pub god_rays: Option<GodRaysParams>,
    pub motion_blur: Option<MotionBlurParams>,
    pub dof: Option<DofParams>,
    pub outline: Option<OutlineParams>,
    pub compositing: Option<CompositingParams>,
    pub antialiasing: Option<AntialiasingParams>,
    pub water: Option<WaterParams>,
    pub sky: Option<SkyParams>,
    pub color_picking: bool,
    pub xray: bool,
    pub dynamic_grass: bool,
    /// Sample count of the main passes; 1 disables multisampling.
    pub msaa_samples: u32,
    pub stereo: StereoMode,
    pub render_to_texture: Vec<RenderTexture>,
}

impl Default for SceneDescriptor {
    fn default() -> Self {
        Self::new(Extent2d::new(1280, 720))
    }
}

impl SceneDescriptor {
    /// Scene with every optional feature disabled.
    pub fn new(viewport: Extent2d) -> Self {
        Self {
            viewport,
            shadows: None,
            reflections: None,
            ssao: None,
            bloom: None,
            god_rays: None,
            motion_blur: None,
            dof: None,
            outline: None,
            compositing: None,
            antialiasing: None,
            water: None,
            sky: None,
            color_picking: false,
            xray: false,
            dynamic_grass: false,
            msaa_samples: 1,
            stereo: StereoMode::Mono,
            render_to_texture: Vec::new(),
        }
    }

    pub fn with_shadows(mut self, params: ShadowParams) -> Self {
        self.shadows = Some(params);
        self
    }

    pub fn with_reflections(mut self, params: ReflectionParams) -> Self {
        self.reflections = Some(params);
        self
    }

    pub fn with_ssao(mut self, params: SsaoParams) -> Self {
        self.ssao = Some(params);
        self
    }

    pub fn with_bloom(mut self, params: BloomParams) -> Self {
        self.bloom = Some(params);
        self
    }

    pub fn with_god_rays(mut self, params: GodRaysParams) -> Self {
        self.god_rays = Some(params);
        self
    }

    pub fn with_motion_blur(mut self, params: MotionBlurParams) -> Self {
        self.motion_blur = Some(params);
        self
    }

    pub fn with_dof(mut self, params: DofParams) -> Self {
        self.dof = Some(params);
        self
    }

    pub fn with_outline(mut self, params: OutlineParams) -> Self {
        self.outline = Some(params);
        self
    }

    pub fn with_compositing(mut self, params: CompositingParams) -> Self {
        self.compositing = Some(params);
        self
    }

    pub fn with_antialiasing(mut self, method: AntialiasingMethod) -> Self {
        self.antialiasing = Some(AntialiasingParams { method });
        self
    }

    pub fn with_water(mut self, params: WaterParams) -> Self {
        self.water = Some(params);
        self
    }

    pub fn with_sky(mut self, params: SkyParams) -> Self {
        self.sky = Some(params);
        self
    }

    pub fn with_color_picking(mut self, xray: bool) -> Self {
        self.color_picking = true;
        self.xray = xray;
        self
    }

    pub fn with_dynamic_grass(mut self) -> Self {
        self.dynamic_grass = true;
        self
    }

    pub fn with_msaa(mut self, samples: u32) -> Self {
        self.msaa_samples = samples.max(1);
        self
    }

    pub fn with_stereo(mut self, mode: StereoMode) -> Self {
        self.stereo = mode;
        self
    }

    pub fn with_render_texture(mut self, target: RenderTexture) -> Self {
        self.render_to_texture.push(target);
        self
    }

    pub fn is_multisampled(&self) -> bool {
        self.msaa_samples > 1
    }

    /// Whether refraction is requested by the water parameters.
    pub fn refraction(&self) -> bool {
        self.water.is_some_and(|w| w.refraction)
    }
}
