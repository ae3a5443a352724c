//! Link endpoint names.

use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;

/// Sampler uniform a consuming pass reads a link through.
///
/// Indexed variants carry the cascade or reflection index that is appended to
/// the uniform name (`u_shadow_map0`, `u_plane_reflection2`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sampler {
    Color,
    Depth,
    Input,
    Main,
    ShadowMap(u8),
    ShadowMask,
    SsaoMask,
    SceneDepth,
    PlaneReflection(u8),
    CubeReflection(u8),
    RefractMap,
    GrassMapDepth,
    GrassMapColor,
    GodRays,
    Luminance,
    AverageLuminance,
    Bloom,
    MotionBlurCurrent,
    MotionBlurAccum,
    Sharp,
    Blurred,
    OutlineMask,
    OutlineMaskBlurred,
    OutlineSource,
    SearchTex,
    AreaTex,
    Blend,
    Velocity,
    ColorPrev,
    StereoLeft,
    StereoRight,
    Sky,
}

const UNINDEXED: [Sampler; 29] = [
    Sampler::Color,
    Sampler::Depth,
    Sampler::Input,
    Sampler::Main,
    Sampler::ShadowMask,
    Sampler::SsaoMask,
    Sampler::SceneDepth,
    Sampler::RefractMap,
    Sampler::GrassMapDepth,
    Sampler::GrassMapColor,
    Sampler::GodRays,
    Sampler::Luminance,
    Sampler::AverageLuminance,
    Sampler::Bloom,
    Sampler::MotionBlurCurrent,
    Sampler::MotionBlurAccum,
    Sampler::Sharp,
    Sampler::Blurred,
    Sampler::OutlineMask,
    Sampler::OutlineMaskBlurred,
    Sampler::OutlineSource,
    Sampler::SearchTex,
    Sampler::AreaTex,
    Sampler::Blend,
    Sampler::Velocity,
    Sampler::ColorPrev,
    Sampler::StereoLeft,
    Sampler::StereoRight,
    Sampler::Sky,
];

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color => f.write_str("u_color"),
            Self::Depth => f.write_str("u_depth"),
            Self::Input => f.write_str("u_input"),
            Self::Main => f.write_str("u_main"),
            Self::ShadowMap(i) => write!(f, "u_shadow_map{i}"),
            Self::ShadowMask => f.write_str("u_shadow_mask"),
            Self::SsaoMask => f.write_str("u_ssao_mask"),
            Self::SceneDepth => f.write_str("u_scene_depth"),
            Self::PlaneReflection(i) => write!(f, "u_plane_reflection{i}"),
            Self::CubeReflection(i) => write!(f, "u_cube_reflection{i}"),
            Self::RefractMap => f.write_str("u_refractmap"),
            Self::GrassMapDepth => f.write_str("u_grass_map_depth"),
            Self::GrassMapColor => f.write_str("u_grass_map_color"),
            Self::GodRays => f.write_str("u_god_rays"),
            Self::Luminance => f.write_str("u_luminance"),
            Self::AverageLuminance => f.write_str("u_average_lum"),
            Self::Bloom => f.write_str("u_bloom"),
            Self::MotionBlurCurrent => f.write_str("u_mb_tex_curr"),
            Self::MotionBlurAccum => f.write_str("u_mb_tex_accum"),
            Self::Sharp => f.write_str("u_sharp"),
            Self::Blurred => f.write_str("u_blurred"),
            Self::OutlineMask => f.write_str("u_outline_mask"),
            Self::OutlineMaskBlurred => f.write_str("u_outline_mask_blurred"),
            Self::OutlineSource => f.write_str("u_outline_src"),
            Self::SearchTex => f.write_str("u_search_tex"),
            Self::AreaTex => f.write_str("u_area_tex"),
            Self::Blend => f.write_str("u_blend"),
            Self::Velocity => f.write_str("u_velocity_tex"),
            Self::ColorPrev => f.write_str("u_color_prev"),
            Self::StereoLeft => f.write_str("u_sampler_left"),
            Self::StereoRight => f.write_str("u_sampler_right"),
            Self::Sky => f.write_str("u_sky"),
        }
    }
}

impl FromStr for Sampler {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let indexed: [(&str, fn(u8) -> Sampler); 3] = [
            ("u_shadow_map", Sampler::ShadowMap),
            ("u_plane_reflection", Sampler::PlaneReflection),
            ("u_cube_reflection", Sampler::CubeReflection),
        ];
        for (prefix, make) in indexed {
            if let Some(index) = s.strip_prefix(prefix).and_then(|rest| rest.parse().ok()) {
                return Ok(make(index));
            }
        }

        UNINDEXED
            .into_iter()
            .find(|sampler| sampler.to_string() == s)
            .ok_or_else(|| GraphError::UnknownSlot(s.to_string()))
    }
}

/// One end of a resource link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Color attachment.
    Color,
    /// Depth attachment.
    Depth,
    /// Cubemap color attachment.
    Cubemap,
    /// The presentation surface.
    Screen,
    /// Sentinel: nothing reads or writes this end.
    None,
    /// A sampler uniform of the consuming pass.
    Sampler(Sampler),
}

impl Slot {
    /// Whether this slot is a sampler uniform.
    pub fn is_sampler(self) -> bool {
        matches!(self, Self::Sampler(_))
    }

    /// Whether a link produced through this slot is backed by an image.
    pub fn carries_image(self) -> bool {
        matches!(self, Self::Color | Self::Depth | Self::Cubemap)
    }
}

impl From<Sampler> for Slot {
    fn from(sampler: Sampler) -> Self {
        Self::Sampler(sampler)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color => f.write_str("COLOR"),
            Self::Depth => f.write_str("DEPTH"),
            Self::Cubemap => f.write_str("CUBEMAP"),
            Self::Screen => f.write_str("SCREEN"),
            Self::None => f.write_str("NONE"),
            Self::Sampler(sampler) => write!(f, "{sampler}"),
        }
    }
}

impl FromStr for Slot {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COLOR" => Ok(Self::Color),
            "DEPTH" => Ok(Self::Depth),
            "CUBEMAP" => Ok(Self::Cubemap),
            "SCREEN" => Ok(Self::Screen),
            "NONE" => Ok(Self::None),
            _ => s.parse().map(Self::Sampler),
        }
    }
}
