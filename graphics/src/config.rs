//! Build-time configuration that is not a scene feature.

use crate::graph::PassKind;
use crate::types::Slot;

/// Tap one pass output and show it on screen instead of the final image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugProbe {
    pub kind: PassKind,
    /// Which pass of `kind`, counting in creation order.
    pub index: usize,
    /// Output slot of the tapped pass.
    pub slot: Slot,
}

impl DebugProbe {
    pub fn new(kind: PassKind, index: usize, slot: Slot) -> Self {
        Self { kind, index, slot }
    }
}

/// Planner configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Side of cube reflection maps.
    pub cubemap_size: u32,
    /// Side of the dynamic grass map.
    pub grass_map_size: u32,
    /// Plane reflection size relative to the viewport.
    pub reflect_multiplier: f32,
    /// Supersampling factor applied to everything rendered before
    /// antialiasing. Values above 1 render at higher resolution.
    pub resolution_factor: f32,
    /// Add a wireframe overlay pass after the main passes.
    pub wireframe_debug: bool,
    /// Build the reduced pipeline for low-end hardware.
    pub compat: bool,
    pub debug_probe: Option<DebugProbe>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cubemap_size: 512,
            grass_map_size: 256,
            reflect_multiplier: 0.5,
            resolution_factor: 1.0,
            wireframe_debug: false,
            compat: false,
            debug_probe: None,
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cubemap_size(mut self, size: u32) -> Self {
        self.cubemap_size = size;
        self
    }

    pub fn with_grass_map_size(mut self, size: u32) -> Self {
        self.grass_map_size = size;
        self
    }

    pub fn with_reflect_multiplier(mut self, multiplier: f32) -> Self {
        self.reflect_multiplier = multiplier;
        self
    }

    pub fn with_resolution_factor(mut self, factor: f32) -> Self {
        self.resolution_factor = factor;
        self
    }

    pub fn with_wireframe(mut self) -> Self {
        self.wireframe_debug = true;
        self
    }

    pub fn with_compat(mut self) -> Self {
        self.compat = true;
        self
    }

    pub fn with_debug_probe(mut self, probe: DebugProbe) -> Self {
        self.debug_probe = Some(probe);
        self
    }

    /// Whether images before antialiasing are supersampled.
    pub fn supersampled(&self) -> bool {
        self.resolution_factor > 1.0
    }
}
