//! Common types shared across the graphics system.

use std::fmt;

/// Width and height of an image or viewport, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2d {
    pub width: u32,
    pub height: u32,
}

impl Extent2d {
    /// Create a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Extent with both sides equal.
    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Scale both sides, rounding to the nearest pixel and clamping to 1.
    pub fn scaled(self, x: f32, y: f32) -> Self {
        Self {
            width: scale_side(self.width as f32 * x),
            height: scale_side(self.height as f32 * y),
        }
    }
}

pub(crate) fn scale_side(value: f32) -> u32 {
    (value.round() as u32).max(1)
}

impl fmt::Display for Extent2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Texture filtering used when an image is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

impl TextureFilter {
    /// One-letter tag used in graph dumps.
    pub fn tag(self) -> char {
        match self {
            Self::Nearest => 'N',
            Self::Linear => 'L',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_scaled() {
        let viewport = Extent2d::new(1280, 720);
        assert_eq!(viewport.scaled(0.5, 0.5), Extent2d::new(640, 360));
        assert_eq!(viewport.scaled(0.25, 1.0), Extent2d::new(320, 720));
        assert_eq!(Extent2d::new(3, 3).scaled(0.1, 0.1), Extent2d::new(1, 1));
    }

    #[test]
    fn test_filter_tag() {
        assert_eq!(TextureFilter::default(), TextureFilter::Nearest);
        assert_eq!(TextureFilter::Linear.tag(), 'L');
        assert_eq!(TextureFilter::Nearest.tag(), 'N');
    }
}
