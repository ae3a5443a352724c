//! Resource links: typed, sized dependencies between passes.

use crate::pool::ImageId;
use crate::types::{Slot, TextureFilter};

/// Handle to a [`ResourceLink`] in a [`RenderGraph`](super::RenderGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHandle(u32);

impl LinkHandle {
    /// Create a new link handle from an arena index.
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the arena index of this link.
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Where a link came from and whether it owns its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkOrigin {
    /// Created by the assembler or a later stage; binds its own image.
    #[default]
    Owned,
    /// Copy of another link that still binds its own image.
    ClonedFrom(LinkHandle),
    /// Alias of another link's image; never searches the pool.
    SharesWith(LinkHandle),
}

/// A typed dependency carrying one image from a producer pass to a consumer
/// pass, or living inside a single pass.
///
/// The producer writes the image through `source`; the consumer reads it
/// through `dest`. When `source == dest` the link is a *feedback* link: the
/// consumer keeps rendering into the same attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceLink {
    pub source: Slot,
    pub dest: Slot,
    /// Base size in pixels, or the viewport multiplier when
    /// `resizes_with_viewport` is set.
    pub base_size: u32,
    pub size_mult_x: f32,
    pub size_mult_y: f32,
    pub resizes_with_viewport: bool,
    pub active: bool,
    pub bound_image: Option<ImageId>,
    pub multisampled: bool,
    pub use_renderbuffer: bool,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub force_unique: bool,
    pub use_comparison: bool,
    pub origin: LinkOrigin,
}

/// The pool key of a link: everything that decides what image it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDescriptor {
    pub source: Slot,
    pub base_size: u32,
    pub size_mult_x: f32,
    pub size_mult_y: f32,
    pub resizes_with_viewport: bool,
    pub multisampled: bool,
    pub use_renderbuffer: bool,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub force_unique: bool,
    pub use_comparison: bool,
}

impl ResourceLink {
    /// Create an active, nearest-filtered link with square multipliers.
    ///
    /// # Panics
    ///
    /// Panics if `source` is a sampler uniform.
    pub fn new(
        source: Slot,
        dest: Slot,
        base_size: u32,
        size_mult: f32,
        resizes_with_viewport: bool,
    ) -> Self {
        assert!(
            !source.is_sampler(),
            "Sampler {source} cannot be used as a link source"
        );
        Self {
            source,
            dest,
            base_size,
            size_mult_x: size_mult,
            size_mult_y: size_mult,
            resizes_with_viewport,
            active: true,
            bound_image: None,
            multisampled: false,
            use_renderbuffer: false,
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Nearest,
            force_unique: false,
            use_comparison: false,
            origin: LinkOrigin::Owned,
        }
    }

    /// Full-viewport link.
    pub fn viewport(source: Slot, dest: impl Into<Slot>) -> Self {
        Self::new(source, dest.into(), 1, 1.0, true)
    }

    /// Viewport link scaled by `mult` on both axes.
    pub fn scaled(source: Slot, dest: impl Into<Slot>, mult: f32) -> Self {
        Self::new(source, dest.into(), 1, mult, true)
    }

    /// Fixed-size link of `size` pixels that ignores viewport resizes.
    pub fn fixed(source: Slot, dest: impl Into<Slot>, size: u32) -> Self {
        Self::new(source, dest.into(), size, 1.0, false)
    }

    /// Zero-payload link that only orders two passes.
    pub fn ordering() -> Self {
        Self {
            active: false,
            ..Self::new(Slot::None, Slot::None, 1, 1.0, false)
        }
    }

    /// Use linear filtering for both minification and magnification.
    pub fn linear(mut self) -> Self {
        self.min_filter = TextureFilter::Linear;
        self.mag_filter = TextureFilter::Linear;
        self
    }

    /// Set whether the image is multisampled.
    pub fn multisampled(mut self, multisampled: bool) -> Self {
        self.multisampled = multisampled;
        self
    }

    /// Never share this link's image with another link.
    pub fn force_unique(mut self) -> Self {
        self.force_unique = true;
        self
    }

    /// Sample the depth image with comparison.
    pub fn with_comparison(mut self) -> Self {
        self.use_comparison = true;
        self
    }

    /// Set independent viewport multipliers.
    pub fn with_size_mult(mut self, x: f32, y: f32) -> Self {
        self.size_mult_x = x;
        self.size_mult_y = y;
        self
    }

    /// Pool key of this link.
    pub fn descriptor(&self) -> CanonicalDescriptor {
        CanonicalDescriptor {
            source: self.source,
            base_size: self.base_size,
            size_mult_x: self.size_mult_x,
            size_mult_y: self.size_mult_y,
            resizes_with_viewport: self.resizes_with_viewport,
            multisampled: self.multisampled,
            use_renderbuffer: self.use_renderbuffer,
            min_filter: self.min_filter,
            mag_filter: self.mag_filter,
            force_unique: self.force_unique,
            use_comparison: self.use_comparison,
        }
    }

    /// Whether the consumer keeps writing through the same slot.
    pub fn is_feedback(&self) -> bool {
        self.source == self.dest
    }

    /// Whether the consumer reads this link through a sampler.
    pub fn is_sampled(&self) -> bool {
        self.dest.is_sampler()
    }

    /// Copy of this link with a new origin.
    ///
    /// # Panics
    ///
    /// Panics if the link already has an image bound.
    pub fn clone_unbound(&self, origin: LinkOrigin) -> Self {
        assert!(
            self.bound_image.is_none(),
            "Cannot clone link {} -> {} after an image was bound to it",
            self.source,
            self.dest
        );
        Self {
            origin,
            ..self.clone()
        }
    }
}
