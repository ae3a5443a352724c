//! Reference-counted image pool.
//!
//! Every link that carries an image gets one from an [`ImagePool`]. Images are
//! described, not created: the pool hands out [`ImageId`]s and records an
//! [`ImageDescriptor`] for each, which the image-creation collaborator turns
//! into real GPU memory after the build.
//!
//! # Liveness
//!
//! A shared pool entry is checked out while at least one pending consumer
//! still needs its image. When the count drops to zero the entry becomes
//! reusable by the next link with an equal [`CanonicalDescriptor`]. This is
//! linear-scan register allocation over the topological pass order.
//!
//! Entries are scanned in creation order and the *first* free match wins.
//!
//! # Private storage
//!
//! Some passes keep their images across frames (the motion blur accumulator,
//! temporal resolve history) and must never share them. Those passes draw
//! from a private scratch storage that is discarded before the next such
//! pass, so nothing ever reuses their images.

use crate::graph::{CanonicalDescriptor, ResourceLink};
use crate::types::{Extent2d, Slot, TextureFilter};

/// Handle to an image described by an [`ImagePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(u32);

impl ImageId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Handle to a render target (framebuffer) grouping a pass's attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(u32);

impl RenderTargetId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}

/// What kind of GPU object backs an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Color,
    DepthTexture,
    /// Depth storage that can be attached but never sampled.
    DepthRenderbuffer,
    Cubemap,
}

/// Creation parameters of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescriptor {
    pub kind: ImageKind,
    /// Width in pixels, or the viewport width multiplier when
    /// `tracks_viewport` is set.
    pub width_factor: f32,
    pub height_factor: f32,
    pub tracks_viewport: bool,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub multisampled: bool,
    pub use_comparison: bool,
}

impl ImageDescriptor {
    /// Describe the image a link needs, or `None` if its source slot carries
    /// no image.
    pub fn for_link(link: &ResourceLink) -> Option<Self> {
        let kind = match link.source {
            Slot::Color => ImageKind::Color,
            Slot::Depth if link.use_renderbuffer => ImageKind::DepthRenderbuffer,
            Slot::Depth => ImageKind::DepthTexture,
            Slot::Cubemap => ImageKind::Cubemap,
            _ => return None,
        };

        let base = link.base_size as f32;
        let (width_factor, height_factor) = if kind == ImageKind::Cubemap {
            (base, base)
        } else {
            (base * link.size_mult_x, base * link.size_mult_y)
        };

        Some(Self {
            kind,
            width_factor,
            height_factor,
            tracks_viewport: link.resizes_with_viewport,
            min_filter: link.min_filter,
            mag_filter: link.mag_filter,
            multisampled: link.multisampled,
            use_comparison: link.use_comparison,
        })
    }

    /// Pixel size of the image for a given viewport.
    pub fn extent(&self, viewport: Extent2d) -> Extent2d {
        if self.tracks_viewport {
            viewport.scaled(self.width_factor, self.height_factor)
        } else {
            Extent2d::new(1, 1).scaled(self.width_factor, self.height_factor)
        }
    }
}

/// A reusable image together with its key and checkout count.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub descriptor: CanonicalDescriptor,
    pub image: ImageId,
    pub checkout: u32,
}

/// Which storage a pass draws its images from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    Shared,
    Private,
}

/// Image arena plus the shared and private storages that hand images out.
#[derive(Debug, Clone, Default)]
pub struct ImagePool {
    images: Vec<ImageDescriptor>,
    shared: Vec<PoolEntry>,
    private: Vec<PoolEntry>,
    render_targets: u32,
}

impl ImagePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out an image for `link`, reusing a free entry with an equal
    /// descriptor unless the link is `force_unique`.
    ///
    /// Returns `None` for links whose source slot carries no image.
    pub fn acquire(&mut self, storage: Storage, link: &ResourceLink) -> Option<ImageId> {
        let image_desc = ImageDescriptor::for_link(link)?;
        let descriptor = link.descriptor();

        let entries = match storage {
            Storage::Shared => &mut self.shared,
            Storage::Private => &mut self.private,
        };

        if !link.force_unique {
            let free = entries
                .iter_mut()
                .find(|e| e.checkout == 0 && e.descriptor == descriptor);
            if let Some(entry) = free {
                entry.checkout = 1;
                log::trace!("reusing image {:?} for {}", entry.image, link.source);
                return Some(entry.image);
            }
        }

        let image = ImageId::new(self.images.len() as u32);
        self.images.push(image_desc);
        entries.push(PoolEntry {
            descriptor,
            image,
            checkout: 1,
        });
        log::trace!(
            "allocated image {image:?} for {} ({storage:?})",
            link.source
        );
        Some(image)
    }

    /// Record one more pending consumer of `image`.
    pub fn retain(&mut self, image: ImageId) {
        if let Some(entry) = self.entry_mut(image) {
            entry.checkout += 1;
        }
    }

    /// Record that one consumer of `image` has executed.
    ///
    /// Releasing an image that no storage holds does nothing. Releasing a
    /// free entry is a bookkeeping bug and asserts in debug builds.
    pub fn release(&mut self, image: ImageId) {
        if let Some(entry) = self.entry_mut(image) {
            debug_assert!(
                entry.checkout > 0,
                "image {image:?} released more often than acquired"
            );
            entry.checkout = entry.checkout.saturating_sub(1);
        }
    }

    fn entry_mut(&mut self, image: ImageId) -> Option<&mut PoolEntry> {
        self.shared
            .iter_mut()
            .chain(self.private.iter_mut())
            .find(|e| e.image == image)
    }

    /// Discard the private scratch storage. Its images stay described but
    /// can no longer be handed out.
    pub fn begin_private_scope(&mut self) {
        self.private.clear();
    }

    /// Allocate the next render target handle.
    pub fn allocate_render_target(&mut self) -> RenderTargetId {
        let id = RenderTargetId::new(self.render_targets);
        self.render_targets += 1;
        id
    }

    /// Get the descriptor of an image.
    ///
    /// # Panics
    ///
    /// Panics if the image was not described by this pool.
    pub fn image(&self, id: ImageId) -> &ImageDescriptor {
        &self.images[id.index() as usize]
    }

    /// All described images, indexed by [`ImageId`].
    pub fn images(&self) -> &[ImageDescriptor] {
        &self.images
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn render_target_count(&self) -> usize {
        self.render_targets as usize
    }

    /// Shared entries in creation order.
    pub fn entries(&self) -> &[PoolEntry] {
        &self.shared
    }

    /// Checkout count of a shared image.
    pub fn checkout(&self, image: ImageId) -> Option<u32> {
        self.shared
            .iter()
            .find(|e| e.image == image)
            .map(|e| e.checkout)
    }

    /// Whether `image` lives in the shared storage.
    pub fn is_shared(&self, image: ImageId) -> bool {
        self.shared.iter().any(|e| e.image == image)
    }

    /// Shared entries that are still checked out.
    pub fn outstanding(&self) -> impl Iterator<Item = &PoolEntry> {
        self.shared.iter().filter(|e| e.checkout > 0)
    }
}

static_assertions::assert_impl_all!(ImagePool: Send, Sync);
