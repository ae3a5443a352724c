//! Image binding.
//!
//! The binder walks passes in topological order and treats the [`ImagePool`]
//! like a register file: a link's image stays checked out from the moment
//! its producer executes until its consumer has executed, and is handed to
//! the next link with an equal descriptor after that.
//!
//! For every pass:
//!
//! 1. Internal links get an image and give it back right away; they only
//!    live while the pass executes.
//! 2. Active outputs are bound in edge order. A link that shares another
//!    link's image inherits it. Outputs continuing a feedback input, or
//!    fanning out the same source slot, keep one image. Everything else
//!    comes from the pool.
//! 3. Every input image is released, then every output the sink swallows.
//!
//! Passes that are not pooled draw from a private scratch storage, so the
//! images they keep across frames are never handed to anyone else.
//!
//! Once every link is bound, [`assign_render_targets`] derives the color and
//! depth attachment of each pass and sizes its camera.

use crate::diagnostics::{BuildStage, Diagnostics};
use crate::graph::{LinkHandle, LinkOrigin, PassHandle, PassKind, RenderGraph};
use crate::pool::{ImageId, ImagePool, Storage};
use crate::profiling::profile_function;
use crate::types::{Extent2d, Slot};

/// Bind an image to every active link of `graph`, walking `order`.
///
/// `order` must be a topological order of every pass in the graph,
/// including passes that are not enqueued.
///
/// # Panics
///
/// Panics if a link shares the image of a link that was never bound.
pub fn bind_resources(
    graph: &mut RenderGraph,
    pool: &mut ImagePool,
    order: &[PassHandle],
    diagnostics: &mut Diagnostics,
) {
    profile_function!();

    for &pass in order {
        bind_pass(graph, pool, pass);
    }

    let bound = graph
        .links()
        .iter()
        .filter(|l| l.bound_image.is_some())
        .count();
    diagnostics.info(
        BuildStage::Binding,
        format!("bound {bound} links to {} images", pool.image_count()),
    );
}

fn storage_for(kind: PassKind) -> Storage {
    if kind.is_pooled() {
        Storage::Shared
    } else {
        Storage::Private
    }
}

fn bind_pass(graph: &mut RenderGraph, pool: &mut ImagePool, pass: PassHandle) {
    let storage = storage_for(graph.pass(pass).kind);

    if storage == Storage::Private {
        pool.begin_private_scope();
    }
    let internal = graph.pass(pass).internal_links.clone();
    let mut scratch = Vec::with_capacity(internal.len());
    for handle in internal {
        let link = graph.link(handle);
        if !link.active || link.bound_image.is_some() {
            continue;
        }
        if let Some(image) = pool.acquire(storage, link) {
            graph.link_mut(handle).bound_image = Some(image);
            scratch.push(image);
        }
    }
    for image in scratch {
        pool.release(image);
    }
    // Outputs must not land on the images the internals just gave back.
    if storage == Storage::Private {
        pool.begin_private_scope();
    }

    let inputs: Vec<LinkHandle> = graph.inputs(pass).map(|(_, link)| link).collect();
    let outputs: Vec<LinkHandle> = graph.outputs(pass).map(|(_, link)| link).collect();

    // Images this pass writes, keyed by source slot and sample count.
    let mut written: Vec<(Slot, bool, ImageId)> = inputs
        .iter()
        .filter_map(|&handle| {
            let link = graph.link(handle);
            if link.active && link.is_feedback() {
                Some((link.source, link.multisampled, link.bound_image?))
            } else {
                None
            }
        })
        .collect();

    for &handle in &outputs {
        let link = graph.link(handle);
        if !link.active || link.bound_image.is_some() {
            continue;
        }

        let image = match link.origin {
            LinkOrigin::SharesWith(parent) => {
                let image = graph.link(parent).bound_image.unwrap_or_else(|| {
                    panic!(
                        "Link {} -> {} shares the image of a link that was never bound",
                        link.source, link.dest
                    )
                });
                pool.retain(image);
                Some(image)
            }
            _ if !link.source.carries_image() => None,
            _ => {
                let same = written
                    .iter()
                    .find(|&&(source, ms, _)| source == link.source && ms == link.multisampled);
                match same {
                    Some(&(_, _, image)) => {
                        pool.retain(image);
                        Some(image)
                    }
                    None => {
                        let image = pool.acquire(storage, link);
                        if let Some(image) = image {
                            written.push((link.source, link.multisampled, image));
                        }
                        image
                    }
                }
            }
        };

        if let Some(image) = image {
            log::trace!(
                "{} {pass}: {} -> {} bound to {image:?}",
                graph.pass(pass).label(),
                link.source,
                link.dest
            );
        }
        graph.link_mut(handle).bound_image = image;
    }

    // Links into the sink were already given back by their producer.
    for &handle in &inputs {
        let link = graph.link(handle);
        if link.dest == Slot::None {
            continue;
        }
        if let Some(image) = link.bound_image {
            pool.release(image);
        }
    }
    for &handle in &outputs {
        let link = graph.link(handle);
        if link.dest == Slot::None {
            if let Some(image) = link.bound_image {
                pool.release(image);
            }
        }
    }
}

/// Fill in the attachments and render target of every pass in `order` and
/// size its camera for `viewport`.
///
/// Passes without attachments render to the presentation surface and get
/// no render target.
pub fn assign_render_targets(
    graph: &mut RenderGraph,
    pool: &mut ImagePool,
    order: &[PassHandle],
    viewport: Extent2d,
) {
    profile_function!();

    for &pass in order {
        if graph.pass(pass).kind == PassKind::Sink {
            continue;
        }

        let outputs: Vec<(PassHandle, LinkHandle)> = graph.outputs(pass).collect();
        for (consumer, handle) in outputs {
            let link = graph.link(handle);
            let (Some(image), true) = (link.bound_image, link.active) else {
                continue;
            };
            let (source, feedback) = (link.source, link.is_feedback());
            attach(graph, pass, source, image);
            if feedback {
                attach(graph, consumer, source, image);
            }
        }

        let internal = graph.pass(pass).internal_links.clone();
        for handle in internal {
            let link = graph.link(handle);
            if let (true, true, Some(image)) = (link.active, link.is_feedback(), link.bound_image) {
                let source = link.source;
                attach(graph, pass, source, image);
            }
        }
    }

    for &pass in order {
        if !graph.pass(pass).context.targets_surface() {
            let target = pool.allocate_render_target();
            graph.pass_mut(pass).context.render_target = Some(target);
        }

        let pass = graph.pass(pass);
        let Some(camera) = pass.camera else {
            continue;
        };
        let context = pass.context;
        let extent = context
            .color_image
            .or(context.depth_image)
            .map_or(viewport, |image| pool.image(image).extent(viewport));

        let camera = graph.camera_mut(camera);
        camera.width = extent.width;
        camera.height = extent.height;
        camera.color_attachment = context.color_image;
        camera.depth_attachment = context.depth_image;
        camera.render_target = context.render_target;
    }

    log::debug!("assigned {} render targets", pool.render_target_count());
}

fn attach(graph: &mut RenderGraph, pass: PassHandle, source: Slot, image: ImageId) {
    let context = &mut graph.pass_mut(pass).context;
    match source {
        Slot::Color | Slot::Cubemap => context.color_image = Some(image),
        Slot::Depth => context.depth_image = Some(image),
        _ => {}
    }
}
