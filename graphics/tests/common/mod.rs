//! Common utilities for planner integration tests.
//!
//! Provides named feature combinations and checkers for the properties every
//! planned frame must satisfy.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use passforge_graphics::graph::CanonicalDescriptor;
use passforge_graphics::{
    AntialiasingMethod, BloomParams, BuildConfig, CompositingParams, DefaultPassCatalog, DofParams,
    Extent2d, FrameGraph, FramePlanner, GodRaysParams, ImageId, LinkHandle, LinkOrigin,
    MotionBlurParams, OutlineParams, PassHandle, PassKind, ReflectionParams, RenderGraph,
    RenderTexture, SceneDescriptor, ShadowParams, SkyParams, Slot, SsaoParams, StereoMode,
    WaterParams,
};

/// Initialize test logging. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Plan a frame with the stock catalog.
pub fn plan(scene: &SceneDescriptor, config: &BuildConfig) -> FrameGraph {
    init_logging();
    let mut catalog = DefaultPassCatalog::new(config);
    FramePlanner::build(scene, config, &mut catalog).expect("frame should plan")
}

/// Scene with one shadow cascade and nothing else.
pub fn shadowed() -> SceneDescriptor {
    SceneDescriptor::default().with_shadows(ShadowParams::default())
}

/// Scene with every screen-space feature enabled.
pub fn everything() -> SceneDescriptor {
    SceneDescriptor::default()
        .with_shadows(ShadowParams {
            cascades: 3,
            ..Default::default()
        })
        .with_reflections(ReflectionParams {
            plane_reflections: 2,
            cube_reflections: 1,
        })
        .with_ssao(SsaoParams::default())
        .with_god_rays(GodRaysParams::default())
        .with_bloom(BloomParams::default())
        .with_motion_blur(MotionBlurParams::default())
        .with_dof(DofParams::default())
        .with_outline(OutlineParams::default())
        .with_compositing(CompositingParams::default())
        .with_antialiasing(AntialiasingMethod::Smaa { temporal: true })
        .with_water(WaterParams::default())
        .with_sky(SkyParams::default())
        .with_color_picking(true)
        .with_dynamic_grass()
}

/// Named feature combinations exercised by the property tests.
pub fn configuration(name: &str) -> (SceneDescriptor, BuildConfig) {
    let config = BuildConfig::default();
    match name {
        "minimal" => (SceneDescriptor::default(), config),
        "shadowed" => (shadowed(), config),
        "everything" => (everything(), config),
        "fxaa_supersampled" => (
            shadowed()
                .with_bloom(BloomParams::default())
                .with_antialiasing(AntialiasingMethod::Fxaa),
            config.with_resolution_factor(2.0),
        ),
        "msaa" => (
            shadowed()
                .with_msaa(4)
                .with_god_rays(GodRaysParams::default())
                .with_dof(DofParams::default()),
            config,
        ),
        "msaa_only" => (SceneDescriptor::default().with_msaa(4), config),
        "stereo" => (everything().with_stereo(StereoMode::Anaglyph), config),
        "hmd" => (
            shadowed()
                .with_bloom(BloomParams::default())
                .with_stereo(StereoMode::Hmd),
            config,
        ),
        "render_to_texture" => (
            everything()
                .with_render_texture(RenderTexture::new("minimap", Extent2d::new(256, 256)))
                .with_render_texture(RenderTexture::new("mirror", Extent2d::new(512, 256))),
            config,
        ),
        "compat" => (
            SceneDescriptor::default()
                .with_color_picking(true)
                .with_sky(SkyParams::default()),
            config.with_compat().with_wireframe(),
        ),
        other => panic!("unknown configuration {other}"),
    }
}

/// Position of every pass in a topological order of the whole graph.
pub fn positions(graph: &RenderGraph) -> HashMap<PassHandle, usize> {
    graph
        .dag()
        .topological_order()
        .expect("graph should be acyclic")
        .into_iter()
        .enumerate()
        .map(|(i, pass)| (pass, i))
        .collect()
}

/// The graph is acyclic, has exactly one sink, and every pass feeds it.
pub fn assert_single_sink(graph: &RenderGraph) {
    let order = graph
        .dag()
        .topological_order()
        .expect("graph should be acyclic");
    assert_eq!(order.len(), graph.pass_count());

    let sinks = graph.dag().sinks();
    assert_eq!(sinks.len(), 1, "expected exactly one sink, got {sinks:?}");
    let sink = sinks[0];
    for pass in graph.pass_handles() {
        assert!(
            pass == sink || graph.dag().has_path(pass, sink),
            "{} {pass} does not feed the sink",
            graph.pass(pass).label()
        );
    }
}

/// No image written fresh by a pass is held by a link that is still
/// waiting for its consumer.
///
/// A link is live from its producer to its consumer. Links into the sink
/// are handed back by their producer and are never live.
pub fn assert_no_overlapping_images(graph: &RenderGraph) {
    let pos = positions(graph);

    let live: Vec<(usize, usize, ImageId)> = graph
        .edges()
        .filter_map(|(_, from, to, handle)| {
            let link = graph.link(handle);
            if !link.active || link.dest == Slot::None {
                return None;
            }
            Some((pos[&from], pos[&to], link.bound_image?))
        })
        .collect();

    for (&pass, &at) in &pos {
        let read: HashSet<ImageId> = graph
            .inputs(pass)
            .filter_map(|(_, link)| graph.link(link).bound_image)
            .collect();

        let written = graph
            .outputs(pass)
            .map(|(_, link)| link)
            .chain(graph.pass(pass).internal_links.iter().copied())
            .filter(|&link| {
                let link = graph.link(link);
                link.active && !matches!(link.origin, LinkOrigin::SharesWith(_))
            })
            .filter_map(|link| graph.link(link).bound_image)
            .filter(|image| !read.contains(image));

        for image in written {
            for &(from, to, held) in &live {
                assert!(
                    !(held == image && from < at && at < to),
                    "{} {pass} overwrites {image:?} held from {from} to {to}",
                    graph.pass(pass).label()
                );
            }
        }
    }
}

/// Every shared pool entry was handed back.
pub fn assert_refcounts_balanced(frame: &FrameGraph) {
    let outstanding: Vec<_> = frame.pool().outstanding().collect();
    assert!(
        outstanding.is_empty(),
        "entries still checked out: {outstanding:?}"
    );
}

/// No enqueued pass runs before one of its predecessors.
pub fn assert_queue_respects_edges(frame: &FrameGraph) {
    let graph = frame.graph();
    let queue = frame.queue();
    for (_, from, to, _) in graph.edges() {
        if let (Some(a), Some(b)) = (queue.position_of(from), queue.position_of(to)) {
            assert!(
                a < b,
                "{} runs before its input {}",
                graph.pass(to).label(),
                graph.pass(from).label()
            );
        }
    }
    for &pass in queue.passes() {
        assert!(graph.pass(pass).enqueue());
    }
}

/// Everything that delivers a frame to the sink runs. Color picking and the
/// procedural sky are rendered on demand and stay out of the queue.
pub fn assert_presenters_enqueued(frame: &FrameGraph) {
    let graph = frame.graph();
    let sink = graph.sink().expect("graph should have a sink");
    for (from, _) in graph.inputs(sink) {
        let kind = graph.pass(from).kind;
        if kind.is_color_picking() || kind == PassKind::Sky {
            continue;
        }
        assert!(
            frame.queue().contains(from),
            "{} {from} presents but is not enqueued",
            graph.pass(from).label()
        );
    }
    if let Some(present) = graph.find_on_screen() {
        assert!(frame.queue().contains(present));
    }
}

/// One stretch of topological positions during which a link holds an image.
#[derive(Debug, Clone)]
pub struct Hold {
    pub link: LinkHandle,
    pub start: usize,
    pub end: usize,
    pub descriptor: CanonicalDescriptor,
}

impl Hold {
    pub fn covers(&self, at: usize) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Holds of every shared image, keyed by image.
///
/// Inputs are handed back after the consumer's outputs are bound, so a hold
/// includes its consumer. Internal links and links into the sink are held
/// for their own pass only.
pub fn shared_holds(frame: &FrameGraph) -> HashMap<ImageId, Vec<Hold>> {
    let graph = frame.graph();
    let pos = positions(graph);
    let mut holds: HashMap<ImageId, Vec<Hold>> = HashMap::new();

    let edges = graph.edges().map(|(_, from, to, link)| {
        let end = if graph.link(link).dest == Slot::None {
            from
        } else {
            to
        };
        (link, pos[&from], pos[&end])
    });
    let internals = graph.passes().flat_map(|(pass, p)| {
        let at = pos[&pass];
        p.internal_links.iter().map(move |&link| (link, at, at))
    });

    for (handle, start, end) in edges.chain(internals) {
        let link = graph.link(handle);
        let Some(image) = link.bound_image.filter(|_| link.active) else {
            continue;
        };
        if !frame.pool().is_shared(image) {
            continue;
        }
        holds.entry(image).or_default().push(Hold {
            link: handle,
            start,
            end,
            descriptor: link.descriptor(),
        });
    }
    holds
}

/// Descriptor the pool keyed `holds` under, if the links that first drew
/// the image agree on one.
fn allocation_descriptor(graph: &RenderGraph, holds: &[Hold]) -> Option<CanonicalDescriptor> {
    let start = holds.iter().map(|h| h.start).min()?;
    let mut first = holds
        .iter()
        .filter(|h| h.start == start)
        .filter(|h| !matches!(graph.link(h.link).origin, LinkOrigin::SharesWith(_)))
        .map(|h| &h.descriptor);
    let descriptor = first.next()?;
    first.all(|d| d == descriptor).then(|| descriptor.clone())
}

/// A fresh shared image is only allocated when no free image with the same
/// descriptor exists at that point.
///
/// Returns how many shared images were handed to links that do not overlap.
pub fn assert_free_images_are_reused(frame: &FrameGraph) -> usize {
    let graph = frame.graph();
    let holds = shared_holds(frame);

    let mut reused = 0;
    for (&image, image_holds) in &holds {
        let disjoint = image_holds
            .iter()
            .any(|a| image_holds.iter().any(|b| a.end < b.start));
        if disjoint {
            reused += 1;
        }

        let Some(descriptor) = allocation_descriptor(graph, image_holds) else {
            continue;
        };
        if descriptor.force_unique {
            continue;
        }
        let at = image_holds.iter().map(|h| h.start).min().unwrap_or(0);

        for (&other, other_holds) in &holds {
            if other == image {
                continue;
            }
            let allocated_before = other_holds.iter().any(|h| h.start < at);
            let free = other_holds.iter().all(|h| !h.covers(at));
            if allocated_before
                && free
                && allocation_descriptor(graph, other_holds).as_ref() == Some(&descriptor)
            {
                panic!("{image:?} allocated at {at} while matching {other:?} was free");
            }
        }
    }
    reused
}
