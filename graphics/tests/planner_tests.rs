//! End-to-end planning tests.
//!
//! Every named configuration in `common` is planned from scratch and checked
//! against the properties a frame graph must always have. The remaining
//! tests pin down individual features on a concrete pipeline.

mod common;

use std::collections::{HashMap, HashSet};

use common::{configuration, plan};
use passforge_graphics::assembler::assemble;
use passforge_graphics::normalizer::normalize;
use passforge_graphics::{
    BuildConfig, DebugProbe, DefaultPassCatalog, Diagnostics, Eye, LinkOrigin, PassHandle,
    PassKind, RenderGraph, Sampler, SceneDescriptor, Slot, StereoMode, TextureFilter,
};
use rstest::rstest;

// ============================================================================
// Properties over every configuration
// ============================================================================

#[rstest]
#[case::minimal("minimal")]
#[case::shadowed("shadowed")]
#[case::everything("everything")]
#[case::fxaa_supersampled("fxaa_supersampled")]
#[case::msaa("msaa")]
#[case::msaa_only("msaa_only")]
#[case::stereo("stereo")]
#[case::hmd("hmd")]
#[case::render_to_texture("render_to_texture")]
#[case::compat("compat")]
fn test_frame_invariants(#[case] name: &str) {
    let (scene, config) = configuration(name);
    let frame = plan(&scene, &config);

    common::assert_single_sink(frame.graph());
    common::assert_refcounts_balanced(&frame);
    common::assert_queue_respects_edges(&frame);
    common::assert_presenters_enqueued(&frame);
    common::assert_no_overlapping_images(frame.graph());
    common::assert_free_images_are_reused(&frame);
    assert!(
        !frame.diagnostics().has_warnings(),
        "{name}: {:?}",
        frame.diagnostics().warnings().collect::<Vec<_>>()
    );
}

#[rstest]
#[case::shadowed("shadowed")]
#[case::everything("everything")]
#[case::stereo("stereo")]
fn test_every_edge_owns_its_link(#[case] name: &str) {
    let (scene, config) = configuration(name);
    let frame = plan(&scene, &config);
    let graph = frame.graph();

    let mut seen = HashSet::new();
    for (_, from, to, link) in graph.edges() {
        assert!(seen.insert(link), "{from} -> {to} reuses link {link:?}");
    }
    for (_, pass) in graph.passes() {
        for &link in &pass.internal_links {
            assert!(
                seen.insert(link),
                "internal link {link:?} is also used elsewhere"
            );
        }
    }
}

#[rstest]
#[case::everything("everything")]
#[case::stereo("stereo")]
fn test_branching_pipeline_reuses_images(#[case] name: &str) {
    let (scene, config) = configuration(name);
    let frame = plan(&scene, &config);

    let reused = common::assert_free_images_are_reused(&frame);
    assert!(reused > 0, "{name}: no image was handed to a later link");
}

#[test]
fn test_mutating_a_clone_leaves_the_original() {
    let (scene, config) = configuration("stereo");
    let frame = plan(&scene, &config);
    let branches = frame.stereo().unwrap();
    let mut graph = frame.graph().clone();

    let &(original, clone) = branches
        .links
        .iter()
        .find(|&&(original, _)| frame.graph().link(original).min_filter == TextureFilter::Nearest)
        .unwrap();
    let siblings: Vec<_> = branches
        .links
        .iter()
        .filter(|&&(_, c)| c != clone)
        .map(|&(_, c)| (c, graph.link(c).clone()))
        .collect();

    graph.link_mut(clone).min_filter = TextureFilter::Linear;

    assert_eq!(graph.link(original).min_filter, TextureFilter::Nearest);
    assert_eq!(graph.link(original), frame.graph().link(original));
    for (sibling, before) in siblings {
        assert_eq!(graph.link(sibling), &before);
    }
}

#[rstest]
#[case::shadowed("shadowed")]
#[case::everything("everything")]
#[case::msaa("msaa")]
#[case::compat("compat")]
fn test_normalize_is_idempotent(#[case] name: &str) {
    common::init_logging();
    let (scene, config) = configuration(name);
    let mut catalog = DefaultPassCatalog::new(&config);
    let mut diagnostics = Diagnostics::new();
    let mut graph = assemble(&scene, &config, &mut catalog, &mut diagnostics).graph;

    normalize(&mut graph, config.compat, &mut diagnostics);
    let once = graph.links().to_vec();
    normalize(&mut graph, config.compat, &mut diagnostics);

    assert_eq!(graph.links(), once.as_slice());
}

// ============================================================================
// Concrete pipelines
// ============================================================================

#[test]
fn test_single_cascade_pipeline() {
    let (scene, config) = configuration("shadowed");
    let frame = plan(&scene, &config);
    let graph = frame.graph();

    for kind in [
        PassKind::ShadowCast,
        PassKind::ShadowReceive,
        PassKind::MainOpaque,
        PassKind::MainBlend,
    ] {
        let passes = graph.passes_of_kind(kind);
        assert_eq!(passes.len(), 1, "{kind}");
        assert!(frame.queue().contains(passes[0]), "{kind}");
    }
    let present = graph.find_on_screen().unwrap();
    assert!(frame.queue().contains(present));

    let shadow = graph.find_pass(PassKind::ShadowCast).unwrap();
    let opaque = graph.find_pass(PassKind::MainOpaque).unwrap();
    let shadow_depth = graph.pass(shadow).context.depth_image.unwrap();
    let opaque_depth = graph.pass(opaque).context.depth_image.unwrap();
    assert_ne!(shadow_depth, opaque_depth);
}

#[test]
fn test_stereo_shares_single_eye_passes() {
    let (mono_scene, config) = configuration("shadowed");
    let mono = plan(&mono_scene, &config);
    let stereo = plan(
        &mono_scene.clone().with_stereo(StereoMode::Anaglyph),
        &config,
    );

    assert_eq!(mono.graph().pass_count(), 7);
    assert_eq!(stereo.graph().pass_count(), 11);
    assert!(stereo.graph().pass_count() < 2 * mono.graph().pass_count());
    assert_eq!(stereo.graph().passes_of_kind(PassKind::ShadowCast).len(), 1);

    let combines = stereo.graph().passes_of_kind(PassKind::StereoCombine);
    assert_eq!(combines.len(), 1);
    let branches = stereo.stereo().unwrap();
    let upstream: Vec<_> = stereo
        .graph()
        .inputs(combines[0])
        .map(|(from, _)| from)
        .collect();
    assert_eq!(
        upstream,
        vec![branches.left_frontier, branches.right_frontier]
    );
}

/// Active inputs of `pass` as `(producer, source, dest)`, with producers
/// renamed by `rename`.
fn active_inputs(
    graph: &RenderGraph,
    pass: PassHandle,
    rename: impl Fn(PassHandle) -> PassHandle,
) -> Vec<(PassHandle, String, String)> {
    let mut inputs: Vec<_> = graph
        .inputs(pass)
        .filter(|&(_, link)| graph.link(link).active)
        .map(|(from, link)| {
            let link = graph.link(link);
            (rename(from), link.source.to_string(), link.dest.to_string())
        })
        .collect();
    inputs.sort();
    inputs
}

#[rstest]
#[case::anaglyph("stereo")]
#[case::hmd("hmd")]
fn test_stereo_branches_mirror_each_other(#[case] name: &str) {
    let (scene, config) = configuration(name);
    let frame = plan(&scene, &config);
    let graph = frame.graph();
    let branches = frame.stereo().unwrap();

    let to_left: HashMap<_, _> = branches
        .passes
        .pairs()
        .into_iter()
        .map(|(left, right)| (right, left))
        .collect();

    for (left, right) in branches.passes.pairs() {
        let (l, r) = (graph.pass(left), graph.pass(right));
        assert_eq!(l.kind, r.kind);
        assert_eq!(l.subtype, r.subtype);
        assert_eq!((l.eye, r.eye), (Eye::Left, Eye::Right));

        let left_inputs = active_inputs(graph, left, |from| from);
        let right_inputs = active_inputs(graph, right, |from| {
            to_left.get(&from).copied().unwrap_or(from)
        });
        assert_eq!(left_inputs, right_inputs, "{}", l.label());
    }

    for (pass, p) in graph.passes() {
        if p.kind.is_shared_only() {
            assert_eq!(p.eye, Eye::Mono);
            assert!(branches.passes.clone_of(pass).is_none());
        }
    }
}

#[test]
fn test_right_eye_aliases_shared_maps() {
    let (scene, config) = configuration("stereo");
    let frame = plan(&scene, &config);
    let graph = frame.graph();

    let shared_links: Vec<_> = graph
        .edges()
        .filter(|&(_, from, _, _)| graph.pass(from).kind == PassKind::ShadowCast)
        .map(|(_, _, to, link)| (to, graph.link(link)))
        .collect();
    assert!(
        shared_links
            .iter()
            .any(|(to, _)| graph.pass(*to).eye == Eye::Right)
    );

    for (_, link) in &shared_links {
        if let LinkOrigin::SharesWith(parent) = link.origin {
            assert_eq!(link.bound_image, graph.link(parent).bound_image);
        }
    }
}

#[test]
fn test_hmd_renders_each_eye_at_half_width() {
    let (scene, config) = configuration("hmd");
    let frame = plan(&scene, &config);
    let graph = frame.graph();
    let branches = frame.stereo().unwrap();

    let left = graph.find_pass(PassKind::MainOpaque).unwrap();
    let right = branches.passes.clone_of(left).unwrap();
    for opaque in [left, right] {
        let camera = graph.pass(opaque).camera.unwrap();
        let camera = graph.camera(camera);
        assert_eq!((camera.width, camera.height), (640, 720));
    }

    let shadow = graph.find_pass(PassKind::ShadowCast).unwrap();
    let (_, shadow_map) = graph.outputs(shadow).next().unwrap();
    assert_eq!(graph.link(shadow_map).size_mult_x, 1.0);
}

#[test]
fn test_compat_pipeline_uses_renderbuffers() {
    let (scene, config) = configuration("compat");
    let frame = plan(&scene, &config);
    let graph = frame.graph();

    assert!(graph.find_pass(PassKind::ShadowReceive).is_none());
    assert!(graph.find_pass(PassKind::DepthPack).is_none());
    assert!(graph.find_pass(PassKind::Wireframe).is_some());

    let depth_links: Vec<_> = graph
        .edges()
        .map(|(_, _, _, link)| graph.link(link))
        .filter(|link| link.active && link.source == Slot::Depth)
        .collect();
    assert!(!depth_links.is_empty());
    assert!(depth_links.iter().all(|link| link.use_renderbuffer));

    let opaque = graph.find_pass(PassKind::MainOpaque).unwrap();
    assert!(graph.pass(opaque).context.targets_surface());
}

#[test]
fn test_render_to_texture_outputs_are_distinct() {
    let (scene, config) = configuration("render_to_texture");
    let frame = plan(&scene, &config);
    let graph = frame.graph();

    let screens = graph.passes_of_kind(PassKind::Screen);
    assert_eq!(screens.len(), 2);
    assert!(graph.find_pass(PassKind::MainPlaneReflect).is_none());
    assert!(graph.find_pass(PassKind::BloomCombine).is_none());

    let images: Vec<_> = screens
        .iter()
        .flat_map(|&screen| graph.outputs(screen).collect::<Vec<_>>())
        .map(|(_, link)| graph.link(link))
        .inspect(|link| assert!(link.force_unique))
        .map(|link| link.bound_image.unwrap())
        .collect();
    assert_eq!(images.len(), 2);
    assert_ne!(images[0], images[1]);

    let extents: Vec<_> = images
        .iter()
        .map(|&image| frame.pool().image(image).extent(scene.viewport))
        .collect();
    assert_eq!((extents[0].width, extents[0].height), (256, 256));
    assert_eq!((extents[1].width, extents[1].height), (512, 256));
}

#[test]
fn test_motion_blur_keeps_private_images() {
    let (scene, config) = configuration("everything");
    let frame = plan(&scene, &config);
    let graph = frame.graph();

    let blur = graph.find_pass(PassKind::MotionBlur).unwrap();
    let accumulators = &graph.pass(blur).internal_links;
    assert!(!accumulators.is_empty());

    let private: Vec<_> = accumulators
        .iter()
        .map(|&link| graph.link(link).bound_image.unwrap())
        .collect();
    let everywhere_else: HashSet<_> = graph
        .edges()
        .map(|(_, _, _, link)| link)
        .chain(
            graph
                .passes()
                .filter(|&(pass, _)| pass != blur)
                .flat_map(|(_, p)| p.internal_links.clone()),
        )
        .filter_map(|link| graph.link(link).bound_image)
        .collect();

    for image in private {
        assert!(!frame.pool().is_shared(image));
        assert!(!everywhere_else.contains(&image));
    }
}

#[test]
fn test_debug_probe_presents_intermediate_image() {
    let (scene, config) = configuration("everything");
    let config = config.with_debug_probe(DebugProbe::new(PassKind::Ssao, 0, Slot::Color));
    let frame = plan(&scene, &config);
    let graph = frame.graph();

    let view = frame.debug_view().unwrap();
    assert_eq!(graph.find_on_screen(), Some(view));
    assert!(frame.queue().contains(view));

    let ssao = graph.find_pass(PassKind::Ssao).unwrap();
    let tapped: HashSet<_> = graph
        .outputs(ssao)
        .map(|(_, link)| graph.link(link))
        .filter(|link| link.source == Slot::Color)
        .map(|link| link.bound_image)
        .collect();
    assert_eq!(tapped.len(), 1);

    common::assert_single_sink(graph);
    common::assert_refcounts_balanced(&frame);
    common::assert_no_overlapping_images(graph);
}

#[test]
fn test_debug_probe_resolves_multisampled_tap() {
    let (scene, config) = configuration("msaa_only");
    let config = config.with_debug_probe(DebugProbe::new(PassKind::MainBlend, 0, Slot::Color));
    let frame = plan(&scene, &config);
    let graph = frame.graph();

    let view = frame.debug_view().unwrap();
    let (writer, sampled) = graph
        .inputs(view)
        .find(|&(_, link)| graph.link(link).dest == Sampler::Color.into())
        .unwrap();
    assert_eq!(graph.pass(writer).kind, PassKind::Resolve);
    assert!(!graph.link(sampled).multisampled);
    assert!(graph.link(sampled).bound_image.is_some());

    let queue = frame.queue();
    assert!(queue.position_of(writer).unwrap() < queue.position_of(view).unwrap());

    common::assert_presenters_enqueued(&frame);
    common::assert_refcounts_balanced(&frame);
    common::assert_no_overlapping_images(graph);
}

#[test]
fn test_debug_probe_without_target_plans_normally() {
    let config = BuildConfig::default().with_debug_probe(DebugProbe::new(
        PassKind::BloomCombine,
        0,
        Slot::Color,
    ));
    let frame = plan(&SceneDescriptor::default(), &config);

    assert!(frame.debug_view().is_none());
    assert!(frame.diagnostics().has_warnings());
    assert_eq!(
        frame
            .graph()
            .pass(frame.graph().find_on_screen().unwrap())
            .kind,
        PassKind::Screen
    );
}

#[test]
fn test_dot_output() {
    let (scene, config) = configuration("shadowed");
    let dot = plan(&scene, &config).to_dot();

    assert!(dot.starts_with("digraph \"render_graph\" {"));
    assert!(dot.contains("style=\"dotted\""));
    assert!(dot.contains("SHADOW_CAST"));
    assert!(dot.contains("SCREEN -> NONE"));
}
