//! Debug probe injection.
//!
//! A probe shows one intermediate image on screen instead of the final
//! frame. The tapped output is copied, not redirected: a new `DebugView`
//! pass reads a copy of the tapped link, which binds to the same image, and
//! everything that used to present to the sink presents into the view
//! instead. Consumers of the tapped link keep their images.

use crate::catalog::PassCatalog;
use crate::config::DebugProbe;
use crate::diagnostics::{BuildStage, Diagnostics};
use crate::graph::{LinkOrigin, PassHandle, PassKind, PassParams, RenderGraph, ResourceLink};
use crate::profiling::profile_function;
use crate::types::{Sampler, Slot};

/// Splice a debug view of `probe` in front of the sink.
///
/// Returns the view pass, or `None` with a warning in `diagnostics` when
/// there is nothing to tap. A graph without a tap is left unchanged.
///
/// Must run before images are bound.
pub fn inject<C: PassCatalog + ?Sized>(
    graph: &mut RenderGraph,
    catalog: &mut C,
    probe: DebugProbe,
    diagnostics: &mut Diagnostics,
) -> Option<PassHandle> {
    profile_function!();

    let DebugProbe { kind, index, slot } = probe;
    let Some(target) = graph.find_nth_pass(kind, index) else {
        diagnostics.warn(
            BuildStage::DebugProbe,
            format!("no {kind} pass #{index} to tap"),
        );
        return None;
    };
    let tapped = graph.outputs(target).map(|(_, link)| link).find(|&link| {
        let link = graph.link(link);
        link.active && link.source == slot
    });
    let Some(tapped) = tapped else {
        diagnostics.warn(
            BuildStage::DebugProbe,
            format!("{kind} pass #{index} has no active {slot} output"),
        );
        return None;
    };
    let Some(sink) = graph.sink() else {
        diagnostics.warn(BuildStage::DebugProbe, "graph has no sink to present to");
        return None;
    };

    let presenting: Vec<_> = graph
        .input_edges(sink)
        .into_iter()
        .filter(|&(_, from, _)| {
            let kind = graph.pass(from).kind;
            !kind.is_color_picking() && kind != PassKind::Sky
        })
        .map(|(edge, _, _)| edge)
        .collect();

    let view = catalog
        .create(
            PassKind::DebugView,
            None,
            PassParams::DebugProbe { tapped: kind },
        )
        .instantiate(graph);

    let original = graph.link(tapped);
    let origin = match original.origin {
        LinkOrigin::SharesWith(parent) => LinkOrigin::SharesWith(parent),
        _ => LinkOrigin::ClonedFrom(tapped),
    };
    let mut tap = original.clone_unbound(origin);
    tap.dest = Sampler::Color.into();

    if tap.multisampled {
        let resolve = catalog
            .create(PassKind::Resolve, None, PassParams::None)
            .instantiate(graph);
        let resolved = ResourceLink {
            multisampled: false,
            force_unique: true,
            origin: LinkOrigin::Owned,
            ..tap.clone()
        };
        graph.connect(target, resolve, tap);
        graph.connect(resolve, view, resolved);
    } else {
        graph.connect(target, view, tap);
    }

    for edge in presenting {
        graph.retarget(edge, view);
    }
    graph.connect(
        view,
        sink,
        ResourceLink::new(Slot::Screen, Slot::None, 1, 0.5, true),
    );

    diagnostics.info(
        BuildStage::DebugProbe,
        format!("showing {slot} of {kind} pass #{index} in {view}"),
    );
    Some(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind_resources;
    use crate::catalog::DefaultPassCatalog;
    use crate::compiler::compile;
    use crate::graph::Pass;
    use crate::pool::ImagePool;
    use rstest::rstest;

    struct Fixture {
        graph: RenderGraph,
        opaque: PassHandle,
        blend: PassHandle,
        picking: PassHandle,
        sink: PassHandle,
    }

    // opaque ─COLOR->COLOR─> blend ─SCREEN─> sink <─COLOR─ picking
    fn fixture(multisampled: bool) -> Fixture {
        let mut graph = RenderGraph::new();
        let opaque = graph.add_pass(Pass::new(PassKind::MainOpaque));
        let blend = graph.add_pass(Pass::new(PassKind::MainBlend));
        let picking = graph.add_pass(Pass::new(PassKind::ColorPicking));
        let sink = graph.add_pass(Pass::new(PassKind::Sink));
        graph.connect(
            opaque,
            blend,
            ResourceLink::viewport(Slot::Color, Slot::Color).multisampled(multisampled),
        );
        graph.connect(
            blend,
            sink,
            ResourceLink::viewport(Slot::Screen, Slot::None),
        );
        graph.connect(
            picking,
            sink,
            ResourceLink::viewport(Slot::Color, Slot::None),
        );
        Fixture {
            graph,
            opaque,
            blend,
            picking,
            sink,
        }
    }

    fn probe(
        f: &mut Fixture,
        probe: DebugProbe,
        diagnostics: &mut Diagnostics,
    ) -> Option<PassHandle> {
        let mut catalog = DefaultPassCatalog::default();
        inject(&mut f.graph, &mut catalog, probe, diagnostics)
    }

    #[test]
    fn test_view_replaces_screen_output() {
        let mut f = fixture(false);
        let mut diagnostics = Diagnostics::new();
        let view = probe(
            &mut f,
            DebugProbe::new(PassKind::MainOpaque, 0, Slot::Color),
            &mut diagnostics,
        )
        .unwrap();
        let graph = &f.graph;

        assert_eq!(graph.pass(view).kind, PassKind::DebugView);
        assert_eq!(
            graph.find_input(view, Sampler::Color.into()),
            Some(f.opaque)
        );
        assert_eq!(graph.find_on_screen(), Some(view));
        assert_eq!(graph.find_input(view, Slot::None), Some(f.blend));
        assert_eq!(graph.find_input(f.sink, Slot::None), Some(f.picking));
        assert_eq!(graph.find_input(f.blend, Slot::Color), Some(f.opaque));
        assert!(!diagnostics.has_warnings());
    }

    #[test]
    fn test_tap_binds_the_tapped_image() {
        let mut f = fixture(false);
        probe(
            &mut f,
            DebugProbe::new(PassKind::MainOpaque, 0, Slot::Color),
            &mut Diagnostics::new(),
        )
        .unwrap();

        let mut pool = ImagePool::new();
        let order = f.graph.dag().topological_order().unwrap();
        bind_resources(&mut f.graph, &mut pool, &order, &mut Diagnostics::new());

        let images: Vec<_> = f
            .graph
            .outputs(f.opaque)
            .map(|(_, link)| f.graph.link(link).bound_image)
            .collect();
        assert_eq!(images.len(), 2);
        assert!(images[0].is_some());
        assert_eq!(images[0], images[1]);
        assert_eq!(pool.outstanding().count(), 0);
    }

    #[test]
    fn test_multisampled_tap_is_resolved() {
        let mut f = fixture(true);
        let view = probe(
            &mut f,
            DebugProbe::new(PassKind::MainOpaque, 0, Slot::Color),
            &mut Diagnostics::new(),
        )
        .unwrap();
        let graph = &f.graph;

        let resolve = graph.find_input(view, Sampler::Color.into()).unwrap();
        assert_eq!(graph.pass(resolve).kind, PassKind::Resolve);
        assert_eq!(
            graph.find_input(resolve, Sampler::Color.into()),
            Some(f.opaque)
        );

        let (_, resolved) = graph.outputs(resolve).next().unwrap();
        let resolved = graph.link(resolved);
        assert!(!resolved.multisampled);
        assert!(resolved.force_unique);
    }

    #[test]
    fn test_resolved_tap_is_written_by_queued_pass() {
        let mut f = fixture(true);
        let view = probe(
            &mut f,
            DebugProbe::new(PassKind::MainOpaque, 0, Slot::Color),
            &mut Diagnostics::new(),
        )
        .unwrap();

        let mut pool = ImagePool::new();
        let order = f.graph.dag().topological_order().unwrap();
        bind_resources(&mut f.graph, &mut pool, &order, &mut Diagnostics::new());
        let queue = compile(&f.graph).unwrap();
        let graph = &f.graph;

        let (writer, sampled) = graph
            .inputs(view)
            .find(|&(_, link)| graph.link(link).dest == Sampler::Color.into())
            .unwrap();
        let sampled = graph.link(sampled).bound_image.unwrap();
        let written = graph
            .outputs(writer)
            .any(|(_, link)| graph.link(link).bound_image == Some(sampled));
        assert!(written);
        assert!(queue.position_of(writer).unwrap() < queue.position_of(view).unwrap());
        assert_eq!(pool.outstanding().count(), 0);
    }

    #[rstest]
    #[case::missing_pass(DebugProbe::new(PassKind::Ssao, 0, Slot::Color))]
    #[case::missing_index(DebugProbe::new(PassKind::MainOpaque, 1, Slot::Color))]
    #[case::missing_slot(DebugProbe::new(PassKind::MainOpaque, 0, Slot::Depth))]
    fn test_missing_tap_warns_and_leaves_graph(#[case] request: DebugProbe) {
        let mut f = fixture(false);
        let passes = f.graph.pass_count();
        let links = f.graph.link_count();
        let mut diagnostics = Diagnostics::new();

        assert_eq!(probe(&mut f, request, &mut diagnostics), None);
        assert!(diagnostics.has_warnings());
        assert_eq!(f.graph.pass_count(), passes);
        assert_eq!(f.graph.link_count(), links);
        assert_eq!(f.graph.find_on_screen(), Some(f.blend));
    }
}
