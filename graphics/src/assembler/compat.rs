//! Reduced pipeline for hardware without float render targets or depth
//! textures.
//!
//! The main passes render straight to the presentation surface, one after
//! another, and there is no post-processing. Color picking and the sky are
//! kept.

use crate::catalog::PassCatalog;
use crate::config::BuildConfig;
use crate::graph::{PassKind, PassParams, RenderGraph, ResourceLink};
use crate::scene::SceneDescriptor;
use crate::types::{Sampler, Slot};

use super::AssembledGraph;

fn screen() -> ResourceLink {
    ResourceLink::viewport(Slot::Screen, Slot::None)
}

pub(super) fn assemble<C: PassCatalog + ?Sized>(
    scene: &SceneDescriptor,
    config: &BuildConfig,
    catalog: &mut C,
) -> AssembledGraph {
    let mut graph = RenderGraph::new();
    let mut add = |graph: &mut RenderGraph, kind: PassKind, params: PassParams| {
        catalog.create(kind, None, params).instantiate(graph)
    };

    let opaque = add(&mut graph, PassKind::MainOpaque, PassParams::None);
    let blend = add(&mut graph, PassKind::MainBlend, PassParams::None);
    graph.connect(opaque, blend, screen());

    let mut tail = blend;
    if scene.xray {
        let xray = add(&mut graph, PassKind::MainXray, PassParams::None);
        graph.connect(tail, xray, screen());
        tail = xray;
    }

    let sink = add(&mut graph, PassKind::Sink, PassParams::None);

    if config.wireframe_debug {
        let wireframe = add(&mut graph, PassKind::Wireframe, PassParams::None);
        graph.connect(tail, wireframe, screen());
        tail = wireframe;
    }
    graph.connect(tail, sink, screen());

    if scene.color_picking {
        let mut picking = add(&mut graph, PassKind::ColorPicking, PassParams::None);
        if scene.xray {
            let xray = add(&mut graph, PassKind::ColorPickingXray, PassParams::None);
            graph.connect(
                picking,
                xray,
                ResourceLink::viewport(Slot::Color, Slot::Color),
            );
            picking = xray;
        }
        graph.connect(
            picking,
            sink,
            ResourceLink::viewport(Slot::Color, Slot::None),
        );
        graph.connect(
            picking,
            sink,
            ResourceLink::viewport(Slot::Depth, Slot::None),
        );
    }

    if let Some(params) = scene.sky.filter(|s| s.procedural_skydome) {
        let sky = add(&mut graph, PassKind::Sky, PassParams::Sky(params));
        graph.connect(
            sky,
            sink,
            ResourceLink::fixed(Slot::Cubemap, Sampler::Sky, config.cubemap_size),
        );
    }

    AssembledGraph {
        graph,
        stereo: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DefaultPassCatalog;
    use crate::scene::SkyParams;

    #[test]
    fn test_compat_chain_renders_to_screen() {
        let scene = SceneDescriptor::default().with_color_picking(true);
        let config = BuildConfig::default().with_compat();
        let mut catalog = DefaultPassCatalog::new(&config);
        let assembled = assemble(&scene, &config, &mut catalog);
        let graph = &assembled.graph;

        let xray = graph.find_pass(PassKind::MainXray).unwrap();
        assert_eq!(graph.find_on_screen(), Some(xray));
        assert!(graph.links().iter().all(|l| !l.is_sampled()));
        assert!(graph.find_pass(PassKind::ShadowReceive).is_none());
        assert!(assembled.stereo.is_none());
    }

    #[test]
    fn test_compat_keeps_sky() {
        let scene = SceneDescriptor::default().with_sky(SkyParams::default());
        let config = BuildConfig::default().with_compat();
        let mut catalog = DefaultPassCatalog::new(&config);
        let graph = assemble(&scene, &config, &mut catalog).graph;

        let sky = graph.find_pass(PassKind::Sky).unwrap();
        let sink = graph.sink().unwrap();
        assert_eq!(graph.find_input(sink, Sampler::Sky.into()), Some(sky));
    }
}
