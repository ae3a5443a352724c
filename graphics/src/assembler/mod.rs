//! Graph assembly.
//!
//! The assembler turns a [`SceneDescriptor`] into a wired [`RenderGraph`].
//! Every optional feature is wired independently, but all branches converge
//! on the main opaque pass, then the blend pass, then post-processing, then
//! the sink:
//!
//! ```text
//! shadow casts ──┐   reflections ──┐
//!                v                 v
//! grass map ─> depth ─> [ssao] ─> opaque ─> blend ─> [xray] ─> post... ─> sink
//!                 └─> depth pack ───────────^
//! ```
//!
//! Which passes exist is decided here; what each pass starts out as comes
//! from the [`PassCatalog`]. Links that several consumers read the same way
//! (shadow maps, grass maps, the main color/depth pair, blur inputs) are put
//! into the arena once and attached to every consuming edge; the
//! [`normalizer`](crate::normalizer) gives each edge its own copy afterwards.
//!
//! An impossible configuration (too many reflections, a zero-sized shadow
//! map, a feature that needs a pass that was not built) is a caller bug and
//! panics.

mod compat;
mod post;

use std::collections::HashSet;

use passforge_core::dag::Direction;

use crate::catalog::PassCatalog;
use crate::config::BuildConfig;
use crate::diagnostics::{BuildStage, Diagnostics};
use crate::graph::{
    LinkHandle, PassFlags, PassHandle, PassKind, PassParams, PostEffect, RenderGraph, ResourceLink,
};
use crate::profiling::profile_function;
use crate::scene::{SceneDescriptor, StereoMode};
use crate::types::{Sampler, Slot};

/// Maximum number of reflection passes (plane and cube together).
pub const MAX_REFLECTIONS: usize = 4;

/// Where the stereo duplicator splices the right eye in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoSplice {
    /// Last per-eye pass before the eyes are combined.
    pub frontier: PassHandle,
    /// The stereo-combine pass, fed by `frontier` through `u_sampler_left`.
    pub combine: PassHandle,
    pub mode: StereoMode,
}

/// Output of [`assemble`].
#[derive(Debug, Clone)]
pub struct AssembledGraph {
    pub graph: RenderGraph,
    /// Set when the scene asked for stereo rendering.
    pub stereo: Option<StereoSplice>,
}

/// Build the render graph for `scene`.
///
/// Passes that end up not feeding the sink are removed and reported in
/// `diagnostics`.
///
/// # Panics
///
/// Panics on configurations the pipeline cannot express, e.g. more than
/// [`MAX_REFLECTIONS`] reflection passes or a zero-sized shadow map.
pub fn assemble<C: PassCatalog + ?Sized>(
    scene: &SceneDescriptor,
    config: &BuildConfig,
    catalog: &mut C,
    diagnostics: &mut Diagnostics,
) -> AssembledGraph {
    profile_function!();

    let mut assembled = if config.compat {
        compat::assemble(scene, config, catalog)
    } else {
        Assembler::new(scene, config, catalog).run()
    };

    prune_unreachable(&mut assembled.graph, diagnostics);
    assert!(
        assembled.graph.sink().is_some(),
        "Assembled render graph must have exactly one sink"
    );

    diagnostics.info(
        BuildStage::Assembly,
        format!(
            "assembled {} passes and {} links",
            assembled.graph.pass_count(),
            assembled.graph.link_count()
        ),
    );
    assembled
}

/// Remove every pass the sink does not depend on.
///
/// Returns the number of removed passes.
pub(crate) fn prune_unreachable(graph: &mut RenderGraph, diagnostics: &mut Diagnostics) -> usize {
    let Some(sink) = graph.find_pass(PassKind::Sink) else {
        return 0;
    };

    let mut keep: HashSet<PassHandle> = graph
        .dag()
        .reachable(sink, Direction::Upstream)
        .into_iter()
        .collect();
    keep.insert(sink);

    let unreachable: Vec<PassHandle> = graph
        .pass_handles()
        .into_iter()
        .filter(|h| !keep.contains(h))
        .collect();

    for &handle in &unreachable {
        if let Some(pass) = graph.remove_pass(handle) {
            diagnostics.warn(
                BuildStage::Assembly,
                format!(
                    "pruned pass {} {handle}: it does not feed the sink",
                    pass.label()
                ),
            );
        }
    }
    unreachable.len()
}

/// Links a scene pass reads from passes outside the main chain.
#[derive(Debug, Default)]
struct SceneMaps {
    shadow: Vec<(PassHandle, LinkHandle)>,
    plane_reflection: Vec<(PassHandle, LinkHandle)>,
    cube_reflection: Vec<(PassHandle, LinkHandle)>,
    grass: Vec<(PassHandle, LinkHandle)>,
    refraction: Option<(PassHandle, LinkHandle)>,
}

/// Full pipeline builder.
///
/// `frontier` is the tail of the main chain: each stage reads from it and
/// moves it to the last pass it added, so optional chains compose without
/// knowing about each other.
struct Assembler<'a, C: PassCatalog + ?Sized> {
    scene: &'a SceneDescriptor,
    config: &'a BuildConfig,
    catalog: &'a mut C,
    graph: RenderGraph,
    maps: SceneMaps,
    frontier: Option<PassHandle>,
    /// Pass whose depth post-processing reads.
    scene_depth: Option<PassHandle>,
    /// Main color and depth, shared along opaque, blend, xray and wireframe.
    main_color: Option<LinkHandle>,
    main_depth: Option<LinkHandle>,
    color_picking: Option<PassHandle>,
    stereo: Option<StereoSplice>,
}

impl<'a, C: PassCatalog + ?Sized> Assembler<'a, C> {
    fn new(scene: &'a SceneDescriptor, config: &'a BuildConfig, catalog: &'a mut C) -> Self {
        Self {
            scene,
            config,
            catalog,
            graph: RenderGraph::new(),
            maps: SceneMaps::default(),
            frontier: None,
            scene_depth: None,
            main_color: None,
            main_depth: None,
            color_picking: None,
            stereo: None,
        }
    }

    fn run(mut self) -> AssembledGraph {
        let rtt = self.render_to_texture();

        self.shadow_casts();
        if !rtt {
            self.reflections();
        }
        self.grass_map();

        let (depth, shadow_mask) = self.depth_passes();
        let depth_pack = self.add(PassKind::DepthPack);
        self.graph.connect(
            depth,
            depth_pack,
            ResourceLink::viewport(Slot::Depth, Sampler::Depth),
        );

        let opaque = self.opaque(depth, shadow_mask);
        if !rtt && self.scene.color_picking {
            self.color_picking();
        }
        if !rtt && self.scene.refraction() {
            self.refraction(opaque);
        }

        let mut tail = self.main_pass(PassKind::MainBlend, opaque, depth_pack);
        if self.scene.xray {
            tail = self.main_pass(PassKind::MainXray, tail, depth_pack);
        }
        if self.config.wireframe_debug {
            tail = self.wireframe(tail);
        }
        self.frontier = Some(tail);
        self.scene_depth = Some(tail);

        if self.scene.is_multisampled() {
            self.resolve_multisampled(depth);
        }

        if !rtt {
            self.god_rays();
            self.bloom();
            self.motion_blur();
            self.depth_of_field();
            self.outline();
            self.compositing();
            self.antialiasing();
            if self.scene.stereo.is_stereo() {
                self.stereo_combine();
            }
        }

        self.output_level();

        AssembledGraph {
            graph: self.graph,
            stereo: self.stereo,
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn render_to_texture(&self) -> bool {
        !self.scene.render_to_texture.is_empty()
    }

    fn create(
        &mut self,
        kind: PassKind,
        subtype: Option<PostEffect>,
        params: PassParams,
    ) -> PassHandle {
        self.catalog
            .create(kind, subtype, params)
            .instantiate(&mut self.graph)
    }

    fn add(&mut self, kind: PassKind) -> PassHandle {
        self.create(kind, None, PassParams::None)
    }

    fn frontier(&self) -> PassHandle {
        self.frontier
            .unwrap_or_else(|| panic!("Post-processing requires the main scene passes"))
    }

    fn feed(&mut self, to: PassHandle, maps: &[(PassHandle, LinkHandle)]) {
        for &(from, link) in maps {
            self.graph.connect_with(from, to, link);
        }
    }

    /// Shadow maps feed the depth pass and every lit transparent pass.
    fn feed_shadows(&mut self, to: PassHandle) {
        let maps = self.maps.shadow.clone();
        self.feed(to, &maps);
    }

    fn feed_grass(&mut self, to: PassHandle) {
        let maps = self.maps.grass.clone();
        self.feed(to, &maps);
    }

    fn feed_reflections(&mut self, to: PassHandle) {
        let maps: Vec<_> = self
            .maps
            .plane_reflection
            .iter()
            .chain(&self.maps.cube_reflection)
            .copied()
            .collect();
        self.feed(to, &maps);
    }

    // ------------------------------------------------------------------
    // Shared maps
    // ------------------------------------------------------------------

    fn shadow_casts(&mut self) {
        let Some(params) = self.scene.shadows else {
            return;
        };
        assert!(
            params.resolution > 0,
            "Shadow map resolution must be non-zero"
        );

        for index in 0..params.cascades {
            let pass = self.create(
                PassKind::ShadowCast,
                None,
                PassParams::ShadowCascade { index, params },
            );
            let link = self.graph.add_link(ResourceLink::fixed(
                Slot::Depth,
                Sampler::ShadowMap(index),
                params.resolution,
            ));
            self.maps.shadow.push((pass, link));
        }
    }

    fn reflections(&mut self) {
        let Some(params) = self.scene.reflections else {
            return;
        };
        let total = params.plane_reflections as usize + params.cube_reflections as usize;
        assert!(
            total <= MAX_REFLECTIONS,
            "At most {MAX_REFLECTIONS} reflection passes are supported, got {total}"
        );

        for index in 0..params.plane_reflections {
            let pass = self.create(
                PassKind::MainPlaneReflect,
                None,
                PassParams::Reflection { index },
            );
            let link = self.graph.add_link(ResourceLink::scaled(
                Slot::Color,
                Sampler::PlaneReflection(index),
                self.config.reflect_multiplier,
            ));
            self.maps.plane_reflection.push((pass, link));
        }

        for index in 0..params.cube_reflections {
            let pass = self.create(
                PassKind::MainCubeReflect,
                None,
                PassParams::Reflection { index },
            );
            let link = self.graph.add_link(ResourceLink::fixed(
                Slot::Cubemap,
                Sampler::CubeReflection(index),
                self.config.cubemap_size,
            ));
            self.maps.cube_reflection.push((pass, link));
        }
    }

    fn grass_map(&mut self) {
        if !self.scene.dynamic_grass {
            return;
        }
        let size = self.config.grass_map_size;
        let pass = self.add(PassKind::GrassMap);
        let depth = self
            .graph
            .add_link(ResourceLink::fixed(Slot::Depth, Sampler::GrassMapDepth, size).linear());
        let color = self
            .graph
            .add_link(ResourceLink::fixed(Slot::Color, Sampler::GrassMapColor, size).linear());
        self.maps.grass = vec![(pass, depth), (pass, color)];
    }

    // ------------------------------------------------------------------
    // Main scene
    // ------------------------------------------------------------------

    /// Depth pass with optional SSAO. Returns the depth pass and the pass
    /// producing the shadow mask the opaque pass reads.
    fn depth_passes(&mut self) -> (PassHandle, PassHandle) {
        let depth = self.add(PassKind::ShadowReceive);
        self.feed_shadows(depth);
        self.feed_grass(depth);

        let Some(params) = self.scene.ssao else {
            return (depth, depth);
        };

        let ssao = self.create(PassKind::Ssao, None, PassParams::Ssao(params));
        self.graph.connect(
            depth,
            ssao,
            ResourceLink::viewport(Slot::Color, Sampler::Color),
        );
        let depth_in = self.graph.connect(
            depth,
            ssao,
            ResourceLink::viewport(Slot::Depth, Sampler::Depth),
        );

        let blur = self.create(PassKind::SsaoBlur, None, PassParams::Ssao(params));
        self.graph.connect(
            ssao,
            blur,
            ResourceLink::viewport(Slot::Color, Sampler::SsaoMask),
        );
        self.graph.connect_with(depth, blur, depth_in);

        (depth, blur)
    }

    fn opaque(&mut self, depth: PassHandle, shadow_mask: PassHandle) -> PassHandle {
        let multisampled = self.scene.is_multisampled();
        let opaque = self.add(PassKind::MainOpaque);

        let main_depth = self
            .graph
            .add_link(ResourceLink::viewport(Slot::Depth, Slot::Depth).multisampled(multisampled));
        let main_color = self
            .graph
            .add_link(ResourceLink::viewport(Slot::Color, Slot::Color).multisampled(multisampled));
        self.main_depth = Some(main_depth);
        self.main_color = Some(main_color);

        if multisampled {
            // The resolved depth of the depth pass cannot seed a
            // multisampled attachment.
            self.graph.pass_mut(opaque).flags |= PassFlags::CLEAR_DEPTH;
        } else {
            self.graph.connect_with(depth, opaque, main_depth);
        }

        self.graph.connect(
            shadow_mask,
            opaque,
            ResourceLink::viewport(Slot::Color, Sampler::ShadowMask),
        );
        self.feed_grass(opaque);
        self.feed_reflections(opaque);
        opaque
    }

    fn color_picking(&mut self) {
        let picking = self.add(PassKind::ColorPicking);
        if !self.scene.xray {
            self.color_picking = Some(picking);
            return;
        }

        let xray = self.add(PassKind::ColorPickingXray);
        self.graph.connect(
            picking,
            xray,
            ResourceLink::viewport(Slot::Color, Slot::Color),
        );
        self.graph.connect(
            picking,
            xray,
            ResourceLink::viewport(Slot::Depth, Slot::Depth),
        );
        self.color_picking = Some(xray);
    }

    fn refraction(&mut self, opaque: PassHandle) {
        let refract = self.add(PassKind::Refract);
        self.graph.connect(
            opaque,
            refract,
            ResourceLink::viewport(Slot::Color, Sampler::Color),
        );
        let link = self
            .graph
            .add_link(ResourceLink::viewport(Slot::Color, Sampler::RefractMap));
        self.maps.refraction = Some((refract, link));
    }

    fn main_links(&self) -> (LinkHandle, LinkHandle) {
        match (self.main_color, self.main_depth) {
            (Some(color), Some(depth)) => (color, depth),
            _ => panic!("Main scene links are created by the opaque pass"),
        }
    }

    /// Blend or x-ray pass continuing the main chain from `prev`.
    fn main_pass(
        &mut self,
        kind: PassKind,
        prev: PassHandle,
        depth_pack: PassHandle,
    ) -> PassHandle {
        let (color, depth) = self.main_links();
        let pass = self.add(kind);
        self.graph.connect_with(prev, pass, color);
        self.graph.connect_with(prev, pass, depth);
        self.feed_grass(pass);
        self.feed_shadows(pass);
        self.graph.connect(
            depth_pack,
            pass,
            ResourceLink::viewport(Slot::Color, Sampler::SceneDepth),
        );
        self.feed_reflections(pass);
        if let Some((refract, link)) = self.maps.refraction {
            self.graph.connect_with(refract, pass, link);
        }
        pass
    }

    fn wireframe(&mut self, prev: PassHandle) -> PassHandle {
        let (color, depth) = self.main_links();
        let pass = self.add(PassKind::Wireframe);
        self.graph.connect_with(prev, pass, color);
        self.graph.connect_with(prev, pass, depth);
        self.feed_grass(pass);
        pass
    }

    /// Resolve the multisampled main chain. Post-processing then reads the
    /// resolved color and the single-sampled depth of the depth pass.
    fn resolve_multisampled(&mut self, depth: PassHandle) {
        let prev = self.frontier();
        let resolve = self.add(PassKind::Resolve);
        self.graph.connect(
            prev,
            resolve,
            ResourceLink::viewport(Slot::Color, Sampler::Color).multisampled(true),
        );
        self.frontier = Some(resolve);
        self.scene_depth = Some(depth);
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    fn stereo_combine(&mut self) {
        let prev = self.frontier();
        let combine = self.create(
            PassKind::StereoCombine,
            None,
            PassParams::Stereo(self.scene.stereo),
        );
        self.graph.connect(
            prev,
            combine,
            ResourceLink::viewport(Slot::Color, Sampler::StereoLeft),
        );
        self.stereo = Some(StereoSplice {
            frontier: prev,
            combine,
            mode: self.scene.stereo,
        });
        self.frontier = Some(combine);
    }

    /// Whether the last pass keeps rendering into an upstream attachment and
    /// therefore cannot present directly.
    fn needs_screen_copy(&self, pass: PassHandle) -> bool {
        self.graph.inputs(pass).any(|(_, link)| {
            let link = self.graph.link(link);
            link.active && link.is_feedback()
        })
    }

    /// Screen copies, color picking and sky, all feeding the sink.
    fn output_level(&mut self) {
        let scene = self.scene;
        let prev = self.frontier();
        let mut level: Vec<(PassHandle, ResourceLink)> = Vec::new();

        if self.render_to_texture() {
            for target in &scene.render_to_texture {
                let screen = self.catalog.create(
                    PassKind::Screen,
                    None,
                    PassParams::RenderTexture {
                        name: target.name.clone(),
                    },
                );
                let screen = screen.instantiate(&mut self.graph);
                self.graph.connect(
                    prev,
                    screen,
                    ResourceLink::viewport(Slot::Color, Sampler::Color),
                );
                let output = ResourceLink::new(Slot::Color, Slot::None, 1, 1.0, false)
                    .with_size_mult(target.size.width as f32, target.size.height as f32)
                    .force_unique();
                level.push((screen, output));
            }
        } else if self.needs_screen_copy(prev) {
            let screen = self.add(PassKind::Screen);
            self.graph.connect(
                prev,
                screen,
                ResourceLink::viewport(Slot::Color, Sampler::Color),
            );
            level.push((screen, ResourceLink::viewport(Slot::Screen, Slot::None)));
        } else {
            level.push((prev, ResourceLink::viewport(Slot::Screen, Slot::None)));
        }

        if let Some(picking) = self.color_picking {
            level.push((picking, ResourceLink::viewport(Slot::Color, Slot::None)));
            level.push((picking, ResourceLink::viewport(Slot::Depth, Slot::None)));
        }

        if !self.render_to_texture() {
            if let Some(params) = scene.sky.filter(|s| s.procedural_skydome) {
                let sky = self.create(PassKind::Sky, None, PassParams::Sky(params));
                level.push((
                    sky,
                    ResourceLink::fixed(Slot::Cubemap, Sampler::Sky, self.config.cubemap_size),
                ));
            }
        }

        let sink = self.add(PassKind::Sink);
        for (from, link) in level {
            self.graph.connect(from, sink, link);
        }
    }
}
