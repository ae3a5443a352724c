//! Stereo duplication.
//!
//! The assembler builds a single-eye pipeline that ends in a stereo-combine
//! pass. This stage turns everything that renders into the combine's left
//! input into the left branch and adds a cloned right branch beside it:
//!
//! ```text
//!                 ┌─> depth(L) ─> ... ─> frontier(L) ──u_sampler_left──┐
//! shadow casts ───┤                          │ ordering                v
//!                 └─> depth(R) ─> ... ─> frontier(R) ──u_sampler_right─> combine
//! ```
//!
//! Shared-only passes (shadow casts, cube reflections, grass map, sky) stay
//! single; the right branch aliases their images through
//! [`LinkOrigin::SharesWith`]. Per-eye links are copied with
//! [`LinkOrigin::ClonedFrom`] and bind their own images.
//!
//! Zero-payload ordering links make the whole left branch execute before the
//! right one.

use std::collections::HashSet;

use passforge_core::dag::{CloneMap, Direction};

use crate::assembler::StereoSplice;
use crate::diagnostics::{BuildStage, Diagnostics};
use crate::graph::{Eye, LinkHandle, LinkOrigin, PassHandle, RenderGraph, ResourceLink};
use crate::profiling::profile_function;
use crate::scene::StereoMode;
use crate::types::{Sampler, Slot};

/// Result of [`duplicate`].
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBranches {
    pub combine: PassHandle,
    pub left_frontier: PassHandle,
    pub right_frontier: PassHandle,
    /// Left-eye pass to right-eye clone.
    pub passes: CloneMap,
    /// `(original, clone)` link pairs, including the combine's right input.
    pub links: Vec<(LinkHandle, LinkHandle)>,
}

impl StereoBranches {
    /// Right-eye clones in the order of their originals.
    pub fn right_passes(&self) -> Vec<PassHandle> {
        self.passes
            .pairs()
            .into_iter()
            .map(|(_, clone)| clone)
            .collect()
    }
}

/// Split the pipeline feeding `splice.combine` into a left and a right
/// branch.
///
/// For [`StereoMode::Hmd`] every viewport-sized link rendered for the combine
/// pass is halved horizontally, since each eye covers half of the display.
///
/// # Panics
///
/// Panics if the frontier is a shared-only pass or does not feed the combine
/// pass through `u_sampler_left`.
pub fn duplicate(
    graph: &mut RenderGraph,
    splice: StereoSplice,
    diagnostics: &mut Diagnostics,
) -> StereoBranches {
    profile_function!();

    let StereoSplice {
        frontier,
        combine,
        mode,
    } = splice;

    let left_input = graph
        .inputs(combine)
        .find(|&(from, link)| {
            from == frontier && graph.link(link).dest == Slot::Sampler(Sampler::StereoLeft)
        })
        .map(|(_, link)| link)
        .unwrap_or_else(|| panic!("Stereo frontier {frontier} must feed the combine pass"));

    let mut branch = graph.dag().reachable(frontier, Direction::Upstream);
    branch.push(frontier);
    branch.sort();
    branch.retain(|&pass| !graph.pass(pass).kind.is_shared_only());

    for &pass in &branch {
        graph.pass_mut(pass).eye = Eye::Left;
        if let Some(camera) = graph.pass(pass).camera {
            graph.camera_mut(camera).eye = Eye::Left;
        }
    }

    let (passes, mut links) = graph.clone_passes(&branch, Eye::Right);
    let right_frontier = passes
        .clone_of(frontier)
        .unwrap_or_else(|| panic!("Stereo frontier {frontier} must render per eye"));

    let mut right_input = graph
        .link(left_input)
        .clone_unbound(LinkOrigin::ClonedFrom(left_input));
    right_input.dest = Sampler::StereoRight.into();
    let right_link = graph.connect(right_frontier, combine, right_input);
    links.push((left_input, right_link));

    let clones: HashSet<PassHandle> = passes.pairs().into_iter().map(|(_, c)| c).collect();
    let mut roots = 0;
    for (_, clone) in passes.pairs() {
        let fed_by_branch = graph.inputs(clone).any(|(from, _)| clones.contains(&from));
        if !fed_by_branch {
            graph.connect(frontier, clone, ResourceLink::ordering());
            roots += 1;
        }
    }

    if mode == StereoMode::Hmd {
        halve_viewport_width(graph, combine);
    }

    diagnostics.info(
        BuildStage::Stereo,
        format!(
            "cloned {} passes and {} links for the right eye, {roots} ordering links",
            passes.len(),
            links.len()
        ),
    );

    StereoBranches {
        combine,
        left_frontier: frontier,
        right_frontier,
        passes,
        links,
    }
}

/// Halve the width of every viewport-sized link consumed by a pass that
/// renders for `combine`, including the combine pass itself.
fn halve_viewport_width(graph: &mut RenderGraph, combine: PassHandle) {
    let mut consumers: HashSet<PassHandle> = graph
        .dag()
        .reachable(combine, Direction::Upstream)
        .into_iter()
        .collect();
    consumers.insert(combine);

    let mut targets: Vec<LinkHandle> = graph
        .edges()
        .filter(|(_, _, to, _)| consumers.contains(to))
        .map(|(_, _, _, link)| link)
        .collect();
    for &pass in &consumers {
        targets.extend(graph.pass(pass).internal_links.iter().copied());
    }

    let mut halved = HashSet::new();
    for handle in targets {
        let link = graph.link_mut(handle);
        if link.resizes_with_viewport && halved.insert(handle) {
            link.size_mult_x *= 0.5;
        }
    }
    log::debug!("halved {} links for head-mounted display", halved.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Pass, PassKind};
    use crate::scene::{Camera, CameraProjection};

    struct Fixture {
        graph: RenderGraph,
        shadow: PassHandle,
        depth: PassHandle,
        blend: PassHandle,
        combine: PassHandle,
        shadow_map: LinkHandle,
        main: LinkHandle,
        present: LinkHandle,
    }

    // shadow ─> depth ─> blend ─> combine ─> sink
    fn fixture() -> Fixture {
        let mut graph = RenderGraph::new();
        let shadow = graph.add_pass(Pass::new(PassKind::ShadowCast));
        let depth = graph.add_pass(Pass::new(PassKind::ShadowReceive));
        let blend = graph.add_pass(Pass::new(PassKind::MainBlend));
        let combine = graph.add_pass(Pass::new(PassKind::StereoCombine));
        let sink = graph.add_pass(Pass::new(PassKind::Sink));
        let camera = graph.add_camera(Camera::new(CameraProjection::Perspective));
        graph.pass_mut(blend).camera = Some(camera);

        let shadow_map = graph.connect(
            shadow,
            depth,
            ResourceLink::fixed(Slot::Depth, Sampler::ShadowMap(0), 1024),
        );
        let main = graph.connect(
            depth,
            blend,
            ResourceLink::viewport(Slot::Depth, Slot::Depth),
        );
        graph.connect(
            blend,
            combine,
            ResourceLink::viewport(Slot::Color, Sampler::StereoLeft),
        );
        let present = graph.connect(
            combine,
            sink,
            ResourceLink::viewport(Slot::Screen, Slot::None),
        );

        Fixture {
            graph,
            shadow,
            depth,
            blend,
            combine,
            shadow_map,
            main,
            present,
        }
    }

    fn split(f: &mut Fixture, mode: StereoMode) -> StereoBranches {
        let splice = StereoSplice {
            frontier: f.blend,
            combine: f.combine,
            mode,
        };
        duplicate(&mut f.graph, splice, &mut Diagnostics::new())
    }

    #[test]
    fn test_per_eye_passes_are_cloned() {
        let mut f = fixture();
        let branches = split(&mut f, StereoMode::Anaglyph);
        let graph = &f.graph;

        assert_eq!(branches.passes.len(), 2);
        assert!(branches.passes.clone_of(f.shadow).is_none());
        assert_eq!(graph.pass(f.shadow).eye, Eye::Mono);
        assert_eq!(graph.pass(f.depth).eye, Eye::Left);

        let depth_r = branches.passes.clone_of(f.depth).unwrap();
        assert_eq!(graph.pass(depth_r).eye, Eye::Right);
        assert_eq!(
            branches.right_frontier,
            branches.passes.clone_of(f.blend).unwrap()
        );

        let camera_l = graph.pass(f.blend).camera.unwrap();
        let camera_r = graph.pass(branches.right_frontier).camera.unwrap();
        assert_eq!(graph.camera(camera_l).eye, Eye::Left);
        assert_eq!(graph.camera(camera_r).eye, Eye::Right);
    }

    #[test]
    fn test_link_origins() {
        let mut f = fixture();
        let branches = split(&mut f, StereoMode::Anaglyph);
        let graph = &f.graph;
        let depth_r = branches.passes.clone_of(f.depth).unwrap();

        let (_, shadow_r) = graph
            .inputs(depth_r)
            .find(|&(from, _)| from == f.shadow)
            .unwrap();
        assert_eq!(
            graph.link(shadow_r).origin,
            LinkOrigin::SharesWith(f.shadow_map)
        );

        let (_, main_r) = graph
            .inputs(branches.right_frontier)
            .find(|&(from, _)| from == depth_r)
            .unwrap();
        assert_eq!(graph.link(main_r).origin, LinkOrigin::ClonedFrom(f.main));

        assert_eq!(
            graph.find_input(f.combine, Sampler::StereoRight.into()),
            Some(branches.right_frontier)
        );
        assert_eq!(
            graph.find_input(f.combine, Sampler::StereoLeft.into()),
            Some(f.blend)
        );
    }

    #[test]
    fn test_right_branch_runs_after_left() {
        let mut f = fixture();
        let branches = split(&mut f, StereoMode::Anaglyph);
        let graph = &f.graph;
        let depth_r = branches.passes.clone_of(f.depth).unwrap();

        let ordering: Vec<_> = graph
            .inputs(depth_r)
            .filter(|&(_, link)| !graph.link(link).active)
            .map(|(from, _)| from)
            .collect();
        assert_eq!(ordering, vec![f.blend]);
        assert!(
            graph
                .inputs(branches.right_frontier)
                .all(|(_, link)| graph.link(link).active)
        );

        let order = graph.dag().topological_order().unwrap();
        let position = |pass| order.iter().position(|&p| p == pass).unwrap();
        for clone in branches.right_passes() {
            assert!(position(f.blend) < position(clone));
        }
    }

    #[test]
    fn test_hmd_halves_viewport_width() {
        let mut f = fixture();
        let branches = split(&mut f, StereoMode::Hmd);
        let graph = &f.graph;

        assert_eq!(graph.link(f.main).size_mult_x, 0.5);
        assert_eq!(graph.link(f.main).size_mult_y, 1.0);
        for &(_, clone) in &branches.links {
            let link = graph.link(clone);
            if link.resizes_with_viewport {
                assert_eq!(link.size_mult_x, 0.5);
            }
        }
        assert_eq!(graph.link(f.shadow_map).size_mult_x, 1.0);
        assert_eq!(graph.link(f.present).size_mult_x, 1.0);
    }

    #[test]
    fn test_anaglyph_keeps_full_width() {
        let mut f = fixture();
        split(&mut f, StereoMode::Anaglyph);
        assert!(f.graph.links().iter().all(|l| l.size_mult_x == 1.0));
    }

    #[test]
    #[should_panic(expected = "must feed the combine pass")]
    fn test_frontier_must_feed_combine() {
        let mut f = fixture();
        let splice = StereoSplice {
            frontier: f.depth,
            combine: f.combine,
            mode: StereoMode::Anaglyph,
        };
        duplicate(&mut f.graph, splice, &mut Diagnostics::new());
    }
}
