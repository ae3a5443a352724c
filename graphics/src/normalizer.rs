//! Resource link normalization.
//!
//! The assembler attaches one link to several edges where consumers read the
//! same image the same way. Before anything is bound, every edge and internal
//! slot gets its own link instance, and links that end up backed by the same
//! image are made to agree on how that image is created.
//!
//! Normalization runs two phases, always in order:
//!
//! 1. **Identity dedup** - a link referenced more than once is copied for
//!    every extra reference, in arena order.
//! 2. **Consistency propagation** - links that will share one image (all
//!    outputs of a pass with the same source slot, extended upstream through
//!    feedback inputs) agree on filtering and storage. Linear filtering beats
//!    nearest, textures beat renderbuffers. Propagation repeats until nothing
//!    changes.
//!
//! Both phases are idempotent: normalizing an already normalized graph
//! changes no link.
//!
//! [`apply_resolution_factor`] is a separate, non-idempotent step that scales
//! the links rendered before antialiasing for supersampling.

use std::collections::HashSet;

use crate::diagnostics::{BuildStage, Diagnostics};
use crate::graph::{LinkHandle, PassHandle, PassKind, RenderGraph};
use crate::profiling::profile_function;
use crate::types::{Slot, TextureFilter};

/// Normalize every link of `graph`.
///
/// With `compat` set, unsampled depth links are backed by renderbuffers.
///
/// # Panics
///
/// Panics in compat mode if a depth link is read through a sampler, since a
/// renderbuffer cannot be sampled.
pub fn normalize(graph: &mut RenderGraph, compat: bool, diagnostics: &mut Diagnostics) {
    profile_function!();

    let copies = dedup_links(graph);
    linear_motion_blur_accumulators(graph);
    if compat {
        use_depth_renderbuffers(graph);
    }
    let reconciled = propagate(graph);

    diagnostics.info(
        BuildStage::Normalization,
        format!("made {copies} link copies, reconciled {reconciled} links"),
    );
}

/// Give every edge and internal slot its own link. Returns the number of
/// copies made.
fn dedup_links(graph: &mut RenderGraph) -> usize {
    let mut seen = HashSet::new();
    let mut copies = 0;

    let edges: Vec<_> = graph
        .edges()
        .map(|(edge, _, _, link)| (edge, link))
        .collect();
    for (edge, link) in edges {
        if !seen.insert(link) {
            let copy = graph.link(link).clone_unbound(graph.link(link).origin);
            let handle = graph.add_link(copy);
            graph.set_edge_link(edge, handle);
            copies += 1;
        }
    }

    for pass in graph.pass_handles() {
        let internal = graph.pass(pass).internal_links.clone();
        for (i, link) in internal.into_iter().enumerate() {
            if !seen.insert(link) {
                let copy = graph.link(link).clone_unbound(graph.link(link).origin);
                let handle = graph.add_link(copy);
                graph.pass_mut(pass).internal_links[i] = handle;
                copies += 1;
            }
        }
    }

    copies
}

/// The motion blur accumulator is sampled with linear filtering when
/// antialiasing reads the blurred image.
fn linear_motion_blur_accumulators(graph: &mut RenderGraph) {
    let mut accumulators = Vec::new();
    for aa in graph.passes_of_kind(PassKind::Antialiasing) {
        for (from, _) in graph.inputs(aa) {
            if graph.pass(from).kind == PassKind::MotionBlur {
                accumulators.extend(graph.pass(from).internal_links.iter().copied());
            }
        }
    }

    for handle in accumulators {
        let link = graph.link_mut(handle);
        link.min_filter = TextureFilter::Linear;
        link.mag_filter = TextureFilter::Linear;
    }
}

fn use_depth_renderbuffers(graph: &mut RenderGraph) {
    let depth_links: Vec<LinkHandle> = graph
        .edges()
        .map(|(_, _, _, link)| link)
        .filter(|&l| {
            let link = graph.link(l);
            link.active && link.source == Slot::Depth
        })
        .collect();

    for handle in depth_links {
        let link = graph.link_mut(handle);
        assert!(
            !link.is_sampled(),
            "Failed to use renderbuffer as input texture: {} -> {}",
            link.source,
            link.dest
        );
        link.use_renderbuffer = true;
    }
}

/// Links that will be backed by the same image, grouped by source slot.
#[derive(Debug, Default)]
struct SlotGroups(Vec<(Slot, Vec<LinkHandle>)>);

impl SlotGroups {
    fn push(&mut self, slot: Slot, link: LinkHandle) {
        match self.0.iter_mut().find(|(s, _)| *s == slot) {
            Some((_, links)) => {
                if !links.contains(&link) {
                    links.push(link);
                }
            }
            None => self.0.push((slot, vec![link])),
        }
    }
}

fn collect_groups(
    graph: &RenderGraph,
    pass: PassHandle,
    groups: &mut SlotGroups,
    visited: &mut HashSet<PassHandle>,
) {
    if !visited.insert(pass) {
        return;
    }

    for (from, handle) in graph.inputs(pass) {
        let link = graph.link(handle);
        if link.active && link.is_feedback() {
            groups.push(link.source, handle);
            collect_groups(graph, from, groups, visited);
        }
    }

    for (_, handle) in graph.outputs(pass) {
        let link = graph.link(handle);
        if link.active {
            groups.push(link.source, handle);
        }
    }

    // The accumulator swaps with the blurred output every frame.
    let pass = graph.pass(pass);
    if pass.kind == PassKind::MotionBlur {
        for &handle in &pass.internal_links {
            groups.push(graph.link(handle).source, handle);
        }
    }
}

/// Reconcile filters and storage of every group until a fixpoint. Returns
/// the number of link updates.
fn propagate(graph: &mut RenderGraph) -> usize {
    let mut updates = 0;
    loop {
        let mut changed = 0;
        for pass in graph.pass_handles() {
            let mut groups = SlotGroups::default();
            collect_groups(graph, pass, &mut groups, &mut HashSet::new());
            for (_, links) in &groups.0 {
                changed += reconcile(graph, links);
            }
        }
        if changed == 0 {
            return updates;
        }
        updates += changed;
    }
}

fn reconcile(graph: &mut RenderGraph, group: &[LinkHandle]) -> usize {
    let linear_if = |any_linear: bool| {
        if any_linear {
            TextureFilter::Linear
        } else {
            TextureFilter::Nearest
        }
    };
    let min_filter = linear_if(
        group
            .iter()
            .any(|&l| graph.link(l).min_filter == TextureFilter::Linear),
    );
    let mag_filter = linear_if(
        group
            .iter()
            .any(|&l| graph.link(l).mag_filter == TextureFilter::Linear),
    );
    let use_renderbuffer = group.iter().all(|&l| graph.link(l).use_renderbuffer);

    let mut changed = 0;
    for &handle in group {
        let link = graph.link_mut(handle);
        if link.min_filter != min_filter
            || link.mag_filter != mag_filter
            || link.use_renderbuffer != use_renderbuffer
        {
            link.min_filter = min_filter;
            link.mag_filter = mag_filter;
            link.use_renderbuffer = use_renderbuffer;
            changed += 1;
        }
    }
    changed
}

/// Scale the viewport-tracking links rendered before antialiasing by
/// `factor`. Returns the number of scaled links.
///
/// Factors of 1 or below leave the graph unchanged. Unlike [`normalize`],
/// this must run exactly once per build.
pub fn apply_resolution_factor(graph: &mut RenderGraph, factor: f32) -> usize {
    if factor <= 1.0 {
        return 0;
    }
    profile_function!();

    let mut scaled = Vec::new();
    for pass in graph.pass_handles() {
        let before_aa = (graph.pass(pass).kind != PassKind::SmaaNeighborhoodBlending
            && graph.has_downstream(pass, PassKind::SmaaNeighborhoodBlending))
            || graph.has_downstream(pass, PassKind::Antialiasing);
        if !before_aa {
            continue;
        }
        scaled.extend(graph.outputs(pass).map(|(_, link)| link));
        scaled.extend(graph.pass(pass).internal_links.iter().copied());
    }

    let mut count = 0;
    for handle in scaled {
        let link = graph.link_mut(handle);
        if link.resizes_with_viewport {
            link.size_mult_x *= factor;
            link.size_mult_y *= factor;
            count += 1;
        }
    }
    log::debug!("scaled {count} links by resolution factor {factor}");
    count
}
