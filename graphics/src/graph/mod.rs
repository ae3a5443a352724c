//! Render graph infrastructure.
//!
//! A [`RenderGraph`] is a DAG of [`Pass`]es whose edges carry
//! [`ResourceLink`]s. Passes and links live in arenas and are addressed by
//! stable handles, so stages can rewrite, clone and splice the graph without
//! invalidating anything they hold on to.
//!
//! | Stage | Writes |
//! |-------|--------|
//! | [`assembler`](crate::assembler) | passes, edges, links |
//! | [`normalizer`](crate::normalizer) | link identity, filters, storage |
//! | [`stereo`](crate::stereo) | cloned right-eye branch |
//! | [`binder`](crate::binder) | bound images, attachments, camera sizes |
//!
//! # Example
//!
//! ```ignore
//! use passforge_graphics::{Pass, PassKind, RenderGraph, ResourceLink, Slot};
//!
//! let mut graph = RenderGraph::new();
//! let opaque = graph.add_pass(Pass::new(PassKind::MainOpaque));
//! let blend = graph.add_pass(Pass::new(PassKind::MainBlend));
//! graph.connect(opaque, blend, ResourceLink::viewport(Slot::Color, Slot::Color));
//! let queue = graph.compile()?;
//! ```

mod dot;
mod link;
mod pass;

use std::collections::HashSet;

use passforge_core::dag::{CloneMap, Dag, Direction, EdgeId};

pub use link::{CanonicalDescriptor, LinkHandle, LinkOrigin, ResourceLink};
pub use pass::{Eye, Pass, PassContext, PassFlags, PassInfo, PassKind, PassParams, PostEffect};

use crate::compiler::{self, RenderQueue};
use crate::error::GraphError;
use crate::scene::{Camera, CameraId};
use crate::types::Slot;

/// Handle to a pass in the render graph.
///
/// `PassHandle` is `Copy` and cheap to pass around. It is only valid within
/// the `RenderGraph` that created it.
pub use passforge_core::dag::NodeId as PassHandle;

/// The render graph of one frame configuration.
#[derive(Debug, Clone, Default)]
pub struct RenderGraph {
    dag: Dag<Pass, LinkHandle>,
    links: Vec<ResourceLink>,
    cameras: Vec<Camera>,
}

impl RenderGraph {
    /// Create a new empty render graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Passes
    // ------------------------------------------------------------------

    /// Add a pass and return its handle.
    pub fn add_pass(&mut self, pass: Pass) -> PassHandle {
        self.dag.add_node(pass)
    }

    /// Remove a pass together with every edge touching it.
    ///
    /// Links referenced by the removed edges stay in the arena, unreferenced.
    pub fn remove_pass(&mut self, handle: PassHandle) -> Option<Pass> {
        self.dag.remove_node(handle)
    }

    /// Get a pass.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not refer to a live pass.
    pub fn pass(&self, handle: PassHandle) -> &Pass {
        self.dag
            .node(handle)
            .unwrap_or_else(|| panic!("Invalid pass handle {handle}"))
    }

    /// Get a mutable pass.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not refer to a live pass.
    pub fn pass_mut(&mut self, handle: PassHandle) -> &mut Pass {
        self.dag
            .node_mut(handle)
            .unwrap_or_else(|| panic!("Invalid pass handle {handle}"))
    }

    pub fn get_pass(&self, handle: PassHandle) -> Option<&Pass> {
        self.dag.node(handle)
    }

    pub fn contains(&self, handle: PassHandle) -> bool {
        self.dag.contains(handle)
    }

    /// Live passes in creation order.
    pub fn passes(&self) -> impl Iterator<Item = (PassHandle, &Pass)> + '_ {
        self.dag.nodes()
    }

    /// Handles of live passes in creation order.
    pub fn pass_handles(&self) -> Vec<PassHandle> {
        self.dag.node_ids().collect()
    }

    pub fn pass_count(&self) -> usize {
        self.dag.node_count()
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Put a link into the arena without attaching it anywhere.
    pub fn add_link(&mut self, link: ResourceLink) -> LinkHandle {
        let handle = LinkHandle::new(self.links.len() as u32);
        self.links.push(link);
        handle
    }

    /// Get a link.
    ///
    /// # Panics
    ///
    /// Panics if the handle is out of range.
    pub fn link(&self, handle: LinkHandle) -> &ResourceLink {
        &self.links[handle.index() as usize]
    }

    /// Get a mutable link.
    ///
    /// # Panics
    ///
    /// Panics if the handle is out of range.
    pub fn link_mut(&mut self, handle: LinkHandle) -> &mut ResourceLink {
        &mut self.links[handle.index() as usize]
    }

    /// The link arena, indexed by [`LinkHandle`].
    pub fn links(&self) -> &[ResourceLink] {
        &self.links
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Connect two passes with a new link and return the link handle.
    pub fn connect(&mut self, from: PassHandle, to: PassHandle, link: ResourceLink) -> LinkHandle {
        let handle = self.add_link(link);
        self.dag.add_edge(from, to, handle);
        handle
    }

    /// Connect two passes with an existing link.
    ///
    /// The same link may be attached to several edges; the normalizer gives
    /// every edge its own copy later.
    pub fn connect_with(&mut self, from: PassHandle, to: PassHandle, link: LinkHandle) -> EdgeId {
        self.dag.add_edge(from, to, link)
    }

    /// Attach a link that lives only inside `pass`.
    pub fn add_internal_link(&mut self, pass: PassHandle, link: ResourceLink) -> LinkHandle {
        let handle = self.add_link(link);
        self.pass_mut(pass).internal_links.push(handle);
        handle
    }

    /// All edges as `(edge, producer, consumer, link)`, in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, PassHandle, PassHandle, LinkHandle)> + '_ {
        self.dag
            .edges()
            .map(|(id, e)| (id, e.from(), e.to(), *e.attr()))
    }

    /// Replace the link carried by an edge.
    ///
    /// # Panics
    ///
    /// Panics if the edge does not exist.
    pub fn set_edge_link(&mut self, edge: EdgeId, link: LinkHandle) {
        let edge = self
            .dag
            .edge_mut(edge)
            .unwrap_or_else(|| panic!("Invalid edge handle {edge:?}"));
        *edge.attr_mut() = link;
    }

    /// Point an edge at a different consumer.
    pub fn retarget(&mut self, edge: EdgeId, to: PassHandle) {
        self.dag.retarget_edge(edge, to);
    }

    /// Inbound edges of `pass` as `(producer, link)`, in creation order.
    pub fn inputs(&self, pass: PassHandle) -> impl Iterator<Item = (PassHandle, LinkHandle)> + '_ {
        self.dag.inputs(pass).map(|(_, e)| (e.from(), *e.attr()))
    }

    /// Outbound edges of `pass` as `(consumer, link)`, in creation order.
    pub fn outputs(&self, pass: PassHandle) -> impl Iterator<Item = (PassHandle, LinkHandle)> + '_ {
        self.dag.outputs(pass).map(|(_, e)| (e.to(), *e.attr()))
    }

    /// Inbound edges of `pass` with their edge ids.
    pub fn input_edges(&self, pass: PassHandle) -> Vec<(EdgeId, PassHandle, LinkHandle)> {
        self.dag
            .inputs(pass)
            .map(|(id, e)| (id, e.from(), *e.attr()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Cameras
    // ------------------------------------------------------------------

    pub fn add_camera(&mut self, camera: Camera) -> CameraId {
        let id = CameraId::new(self.cameras.len() as u32);
        self.cameras.push(camera);
        id
    }

    pub fn camera(&self, id: CameraId) -> &Camera {
        &self.cameras[id.index() as usize]
    }

    pub fn camera_mut(&mut self, id: CameraId) -> &mut Camera {
        &mut self.cameras[id.index() as usize]
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// The underlying graph.
    pub fn dag(&self) -> &Dag<Pass, LinkHandle> {
        &self.dag
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// First pass of `kind` in creation order.
    pub fn find_pass(&self, kind: PassKind) -> Option<PassHandle> {
        self.find_nth_pass(kind, 0)
    }

    /// The `index`-th pass of `kind` in creation order.
    pub fn find_nth_pass(&self, kind: PassKind, index: usize) -> Option<PassHandle> {
        self.passes()
            .filter(|(_, p)| p.kind == kind)
            .nth(index)
            .map(|(h, _)| h)
    }

    /// Every pass of `kind` in creation order.
    pub fn passes_of_kind(&self, kind: PassKind) -> Vec<PassHandle> {
        self.passes()
            .filter(|(_, p)| p.kind == kind)
            .map(|(h, _)| h)
            .collect()
    }

    /// The single pass without outputs, if there is exactly one.
    pub fn sink(&self) -> Option<PassHandle> {
        match self.dag.sinks().as_slice() {
            [sink] => Some(*sink),
            _ => None,
        }
    }

    /// The pass presenting to the screen: the producer of the first
    /// `SCREEN` link into the sink.
    pub fn find_on_screen(&self) -> Option<PassHandle> {
        let sink = self.sink()?;
        self.inputs(sink)
            .find(|&(_, link)| self.link(link).source == Slot::Screen)
            .map(|(from, _)| from)
    }

    /// Producer of the link `pass` reads through `dest`.
    pub fn find_input(&self, pass: PassHandle, dest: Slot) -> Option<PassHandle> {
        self.inputs(pass)
            .find(|&(_, link)| self.link(link).dest == dest)
            .map(|(from, _)| from)
    }

    /// Nearest pass of `kind` upstream of `pass`, in breadth-first order.
    pub fn find_upstream(&self, pass: PassHandle, kind: PassKind) -> Option<PassHandle> {
        self.dag
            .reachable(pass, Direction::Upstream)
            .into_iter()
            .find(|&h| self.pass(h).kind == kind)
    }

    pub fn has_upstream(&self, pass: PassHandle, kind: PassKind) -> bool {
        self.find_upstream(pass, kind).is_some()
    }

    pub fn has_downstream(&self, pass: PassHandle, kind: PassKind) -> bool {
        self.dag
            .reachable(pass, Direction::Downstream)
            .into_iter()
            .any(|h| self.pass(h).kind == kind)
    }

    /// Linearize the graph into the executable queue.
    pub fn compile(&self) -> Result<RenderQueue, GraphError> {
        compiler::compile(self)
    }

    // ------------------------------------------------------------------
    // Cloning
    // ------------------------------------------------------------------

    /// Clone `passes` and every link feeding them, tagging the clones with
    /// `eye`.
    ///
    /// Links produced inside the set are copied with
    /// [`LinkOrigin::ClonedFrom`] and bind their own image. Links produced by
    /// a pass outside the set keep that producer and alias its image through
    /// [`LinkOrigin::SharesWith`]. Cameras and internal links of the cloned
    /// passes are copied too.
    ///
    /// Returns the pass mapping and the `(original, clone)` link pairs.
    pub(crate) fn clone_passes(
        &mut self,
        passes: &[PassHandle],
        eye: Eye,
    ) -> (CloneMap, Vec<(LinkHandle, LinkHandle)>) {
        let cloned: HashSet<PassHandle> = passes.iter().copied().collect();
        let mut link_pairs = Vec::new();

        let Self { dag, links, .. } = self;
        let map = dag.clone_nodes(
            passes,
            |_, pass| Pass {
                eye,
                context: PassContext::default(),
                ..pass.clone()
            },
            |_, edge| {
                let original = *edge.attr();
                let origin = if cloned.contains(&edge.from()) {
                    LinkOrigin::ClonedFrom(original)
                } else {
                    LinkOrigin::SharesWith(original)
                };
                let copy = links[original.index() as usize].clone_unbound(origin);
                let handle = LinkHandle::new(links.len() as u32);
                links.push(copy);
                link_pairs.push((original, handle));
                handle
            },
        );

        for (_, clone) in map.pairs() {
            if let Some(id) = self.pass(clone).camera {
                let camera = Camera {
                    eye,
                    ..self.camera(id).clone()
                };
                let copy = self.add_camera(camera);
                self.pass_mut(clone).camera = Some(copy);
            }

            let internal = self.pass(clone).internal_links.clone();
            let mut remapped = Vec::with_capacity(internal.len());
            for original in internal {
                let copy = self
                    .link(original)
                    .clone_unbound(LinkOrigin::ClonedFrom(original));
                let handle = self.add_link(copy);
                link_pairs.push((original, handle));
                remapped.push(handle);
            }
            self.pass_mut(clone).internal_links = remapped;
        }

        (map, link_pairs)
    }
}

static_assertions::assert_impl_all!(RenderGraph: Send, Sync);
