//! One-shot frame planning.
//!
//! [`FramePlanner::build`] runs every stage in order:
//!
//! 1. [`assemble`] the pass graph for the scene
//! 2. [`normalize`] links, then apply the resolution factor
//! 3. [`duplicate`] the per-eye branch for stereo scenes
//! 4. [`inject`] the debug probe, if one is configured
//! 5. [`bind_resources`] and [`assign_render_targets`] in topological order
//! 6. [`compile`] the executable queue
//!
//! Nothing is cached between builds; every build owns its image pool.

use crate::assembler::assemble;
use crate::binder::{assign_render_targets, bind_resources};
use crate::catalog::PassCatalog;
use crate::compiler::{RenderQueue, compile};
use crate::config::BuildConfig;
use crate::debug_probe::inject;
use crate::diagnostics::{BuildStage, Diagnostics};
use crate::error::GraphError;
use crate::graph::{PassHandle, RenderGraph};
use crate::normalizer::{apply_resolution_factor, normalize};
use crate::pool::ImagePool;
use crate::profiling::{profile_function, profile_message, profile_scope};
use crate::scene::{Camera, SceneDescriptor};
use crate::stereo::{StereoBranches, duplicate};

/// A planned frame: the bound graph, its images and the execution queue.
#[derive(Debug, Clone)]
pub struct FrameGraph {
    graph: RenderGraph,
    pool: ImagePool,
    queue: RenderQueue,
    stereo: Option<StereoBranches>,
    debug_view: Option<PassHandle>,
    diagnostics: Diagnostics,
}

impl FrameGraph {
    /// The bound render graph.
    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    /// Image descriptors for the image-creation collaborator.
    pub fn pool(&self) -> &ImagePool {
        &self.pool
    }

    pub fn cameras(&self) -> &[Camera] {
        self.graph.cameras()
    }

    /// Passes in execution order.
    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    /// Left and right branches of a stereo frame.
    pub fn stereo(&self) -> Option<&StereoBranches> {
        self.stereo.as_ref()
    }

    /// The debug view pass, when a probe found its target.
    pub fn debug_view(&self) -> Option<PassHandle> {
        self.debug_view
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Graphviz view of the bound graph.
    pub fn to_dot(&self) -> String {
        self.graph.to_dot()
    }
}

static_assertions::assert_impl_all!(FrameGraph: Send, Sync);

/// Entry point of the planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct FramePlanner;

impl FramePlanner {
    /// Plan one frame for `scene`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CyclicDependency`] if the graph cannot be
    /// ordered.
    ///
    /// # Panics
    ///
    /// Panics on configurations the pipeline cannot express; see
    /// [`assemble`].
    pub fn build<C: PassCatalog + ?Sized>(
        scene: &SceneDescriptor,
        config: &BuildConfig,
        catalog: &mut C,
    ) -> Result<FrameGraph, GraphError> {
        profile_function!();

        let mut diagnostics = Diagnostics::new();
        let assembled = assemble(scene, config, catalog, &mut diagnostics);
        let mut graph = assembled.graph;

        normalize(&mut graph, config.compat, &mut diagnostics);
        if config.supersampled() {
            apply_resolution_factor(&mut graph, config.resolution_factor);
        }

        let stereo = assembled.stereo.map(|splice| {
            profile_scope!("stereo_duplicate");
            duplicate(&mut graph, splice, &mut diagnostics)
        });

        let debug_view = config
            .debug_probe
            .and_then(|probe| inject(&mut graph, catalog, probe, &mut diagnostics));

        let order = graph.dag().topological_order()?;
        let mut pool = ImagePool::new();
        {
            profile_scope!("allocate_images");
            bind_resources(&mut graph, &mut pool, &order, &mut diagnostics);
            assign_render_targets(&mut graph, &mut pool, &order, scene.viewport);
        }

        let queue = compile(&graph)?;
        diagnostics.info(
            BuildStage::Linearization,
            format!("queued {} of {} passes", queue.len(), graph.pass_count()),
        );

        profile_message!("frame planned");
        log::debug!(
            "planned frame: {} passes, {} images, {} render targets",
            graph.pass_count(),
            pool.image_count(),
            pool.render_target_count()
        );

        Ok(FrameGraph {
            graph,
            pool,
            queue,
            stereo,
            debug_view,
            diagnostics,
        })
    }
}
