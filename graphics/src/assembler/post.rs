//! Post-processing chains.
//!
//! Each stage reads the current frontier and leaves the frontier at the last
//! pass it added. Stages whose feature is disabled add nothing.

use crate::catalog::PassCatalog;
use crate::graph::{PassHandle, PassKind, PassParams, PostEffect, ResourceLink};
use crate::scene::AntialiasingMethod;
use crate::types::{Sampler, Slot};

use super::Assembler;

impl<C: PassCatalog + ?Sized> Assembler<'_, C> {
    fn scene_depth(&self) -> PassHandle {
        self.scene_depth
            .unwrap_or_else(|| panic!("Post-processing requires a scene depth pass"))
    }

    /// Three god ray passes of decreasing step length, combined with the
    /// frontier.
    pub(super) fn god_rays(&mut self) {
        let Some(params) = self.scene.god_rays else {
            return;
        };
        let prev = self.frontier();
        let depth = self.scene_depth();

        let step = params.max_ray_length / params.steps_per_pass;
        let first = self.create(
            PassKind::GodRays,
            None,
            PassParams::GodRays { params, step },
        );
        self.graph.connect(
            depth,
            first,
            ResourceLink::viewport(Slot::Depth, Sampler::Input).linear(),
        );

        let rays = self
            .graph
            .add_link(ResourceLink::scaled(Slot::Color, Sampler::Input, 0.25).linear());
        let mut last = first;
        for factor in [0.5, 0.25] {
            let pass = self.create(
                PassKind::GodRays,
                None,
                PassParams::GodRays {
                    params,
                    step: step * factor,
                },
            );
            self.graph.connect_with(last, pass, rays);
            last = pass;
        }

        let combine = self.create(
            PassKind::GodRaysCombine,
            None,
            PassParams::GodRaysCombine(params),
        );
        self.graph.connect(
            prev,
            combine,
            ResourceLink::viewport(Slot::Color, Sampler::Main),
        );
        self.graph.connect(
            last,
            combine,
            ResourceLink::scaled(Slot::Color, Sampler::GodRays, 0.25).linear(),
        );
        self.frontier = Some(combine);
    }

    pub(super) fn bloom(&mut self) {
        let Some(params) = self.scene.bloom else {
            return;
        };
        let prev = self.frontier();
        let bloom = PassParams::Bloom(params);

        let luminance = self.create(PassKind::Luminance, None, bloom.clone());
        self.graph.connect(
            prev,
            luminance,
            ResourceLink::viewport(Slot::Color, Sampler::Input),
        );

        let average = self.create(PassKind::AverageLuminance, None, bloom.clone());
        self.graph.connect(
            luminance,
            average,
            ResourceLink::scaled(Slot::Color, Sampler::Input, 0.25).linear(),
        );

        let trunced = self.create(PassKind::LuminanceTrunced, None, bloom.clone());
        self.graph.connect(
            luminance,
            trunced,
            ResourceLink::scaled(Slot::Color, Sampler::Luminance, 0.25).linear(),
        );
        self.graph.connect(
            average,
            trunced,
            ResourceLink::fixed(Slot::Color, Sampler::AverageLuminance, 1),
        );
        self.graph.connect(
            prev,
            trunced,
            ResourceLink::viewport(Slot::Color, Sampler::Main),
        );

        let blur_in = self
            .graph
            .add_link(ResourceLink::scaled(Slot::Color, Sampler::Color, 0.25).linear());
        let blur_x = self.create(PassKind::BloomBlur, Some(PostEffect::XBlur), bloom.clone());
        self.graph.connect_with(trunced, blur_x, blur_in);
        let blur_y = self.create(PassKind::BloomBlur, Some(PostEffect::YBlur), bloom.clone());
        self.graph.connect_with(blur_x, blur_y, blur_in);

        let combine = self.create(PassKind::BloomCombine, None, bloom);
        self.graph.connect(
            prev,
            combine,
            ResourceLink::viewport(Slot::Color, Sampler::Main),
        );
        self.graph.connect(
            blur_y,
            combine,
            ResourceLink::scaled(Slot::Color, Sampler::Bloom, 0.25).linear(),
        );
        self.frontier = Some(combine);
    }

    pub(super) fn motion_blur(&mut self) {
        let Some(params) = self.scene.motion_blur else {
            return;
        };
        let prev = self.frontier();
        let blur = self.create(PassKind::MotionBlur, None, PassParams::MotionBlur(params));
        self.graph.connect(
            prev,
            blur,
            ResourceLink::viewport(Slot::Color, Sampler::MotionBlurCurrent),
        );
        self.frontier = Some(blur);
    }

    pub(super) fn depth_of_field(&mut self) {
        let Some(params) = self.scene.dof else {
            return;
        };
        let prev = self.frontier();
        let depth = self.scene_depth();

        let blur_in = self
            .graph
            .add_link(ResourceLink::viewport(Slot::Color, Sampler::Color).linear());
        let blur_x = self.create(
            PassKind::Postprocessing,
            Some(PostEffect::XBlur),
            PassParams::None,
        );
        self.graph.connect_with(prev, blur_x, blur_in);
        let blur_y = self.create(
            PassKind::Postprocessing,
            Some(PostEffect::YBlur),
            PassParams::None,
        );
        self.graph.connect_with(blur_x, blur_y, blur_in);

        let dof = self.create(PassKind::Dof, None, PassParams::Dof(params));
        self.graph.connect(
            prev,
            dof,
            ResourceLink::viewport(Slot::Color, Sampler::Sharp),
        );
        self.graph.connect(
            blur_y,
            dof,
            ResourceLink::viewport(Slot::Color, Sampler::Blurred),
        );
        self.graph.connect(
            depth,
            dof,
            ResourceLink::viewport(Slot::Depth, Sampler::Depth),
        );
        self.frontier = Some(dof);
    }

    /// Outline glow: a mask of the outlined objects, extended and blurred at
    /// reduced resolution, composited over the frontier.
    pub(super) fn outline(&mut self) {
        let Some(params) = self.scene.outline else {
            return;
        };
        let prev = self.frontier();
        let outline = PassParams::Outline(params);

        let mask = self.create(PassKind::OutlineMask, None, outline.clone());
        let extend_x = self.create(
            PassKind::Postprocessing,
            Some(PostEffect::XExtend),
            PassParams::None,
        );
        self.graph.connect(
            mask,
            extend_x,
            ResourceLink::viewport(Slot::Color, Sampler::Color),
        );

        let extended = self
            .graph
            .add_link(ResourceLink::scaled(Slot::Color, Sampler::Color, 0.5).linear());
        let extend_y = self.create(
            PassKind::Postprocessing,
            Some(PostEffect::YExtend),
            PassParams::None,
        );
        self.graph.connect_with(extend_x, extend_y, extended);
        let blur_x = self.create(
            PassKind::Postprocessing,
            Some(PostEffect::XBlur),
            PassParams::None,
        );
        self.graph.connect_with(extend_y, blur_x, extended);

        let blur_y = self.create(
            PassKind::Postprocessing,
            Some(PostEffect::YBlur),
            PassParams::None,
        );
        self.graph.connect(
            blur_x,
            blur_y,
            ResourceLink::scaled(Slot::Color, Sampler::Color, 0.25).linear(),
        );

        let pass = self.create(PassKind::Outline, None, outline);
        self.graph.connect(
            prev,
            pass,
            ResourceLink::viewport(Slot::Color, Sampler::OutlineSource),
        );
        self.graph.connect(
            mask,
            pass,
            ResourceLink::viewport(Slot::Color, Sampler::OutlineMask),
        );
        self.graph.connect(
            blur_y,
            pass,
            ResourceLink::scaled(Slot::Color, Sampler::OutlineMaskBlurred, 0.25).linear(),
        );
        self.frontier = Some(pass);
    }

    pub(super) fn compositing(&mut self) {
        let Some(params) = self.scene.compositing else {
            return;
        };
        let prev = self.frontier();
        let pass = self.create(PassKind::Compositing, None, PassParams::Compositing(params));
        self.graph.connect(
            prev,
            pass,
            ResourceLink::viewport(Slot::Color, Sampler::Color),
        );
        self.frontier = Some(pass);
    }

    pub(super) fn antialiasing(&mut self) {
        let Some(params) = self.scene.antialiasing else {
            return;
        };
        let prev = self.frontier();
        let aa = PassParams::Antialiasing(params);

        match params.method {
            AntialiasingMethod::Fxaa => {
                let pass = self.create(PassKind::Antialiasing, None, aa);
                let color = self.graph.connect(
                    prev,
                    pass,
                    ResourceLink::viewport(Slot::Color, Sampler::Color).linear(),
                );
                self.frontier = Some(pass);

                // Supersampled frames are scaled back to the viewport.
                if self.config.supersampled() {
                    let rescale = self.create(
                        PassKind::Postprocessing,
                        Some(PostEffect::Passthrough),
                        PassParams::None,
                    );
                    self.graph.connect_with(pass, rescale, color);
                    self.frontier = Some(rescale);
                }
            }
            AntialiasingMethod::Smaa { temporal } => {
                let input = self
                    .graph
                    .add_link(ResourceLink::viewport(Slot::Color, Sampler::Color).linear());

                let edges = self.create(PassKind::SmaaEdgeDetection, None, aa.clone());
                self.graph.connect_with(prev, edges, input);

                let weights = self.create(PassKind::SmaaBlendingWeights, None, aa.clone());
                self.graph.connect_with(edges, weights, input);

                let blending = self.create(PassKind::SmaaNeighborhoodBlending, None, aa.clone());
                self.graph.connect_with(prev, blending, input);
                self.graph.connect(
                    weights,
                    blending,
                    ResourceLink::viewport(Slot::Color, Sampler::Blend).linear(),
                );
                self.frontier = Some(blending);

                if temporal {
                    let depth = self
                        .graph
                        .find_upstream(prev, PassKind::ShadowReceive)
                        .unwrap_or_else(|| panic!("Temporal SMAA requires a depth pass upstream"));
                    let velocity = self.create(PassKind::Velocity, None, aa.clone());
                    self.graph.connect(
                        depth,
                        velocity,
                        ResourceLink::viewport(Slot::Depth, Sampler::Depth),
                    );

                    let motion = self
                        .graph
                        .add_link(ResourceLink::viewport(Slot::Color, Sampler::Velocity));
                    self.graph.connect_with(velocity, blending, motion);

                    let resolve = self.create(PassKind::SmaaResolve, None, aa);
                    self.graph.connect_with(velocity, resolve, motion);
                    self.graph.connect_with(blending, resolve, input);
                    self.frontier = Some(resolve);
                }
            }
        }
    }
}
