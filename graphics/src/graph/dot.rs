//! Graphviz view of a render graph.

use passforge_core::dot::{self, DotAttrs};

use super::RenderGraph;
use super::pass::PassKind;

impl RenderGraph {
    /// Render the graph in Graphviz DOT format.
    ///
    /// Pass labels carry the bound color and depth images as `C#`/`D#`. Edge
    /// labels name both slots and the min/mag filters (`L`/`N`), with `RR`
    /// marking a renderbuffer. The sink is dotted and passes left out of the
    /// queue are dashed.
    pub fn to_dot(&self) -> String {
        dot::render(
            &self.dag,
            "render_graph",
            |id, pass| {
                let mut label = format!("{} {id}", pass.label());
                if let Some(color) = pass.context.color_image {
                    label.push_str(&format!(" C{}", color.index()));
                }
                if let Some(depth) = pass.context.depth_image {
                    label.push_str(&format!(" D{}", depth.index()));
                }

                let attrs = DotAttrs::new().with("label", label);
                if pass.kind == PassKind::Sink {
                    attrs.with("style", "dotted")
                } else if !pass.enqueue() {
                    attrs.with("style", "dashed")
                } else {
                    attrs
                }
            },
            |_, edge| {
                let link = self.link(*edge.attr());
                let mut label = format!(
                    "{} -> {} {}{}",
                    link.source,
                    link.dest,
                    link.min_filter.tag(),
                    link.mag_filter.tag()
                );
                if link.use_renderbuffer {
                    label.push_str(" RR");
                }

                let attrs = DotAttrs::new().with("label", label);
                if link.active {
                    attrs
                } else {
                    attrs.with("style", "dashed")
                }
            },
        )
    }
}
