//! Graphviz DOT rendering for [`Dag`].
//!
//! The caller decides how nodes and edges look by returning a [`DotAttrs`]
//! set for each of them; this module only handles layout of the output and
//! escaping.

use std::fmt::{self, Write};

use crate::dag::{Dag, Edge, EdgeId, NodeId};

/// Attribute list attached to a DOT node or edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotAttrs(Vec<(&'static str, String)>);

impl DotAttrs {
    /// Create an empty attribute list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key = value`.
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.push((key, value.into()));
        self
    }

    /// Whether no attribute was set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn write_to(&self, out: &mut impl Write) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        out.write_str(" [")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            write!(out, "{key}=\"{}\"", escape(value))?;
        }
        out.write_str("]")
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Write `dag` as a DOT `digraph` named `name`.
pub fn write_dot<N, E, W, FN, FE>(
    out: &mut W,
    dag: &Dag<N, E>,
    name: &str,
    mut node_attrs: FN,
    mut edge_attrs: FE,
) -> fmt::Result
where
    W: Write,
    FN: FnMut(NodeId, &N) -> DotAttrs,
    FE: FnMut(EdgeId, &Edge<E>) -> DotAttrs,
{
    writeln!(out, "digraph \"{}\" {{", escape(name))?;
    writeln!(out, "    node [shape=box];")?;

    for (id, node) in dag.nodes() {
        write!(out, "    {id}")?;
        node_attrs(id, node).write_to(out)?;
        writeln!(out, ";")?;
    }

    for (id, edge) in dag.edges() {
        write!(out, "    {} -> {}", edge.from(), edge.to())?;
        edge_attrs(id, edge).write_to(out)?;
        writeln!(out, ";")?;
    }

    writeln!(out, "}}")
}

/// Render `dag` as a DOT string.
pub fn render<N, E, FN, FE>(dag: &Dag<N, E>, name: &str, node_attrs: FN, edge_attrs: FE) -> String
where
    FN: FnMut(NodeId, &N) -> DotAttrs,
    FE: FnMut(EdgeId, &Edge<E>) -> DotAttrs,
{
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_dot(&mut out, dag, name, node_attrs, edge_attrs);
    out
}
