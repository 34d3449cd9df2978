//! Graphviz DOT rendering

use turnip_core::{GraphSnapshot, RenderAdapter, Result};

/// Renders a snapshot as Graphviz DOT source.
///
/// Nodes are filled `lightblue2` boxes labelled with the node label; edges
/// carry their relation as label.
#[derive(Debug, Clone, Default)]
pub struct DotRenderer {
    /// Draw nodes as boxes instead of ellipses
    pub boxed: bool,
}

impl DotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(mut self) -> Self {
        self.boxed = true;
        self
    }
}

impl RenderAdapter for DotRenderer {
    type Artifact = String;

    fn render(&self, snapshot: &GraphSnapshot) -> Result<String> {
        let mut dot = String::new();
        dot.push_str("// Knowledge Graph\n");
        dot.push_str("digraph {\n");
        if self.boxed {
            dot.push_str("\tnode [shape=box]\n");
        }

        for node in snapshot.nodes() {
            dot.push_str(&format!(
                "\t{} [label=\"{}\" color=lightblue2 style=filled]\n",
                node.id,
                dot_escape(&node.label)
            ));
        }

        for edge in snapshot.edges() {
            dot.push_str(&format!(
                "\t{} -> {} [label=\"{}\"]\n",
                edge.source_id,
                edge.target_id,
                dot_escape(&edge.relation)
            ));
        }

        dot.push_str("}\n");
        Ok(dot)
    }
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
