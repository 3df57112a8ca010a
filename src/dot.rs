//! Expression DAG to DOT (Graphviz) conversion.
//!
//! Every reachable node is drawn once, so sharing in the DAG shows up as
//! several incoming edges. Leaves (constants, arbitraries, empty lists) sit at
//! the bottom, roots at the top. Edges are labelled with the child position.
//!
//! ```
//! use zen_rs::types::Type;
//! use zen_rs::zen::Zen;
//!
//! let zen = Zen::default();
//! let x = zen.arbitrary("x", Type::Bool);
//! let f = zen.and(x, zen.not(x).unwrap()).unwrap();
//! let dot = zen.to_dot(&[f]).unwrap();
//! assert!(dot.starts_with("digraph {"));
//! ```

use crate::display::op_name;
use crate::node::Node;
use crate::reference::ExprRef;
use crate::zen::Zen;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for operator nodes (default: "ellipse")
    pub node_shape: &'static str,
    /// Shape for leaf nodes (default: "box")
    pub leaf_shape: &'static str,
    /// Shape for root markers (default: "plaintext")
    pub root_shape: &'static str,
    /// Whether to append the node id to each label (default: false)
    pub show_ids: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "ellipse",
            leaf_shape: "box",
            root_shape: "plaintext",
            show_ids: false,
        }
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Zen {
    /// Converts the DAG below `roots` to DOT format.
    pub fn to_dot(&self, roots: &[ExprRef]) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(roots, &DotConfig::default())
    }

    pub fn to_dot_with_config(&self, roots: &[ExprRef], config: &DotConfig) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        let nodes = self.reachable(roots);

        // Leaves at the bottom
        writeln!(dot, "{{ rank=sink")?;
        for &e in nodes.iter() {
            let node = self.node(e);
            if node.children().is_empty() {
                writeln!(dot, "{} [shape={}, label=\"{}\"];", e.id(), config.leaf_shape, self.dot_label(e, &node, config))?;
            }
        }
        writeln!(dot, "}}")?;

        for &e in nodes.iter() {
            let node = self.node(e);
            let children = node.children();
            if children.is_empty() {
                continue;
            }
            writeln!(dot, "{} [label=\"{}\"];", e.id(), self.dot_label(e, &node, config))?;
            for (i, c) in children.iter().enumerate() {
                writeln!(dot, "{} -> {} [label=\"{}\"];", e.id(), c.id(), i)?;
            }
        }

        // Roots at the top
        writeln!(dot, "{{ rank=source")?;
        for (i, _) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape={}, label=\"r{}\"];", i, config.root_shape, i)?;
        }
        writeln!(dot, "}}")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} -> {};", i, root.id())?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    fn dot_label(&self, e: ExprRef, node: &Node, config: &DotConfig) -> String {
        let label = escape(&op_name(node));
        if config.show_ids {
            format!("{} {}", label, e)
        } else {
            label
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::Type;

    #[test]
    fn test_to_dot_basic() {
        let zen = Zen::default();
        let x = zen.arbitrary("x", Type::Bool);
        let y = zen.arbitrary("y", Type::Bool);
        let f = zen.or(x, y).unwrap();

        let dot = zen.to_dot(&[f]).unwrap();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("label=\"or\""));
    }

    #[test]
    fn test_to_dot_draws_shared_nodes_once() {
        let zen = Zen::default();
        let x = zen.arbitrary("x", Type::Bool);
        let nx = zen.not(x).unwrap();
        let f = zen.and(nx, x).unwrap();
        let g = zen.or(nx, x).unwrap();

        let dot = zen.to_dot(&[f, g]).unwrap();
        let declaration = format!("{} [label=\"not\"];", nx.id());
        assert_eq!(dot.matches(&declaration).count(), 1);
        assert_eq!(dot.matches(&format!("-> {} ", nx.id())).count(), 2);
        assert!(dot.contains("r1 -> "));
    }

    #[test]
    fn test_to_dot_with_ids() {
        let zen = Zen::default();
        let x = zen.arbitrary("x", Type::Bool);
        let config = DotConfig {
            show_ids: true,
            ..DotConfig::default()
        };
        let dot = zen.to_dot_with_config(&[x], &config).unwrap();
        assert!(dot.contains(&format!("label=\"x {}\"", x)));
    }
}
