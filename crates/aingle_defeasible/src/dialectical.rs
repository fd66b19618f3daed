//! Dialectical trees
//!
//! The tree for an argument holds every acceptable chain of defeaters
//! starting at it. Nodes live in an arena and refer to their children by
//! index; the ancestors of a node are only needed while the tree is built
//! and are passed down as an explicit path.

use serde::{Deserialize, Serialize};
use std::fmt;

use log::trace;

use crate::argument::Structure;
use crate::defeat::{DefeaterKind, DefeaterSummary};

/// The outcome of marking a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mark {
    /// No child survives.
    Undefeated,
    /// Some child survives.
    Defeated,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::Undefeated => f.write_str("UNDEFEATED"),
            Mark::Defeated => f.write_str("DEFEATED"),
        }
    }
}

/// A node of a dialectical tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// The argument at this node.
    pub structure: Structure,
    /// How this node defeats its parent; `None` at the root.
    pub defeat: Option<DefeaterKind>,
    /// Arena indices of the children.
    pub children: Vec<usize>,
    /// Mark computed bottom-up.
    pub mark: Mark,
}

/// A dialectical tree stored as an arena; the root is node 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialecticalTree {
    nodes: Vec<TreeNode>,
}

impl DialecticalTree {
    /// Builds and marks the tree rooted at `root`.
    ///
    /// A defeater becomes a child of a node only if it:
    /// - is not the argument of the node or of one of its ancestors,
    /// - is not a sub-argument of any of those arguments,
    /// - is a proper defeater whenever the node itself is a blocking defeater.
    pub fn build(root: &Structure, summary: &DefeaterSummary) -> Self {
        let mut tree = Self {
            nodes: vec![TreeNode {
                structure: root.clone(),
                defeat: None,
                children: Vec::new(),
                mark: Mark::Undefeated,
            }],
        };

        if let Some(position) = summary.position(root) {
            let mut path = vec![position];
            tree.expand(0, &mut path, summary);
        }
        tree.mark();
        tree
    }

    fn expand(&mut self, node: usize, path: &mut Vec<usize>, summary: &DefeaterSummary) {
        let Some(&current) = path.last() else {
            return;
        };
        let incoming = self.nodes[node].defeat;

        for edge in summary.edges(current) {
            let candidate = summary.structure(edge.defeater);
            if path.contains(&edge.defeater) {
                trace!("Rejected {}: already on the branch", candidate);
                continue;
            }
            if path
                .iter()
                .any(|&ancestor| candidate.is_subargument_of(summary.structure(ancestor)))
            {
                trace!("Rejected {}: sub-argument of the branch", candidate);
                continue;
            }
            if incoming == Some(DefeaterKind::Blocking) && edge.kind != DefeaterKind::Proper {
                trace!("Rejected {}: blocking after blocking", candidate);
                continue;
            }

            self.nodes.push(TreeNode {
                structure: candidate.clone(),
                defeat: Some(edge.kind),
                children: Vec::new(),
                mark: Mark::Undefeated,
            });
            let child = self.nodes.len() - 1;
            self.nodes[node].children.push(child);

            path.push(edge.defeater);
            self.expand(child, path, summary);
            path.pop();
        }
    }

    /// Marks every node and returns the mark of the root.
    ///
    /// Children always follow their parent in the arena, so one reverse pass
    /// sees every child before its parent.
    pub fn mark(&mut self) -> Mark {
        for i in (0..self.nodes.len()).rev() {
            let defeated = self.nodes[i]
                .children
                .iter()
                .any(|&child| self.nodes[child].mark == Mark::Undefeated);
            self.nodes[i].mark = if defeated {
                Mark::Defeated
            } else {
                Mark::Undefeated
            };
        }
        self.root_mark()
    }

    /// The mark of the root.
    pub fn root_mark(&self) -> Mark {
        self.nodes[0].mark
    }

    /// The argument at the root.
    pub fn root(&self) -> &Structure {
        &self.nodes[0].structure
    }

    /// Returns `true` if the root is undefeated.
    pub fn is_warranted(&self) -> bool {
        self.root_mark() == Mark::Undefeated
    }

    /// All nodes, root first.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes on the longest branch.
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[TreeNode], node: usize) -> usize {
            1 + nodes[node]
                .children
                .iter()
                .map(|&child| depth_of(nodes, child))
                .max()
                .unwrap_or(0)
        }
        depth_of(&self.nodes, 0)
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, node: usize, level: usize) -> fmt::Result {
        let entry = &self.nodes[node];
        write!(f, "{:indent$}", "", indent = level * 2)?;
        if let Some(kind) = entry.defeat {
            write!(f, "{} ", kind)?;
        }
        writeln!(f, "{} [{}]", entry.structure, entry.mark)?;
        for &child in &entry.children {
            self.write_node(f, child, level + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for DialecticalTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, 0, 0)
    }
}
