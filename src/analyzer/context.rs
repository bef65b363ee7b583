//! One-pass precomputation over a plan tree.
//!
//! Built once per analysis and borrowed read-only by every rule: a
//! flattened pre-order node list with parent indices and depths, plus the
//! CTE definitions discovered along the way. Parents are encoded as indices
//! into the flat list (the tree is single-owner and immutable during
//! analysis, so a stable index serves wherever pointer identity would).

use crate::plan::PlanNode;

/// A flattened node with its position in the tree.
#[derive(Debug)]
pub struct NodeRef<'a> {
    pub node: &'a PlanNode,
    /// Index of the parent in [`PlanContext::all_nodes`]; `None` for the root.
    pub parent: Option<usize>,
    /// Distance from the root; the root is 0.
    pub depth: usize,
}

/// A CTE definition discovered in the tree.
///
/// Definitions are nodes whose subplan name has the form `CTE <name>`;
/// consumers are `CTE Scan` nodes carrying the matching `CTE Name`.
#[derive(Debug)]
pub struct CteInfo<'a> {
    pub name: String,
    pub node: &'a PlanNode,
    pub estimated_rows: u64,
    pub actual_rows: u64,
}

/// Cross-cutting context shared by all rules during one analysis.
#[derive(Debug)]
pub struct PlanContext<'a> {
    nodes: Vec<NodeRef<'a>>,
    // Discovery order, so downstream passes stay deterministic.
    ctes: Vec<CteInfo<'a>>,
}

impl<'a> PlanContext<'a> {
    /// Flatten the tree rooted at `root` in pre-order.
    pub fn build(root: &'a PlanNode) -> Self {
        let mut ctx = PlanContext {
            nodes: Vec::new(),
            ctes: Vec::new(),
        };
        ctx.collect(root, None, 0);
        ctx
    }

    fn collect(&mut self, node: &'a PlanNode, parent: Option<usize>, depth: usize) {
        let index = self.nodes.len();
        self.nodes.push(NodeRef {
            node,
            parent,
            depth,
        });

        if let Some(name) = node.subplan_name.strip_prefix("CTE ") {
            self.ctes.push(CteInfo {
                name: name.to_string(),
                node,
                estimated_rows: node.plan_rows,
                actual_rows: node.actual_rows,
            });
        }

        for child in &node.plans {
            self.collect(child, Some(index), depth + 1);
        }
    }

    /// All nodes in pre-order.
    pub fn all_nodes(&self) -> &[NodeRef<'a>] {
        &self.nodes
    }

    /// CTE definitions in discovery order.
    pub fn ctes(&self) -> &[CteInfo<'a>] {
        &self.ctes
    }

    /// Indices of every ancestor of `index`, nearest first, root last.
    pub fn ancestors(&self, index: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = self.nodes[index].parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.nodes[parent].parent;
        }
        chain
    }
}
