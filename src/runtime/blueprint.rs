use std::collections::HashMap;
use std::sync::Arc;

use crate::dsl::{Workflow, WorkflowEdge, WorkflowNode};

pub type NodeIndex = usize;

/// A document prepared for execution: node lookup by id and outgoing edges
/// per source, both in document order.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub workflow: Arc<Workflow>,
    pub(crate) index: HashMap<String, NodeIndex>,
    /// Source node id → indices into `workflow.edges`.
    pub(crate) outgoing: HashMap<String, Vec<usize>>,
    pub entry_index: NodeIndex,
}

impl Blueprint {
    pub fn id(&self) -> &str {
        &self.workflow.id
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.index.get(id).map(|&idx| &self.workflow.nodes[idx])
    }

    pub fn entry(&self) -> &WorkflowNode {
        &self.workflow.nodes[self.entry_index]
    }

    pub fn outgoing(&self, source: &str) -> impl Iterator<Item = &WorkflowEdge> {
        self.outgoing
            .get(source)
            .into_iter()
            .flatten()
            .map(|&idx| &self.workflow.edges[idx])
    }

    /// Picks the continuation edge out of `source`.
    ///
    /// An edge tagged with `selector` (as response or condition id) wins; then
    /// the first untagged edge; then the first edge of any kind.
    pub fn route(&self, source: &str, selector: Option<&str>) -> Option<&WorkflowEdge> {
        if let Some(selector) = selector {
            if let Some(edge) = self.outgoing(source).find(|e| e.matches_selector(selector)) {
                return Some(edge);
            }
        }
        self.outgoing(source)
            .find(|e| e.is_unconditional())
            .or_else(|| self.outgoing(source).next())
    }
}
