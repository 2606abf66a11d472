use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::dsl::{NodeKind, Workflow};
use crate::error::CompileError;
use crate::runtime::blueprint::{Blueprint, NodeIndex};

/// Prepares a document for execution.
///
/// Broken references are tolerated: they are reported with `warn!` and later
/// behave as "no continuation". Only an empty document or duplicated node ids
/// are rejected.
pub struct Compiler {
    id_map: HashMap<String, NodeIndex>,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            id_map: HashMap::new(),
        }
    }

    pub fn compile(&mut self, workflow: Arc<Workflow>) -> Result<Blueprint, CompileError> {
        self.id_map.clear();

        if workflow.nodes.is_empty() {
            return Err(CompileError::EmptyWorkflow(workflow.id.clone()));
        }

        // 1. Pass 1: Indexing
        for (idx, node) in workflow.nodes.iter().enumerate() {
            if self.id_map.insert(node.id.clone(), idx).is_some() {
                return Err(CompileError::DuplicateNodeId(node.id.clone()));
            }
        }

        // 2. Pass 2: Adjacency, keeping document order per source
        let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, edge) in workflow.edges.iter().enumerate() {
            if !self.id_map.contains_key(&edge.source) {
                warn!(workflow_id = %workflow.id, edge_id = %edge.id, source = %edge.source, "Edge source node not found");
            }
            if !self.id_map.contains_key(&edge.target) {
                warn!(workflow_id = %workflow.id, edge_id = %edge.id, target = %edge.target, "Edge target node not found");
            }
            outgoing.entry(edge.source.clone()).or_default().push(idx);
        }

        // 3. Entry node: the first start node, else the first node
        let mut starts = workflow.nodes.iter().enumerate().filter(|(_, n)| n.kind == NodeKind::Start);
        let entry_index = match starts.next() {
            Some((idx, _)) => {
                if let Some((_, extra)) = starts.next() {
                    warn!(workflow_id = %workflow.id, node_id = %extra.id, "Multiple start nodes, using the first one");
                }
                idx
            }
            None => {
                warn!(workflow_id = %workflow.id, "Start node not found, entering at the first node");
                0
            }
        };

        Ok(Blueprint {
            workflow,
            index: self.id_map.clone(),
            outgoing,
            entry_index,
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
