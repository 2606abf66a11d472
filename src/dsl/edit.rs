use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::dsl::{
    ConditionRule, MediaType, NodeData, NodeKind, NodeStyle, Position, ResponseOption, VariableType,
    Workflow, WorkflowEdge, WorkflowNode, WorkflowVariable,
};
use crate::runtime::condition::Operator;

/// Label, content and kind-specific fields a freshly dropped node starts with.
pub fn node_defaults(kind: &NodeKind) -> NodeData {
    let (label, content) = match kind {
        NodeKind::Start => ("Start", "Bot start"),
        NodeKind::End => ("End", "End of conversation"),
        NodeKind::Text => ("Text message", "Your message here..."),
        NodeKind::Paragraph => ("Paragraph", "Your detailed paragraph here..."),
        NodeKind::Question => ("Question", "Your question here?"),
        NodeKind::Action => ("Action", "Action to perform"),
        NodeKind::Condition => ("Condition", "Logical condition"),
        NodeKind::Delay => ("Delay", "Wait before continuing"),
        NodeKind::Webhook => ("Webhook", "External API call"),
        NodeKind::Variable => ("Variable", "Set a variable"),
        NodeKind::Media => ("Media", "Image, video or audio"),
        NodeKind::Button => ("Buttons", "Action buttons"),
        NodeKind::Carousel => ("Carousel", "Carousel of items"),
        NodeKind::Other(_) => ("", ""),
    };

    let mut data = NodeData {
        label: label.to_string(),
        content: content.to_string(),
        style: NodeStyle::default(),
        ..NodeData::default()
    };

    match kind {
        NodeKind::Question => data.responses = Some(Vec::new()),
        NodeKind::Condition => data.conditions = Some(Vec::new()),
        NodeKind::Delay => data.delay = Some(2000),
        NodeKind::Webhook => data.webhook_url = Some(String::new()),
        NodeKind::Variable => {
            data.variable_name = Some(String::new());
            data.variable_value = Some(String::new());
        }
        NodeKind::Media => {
            data.media_url = Some(String::new());
            data.media_type = Some(MediaType::Image);
        }
        NodeKind::Button => data.buttons = Some(Vec::new()),
        NodeKind::Carousel => data.carousel_items = Some(Vec::new()),
        _ => {}
    }

    data
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Workflow {
    /// An empty document with a fresh identity.
    pub fn new(name: &str, description: &str) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.to_string(),
            description: description.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            variables: Vec::new(),
            created_at: now,
            updated_at: now,
            published_id: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn rename(&mut self, name: &str, description: &str) {
        self.name = name.to_string();
        self.description = description.to_string();
        self.touch();
    }

    // --- nodes ---

    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> String {
        let id = new_id();
        let data = node_defaults(&kind);
        self.nodes.push(WorkflowNode { id: id.clone(), kind, position, data });
        self.touch();
        id
    }

    pub fn update_node(&mut self, id: &str, f: impl FnOnce(&mut WorkflowNode)) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        f(node);
        self.touch();
        true
    }

    /// Removes the node together with every edge touching it.
    pub fn delete_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| e.source != id && e.target != id);
        self.touch();
        true
    }

    // --- edges ---

    pub fn add_edge(&mut self, edge: WorkflowEdge) {
        self.edges.push(edge);
        self.touch();
    }

    pub fn update_edge(&mut self, id: &str, f: impl FnOnce(&mut WorkflowEdge)) -> bool {
        let Some(edge) = self.edges.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        f(edge);
        self.touch();
        true
    }

    pub fn delete_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        let removed = self.edges.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    // --- responses ---

    /// Appends a response to a node and returns its new id, or `None` if the
    /// node does not exist.
    pub fn add_response(&mut self, node_id: &str, text: &str, value: &str, color: &str) -> Option<String> {
        let node = self.nodes.iter_mut().find(|n| n.id == node_id)?;
        let id = new_id();
        node.data.responses.get_or_insert_with(Vec::new).push(ResponseOption {
            id: id.clone(),
            text: text.to_string(),
            value: value.to_string(),
            target_node_id: None,
            color: color.to_string(),
        });
        self.touch();
        Some(id)
    }

    pub fn update_response(&mut self, node_id: &str, response_id: &str, f: impl FnOnce(&mut ResponseOption)) -> bool {
        let response = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .and_then(|n| n.data.responses.as_mut())
            .and_then(|rs| rs.iter_mut().find(|r| r.id == response_id));
        let Some(response) = response else {
            return false;
        };
        f(response);
        self.touch();
        true
    }

    /// Removes the response and every edge routed by it.
    pub fn delete_response(&mut self, node_id: &str, response_id: &str) -> bool {
        let Some(responses) = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .and_then(|n| n.data.responses.as_mut())
        else {
            return false;
        };
        let before = responses.len();
        responses.retain(|r| r.id != response_id);
        if responses.len() == before {
            return false;
        }
        self.edges.retain(|e| e.response_id.as_deref() != Some(response_id));
        self.touch();
        true
    }

    // --- conditions ---

    pub fn add_condition(
        &mut self,
        node_id: &str,
        variable: &str,
        operator: Operator,
        value: &str,
        target_node_id: Option<&str>,
    ) -> Option<String> {
        let node = self.nodes.iter_mut().find(|n| n.id == node_id)?;
        let id = new_id();
        node.data.conditions.get_or_insert_with(Vec::new).push(ConditionRule {
            id: id.clone(),
            variable: variable.to_string(),
            operator,
            value: value.to_string(),
            target_node_id: target_node_id.map(str::to_string),
        });
        self.touch();
        Some(id)
    }

    pub fn update_condition(&mut self, node_id: &str, condition_id: &str, f: impl FnOnce(&mut ConditionRule)) -> bool {
        let rule = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .and_then(|n| n.data.conditions.as_mut())
            .and_then(|cs| cs.iter_mut().find(|c| c.id == condition_id));
        let Some(rule) = rule else {
            return false;
        };
        f(rule);
        self.touch();
        true
    }

    /// Removes the rule and every edge routed by it.
    pub fn delete_condition(&mut self, node_id: &str, condition_id: &str) -> bool {
        let Some(conditions) = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .and_then(|n| n.data.conditions.as_mut())
        else {
            return false;
        };
        let before = conditions.len();
        conditions.retain(|c| c.id != condition_id);
        if conditions.len() == before {
            return false;
        }
        self.edges.retain(|e| e.condition_id.as_deref() != Some(condition_id));
        self.touch();
        true
    }

    // --- declared variables ---

    pub fn add_variable(&mut self, name: &str, var_type: VariableType, default_value: Value, description: &str) -> String {
        let id = new_id();
        self.variables.push(WorkflowVariable {
            id: id.clone(),
            name: name.to_string(),
            var_type,
            default_value,
            description: description.to_string(),
        });
        self.touch();
        id
    }

    pub fn update_variable(&mut self, id: &str, f: impl FnOnce(&mut WorkflowVariable)) -> bool {
        let Some(variable) = self.variables.iter_mut().find(|v| v.id == id) else {
            return false;
        };
        f(variable);
        self.touch();
        true
    }

    pub fn delete_variable(&mut self, id: &str) -> bool {
        let before = self.variables.len();
        self.variables.retain(|v| v.id != id);
        let removed = self.variables.len() != before;
        if removed {
            self.touch();
        }
        removed
    }
}
