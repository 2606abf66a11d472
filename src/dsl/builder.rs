use crate::dsl::edit::node_defaults;
use crate::dsl::{
    ButtonAction, ButtonOption, ButtonStyle, ConditionRule, MediaType, NodeKind, Position, ResponseOption,
    Workflow, WorkflowEdge, WorkflowNode,
};
use crate::runtime::condition::Operator;

/// Fluent construction of documents with caller-chosen ids.
pub struct WorkflowBuilder {
    workflow: Workflow,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
}

impl WorkflowBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            workflow: Workflow::new(name, ""),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.workflow.id = id.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.workflow.description = description.to_string();
        self
    }

    /// Adds a node of `kind` with the editor defaults; `content` overrides the
    /// default content when non-empty.
    pub fn node(mut self, kind: NodeKind, id: &str, content: &str) -> Self {
        self.push_node(kind, id, content);
        self
    }

    fn push_node(&mut self, kind: NodeKind, id: &str, content: &str) -> &mut WorkflowNode {
        let mut data = node_defaults(&kind);
        if !content.is_empty() {
            data.content = content.to_string();
        }
        let position = Position {
            x: 0.0,
            y: 120.0 * self.nodes.len() as f64,
        };
        self.nodes.push(WorkflowNode {
            id: id.to_string(),
            kind,
            position,
            data,
        });
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    pub fn start(self, id: &str) -> Self {
        self.node(NodeKind::Start, id, "")
    }

    pub fn end(self, id: &str, content: &str) -> Self {
        self.node(NodeKind::End, id, content)
    }

    pub fn text(self, id: &str, content: &str) -> Self {
        self.node(NodeKind::Text, id, content)
    }

    pub fn paragraph(self, id: &str, content: &str) -> Self {
        self.node(NodeKind::Paragraph, id, content)
    }

    pub fn action(self, id: &str, content: &str) -> Self {
        self.node(NodeKind::Action, id, content)
    }

    pub fn delay(mut self, id: &str, millis: u64) -> Self {
        self.push_node(NodeKind::Delay, id, "").data.delay = Some(millis);
        self
    }

    pub fn webhook(mut self, id: &str, url: &str) -> Self {
        self.push_node(NodeKind::Webhook, id, "").data.webhook_url = Some(url.to_string());
        self
    }

    pub fn variable(mut self, id: &str, name: &str, value: &str) -> Self {
        let node = self.push_node(NodeKind::Variable, id, "");
        node.data.variable_name = Some(name.to_string());
        node.data.variable_value = Some(value.to_string());
        self
    }

    pub fn media(mut self, id: &str, url: &str, media_type: MediaType) -> Self {
        let node = self.push_node(NodeKind::Media, id, "");
        node.data.content = String::new();
        node.data.media_url = Some(url.to_string());
        node.data.media_type = Some(media_type);
        self
    }

    pub fn question(self, id: &str, content: &str) -> ChoiceBuilder {
        ChoiceBuilder::new(self, NodeKind::Question, id, content)
    }

    pub fn buttons(self, id: &str, content: &str) -> ChoiceBuilder {
        ChoiceBuilder::new(self, NodeKind::Button, id, content)
    }

    pub fn condition(self, id: &str, content: &str) -> ConditionBuilder {
        ConditionBuilder {
            workflow_builder: self.node(NodeKind::Condition, id, content),
            rules: Vec::new(),
        }
    }

    fn next_edge_id(&self) -> String {
        format!("e{}", self.edges.len() + 1)
    }

    pub fn connect(mut self, source: &str, target: &str) -> Self {
        let edge = WorkflowEdge::new(self.next_edge_id(), source, target);
        self.edges.push(edge);
        self
    }

    pub fn connect_response(mut self, source: &str, target: &str, response_id: &str) -> Self {
        let mut edge = WorkflowEdge::new(self.next_edge_id(), source, target);
        edge.response_id = Some(response_id.to_string());
        self.edges.push(edge);
        self
    }

    pub fn connect_condition(mut self, source: &str, target: &str, condition_id: &str) -> Self {
        let mut edge = WorkflowEdge::new(self.next_edge_id(), source, target);
        edge.condition_id = Some(condition_id.to_string());
        self.edges.push(edge);
        self
    }

    pub fn build(self) -> Workflow {
        Workflow {
            nodes: self.nodes,
            edges: self.edges,
            ..self.workflow
        }
    }
}

/// Attaches response options (question) or button options (button) to the
/// node just added.
pub struct ChoiceBuilder {
    workflow_builder: WorkflowBuilder,
}

impl ChoiceBuilder {
    fn new(mut workflow_builder: WorkflowBuilder, kind: NodeKind, id: &str, content: &str) -> Self {
        workflow_builder.push_node(kind, id, content);
        Self { workflow_builder }
    }

    fn current(&mut self) -> &mut WorkflowNode {
        let last = self.workflow_builder.nodes.len() - 1;
        &mut self.workflow_builder.nodes[last]
    }

    pub fn response(mut self, id: &str, text: &str, value: &str) -> Self {
        self.current()
            .data
            .responses
            .get_or_insert_with(Vec::new)
            .push(ResponseOption {
                id: id.to_string(),
                text: text.to_string(),
                value: value.to_string(),
                target_node_id: None,
                color: "#3B82F6".to_string(),
            });
        self
    }

    pub fn button(mut self, id: &str, text: &str, value: &str) -> Self {
        self.current().data.buttons.get_or_insert_with(Vec::new).push(ButtonOption {
            id: id.to_string(),
            text: text.to_string(),
            action: ButtonAction::Navigate,
            value: value.to_string(),
            style: ButtonStyle::Primary,
        });
        self
    }

    pub fn build(self) -> WorkflowBuilder {
        self.workflow_builder
    }
}

pub struct ConditionBuilder {
    workflow_builder: WorkflowBuilder,
    rules: Vec<ConditionRule>,
}

impl ConditionBuilder {
    pub fn rule(mut self, id: &str, variable: &str, operator: Operator, value: &str, target: Option<&str>) -> Self {
        self.rules.push(ConditionRule {
            id: id.to_string(),
            variable: variable.to_string(),
            operator,
            value: value.to_string(),
            target_node_id: target.map(str::to_string),
        });
        self
    }

    pub fn build(mut self) -> WorkflowBuilder {
        let last = self.workflow_builder.nodes.len() - 1;
        self.workflow_builder.nodes[last].data.conditions = Some(self.rules);
        self.workflow_builder
    }
}
