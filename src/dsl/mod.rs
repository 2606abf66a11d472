pub mod builder;
pub mod edit;
pub mod templates;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::runtime::condition::Operator;

/// A bot conversation document: the graph the editor produces and the engine walks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub variables: Vec<WorkflowVariable>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_id: Option<String>,
}

/// Node kinds understood by the built-in handlers.
///
/// Kinds outside the closed set are kept as `Other` so a document written by a
/// newer editor still loads, round-trips, and runs (as a passthrough).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Start,
    End,
    Text,
    Paragraph,
    Question,
    Action,
    Condition,
    Delay,
    Webhook,
    Variable,
    Media,
    Button,
    Carousel,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::Text => "text",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Question => "question",
            NodeKind::Action => "action",
            NodeKind::Condition => "condition",
            NodeKind::Delay => "delay",
            NodeKind::Webhook => "webhook",
            NodeKind::Variable => "variable",
            NodeKind::Media => "media",
            NodeKind::Button => "button",
            NodeKind::Carousel => "carousel",
            NodeKind::Other(name) => name,
        }
    }

    /// Kinds that halt automatic advancement until the user answers.
    pub fn awaits_input(&self) -> bool {
        matches!(self, NodeKind::Question | NodeKind::Button)
    }
}

impl From<String> for NodeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "start" => NodeKind::Start,
            "end" => NodeKind::End,
            "text" => NodeKind::Text,
            "paragraph" => NodeKind::Paragraph,
            "question" => NodeKind::Question,
            "action" => NodeKind::Action,
            "condition" => NodeKind::Condition,
            "delay" => NodeKind::Delay,
            "webhook" => NodeKind::Webhook,
            "variable" => NodeKind::Variable,
            "media" => NodeKind::Media,
            "button" => NodeKind::Button,
            "carousel" => NodeKind::Carousel,
            _ => NodeKind::Other(value),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(value: &str) -> Self {
        NodeKind::from(value.to_string())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editor canvas coordinate. The engine never looks at it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

impl WorkflowNode {
    /// Content shown to the user, falling back to the label when empty.
    pub fn display_text(&self) -> &str {
        if self.data.content.is_empty() {
            &self.data.label
        } else {
            &self.data.content
        }
    }
}

/// Kind-specific payload. Fields a kind does not use stay `None`/empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<ResponseOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<ConditionRule>>,
    /// Milliseconds, `delay` nodes only.
    #[serde(default, deserialize_with = "deserialize_millis", skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ButtonOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carousel_items: Option<Vec<CarouselItem>>,
    #[serde(default)]
    pub style: NodeStyle,
}

impl NodeData {
    pub fn responses(&self) -> &[ResponseOption] {
        self.responses.as_deref().unwrap_or_default()
    }

    pub fn conditions(&self) -> &[ConditionRule] {
        self.conditions.as_deref().unwrap_or_default()
    }

    pub fn buttons(&self) -> &[ButtonOption] {
        self.buttons.as_deref().unwrap_or_default()
    }
}

/// Accepts any JSON number; fractions are truncated and negatives clamp to zero.
fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<f64>::deserialize(deserializer)?;
    Ok(millis.map(|ms| if ms.is_finite() && ms > 0.0 { ms as u64 } else { 0 }))
}

/// Presentation only, consumed by renderers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub background_color: String,
    pub border_color: String,
    pub border_width: u32,
    pub border_radius: u32,
    pub text_color: String,
    pub font_size: u32,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".to_string(),
            border_color: "#e5e7eb".to_string(),
            border_width: 2,
            border_radius: 8,
            text_color: "#374151".to_string(),
            font_size: 14,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub value: String,
    /// Direct-jump hint for condition-style branching; edge lookup ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRule {
    pub id: String,
    pub variable: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonAction {
    Navigate,
    Url,
    Phone,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ButtonOption {
    pub id: String,
    pub text: String,
    pub action: ButtonAction,
    #[serde(default)]
    pub value: String,
    pub style: ButtonStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarouselItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub buttons: Vec<ButtonOption>,
}

/// A directed connection. `response_id`/`condition_id` restrict the edge to the
/// continuation after that response or condition was chosen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
}

impl WorkflowEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: None,
            label: None,
            response_id: None,
            condition_id: None,
            style: None,
        }
    }

    /// An edge carrying neither a response nor a condition tag.
    pub fn is_unconditional(&self) -> bool {
        self.response_id.is_none() && self.condition_id.is_none()
    }

    pub fn matches_selector(&self, selector: &str) -> bool {
        self.response_id.as_deref() == Some(selector) || self.condition_id.as_deref() == Some(selector)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Array,
}

/// Declared variable. Advisory only: the engine never checks values against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowVariable {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default)]
    pub description: String,
}
