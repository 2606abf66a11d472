pub mod common;
pub mod flow;
pub mod interactive;
pub mod message;
pub mod system;

use std::sync::Arc;

use crate::dsl::NodeKind;
use crate::runtime::node::NodeHandler;

/// Handlers for every built-in node kind. `carousel` and unknown kinds fall
/// through to the engine's passthrough.
pub fn standard_handlers() -> Vec<Arc<dyn NodeHandler>> {
    vec![
        Arc::new(common::StartHandler),
        Arc::new(common::EndHandler),
        Arc::new(message::TextHandler::new(NodeKind::Text)),
        Arc::new(message::TextHandler::new(NodeKind::Paragraph)),
        Arc::new(message::MediaHandler),
        Arc::new(interactive::QuestionHandler),
        Arc::new(interactive::ButtonHandler),
        Arc::new(system::ActionHandler),
        Arc::new(system::DelayHandler),
        Arc::new(system::WebhookHandler),
        Arc::new(system::VariableHandler),
        Arc::new(flow::ConditionHandler),
    ]
}
