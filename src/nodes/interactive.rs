//! Nodes that suspend the run until the user picks an option.

use anyhow::Result;

use crate::dsl::{NodeKind, WorkflowNode};
use crate::runtime::context::Context;
use crate::runtime::event::ChatMessage;
use crate::runtime::node::NodeHandler;
use crate::runtime::syscall::Syscall;

#[derive(Debug)]
pub struct QuestionHandler;

impl NodeHandler for QuestionHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Question
    }

    fn execute(&self, node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        let message = ChatMessage::bot(node.display_text())
            .with_node(&node.id)
            .with_responses(node.data.responses().to_vec());
        syscall.emit(message);
        syscall.wait();
        Ok(())
    }
}

/// Buttons resume the run only where the mode allows it; the engine enforces
/// that on submission.
#[derive(Debug)]
pub struct ButtonHandler;

impl NodeHandler for ButtonHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Button
    }

    fn execute(&self, node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        let message = ChatMessage::bot(node.display_text())
            .with_node(&node.id)
            .with_buttons(node.data.buttons().to_vec());
        syscall.emit(message);
        syscall.wait();
        Ok(())
    }
}
