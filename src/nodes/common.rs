use anyhow::Result;

use crate::dsl::{NodeKind, WorkflowNode};
use crate::runtime::context::Context;
use crate::runtime::engine::RunMode;
use crate::runtime::event::ChatMessage;
use crate::runtime::node::NodeHandler;
use crate::runtime::syscall::Syscall;

#[derive(Debug)]
pub struct StartHandler;

impl NodeHandler for StartHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Start
    }

    fn execute(&self, _node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        syscall.proceed(None);
        Ok(())
    }
}

#[derive(Debug)]
pub struct EndHandler;

impl NodeHandler for EndHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::End
    }

    fn execute(&self, node: &WorkflowNode, ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        match ctx.mode {
            RunMode::Preview => syscall.announce("Conversation ended".to_string()),
            RunMode::Public => {
                if !node.data.content.is_empty() {
                    syscall.emit(ChatMessage::bot(node.data.content.clone()).with_node(&node.id));
                }
            }
        }
        syscall.terminate();
        Ok(())
    }
}

/// Used for kinds without a registered handler: no output, straight on.
#[derive(Debug)]
pub struct PassthroughHandler;

impl NodeHandler for PassthroughHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Other("passthrough".to_string())
    }

    fn execute(&self, _node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        syscall.proceed(None);
        Ok(())
    }
}
