use anyhow::Result;

use crate::dsl::{MediaType, NodeKind, WorkflowNode};
use crate::runtime::config::Pace;
use crate::runtime::context::Context;
use crate::runtime::event::ChatMessage;
use crate::runtime::node::NodeHandler;
use crate::runtime::syscall::Syscall;

/// Plain bot message. Serves both `text` and `paragraph`.
#[derive(Debug)]
pub struct TextHandler {
    kind: NodeKind,
}

impl TextHandler {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind }
    }
}

impl NodeHandler for TextHandler {
    fn kind(&self) -> NodeKind {
        self.kind.clone()
    }

    fn execute(&self, node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        syscall.emit(ChatMessage::bot(node.display_text()).with_node(&node.id));
        syscall.pause(Pace::Message);
        syscall.proceed(None);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MediaHandler;

impl NodeHandler for MediaHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Media
    }

    fn execute(&self, node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        let kind = node.data.media_type.unwrap_or(MediaType::Image);
        let content = if node.data.content.is_empty() {
            format!("Media {}", kind)
        } else {
            node.data.content.clone()
        };

        let mut message = ChatMessage::bot(content).with_node(&node.id);
        if let Some(url) = node.data.media_url.as_deref().filter(|u| !u.is_empty()) {
            message = message.with_media(url, kind);
        }
        syscall.emit(message);
        syscall.pause(Pace::Message);
        syscall.proceed(None);
        Ok(())
    }
}
