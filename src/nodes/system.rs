//! Nodes that only narrate to the author. Their announcements are dropped in
//! public runs, but their effects (variable writes, pacing) still apply.

use anyhow::Result;
use serde_json::Value;

use crate::dsl::{NodeKind, WorkflowNode};
use crate::runtime::config::Pace;
use crate::runtime::context::Context;
use crate::runtime::node::NodeHandler;
use crate::runtime::syscall::Syscall;

// --- ACTION NODE ---

#[derive(Debug)]
pub struct ActionHandler;

impl NodeHandler for ActionHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Action
    }

    fn execute(&self, node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        syscall.announce(format!("Action: {}", node.display_text()));
        syscall.pause(Pace::Action);
        syscall.proceed(None);
        Ok(())
    }
}

// --- DELAY NODE ---

#[derive(Debug)]
pub struct DelayHandler;

impl NodeHandler for DelayHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Delay
    }

    fn execute(&self, node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        let notice = match node.data.delay {
            Some(ms) => format!("Waiting {}s...", ms as f64 / 1000.0),
            None => "Waiting...".to_string(),
        };
        syscall.announce(notice);
        syscall.pause(Pace::Delay(node.data.delay));
        syscall.proceed(None);
        Ok(())
    }
}

// --- WEBHOOK NODE ---

/// Records the intent to call the URL. No request is made.
#[derive(Debug)]
pub struct WebhookHandler;

impl NodeHandler for WebhookHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Webhook
    }

    fn execute(&self, node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        let url = node
            .data
            .webhook_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or("URL not set");
        syscall.announce(format!("Webhook call: {}", url));
        syscall.pause(Pace::Action);
        syscall.proceed(None);
        Ok(())
    }
}

// --- VARIABLE NODE ---

#[derive(Debug)]
pub struct VariableHandler;

impl NodeHandler for VariableHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Variable
    }

    fn execute(&self, node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        let name = node.data.variable_name.as_deref().unwrap_or_default();
        let value = node.data.variable_value.as_deref().unwrap_or_default();

        // Both halves are required; a half-configured node only narrates.
        if !name.is_empty() && !value.is_empty() {
            syscall.set_var(name, Value::String(value.to_string()));
        }
        syscall.announce(format!("Variable \"{}\" = \"{}\"", name, value));
        syscall.pause(Pace::Message);
        syscall.proceed(None);
        Ok(())
    }
}
