use anyhow::Result;
use tracing::debug;

use crate::dsl::{NodeKind, WorkflowNode};
use crate::runtime::condition::evaluate;
use crate::runtime::config::Pace;
use crate::runtime::context::Context;
use crate::runtime::node::NodeHandler;
use crate::runtime::syscall::Syscall;

// --- CONDITION NODE ---

/// Evaluates the rules in order; the first that holds decides the branch.
///
/// A matching rule with a target jumps straight there, otherwise its id selects
/// the outgoing edge tagged with it. When nothing matches the default
/// continuation is taken.
#[derive(Debug)]
pub struct ConditionHandler;

impl NodeHandler for ConditionHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Condition
    }

    fn execute(&self, node: &WorkflowNode, ctx: &Context, syscall: &mut dyn Syscall) -> Result<()> {
        let matched = node
            .data
            .conditions()
            .iter()
            .find(|rule| evaluate(ctx.get_var(&rule.variable), &rule.operator, &rule.value));

        syscall.announce(format!(
            "Condition {}: {}",
            matched.is_some(),
            node.display_text()
        ));
        syscall.pause(Pace::Message);

        match matched {
            Some(rule) => {
                debug!(node_id = %node.id, condition_id = %rule.id, "Condition matched");
                match rule.target_node_id.as_deref().filter(|t| !t.is_empty()) {
                    Some(target) => syscall.jump(target),
                    None => syscall.proceed(Some(rule.id.as_str())),
                }
            }
            None => syscall.proceed(None),
        }
        Ok(())
    }
}
