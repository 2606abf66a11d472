use anyhow::Result;
use std::fmt::Debug;

use crate::dsl::{NodeKind, WorkflowNode};
use crate::runtime::context::Context;
use crate::runtime::syscall::Syscall;

/// Behaviour of one node kind. The engine keeps a kind → handler table.
pub trait NodeHandler: Send + Sync + Debug {
    fn kind(&self) -> NodeKind;

    /// Visits `node`: emit its events and pick a transition through `syscall`.
    /// The context is read-only here; writes go through `Syscall::set_var`.
    fn execute(&self, node: &WorkflowNode, ctx: &Context, syscall: &mut dyn Syscall) -> Result<()>;
}
