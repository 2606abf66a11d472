use serde_json::Value;

use crate::runtime::config::Pace;
use crate::runtime::event::ChatMessage;

/// Commands a node handler issues to the engine.
///
/// Calls are buffered and applied only after the handler returns `Ok`, so a
/// failing handler never leaves a half-applied step behind.
pub trait Syscall: Send {
    /// Appends an event to the trace.
    fn emit(&mut self, message: ChatMessage);

    /// System event about the current node. Dropped in public runs.
    fn announce(&mut self, content: String);

    /// Writes a variable into the environment.
    fn set_var(&mut self, key: &str, value: Value);

    /// Pacing hint before the next step.
    fn pause(&mut self, pace: Pace);

    /// Continue at `target`, bypassing edge lookup.
    fn jump(&mut self, target: &str);

    /// Continue along an outgoing edge, preferring one tagged with `selector`.
    fn proceed(&mut self, selector: Option<&str>);

    /// Suspend until the user answers.
    fn wait(&mut self);

    /// End the run.
    fn terminate(&mut self);
}
