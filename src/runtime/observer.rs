//! Delivery of conversation events to whichever front end drives a run.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::runtime::engine::RunStatus;
use crate::runtime::event::ChatMessage;

/// Receives every event of a run, in order, before the next step executes.
pub trait ConversationObserver: Send + Sync {
    fn on_message(&self, run_id: Uuid, message: &ChatMessage);

    fn on_status(&self, _run_id: Uuid, _status: RunStatus) {}
}

/// Discards all events. Useful when the trace is read back from the engine.
#[derive(Debug, Clone, Default)]
pub struct NoopObserver;

impl ConversationObserver for NoopObserver {
    fn on_message(&self, _run_id: Uuid, _message: &ChatMessage) {}
}

/// Forwards events to an unbounded channel for asynchronous consumers.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<(Uuid, ChatMessage)>,
}

impl ChannelObserver {
    pub fn new(sender: mpsc::UnboundedSender<(Uuid, ChatMessage)>) -> Self {
        Self { sender }
    }
}

impl ConversationObserver for ChannelObserver {
    fn on_message(&self, run_id: Uuid, message: &ChatMessage) {
        // Receiver may have been dropped; the run keeps its own trace.
        let _ = self.sender.send((run_id, message.clone()));
    }
}
