use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::compiler::core::Compiler;
use crate::dsl::{NodeKind, Workflow};
use crate::error::EngineError;
use crate::nodes;
use crate::nodes::common::PassthroughHandler;
use crate::runtime::blueprint::Blueprint;
use crate::runtime::config::{EngineConfig, Pace};
use crate::runtime::context::{Context, LAST_RESPONSE};
use crate::runtime::event::ChatMessage;
use crate::runtime::node::NodeHandler;
use crate::runtime::observer::{ConversationObserver, NoopObserver};
use crate::runtime::pacer::Pacer;
use crate::runtime::syscall::Syscall;
use crate::runtime::task::Task;

/// Which front end a run serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Authoring preview: narrates system events, buttons resume the run.
    Preview,
    /// Published chat: bot output only, buttons are display-only.
    Public,
}

impl RunMode {
    pub fn announces_system_events(self) -> bool {
        matches!(self, RunMode::Preview)
    }

    pub fn resumes_buttons(self) -> bool {
        matches!(self, RunMode::Preview)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Idle,
    Running,
    AwaitingInput,
    Terminated,
}

#[derive(Debug)]
enum Transition {
    Jump(String),
    Proceed(Option<String>),
    Wait,
    Terminate,
}

struct EngineSyscall {
    mode: RunMode,
    node_id: String,
    messages: Vec<ChatMessage>,
    writes: Vec<(String, Value)>,
    pace: Option<Pace>,
    transition: Option<Transition>,
}

impl EngineSyscall {
    fn new(mode: RunMode, node_id: &str) -> Self {
        Self {
            mode,
            node_id: node_id.to_string(),
            messages: Vec::new(),
            writes: Vec::new(),
            pace: None,
            transition: None,
        }
    }
}

impl Syscall for EngineSyscall {
    fn emit(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    fn announce(&mut self, content: String) {
        if self.mode.announces_system_events() {
            self.messages.push(ChatMessage::system(content).with_node(&self.node_id));
        }
    }

    fn set_var(&mut self, key: &str, value: Value) {
        self.writes.push((key.to_string(), value));
    }

    fn pause(&mut self, pace: Pace) {
        self.pace = Some(pace);
    }

    fn jump(&mut self, target: &str) {
        self.transition = Some(Transition::Jump(target.to_string()));
    }

    fn proceed(&mut self, selector: Option<&str>) {
        self.transition = Some(Transition::Proceed(selector.map(str::to_string)));
    }

    fn wait(&mut self) {
        self.transition = Some(Transition::Wait);
    }

    fn terminate(&mut self) {
        self.transition = Some(Transition::Terminate);
    }
}

/// State of the single active run. Replaced wholesale by every new start.
struct Run {
    ctx: Context,
    blueprint: Arc<Blueprint>,
    messages: Vec<ChatMessage>,
    status: RunStatus,
    current: Option<String>,
    pending: Option<Task>,
    steps: usize,
}

impl Run {
    fn id(&self) -> Uuid {
        self.ctx.run_id
    }

    fn deliver(&mut self, observer: &dyn ConversationObserver, message: ChatMessage) {
        observer.on_message(self.id(), &message);
        self.messages.push(message);
    }

    fn set_status(&mut self, status: RunStatus, observer: &dyn ConversationObserver) {
        if self.status != status {
            self.status = status;
            observer.on_status(self.id(), status);
        }
    }

    fn schedule(&mut self, node_id: String, delay: Duration) {
        self.pending = Some(Task::new(self.id(), node_id, delay));
    }

    /// Follows an outgoing edge of `source`, or completes the run when there is none.
    fn proceed(&mut self, source: &str, selector: Option<&str>, delay: Duration, observer: &dyn ConversationObserver) {
        let target = self.blueprint.route(source, selector).map(|e| e.target.clone());
        match target {
            Some(target) => self.schedule(target, delay),
            None => self.complete(observer),
        }
    }

    fn complete(&mut self, observer: &dyn ConversationObserver) {
        self.finish(observer, ChatMessage::system("Conversation completed"));
    }

    fn finish(&mut self, observer: &dyn ConversationObserver, message: ChatMessage) {
        self.pending = None;
        self.deliver(observer, message);
        self.set_status(RunStatus::Terminated, observer);
        info!(run_id = %self.id(), workflow_id = %self.ctx.workflow_id, steps = self.steps, "Run terminated");
    }

    fn apply(&mut self, node_id: &str, syscall: EngineSyscall, config: &EngineConfig, observer: &dyn ConversationObserver) {
        for (key, value) in syscall.writes {
            self.ctx.set_var(&key, value);
        }
        for message in syscall.messages {
            self.deliver(observer, message);
        }

        let pause = syscall
            .pace
            .map(|pace| config.pacing.resolve(pace))
            .unwrap_or(Duration::ZERO);

        match syscall.transition.unwrap_or(Transition::Proceed(None)) {
            Transition::Jump(target) => self.schedule(target, pause),
            Transition::Proceed(selector) => {
                let delay = pause + config.pacing.transition();
                self.proceed(node_id, selector.as_deref(), delay, observer);
            }
            Transition::Wait => self.set_status(RunStatus::AwaitingInput, observer),
            Transition::Terminate => {
                self.pending = None;
                self.set_status(RunStatus::Terminated, observer);
                info!(run_id = %self.id(), workflow_id = %self.ctx.workflow_id, steps = self.steps, "Run terminated");
            }
        }
    }
}

/// Conversation engine for one session.
///
/// Walks a workflow one node per [`tick`](Engine::tick), suspends at
/// `question`/`button` nodes until [`submit_response`](Engine::submit_response),
/// and stops at `end` or when no continuation exists. Two sessions never share
/// an engine, so no state is shared between them.
pub struct Engine {
    mode: RunMode,
    config: EngineConfig,
    node_registry: HashMap<NodeKind, Arc<dyn NodeHandler>>,
    fallback: Arc<dyn NodeHandler>,
    observer: Arc<dyn ConversationObserver>,
    compiler: Compiler,
    run: Option<Run>,
}

impl Engine {
    pub fn new(mode: RunMode) -> Self {
        let mut engine = Self {
            mode,
            config: EngineConfig::for_mode(mode),
            node_registry: HashMap::new(),
            fallback: Arc::new(PassthroughHandler),
            observer: Arc::new(NoopObserver),
            compiler: Compiler::new(),
            run: None,
        };
        for handler in nodes::standard_handlers() {
            engine.register_node(handler);
        }
        engine
    }

    pub fn preview() -> Self {
        Self::new(RunMode::Preview)
    }

    pub fn public() -> Self {
        Self::new(RunMode::Public)
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ConversationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Installs or replaces the handler for its kind.
    pub fn register_node(&mut self, handler: Arc<dyn NodeHandler>) {
        self.node_registry.insert(handler.kind(), handler);
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Starts a new run, discarding any run in flight.
    pub fn start(&mut self, workflow: Arc<Workflow>) -> Result<Uuid, EngineError> {
        if let Some(previous) = self.run.take() {
            debug!(run_id = %previous.id(), "Discarding previous run");
        }

        let blueprint = Arc::new(self.compiler.compile(workflow)?);
        let run_id = Uuid::new_v4();
        let entry = blueprint.entry().id.clone();
        let name = blueprint.workflow.name.clone();

        let mut run = Run {
            ctx: Context::new(run_id, blueprint.id().to_string(), self.mode),
            blueprint,
            messages: Vec::new(),
            status: RunStatus::Idle,
            current: None,
            pending: None,
            steps: 0,
        };

        info!(run_id = %run_id, workflow_id = %run.ctx.workflow_id, entry = %entry, mode = ?self.mode, "Run started");

        let observer = self.observer.as_ref();
        run.set_status(RunStatus::Running, observer);
        if self.mode.announces_system_events() {
            run.deliver(observer, ChatMessage::system(format!("Bot started: {}", name)));
        }
        run.schedule(entry, self.config.pacing.start());

        self.run = Some(run);
        Ok(run_id)
    }

    /// Visits the next scheduled node, ignoring its pacing delay.
    pub fn tick(&mut self) -> RunStatus {
        let Self {
            mode,
            config,
            node_registry,
            fallback,
            observer,
            run,
            ..
        } = self;
        let observer = observer.as_ref();

        let Some(run) = run.as_mut() else {
            return RunStatus::Idle;
        };
        if run.status != RunStatus::Running {
            return run.status;
        }

        let Some(task) = run.pending.take() else {
            run.complete(observer);
            return run.status;
        };
        if run.steps >= config.step_limit {
            warn!(run_id = %run.id(), limit = config.step_limit, "Step limit reached");
            run.finish(observer, ChatMessage::system("Step limit reached, conversation stopped"));
            return run.status;
        }
        run.steps += 1;

        let blueprint = run.blueprint.clone();
        let Some(node) = blueprint.node(&task.node_id) else {
            warn!(run_id = %run.id(), node_id = %task.node_id, "Target node not found");
            run.complete(observer);
            return run.status;
        };
        run.current = Some(node.id.clone());

        let handler = node_registry.get(&node.kind).unwrap_or(&*fallback).clone();
        debug!(run_id = %run.id(), node_id = %node.id, kind = %node.kind, "Visiting node");

        let mut syscall = EngineSyscall::new(*mode, &node.id);
        match handler.execute(node, &run.ctx, &mut syscall) {
            Ok(()) => run.apply(&node.id, syscall, config, observer),
            Err(e) => {
                error!(run_id = %run.id(), node_id = %node.id, error = ?e, "Node failed");
                run.finish(observer, ChatMessage::system("Conversation interrupted").with_node(&node.id));
            }
        }
        run.status
    }

    /// Ticks until the run suspends or terminates, collapsing all pacing.
    pub fn run_until_blocked(&mut self) -> RunStatus {
        loop {
            let status = self.tick();
            if status != RunStatus::Running {
                return status;
            }
        }
    }

    /// Ticks until the run suspends or terminates, pausing between steps.
    pub async fn drive(&mut self, pacer: &dyn Pacer) -> RunStatus {
        while let Some(delay) = self.next_delay() {
            pacer.pause(delay).await;
            self.tick();
        }
        self.status()
    }

    /// Pause owed before the next step, or `None` when nothing is due.
    pub fn next_delay(&self) -> Option<Duration> {
        let run = self.run.as_ref()?;
        if run.status != RunStatus::Running {
            return None;
        }
        Some(run.pending.as_ref().map(|t| t.delay).unwrap_or(Duration::ZERO))
    }

    /// Resumes a suspended run with the response (or button) the user picked.
    pub fn submit_response(&mut self, option_id: &str) -> Result<RunStatus, EngineError> {
        let Self {
            mode,
            config,
            observer,
            run,
            ..
        } = self;
        let observer = observer.as_ref();

        let run = run.as_mut().ok_or(EngineError::NoActiveRun)?;
        if run.status != RunStatus::AwaitingInput {
            return Err(EngineError::NotAwaitingInput);
        }

        let blueprint = run.blueprint.clone();
        let node = run
            .current
            .as_deref()
            .and_then(|id| blueprint.node(id))
            .ok_or(EngineError::NotAwaitingInput)?;

        let choice = match node.kind {
            NodeKind::Button => {
                if !mode.resumes_buttons() {
                    return Err(EngineError::ButtonsDisplayOnly(node.id.clone()));
                }
                node.data
                    .buttons()
                    .iter()
                    .find(|b| b.id == option_id)
                    .map(|b| (b.text.clone(), b.value.clone()))
            }
            _ => node
                .data
                .responses()
                .iter()
                .find(|r| r.id == option_id)
                .map(|r| (r.text.clone(), r.value.clone())),
        };
        let (text, value) = choice.ok_or_else(|| EngineError::UnknownResponse {
            node_id: node.id.clone(),
            response_id: option_id.to_string(),
        })?;

        debug!(run_id = %run.id(), node_id = %node.id, response_id = option_id, "Response selected");

        run.deliver(observer, ChatMessage::user(text));
        if !value.is_empty() {
            run.ctx.set_var(LAST_RESPONSE, Value::String(value));
        }
        run.set_status(RunStatus::Running, observer);
        run.proceed(&node.id, Some(option_id), config.pacing.response(), observer);
        Ok(run.status)
    }

    /// Drops the current run, if any.
    pub fn reset(&mut self) {
        self.run = None;
    }

    pub fn status(&self) -> RunStatus {
        self.run.as_ref().map(|r| r.status).unwrap_or(RunStatus::Idle)
    }

    pub fn is_awaiting_input(&self) -> bool {
        self.status() == RunStatus::AwaitingInput
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run.as_ref().map(Run::id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.run.as_ref().map(|r| r.messages.as_slice()).unwrap_or_default()
    }

    /// Snapshot of the variable environment.
    pub fn variables(&self) -> HashMap<String, Value> {
        self.run.as_ref().map(|r| r.ctx.get_all_vars()).unwrap_or_default()
    }

    pub fn current_node(&self) -> Option<&str> {
        self.run.as_ref().and_then(|r| r.current.as_deref())
    }

    pub fn pending_task(&self) -> Option<&Task> {
        self.run.as_ref().and_then(|r| r.pending.as_ref())
    }

    /// Options the user can pick from while the run is suspended, as `(id, text)`.
    pub fn choices(&self) -> Vec<(String, String)> {
        let Some(run) = self.run.as_ref().filter(|r| r.status == RunStatus::AwaitingInput) else {
            return Vec::new();
        };
        let Some(node) = run.current.as_deref().and_then(|id| run.blueprint.node(id)) else {
            return Vec::new();
        };
        match node.kind {
            NodeKind::Button => node
                .data
                .buttons()
                .iter()
                .map(|b| (b.id.clone(), b.text.clone()))
                .collect(),
            _ => node
                .data
                .responses()
                .iter()
                .map(|r| (r.id.clone(), r.text.clone()))
                .collect(),
        }
    }
}
