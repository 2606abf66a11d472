use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use botflow::dsl::builder::WorkflowBuilder;
use botflow::dsl::templates::default_workflows;
use botflow::dsl::{MediaType, NodeKind, Workflow, WorkflowNode};
use botflow::error::{CompileError, EngineError};
use botflow::runtime::condition::Operator;
use botflow::runtime::config::EngineConfig;
use botflow::runtime::context::{Context, LAST_RESPONSE};
use botflow::runtime::engine::{Engine, RunMode, RunStatus};
use botflow::runtime::event::{ChatMessage, MessageRole};
use botflow::runtime::node::NodeHandler;
use botflow::runtime::observer::ChannelObserver;
use botflow::runtime::pacer::InstantPacer;
use botflow::runtime::syscall::Syscall;
use serde_json::{Value, json};
use tokio::sync::mpsc;

fn preview() -> Engine {
    Engine::preview().with_config(EngineConfig::instant())
}

fn public() -> Engine {
    Engine::public().with_config(EngineConfig::instant())
}

fn trace(engine: &Engine) -> Vec<(MessageRole, String)> {
    engine
        .messages()
        .iter()
        .map(|m| (m.role, m.content.clone()))
        .collect()
}

fn contents(engine: &Engine) -> Vec<String> {
    engine.messages().iter().map(|m| m.content.clone()).collect()
}

fn survey() -> Workflow {
    WorkflowBuilder::new("Survey")
        .start("start")
        .question("ask", "Do you like Rust?")
            .response("r_yes", "Yes", "yes")
            .response("r_no", "No", "")
            .build()
        .text("happy", "Great!")
        .text("sad", "Sorry to hear that")
        .connect("start", "ask")
        .connect_response("ask", "happy", "r_yes")
        .connect_response("ask", "sad", "r_no")
        .build()
}

#[test]
fn test_linear_preview_trace() {
    let workflow = WorkflowBuilder::new("Greeter")
        .start("start")
        .text("hello", "Hello")
        .end("end", "Bye")
        .connect("start", "hello")
        .connect("hello", "end")
        .build();

    let mut engine = preview();
    assert_eq!(engine.status(), RunStatus::Idle);
    engine.start(Arc::new(workflow)).expect("Failed to start run");
    assert_eq!(engine.status(), RunStatus::Running);

    let status = engine.run_until_blocked();
    assert_eq!(status, RunStatus::Terminated);
    assert_eq!(
        trace(&engine),
        vec![
            (MessageRole::System, "Bot started: Greeter".to_string()),
            (MessageRole::Bot, "Hello".to_string()),
            (MessageRole::System, "Conversation ended".to_string()),
        ]
    );
    assert_eq!(engine.messages()[1].node_id.as_deref(), Some("hello"));
    assert_eq!(engine.current_node(), Some("end"));
}

#[test]
fn test_public_end_emits_its_content() {
    let workflow = WorkflowBuilder::new("Greeter")
        .start("start")
        .text("hello", "Hello")
        .end("end", "Bye")
        .connect("start", "hello")
        .connect("hello", "end")
        .build();

    let mut engine = public();
    engine.start(Arc::new(workflow)).unwrap();
    engine.run_until_blocked();

    assert_eq!(
        trace(&engine),
        vec![
            (MessageRole::Bot, "Hello".to_string()),
            (MessageRole::Bot, "Bye".to_string()),
        ]
    );
}

#[test]
fn test_question_suspends_and_routes_by_response() {
    let mut engine = preview();
    engine.start(Arc::new(survey())).unwrap();

    assert_eq!(engine.run_until_blocked(), RunStatus::AwaitingInput);
    assert!(engine.is_awaiting_input());
    assert_eq!(engine.current_node(), Some("ask"));
    assert_eq!(
        engine.choices(),
        vec![
            ("r_yes".to_string(), "Yes".to_string()),
            ("r_no".to_string(), "No".to_string()),
        ]
    );

    let question = engine.messages().last().unwrap();
    assert_eq!(question.role, MessageRole::Bot);
    assert_eq!(question.responses.len(), 2);

    // Ticking while suspended changes nothing
    let before = engine.messages().len();
    assert_eq!(engine.tick(), RunStatus::AwaitingInput);
    assert_eq!(engine.messages().len(), before);

    assert_eq!(engine.submit_response("r_no").unwrap(), RunStatus::Running);
    assert_eq!(engine.run_until_blocked(), RunStatus::Terminated);

    let texts = contents(&engine);
    assert!(texts.contains(&"No".to_string()));
    assert!(texts.contains(&"Sorry to hear that".to_string()));
    assert!(!texts.contains(&"Great!".to_string()));
    assert_eq!(texts.last().map(String::as_str), Some("Conversation completed"));

    // Empty value leaves last_response unset
    assert!(!engine.variables().contains_key(LAST_RESPONSE));
}

#[test]
fn test_response_value_is_recorded() {
    let mut engine = preview();
    engine.start(Arc::new(survey())).unwrap();
    engine.run_until_blocked();

    engine.submit_response("r_yes").unwrap();
    let echo = engine.messages().last().unwrap();
    assert_eq!(echo.role, MessageRole::User);
    assert_eq!(echo.content, "Yes");

    engine.run_until_blocked();
    assert_eq!(engine.variables().get(LAST_RESPONSE), Some(&json!("yes")));
    assert!(contents(&engine).contains(&"Great!".to_string()));
}

#[test]
fn test_response_without_tagged_edge_takes_default_path() {
    let workflow = WorkflowBuilder::new("Fallback")
        .question("ask", "Pick one")
            .response("a", "A", "a")
            .response("b", "B", "b")
            .build()
        .text("for_a", "Picked A")
        .text("other", "Default path")
        .connect_response("ask", "for_a", "a")
        .connect("ask", "other")
        .build();

    let mut engine = public();
    engine.start(Arc::new(workflow)).unwrap();
    engine.run_until_blocked();
    engine.submit_response("b").unwrap();
    engine.run_until_blocked();

    let texts = contents(&engine);
    assert!(texts.contains(&"Default path".to_string()));
    assert!(!texts.contains(&"Picked A".to_string()));
}

#[test]
fn test_condition_jumps_to_rule_target() {
    let workflow = WorkflowBuilder::new("Age check")
        .start("start")
        .variable("set_age", "age", "20")
        .condition("check", "Is adult?")
            .rule("c1", "age", Operator::Greater, "18", Some("adult"))
            .build()
        .text("adult", "ADULT")
        .text("minor", "MINOR")
        .connect("start", "set_age")
        .connect("set_age", "check")
        .connect("check", "minor")
        .build();

    let mut engine = preview();
    engine.start(Arc::new(workflow)).unwrap();
    assert_eq!(engine.run_until_blocked(), RunStatus::Terminated);

    let texts = contents(&engine);
    assert!(texts.contains(&"Variable \"age\" = \"20\"".to_string()));
    assert!(texts.contains(&"Condition true: Is adult?".to_string()));
    assert!(texts.contains(&"ADULT".to_string()));
    assert!(!texts.contains(&"MINOR".to_string()));
    assert_eq!(engine.variables().get("age"), Some(&Value::String("20".to_string())));
}

#[test]
fn test_condition_selects_tagged_edge_or_default() {
    let build = |age: &str| {
        WorkflowBuilder::new("Age check")
            .start("start")
            .variable("set_age", "age", age)
            .condition("check", "Is adult?")
                .rule("c1", "age", Operator::Greater, "18", None)
                .build()
            .text("adult", "ADULT")
            .text("minor", "MINOR")
            .connect("start", "set_age")
            .connect("set_age", "check")
            .connect_condition("check", "adult", "c1")
            .connect("check", "minor")
            .build()
    };

    let mut engine = public();
    engine.start(Arc::new(build("30"))).unwrap();
    engine.run_until_blocked();
    assert_eq!(contents(&engine), vec!["ADULT", "Conversation completed"]);

    engine.start(Arc::new(build("15"))).unwrap();
    engine.run_until_blocked();
    assert_eq!(contents(&engine), vec!["MINOR", "Conversation completed"]);
}

#[test]
fn test_entry_falls_back_to_first_node() {
    let workflow = WorkflowBuilder::new("No start")
        .text("first", "first")
        .text("second", "second")
        .connect("first", "second")
        .build();

    let mut engine = public();
    engine.start(Arc::new(workflow)).unwrap();
    engine.run_until_blocked();

    assert_eq!(contents(&engine), vec!["first", "second", "Conversation completed"]);
}

#[test]
fn test_lone_node_completes_exactly_once() {
    let workflow = WorkflowBuilder::new("Lonely")
        .node(NodeKind::Other("sticker".to_string()), "only", "")
        .build();

    let mut engine = public();
    engine.start(Arc::new(workflow)).unwrap();
    assert_eq!(engine.run_until_blocked(), RunStatus::Terminated);

    assert_eq!(
        trace(&engine),
        vec![(MessageRole::System, "Conversation completed".to_string())]
    );

    // Further ticks on a terminated run are inert
    assert_eq!(engine.tick(), RunStatus::Terminated);
    assert_eq!(engine.messages().len(), 1);
}

#[test]
fn test_edge_to_missing_node_completes() {
    let workflow = WorkflowBuilder::new("Dangling")
        .text("a", "A")
        .connect("a", "ghost")
        .build();

    let mut engine = public();
    engine.start(Arc::new(workflow)).unwrap();
    assert_eq!(engine.run_until_blocked(), RunStatus::Terminated);

    let completions = contents(&engine)
        .iter()
        .filter(|c| c.as_str() == "Conversation completed")
        .count();
    assert_eq!(completions, 1);
}

#[test]
fn test_restart_discards_previous_run() {
    let first = WorkflowBuilder::new("First")
        .text("a", "from the first run")
        .text("b", "also first")
        .connect("a", "b")
        .build();

    let mut engine = preview();
    let first_run = engine.start(Arc::new(first)).unwrap();
    engine.tick();
    assert!(contents(&engine).contains(&"from the first run".to_string()));
    assert!(engine.pending_task().is_some());

    let second_run = engine.start(Arc::new(survey())).unwrap();
    assert_ne!(first_run, second_run);
    assert_eq!(engine.run_id(), Some(second_run));
    assert_eq!(engine.pending_task().unwrap().run_id, second_run);
    assert!(engine.variables().is_empty());

    engine.run_until_blocked();
    let texts = contents(&engine);
    assert!(!texts.iter().any(|t| t.contains("first")));
    assert_eq!(texts.first().map(String::as_str), Some("Bot started: Survey"));
}

#[test]
fn test_public_mode_hides_system_events_and_keeps_effects() {
    let workflow = WorkflowBuilder::new("Quiet")
        .start("start")
        .action("act", "Send email")
        .webhook("hook", "https://example.com/hook")
        .delay("wait", 100)
        .variable("set", "plan", "pro")
        .text("hi", "Hi")
        .connect("start", "act")
        .connect("act", "hook")
        .connect("hook", "wait")
        .connect("wait", "set")
        .connect("set", "hi")
        .build();

    let mut engine = public();
    engine.start(Arc::new(workflow.clone())).unwrap();
    engine.run_until_blocked();
    assert_eq!(
        trace(&engine),
        vec![
            (MessageRole::Bot, "Hi".to_string()),
            (MessageRole::System, "Conversation completed".to_string()),
        ]
    );
    assert_eq!(engine.variables().get("plan"), Some(&json!("pro")));

    let mut engine = preview();
    engine.start(Arc::new(workflow)).unwrap();
    engine.run_until_blocked();
    let texts = contents(&engine);
    assert!(texts.contains(&"Action: Send email".to_string()));
    assert!(texts.contains(&"Webhook call: https://example.com/hook".to_string()));
    assert!(texts.contains(&"Waiting 0.1s...".to_string()));
    assert!(texts.contains(&"Variable \"plan\" = \"pro\"".to_string()));
}

#[test]
fn test_buttons_resume_only_in_preview() {
    let workflow = WorkflowBuilder::new("Menu")
        .buttons("menu", "Choose")
            .button("b1", "Pricing", "pricing")
            .build()
        .text("pricing", "Plans start at 10")
        .connect_response("menu", "pricing", "b1")
        .build();

    let mut engine = public();
    engine.start(Arc::new(workflow.clone())).unwrap();
    assert_eq!(engine.run_until_blocked(), RunStatus::AwaitingInput);
    assert_eq!(engine.messages()[0].buttons.len(), 1);
    assert_eq!(
        engine.submit_response("b1"),
        Err(EngineError::ButtonsDisplayOnly("menu".to_string()))
    );
    assert!(engine.is_awaiting_input());

    let mut engine = preview();
    engine.start(Arc::new(workflow)).unwrap();
    engine.run_until_blocked();
    engine.submit_response("b1").unwrap();
    engine.run_until_blocked();
    assert!(contents(&engine).contains(&"Plans start at 10".to_string()));
    assert_eq!(engine.variables().get(LAST_RESPONSE), Some(&json!("pricing")));
}

#[test]
fn test_submit_response_misuse() {
    let mut engine = preview();
    assert_eq!(engine.submit_response("x"), Err(EngineError::NoActiveRun));

    engine.start(Arc::new(survey())).unwrap();
    assert_eq!(engine.submit_response("r_yes"), Err(EngineError::NotAwaitingInput));

    engine.run_until_blocked();
    assert_eq!(
        engine.submit_response("nope"),
        Err(EngineError::UnknownResponse {
            node_id: "ask".to_string(),
            response_id: "nope".to_string(),
        })
    );
    assert!(engine.is_awaiting_input());
}

#[test]
fn test_empty_workflow_is_rejected() {
    let workflow = WorkflowBuilder::new("Empty").id("empty").build();
    let mut engine = preview();
    assert_eq!(
        engine.start(Arc::new(workflow)),
        Err(EngineError::Compile(CompileError::EmptyWorkflow("empty".to_string())))
    );
    assert_eq!(engine.status(), RunStatus::Idle);
}

#[test]
fn test_step_limit_stops_cycles() {
    let workflow = WorkflowBuilder::new("Loop")
        .text("a", "ping")
        .text("b", "pong")
        .connect("a", "b")
        .connect("b", "a")
        .build();

    let config = EngineConfig {
        step_limit: 5,
        ..EngineConfig::instant()
    };
    let mut engine = Engine::public().with_config(config);
    engine.start(Arc::new(workflow)).unwrap();
    assert_eq!(engine.run_until_blocked(), RunStatus::Terminated);

    let texts = contents(&engine);
    assert_eq!(texts.len(), 6);
    assert_eq!(texts.last().map(String::as_str), Some("Step limit reached, conversation stopped"));
}

#[test]
fn test_media_message_carries_reference() {
    let workflow = WorkflowBuilder::new("Media")
        .media("clip", "https://example.com/a.mp4", MediaType::Video)
        .build();

    let mut engine = public();
    engine.start(Arc::new(workflow)).unwrap();
    engine.run_until_blocked();

    let message = &engine.messages()[0];
    assert_eq!(message.role, MessageRole::Bot);
    assert_eq!(message.content, "Media video");
    let media = message.media.as_ref().unwrap();
    assert_eq!(media.url, "https://example.com/a.mp4");
    assert_eq!(media.kind, MediaType::Video);
}

#[test]
fn test_pacing_schedule() {
    let workflow = WorkflowBuilder::new("Paced")
        .start("start")
        .delay("wait", 3000)
        .text("hi", "Hi")
        .connect("start", "wait")
        .connect("wait", "hi")
        .build();

    let mut engine = Engine::preview();
    assert_eq!(engine.next_delay(), None);

    engine.start(Arc::new(workflow)).unwrap();
    assert_eq!(engine.next_delay(), Some(Duration::from_millis(1000)));

    engine.tick();
    assert_eq!(engine.next_delay(), Some(Duration::from_millis(500)));

    engine.tick();
    assert_eq!(engine.next_delay(), Some(Duration::from_millis(3500)));
    assert_eq!(engine.pending_task().map(|t| t.node_id.as_str()), Some("hi"));
}

#[tokio::test]
async fn test_drive_streams_events_to_observer() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut engine = Engine::preview()
        .with_config(EngineConfig::instant())
        .with_observer(Arc::new(ChannelObserver::new(tx)));

    let run_id = engine.start(Arc::new(survey())).unwrap();
    assert_eq!(engine.drive(&InstantPacer).await, RunStatus::AwaitingInput);
    engine.submit_response("r_yes").unwrap();
    assert_eq!(engine.drive(&InstantPacer).await, RunStatus::Terminated);

    let mut received = Vec::new();
    while let Ok((id, message)) = rx.try_recv() {
        assert_eq!(id, run_id);
        received.push(message);
    }
    assert_eq!(received, engine.messages());
}

#[derive(Debug)]
struct FailingHandler;

impl NodeHandler for FailingHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::Other("explode".to_string())
    }

    fn execute(&self, node: &WorkflowNode, _ctx: &Context, syscall: &mut dyn Syscall) -> anyhow::Result<()> {
        syscall.emit(ChatMessage::bot("half done").with_node(&node.id));
        syscall.set_var("leaked", json!(true));
        Err(anyhow!("handler blew up"))
    }
}

#[test]
fn test_failing_handler_interrupts_without_partial_effects() {
    let workflow = WorkflowBuilder::new("Boom")
        .text("before", "before")
        .node(NodeKind::Other("explode".to_string()), "boom", "")
        .connect("before", "boom")
        .build();

    let mut engine = public();
    engine.register_node(Arc::new(FailingHandler));
    engine.start(Arc::new(workflow)).unwrap();

    assert_eq!(engine.run_until_blocked(), RunStatus::Terminated);
    assert_eq!(contents(&engine), vec!["before", "Conversation interrupted"]);
    assert!(!engine.variables().contains_key("leaked"));
    assert_eq!(engine.mode(), RunMode::Public);
}

#[test]
fn test_condition_node_does_not_write_variables() {
    let workflow = WorkflowBuilder::new("Read only")
        .variable("set", "score", "7")
        .condition("check", "High score?")
            .rule("c1", "score", Operator::Greater, "5", None)
            .rule("c2", "missing", Operator::Exists, "", None)
            .build()
        .connect("set", "check")
        .build();

    let mut engine = public();
    engine.start(Arc::new(workflow)).unwrap();
    engine.tick();
    let before = engine.variables();
    assert_eq!(engine.current_node(), Some("set"));

    engine.tick();
    assert_eq!(engine.current_node(), Some("check"));
    assert_eq!(engine.variables(), before);
}

#[test]
fn test_sessions_on_one_document_stay_separate() {
    let workflow = Arc::new(survey());
    let mut author = preview();
    let mut visitor = public();

    author.start(workflow.clone()).unwrap();
    visitor.start(workflow.clone()).unwrap();
    author.run_until_blocked();
    visitor.run_until_blocked();
    let visitor_trace = contents(&visitor);

    author.submit_response("r_yes").unwrap();
    author.run_until_blocked();

    assert_eq!(author.variables().get(LAST_RESPONSE), Some(&json!("yes")));
    assert!(visitor.variables().is_empty());
    assert_eq!(contents(&visitor), visitor_trace);
    assert!(visitor.is_awaiting_input());
    assert_ne!(author.run_id(), visitor.run_id());
    assert_eq!(author.status(), RunStatus::Terminated);
}

#[test]
fn test_bundled_templates_run() {
    let templates = default_workflows().expect("Bundled templates must decode");
    let lead = templates
        .into_iter()
        .find(|w| w.name == "Lead qualification")
        .unwrap();

    let mut engine = public();
    engine.start(Arc::new(lead)).unwrap();
    assert_eq!(engine.run_until_blocked(), RunStatus::AwaitingInput);
    engine.submit_response("r_large").unwrap();

    // Larger teams jump to the demo buttons
    assert_eq!(engine.run_until_blocked(), RunStatus::AwaitingInput);
    assert_eq!(engine.current_node(), Some("demo"));
    assert_eq!(engine.variables().get(LAST_RESPONSE), Some(&json!("50")));
}
