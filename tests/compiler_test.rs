use std::sync::Arc;

use botflow::compiler::core::Compiler;
use botflow::dsl::WorkflowEdge;
use botflow::dsl::builder::WorkflowBuilder;
use botflow::error::CompileError;

#[test]
fn test_entry_is_first_start_node() {
    let workflow = WorkflowBuilder::new("Entry")
        .text("intro", "Hi")
        .start("start")
        .start("second_start")
        .connect("start", "intro")
        .build();

    let mut compiler = Compiler::new();
    let blueprint = compiler.compile(Arc::new(workflow)).expect("Compilation failed");

    assert_eq!(blueprint.entry().id, "start");
    assert_eq!(blueprint.entry_index, 1);
    assert!(blueprint.node("intro").is_some());
    assert!(blueprint.node("ghost").is_none());
}

#[test]
fn test_entry_falls_back_to_first_node() {
    let workflow = WorkflowBuilder::new("No start")
        .text("a", "A")
        .text("b", "B")
        .build();

    let blueprint = Compiler::new().compile(Arc::new(workflow)).unwrap();
    assert_eq!(blueprint.entry().id, "a");
}

#[test]
fn test_rejects_empty_and_duplicate_ids() {
    let empty = WorkflowBuilder::new("Empty").id("wf-empty").build();
    assert_eq!(
        Compiler::new().compile(Arc::new(empty)).unwrap_err(),
        CompileError::EmptyWorkflow("wf-empty".to_string())
    );

    let duplicated = WorkflowBuilder::new("Dup").text("a", "one").text("a", "two").build();
    assert_eq!(
        Compiler::new().compile(Arc::new(duplicated)).unwrap_err(),
        CompileError::DuplicateNodeId("a".to_string())
    );
}

#[test]
fn test_dangling_edges_compile() {
    let workflow = WorkflowBuilder::new("Dangling")
        .text("a", "A")
        .connect("a", "ghost")
        .connect("nowhere", "a")
        .build();

    let blueprint = Compiler::new().compile(Arc::new(workflow)).unwrap();
    assert_eq!(blueprint.route("a", None).map(|e| e.target.as_str()), Some("ghost"));
    assert_eq!(blueprint.outgoing("nowhere").count(), 1);
}

#[test]
fn test_route_preference() {
    let workflow = WorkflowBuilder::new("Routes")
        .question("q", "Pick")
            .response("r1", "One", "1")
            .response("r2", "Two", "2")
            .build()
        .text("one", "1")
        .text("two", "2")
        .text("default", "d")
        .connect_response("q", "one", "r1")
        .connect("q", "default")
        .connect_response("q", "two", "r2")
        .build();

    let blueprint = Compiler::new().compile(Arc::new(workflow)).unwrap();
    let target = |selector: Option<&str>| blueprint.route("q", selector).map(|e| e.target.clone());

    assert_eq!(target(Some("r2")), Some("two".to_string()));
    assert_eq!(target(Some("r1")), Some("one".to_string()));
    // Unmatched selector: first untagged edge
    assert_eq!(target(Some("r9")), Some("default".to_string()));
    assert_eq!(target(None), Some("default".to_string()));
    assert_eq!(blueprint.route("one", None), None);
}

#[test]
fn test_route_falls_back_to_first_tagged_edge() {
    let mut workflow = WorkflowBuilder::new("Tagged only")
        .text("a", "A")
        .text("b", "B")
        .text("c", "C")
        .build();
    let mut first = WorkflowEdge::new("e1", "a", "b");
    first.condition_id = Some("c1".to_string());
    let mut second = WorkflowEdge::new("e2", "a", "c");
    second.response_id = Some("r1".to_string());
    workflow.add_edge(first);
    workflow.add_edge(second);

    let blueprint = Compiler::new().compile(Arc::new(workflow)).unwrap();
    assert_eq!(blueprint.route("a", None).map(|e| e.id.as_str()), Some("e1"));
    assert_eq!(blueprint.route("a", Some("r1")).map(|e| e.id.as_str()), Some("e2"));
}
