use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while encoding or decoding a workflow document.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed workflow document: {0}")]
    MalformedDocument(String),

    #[error("Failed to encode workflow document: {0}")]
    Encode(String),

    #[error("Failed to read workflow document from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that prevent a document from being prepared for execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Workflow '{0}' has no nodes")]
    EmptyWorkflow(String),

    #[error("Duplicate node ID: {0}")]
    DuplicateNodeId(String),
}

/// Misuse of the engine boundary by the driving front end.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("No conversation is running")]
    NoActiveRun,

    #[error("The conversation is not waiting for a response")]
    NotAwaitingInput,

    #[error("Node '{node_id}' has no response or button '{response_id}'")]
    UnknownResponse { node_id: String, response_id: String },

    #[error("Buttons of node '{0}' are display-only in this conversation")]
    ButtonsDisplayOnly(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Failed to access workflow store at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// The rejected text was not a workflow document, as opposed to a storage failure.
    pub fn is_malformed_document(&self) -> bool {
        matches!(self, StoreError::Codec(CodecError::MalformedDocument(_)))
    }
}
