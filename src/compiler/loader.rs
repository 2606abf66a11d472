//! Import/export of workflow documents.
//!
//! JSON is the interchange format. YAML is accepted as an alternative encoding
//! of the same structure for hand-written documents.

use std::fs;
use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::dsl::Workflow;
use crate::error::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guesses the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Complete, lossless JSON encoding of a document.
pub fn export_workflow(workflow: &Workflow) -> Result<String, CodecError> {
    export_workflow_as(workflow, DocumentFormat::Json)
}

pub fn export_workflow_as(workflow: &Workflow, format: DocumentFormat) -> Result<String, CodecError> {
    match format {
        DocumentFormat::Json => serde_json::to_string_pretty(workflow).map_err(|e| CodecError::Encode(e.to_string())),
        DocumentFormat::Yaml => serde_yaml::to_string(workflow).map_err(|e| CodecError::Encode(e.to_string())),
    }
}

/// Decodes a document as-is, identities untouched.
pub fn parse_workflow(text: &str, format: DocumentFormat) -> Result<Workflow, CodecError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| CodecError::MalformedDocument(e.to_string())),
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| CodecError::MalformedDocument(e.to_string())),
    }
}

/// Decodes a document as a new one: fresh id, fresh timestamps, not published.
///
/// Node, edge, response and condition ids are kept so routing survives the trip.
pub fn import_workflow(text: &str) -> Result<Workflow, CodecError> {
    import_workflow_as(text, DocumentFormat::Json)
}

pub fn import_workflow_as(text: &str, format: DocumentFormat) -> Result<Workflow, CodecError> {
    let mut workflow = parse_workflow(text, format)?;
    let now = Utc::now();
    workflow.id = Uuid::new_v4().to_string();
    workflow.created_at = now;
    workflow.updated_at = now;
    workflow.published_id = None;
    Ok(workflow)
}

/// Reads a document from disk without refreshing its identity.
pub fn load_workflow_from_file(path: &Path) -> Result<Workflow, CodecError> {
    let content = fs::read_to_string(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_workflow(&content, DocumentFormat::from_path(path))
}
