//! Template documents bundled with the crate, offered to a store on first use.

use crate::compiler::loader::{DocumentFormat, import_workflow_as};
use crate::dsl::Workflow;
use crate::error::CodecError;

const BUNDLED: &[&str] = &[
    include_str!("../../demos/support-bot.yaml"),
    include_str!("../../demos/lead-qualification.yaml"),
];

/// Decodes every bundled template as a new document with its own id.
pub fn default_workflows() -> Result<Vec<Workflow>, CodecError> {
    BUNDLED
        .iter()
        .map(|text| import_workflow_as(text, DocumentFormat::Yaml))
        .collect()
}
