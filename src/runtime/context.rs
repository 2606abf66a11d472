use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::runtime::engine::RunMode;

/// Reserved variable that receives the value of the last selected response.
pub const LAST_RESPONSE: &str = "last_response";

/// Runtime context of one run: its identity and its variable environment.
///
/// Owned exclusively by the run; a new run always gets a fresh one.
#[derive(Debug, Clone)]
pub struct Context {
    pub run_id: Uuid,
    pub workflow_id: String,
    pub mode: RunMode,
    variables: HashMap<String, Value>,
}

impl Context {
    pub fn new(run_id: Uuid, workflow_id: String, mode: RunMode) -> Self {
        Self {
            run_id,
            workflow_id,
            mode,
            variables: HashMap::new(),
        }
    }

    pub fn get_var(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    pub fn set_var(&mut self, key: &str, value: Value) {
        self.variables.insert(key.to_string(), value);
    }

    pub fn get_all_vars(&self) -> HashMap<String, Value> {
        self.variables.clone()
    }
}
