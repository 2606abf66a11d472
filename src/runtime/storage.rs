use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::compiler::loader::{DocumentFormat, export_workflow, import_workflow_as};
use crate::dsl::Workflow;
use crate::dsl::templates::default_workflows;
use crate::error::{CodecError, StoreError};

// --- Interfaces ---

/// Holds the documents of the authoring surface and resolves published ids.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn create_workflow(&self, name: &str, description: &str) -> Result<Workflow, StoreError>;
    async fn get(&self, id: &str) -> Result<Option<Workflow>, StoreError>;
    /// Inserts or replaces the document with the same id.
    async fn put(&self, workflow: Workflow) -> Result<(), StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
    /// All documents, oldest first.
    async fn list(&self) -> Result<Vec<Workflow>, StoreError>;

    /// Mints a new public id for the document. Only the latest one resolves.
    async fn publish(&self, id: &str) -> Result<String, StoreError>;
    /// `Ok(None)` is the ordinary "not found" outcome for public viewers.
    async fn find_by_published_id(&self, published_id: &str) -> Result<Option<Workflow>, StoreError>;

    /// Adds a decoded copy of `text` as a new document. The store is left
    /// untouched when the text is malformed.
    async fn import(&self, text: &str) -> Result<Workflow, StoreError> {
        self.import_as(text, DocumentFormat::Json).await
    }
    async fn import_as(&self, text: &str, format: DocumentFormat) -> Result<Workflow, StoreError>;
    async fn export(&self, id: &str) -> Result<String, StoreError>;

    /// Loads the bundled templates into a store that has no documents yet.
    /// Returns how many were added; a populated store is left alone.
    async fn seed_defaults(&self) -> Result<usize, StoreError> {
        if !self.list().await?.is_empty() {
            return Ok(0);
        }
        let templates = default_workflows()?;
        let count = templates.len();
        for workflow in templates {
            self.put(workflow).await?;
        }
        info!(count, "Seeded default workflows");
        Ok(count)
    }
}

// --- In-Memory Implementation ---

#[derive(Default)]
pub struct InMemoryWorkflowStore {
    workflows: DashMap<String, Workflow>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self {
            workflows: DashMap::new(),
        }
    }

    pub fn from_workflows(workflows: impl IntoIterator<Item = Workflow>) -> Self {
        let store = Self::new();
        for workflow in workflows {
            store.workflows.insert(workflow.id.clone(), workflow);
        }
        store
    }

    fn snapshot(&self) -> Vec<Workflow> {
        let mut all: Vec<Workflow> = self.workflows.iter().map(|item| item.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn create_workflow(&self, name: &str, description: &str) -> Result<Workflow, StoreError> {
        let workflow = Workflow::new(name, description);
        self.workflows.insert(workflow.id.clone(), workflow.clone());
        debug!(workflow_id = %workflow.id, "Workflow created");
        Ok(workflow)
    }

    async fn get(&self, id: &str) -> Result<Option<Workflow>, StoreError> {
        Ok(self.workflows.get(id).map(|w| w.value().clone()))
    }

    async fn put(&self, workflow: Workflow) -> Result<(), StoreError> {
        self.workflows.insert(workflow.id.clone(), workflow);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.workflows.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<Workflow>, StoreError> {
        Ok(self.snapshot())
    }

    async fn publish(&self, id: &str) -> Result<String, StoreError> {
        let mut entry = self
            .workflows
            .get_mut(id)
            .ok_or_else(|| StoreError::WorkflowNotFound(id.to_string()))?;
        let published_id = Uuid::new_v4().to_string();
        if let Some(previous) = entry.published_id.replace(published_id.clone()) {
            debug!(workflow_id = %id, previous = %previous, "Superseding published id");
        }
        entry.updated_at = Utc::now();
        info!(workflow_id = %id, published_id = %published_id, "Workflow published");
        Ok(published_id)
    }

    async fn find_by_published_id(&self, published_id: &str) -> Result<Option<Workflow>, StoreError> {
        Ok(self
            .workflows
            .iter()
            .find(|item| item.value().published_id.as_deref() == Some(published_id))
            .map(|item| item.value().clone()))
    }

    async fn import_as(&self, text: &str, format: DocumentFormat) -> Result<Workflow, StoreError> {
        let workflow = import_workflow_as(text, format)?;
        self.workflows.insert(workflow.id.clone(), workflow.clone());
        info!(workflow_id = %workflow.id, name = %workflow.name, "Workflow imported");
        Ok(workflow)
    }

    async fn export(&self, id: &str) -> Result<String, StoreError> {
        let workflow = self
            .workflows
            .get(id)
            .ok_or_else(|| StoreError::WorkflowNotFound(id.to_string()))?;
        Ok(export_workflow(workflow.value())?)
    }
}

// --- JSON File Implementation ---

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    workflows: Vec<Workflow>,
}

/// In-memory store persisted to a single JSON file.
///
/// The file is read by [`open`](JsonFileStore::open) and written only by
/// [`flush`](JsonFileStore::flush); nothing is saved implicitly.
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryWorkflowStore,
}

impl JsonFileStore {
    /// Loads the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let inner = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let snapshot: StoreSnapshot = serde_json::from_str(&content)
                    .map_err(|e| CodecError::MalformedDocument(e.to_string()))?;
                info!(path = %path.display(), count = snapshot.workflows.len(), "Workflow store loaded");
                InMemoryWorkflowStore::from_workflows(snapshot.workflows)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => InMemoryWorkflowStore::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn flush(&self) -> Result<(), StoreError> {
        let snapshot = StoreSnapshot {
            workflows: self.inner.snapshot(),
        };
        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        tokio::fs::write(&self.path, content).await.map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), count = snapshot.workflows.len(), "Workflow store saved");
        Ok(())
    }
}

#[async_trait]
impl WorkflowStore for JsonFileStore {
    async fn create_workflow(&self, name: &str, description: &str) -> Result<Workflow, StoreError> {
        self.inner.create_workflow(name, description).await
    }

    async fn get(&self, id: &str) -> Result<Option<Workflow>, StoreError> {
        self.inner.get(id).await
    }

    async fn put(&self, workflow: Workflow) -> Result<(), StoreError> {
        self.inner.put(workflow).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<Workflow>, StoreError> {
        self.inner.list().await
    }

    async fn publish(&self, id: &str) -> Result<String, StoreError> {
        self.inner.publish(id).await
    }

    async fn find_by_published_id(&self, published_id: &str) -> Result<Option<Workflow>, StoreError> {
        self.inner.find_by_published_id(published_id).await
    }

    async fn import_as(&self, text: &str, format: DocumentFormat) -> Result<Workflow, StoreError> {
        self.inner.import_as(text, format).await
    }

    async fn export(&self, id: &str) -> Result<String, StoreError> {
        self.inner.export(id).await
    }
}
