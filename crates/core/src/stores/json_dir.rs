use crate::traits::DocumentStore;
use crate::{DocumentMeta, IndexedChunk, KnowledgeDocument, StoreError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tracing::debug;

/// One `<id>.json` file per document under a root directory.
pub struct JsonDirectoryStore {
    root: PathBuf,
    initialized: AtomicBool,
}

impl JsonDirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_ready(&self) -> Result<(), StoreError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::NotInitialized(self.root.display().to_string()))
        }
    }

    fn document_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.json")))
    }

    async fn load_all(&self) -> Result<Vec<KnowledgeDocument>, StoreError> {
        let mut documents = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "json");
            if !is_json {
                continue;
            }

            let bytes = fs::read(&path).await?;
            documents.push(serde_json::from_slice::<KnowledgeDocument>(&bytes)?);
        }

        documents.sort_by(|left, right| {
            left.ingested_at
                .cmp(&right.ingested_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for JsonDirectoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).await?;
        self.initialized.store(true, Ordering::Release);
        debug!(root = %self.root.display(), "document store ready");
        Ok(())
    }

    async fn save(&self, document: &KnowledgeDocument) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let path = self.document_path(&document.id)?;
        let staging = path.with_extension("json.tmp");

        // Written aside and renamed so a half-written document is never listed.
        fs::write(&staging, serde_json::to_vec_pretty(document)?).await?;
        fs::rename(&staging, &path).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>, StoreError> {
        self.ensure_ready()?;
        let path = self.document_path(id)?;

        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn list_meta(&self) -> Result<Vec<DocumentMeta>, StoreError> {
        self.ensure_ready()?;
        Ok(self
            .load_all()
            .await?
            .iter()
            .map(KnowledgeDocument::meta)
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let path = self.document_path(id)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn selected_chunks(&self) -> Result<Vec<IndexedChunk>, StoreError> {
        self.ensure_ready()?;
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|document| document.is_selected)
            .flat_map(|document| document.indexed_chunks)
            .collect())
    }
}
