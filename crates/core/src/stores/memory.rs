use crate::traits::DocumentStore;
use crate::{DocumentMeta, KnowledgeDocument, StoreError};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Insertion-ordered, process-local store.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<KnowledgeDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save(&self, document: &KnowledgeDocument) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|stored| stored.id == document.id) {
            Some(stored) => *stored = document.clone(),
            None => documents.push(document.clone()),
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|stored| stored.id == id).cloned())
    }

    async fn list_meta(&self) -> Result<Vec<DocumentMeta>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().map(KnowledgeDocument::meta).collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|stored| stored.id != id);
        if documents.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
