use crate::llm::{CompletionOutcome, CompletionRequest};
use crate::questions::StoredQuestion;
use crate::{DocumentMeta, GenerationError, IndexedChunk, KnowledgeDocument, StoreError};
use async_trait::async_trait;

/// Persistence for ingested documents. Constructed explicitly and `init`ed
/// before use; retrieval code receives chunks from it and never reaches into
/// storage itself.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn init(&self) -> Result<(), StoreError>;

    async fn save(&self, document: &KnowledgeDocument) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>, StoreError>;

    async fn list_meta(&self) -> Result<Vec<DocumentMeta>, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn set_selected(&self, id: &str, selected: bool) -> Result<(), StoreError> {
        let mut document = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        document.is_selected = selected;
        self.save(&document).await
    }

    /// Chunks of every selected document, flattened in listing order.
    async fn selected_chunks(&self) -> Result<Vec<IndexedChunk>, StoreError> {
        let mut chunks = Vec::new();
        for meta in self.list_meta().await? {
            if !meta.is_selected {
                continue;
            }
            if let Some(document) = self.get(&meta.id).await? {
                chunks.extend(document.indexed_chunks);
            }
        }
        Ok(chunks)
    }
}

/// Question bank. Newly added questions are listed first.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn init(&self) -> Result<(), StoreError>;

    async fn add(&self, questions: &[StoredQuestion]) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<StoredQuestion>, StoreError>;

    async fn set_favorited(&self, id: &str, favorited: bool) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionOutcome, GenerationError>;
}
