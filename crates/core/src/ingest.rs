use crate::chunking::{chunk_text, ChunkingConfig};
use crate::error::IngestError;
use crate::extractor::{extract_text, SourceFormat};
use crate::index::compute_term_frequencies;
use crate::models::{IndexedChunk, KnowledgeDocument, RetrievalOptions};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;
use walkdir::WalkDir;

/// Chunks `text` and indexes every chunk. Order follows the source text.
pub fn index_text(text: &str, options: &RetrievalOptions) -> Vec<IndexedChunk> {
    chunk_text(text, ChunkingConfig::from(options))
        .into_iter()
        .map(|chunk| IndexedChunk {
            tf_index: compute_term_frequencies(&chunk),
            text: chunk,
        })
        .collect()
}

pub fn digest_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn ingest_text(
    name: &str,
    text: &str,
    options: &RetrievalOptions,
) -> Result<KnowledgeDocument, IngestError> {
    let indexed_chunks = index_text(text, options);
    if indexed_chunks.is_empty() {
        return Err(IngestError::EmptyDocument(name.to_string()));
    }

    let document = KnowledgeDocument {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        is_selected: true,
        checksum: digest_text(text),
        ingested_at: Utc::now(),
        indexed_chunks,
    };

    debug!(
        id = %document.id,
        name = %document.name,
        chunks = document.indexed_chunks.len(),
        "indexed document"
    );
    Ok(document)
}

pub fn ingest_file(path: &Path, options: &RetrievalOptions) -> Result<KnowledgeDocument, IngestError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;

    let text = extract_text(path)?;
    ingest_text(name, &text, options)
}

pub fn discover_documents(folder: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| SourceFormat::from_path(entry.path()).is_some())
        .map(|entry| entry.path().to_path_buf())
        .collect();

    files.sort_unstable();
    files
}

pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct IngestionReport {
    pub documents: Vec<KnowledgeDocument>,
    pub skipped_files: Vec<SkippedFile>,
}

pub fn ingest_folder_best_effort(
    folder: &Path,
    options: &RetrievalOptions,
) -> Result<IngestionReport, IngestError> {
    let files = discover_documents(folder);

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no supported documents found in {}",
            folder.display()
        )));
    }

    let mut documents = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        match ingest_file(&path, options) {
            Ok(document) => documents.push(document),
            Err(error) => skipped_files.push(SkippedFile {
                path,
                reason: error.to_string(),
            }),
        }
    }

    info!(
        folder = %folder.display(),
        documents = documents.len(),
        skipped = skipped_files.len(),
        "ingested folder"
    );

    Ok(IngestionReport {
        documents,
        skipped_files,
    })
}
