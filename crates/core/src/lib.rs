pub mod chunking;
pub mod context;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod questions;
pub mod stores;
pub mod tokenizer;
pub mod traits;

pub use chunking::{chunk_text, normalize_whitespace, ChunkingConfig, DEFAULT_CHUNK_MAX_CHARS};
pub use context::{assemble_context, rank_chunks, select_context};
pub use error::{GenerationError, IngestError, StoreError};
pub use extractor::{extract_text, SourceFormat, TextExtractor};
pub use index::{compute_term_frequencies, TermFrequencyMap};
pub use ingest::{
    discover_documents, index_text, ingest_file, ingest_folder_best_effort, ingest_text,
    IngestionReport, SkippedFile,
};
pub use llm::{CompletionOutcome, CompletionRequest, GeminiConfig, GeminiProvider};
pub use models::{
    ContextSelection, DocumentMeta, IndexedChunk, KnowledgeDocument, RetrievalOptions,
    ScoredChunk, SelectionStrategy,
};
pub use prompt::{
    build_question_prompt, generate_questions, knowledge_area, parse_generated_questions,
    GeneratedQuestion, QuestionRequest, QuestionType,
};
pub use questions::{split_topics, stamp_questions, StoredQuestion};
pub use stores::{JsonDirectoryStore, JsonQuestionStore, MemoryStore};
pub use tokenizer::tokenize;
pub use traits::{CompletionProvider, DocumentStore, QuestionStore};
