use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use enem_genius_core::tokenizer::tokenize;
use enem_genius_core::{
    assemble_context, generate_questions, ingest_file, ingest_folder_best_effort,
    normalize_whitespace, rank_chunks, DocumentStore, GeminiConfig, GeminiProvider,
    stamp_questions, JsonDirectoryStore, JsonQuestionStore, KnowledgeDocument, QuestionRequest,
    QuestionStore, QuestionType, RetrievalOptions, SelectionStrategy,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "enem-genius", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding ingested documents
    #[arg(long, env = "ENEM_GENIUS_STORE", default_value = ".enem-genius")]
    store_dir: String,

    /// Question bank file (defaults to questions/bank.json under the store directory)
    #[arg(long, env = "ENEM_GENIUS_QUESTIONS")]
    question_bank: Option<PathBuf>,

    /// Maximum characters per chunk at ingestion time
    #[arg(long, default_value = "1800")]
    chunk_max_chars: usize,

    /// Maximum characters of document context handed to the model
    #[arg(long, default_value = "12000")]
    max_context_chars: usize,

    /// Leading chunks used when nothing matches the topic
    #[arg(long, default_value = "5")]
    fallback_chunks: usize,
}

impl Cli {
    fn retrieval_options(&self) -> RetrievalOptions {
        RetrievalOptions {
            chunk_max_chars: self.chunk_max_chars,
            max_context_chars: self.max_context_chars,
            fallback_chunk_count: self.fallback_chunks,
            ..RetrievalOptions::default()
        }
    }

    fn question_bank_path(&self) -> PathBuf {
        self.question_bank
            .clone()
            .unwrap_or_else(|| Path::new(&self.store_dir).join("questions").join("bank.json"))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum QuestionKind {
    Objective,
    Subjective,
}

impl From<QuestionKind> for QuestionType {
    fn from(value: QuestionKind) -> Self {
        match value {
            QuestionKind::Objective => QuestionType::Objective,
            QuestionKind::Subjective => QuestionType::Subjective,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, index and store a document or every supported document in a folder.
    Ingest {
        /// File (.txt, .md, .pdf) or folder searched recursively.
        #[arg(long)]
        path: String,
    },
    /// List stored documents and whether they are used for retrieval.
    List,
    /// Mark a document as used (or, with --off, unused) for retrieval.
    Select {
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = false)]
        off: bool,
    },
    /// Delete a stored document.
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Print the context that would be injected for a topic.
    Context {
        #[arg(long)]
        topic: String,
        /// Print chunk scores before the context.
        #[arg(long, default_value_t = false)]
        explain: bool,
    },
    /// Generate ENEM questions with context from the selected documents.
    Generate {
        #[arg(long)]
        discipline: String,
        #[arg(long, default_value = "")]
        topics: String,
        #[arg(long, default_value = "1")]
        count: u32,
        #[arg(long, value_enum, default_value = "objective")]
        question_type: QuestionKind,
        #[arg(long, default_value = "3º ano do Ensino Médio")]
        school_year: String,
        #[arg(long, default_value = "Médio")]
        difficulty: String,
        #[arg(long, default_value = "Analisar")]
        bloom_level: String,
        #[arg(long, default_value = "Interpretação de texto")]
        construction_type: String,
        #[arg(long, default_value = "0.7")]
        temperature: f32,
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: String,
        #[arg(long, env = "GEMINI_MODEL", default_value = enem_genius_core::llm::DEFAULT_GEMINI_MODEL)]
        model: String,
        #[arg(long, env = "GEMINI_ENDPOINT", default_value = enem_genius_core::llm::DEFAULT_GEMINI_ENDPOINT)]
        endpoint: String,
    },
    /// List the question bank, newest first.
    Questions {
        /// Only favorited questions.
        #[arg(long, default_value_t = false)]
        favorites: bool,
    },
    /// Mark a stored question as favorite (or, with --off, clear the mark).
    Favorite {
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = false)]
        off: bool,
    },
    /// Remove a question from the bank.
    DeleteQuestion {
        #[arg(long)]
        id: String,
    },
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = normalize_whitespace(text);
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    }
}

async fn ingest(store: &JsonDirectoryStore, path: &Path, options: &RetrievalOptions) -> anyhow::Result<()> {
    let documents: Vec<KnowledgeDocument> = if path.is_dir() {
        let report = ingest_folder_best_effort(path, options)?;
        for skipped in &report.skipped_files {
            warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped document");
        }
        report.documents
    } else {
        vec![ingest_file(path, options)?]
    };

    // Persisted before being reported, so a listed document is always fully indexed.
    for document in &documents {
        store.save(document).await?;
        println!(
            "{} {} chunks={}",
            document.id,
            document.name,
            document.indexed_chunks.len()
        );
    }

    println!(
        "{} document(s) ingested at {}",
        documents.len(),
        Utc::now().to_rfc3339()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let options = cli.retrieval_options();

    let store = JsonDirectoryStore::new(&cli.store_dir);
    store
        .init()
        .await
        .with_context(|| format!("opening document store at {}", cli.store_dir))?;

    let bank = JsonQuestionStore::new(cli.question_bank_path());
    bank
        .init()
        .await
        .with_context(|| format!("opening question bank at {}", bank.path().display()))?;

    info!(
        version = app_version,
        store = %store.root().display(),
        question_bank = %bank.path().display(),
        "enem-genius boot"
    );

    match cli.command {
        Command::Ingest { path } => {
            ingest(&store, Path::new(&path), &options).await?;
        }
        Command::List => {
            let documents = store.list_meta().await?;
            if documents.is_empty() {
                println!("no documents stored");
            }
            for meta in documents {
                let marker = if meta.is_selected { "[x]" } else { "[ ]" };
                println!("{marker} {} {}", meta.id, meta.name);
            }
        }
        Command::Select { id, off } => {
            store.set_selected(&id, !off).await?;
            println!("{id} selected={}", !off);
        }
        Command::Delete { id } => {
            store.delete(&id).await?;
            println!("{id} deleted");
        }
        Command::Context { topic, explain } => {
            let chunks = store.selected_chunks().await?;
            if chunks.is_empty() {
                bail!("no selected documents to retrieve context from");
            }

            if explain {
                let terms = tokenize(&topic);
                println!("query_terms: {}", terms.join(" "));
                for scored in rank_chunks(&terms, &chunks) {
                    println!(
                        "explain: chunk={} score={} text={}",
                        scored.position,
                        scored.score,
                        preview(scored.text, 80)
                    );
                }
            }

            let selection = assemble_context(&topic, &chunks, &options);
            println!(
                "strategy={:?} chunks={} chars={}",
                selection.strategy,
                selection.included_chunks,
                selection.text.chars().count()
            );
            println!("{}", selection.text);
        }
        Command::Generate {
            discipline,
            topics,
            count,
            question_type,
            school_year,
            difficulty,
            bloom_level,
            construction_type,
            temperature,
            api_key,
            model,
            endpoint,
        } => {
            let request = QuestionRequest {
                count,
                question_type: question_type.into(),
                discipline,
                school_year,
                difficulty,
                bloom_level,
                construction_type,
                topics,
                temperature,
            };

            let chunks = store.selected_chunks().await?;
            let selection = assemble_context(request.retrieval_query(), &chunks, &options);
            if selection.strategy == SelectionStrategy::Empty {
                info!("generating without document context");
            }

            let provider = GeminiProvider::new(GeminiConfig {
                endpoint,
                model,
                api_key,
            })?;
            let generated = generate_questions(&provider, &request, &selection.text).await?;
            let stored = stamp_questions(generated, &request);

            // Saved before being printed, so every printed id is in the bank.
            bank.add(&stored).await?;
            info!(saved = stored.len(), "questions added to bank");
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        Command::Questions { favorites } => {
            let listed: Vec<_> = bank
                .list()
                .await?
                .into_iter()
                .filter(|question| !favorites || question.favorited)
                .collect();
            if listed.is_empty() {
                println!("no questions stored");
            }
            for question in listed {
                let marker = if question.favorited { "*" } else { " " };
                println!(
                    "{marker} {} {} {} [{}] {}",
                    question.id,
                    question.creation_date.format("%Y-%m-%d %H:%M"),
                    question.discipline,
                    question.difficulty,
                    preview(&question.stem, 80)
                );
            }
        }
        Command::Favorite { id, off } => {
            bank.set_favorited(&id, !off).await?;
            println!("{id} favorited={}", !off);
        }
        Command::DeleteQuestion { id } => {
            bank.delete(&id).await?;
            println!("{id} deleted");
        }
    }

    Ok(())
}
