use crate::questions::StoredQuestion;
use crate::traits::QuestionStore;
use crate::StoreError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// The whole question bank as one JSON array file.
pub struct JsonQuestionStore {
    path: PathBuf,
    initialized: AtomicBool,
    write_lock: Mutex<()>,
}

impl JsonQuestionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            initialized: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_ready(&self) -> Result<(), StoreError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::NotInitialized(self.path.display().to_string()))
        }
    }

    async fn read_bank(&self) -> Result<Vec<StoredQuestion>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error.into()),
        }
    }

    async fn write_bank(&self, questions: &[StoredQuestion]) -> Result<(), StoreError> {
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec_pretty(questions)?).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for JsonQuestionStore {
    async fn init(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        // A corrupt bank file fails here.
        let existing = self.read_bank().await?;
        self.initialized.store(true, Ordering::Release);
        debug!(path = %self.path.display(), questions = existing.len(), "question bank ready");
        Ok(())
    }

    async fn add(&self, questions: &[StoredQuestion]) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let _guard = self.write_lock.lock().await;

        let mut bank = questions.to_vec();
        bank.extend(self.read_bank().await?);
        self.write_bank(&bank).await
    }

    async fn list(&self) -> Result<Vec<StoredQuestion>, StoreError> {
        self.ensure_ready()?;
        self.read_bank().await
    }

    async fn set_favorited(&self, id: &str, favorited: bool) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let _guard = self.write_lock.lock().await;

        let mut bank = self.read_bank().await?;
        let question = bank
            .iter_mut()
            .find(|question| question.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        question.favorited = favorited;
        self.write_bank(&bank).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let _guard = self.write_lock.lock().await;

        let mut bank = self.read_bank().await?;
        let before = bank.len();
        bank.retain(|question| question.id != id);
        if bank.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.write_bank(&bank).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{GeneratedQuestion, QuestionRequest, QuestionType};
    use crate::questions::stamp_questions;
    use tempfile::tempdir;

    fn batch(stems: &[&str]) -> Vec<StoredQuestion> {
        let request = QuestionRequest {
            count: stems.len() as u32,
            question_type: QuestionType::Subjective,
            discipline: "Filosofia".to_string(),
            school_year: "1º ano do Ensino Médio".to_string(),
            difficulty: "Fácil".to_string(),
            bloom_level: "Compreender".to_string(),
            construction_type: "Situação-problema".to_string(),
            topics: "ética".to_string(),
            temperature: 0.7,
        };
        let generated = stems
            .iter()
            .map(|stem| GeneratedQuestion {
                stem: stem.to_string(),
                question_type: QuestionType::Subjective,
                options: None,
                answer_index: None,
                expected_answer: Some("Resposta.".to_string()),
            })
            .collect();
        stamp_questions(generated, &request)
    }

    #[tokio::test]
    async fn operations_require_init() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = JsonQuestionStore::new(dir.path().join("questions").join("bank.json"));

        assert!(matches!(store.list().await, Err(StoreError::NotInitialized(_))));
        assert!(matches!(
            store.add(&batch(&["Explique Kant."])).await,
            Err(StoreError::NotInitialized(_))
        ));

        store.init().await?;
        assert!(store.list().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn newest_batch_is_listed_first_and_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("bank.json");
        let store = JsonQuestionStore::new(&path);
        store.init().await?;

        let first = batch(&["Explique Kant.", "Explique Hume."]);
        let second = batch(&["Explique Platão."]);
        store.add(&first).await?;
        store.add(&second).await?;

        let stems: Vec<String> = store.list().await?.into_iter().map(|q| q.stem).collect();
        assert_eq!(stems, vec!["Explique Platão.", "Explique Kant.", "Explique Hume."]);

        let reopened = JsonQuestionStore::new(&path);
        reopened.init().await?;
        let listed = reopened.list().await?;
        assert_eq!(listed[0], second[0]);
        assert_eq!(listed.len(), 3);
        assert!(!dir.path().join("bank.json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn favorite_and_delete() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = JsonQuestionStore::new(dir.path().join("bank.json"));
        store.init().await?;

        let questions = batch(&["Explique Kant.", "Explique Hume."]);
        store.add(&questions).await?;

        store.set_favorited(&questions[1].id, true).await?;
        let favorites: Vec<_> = store
            .list()
            .await?
            .into_iter()
            .filter(|question| question.favorited)
            .collect();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, questions[1].id);

        store.delete(&questions[0].id).await?;
        assert_eq!(store.list().await?.len(), 1);
        assert!(matches!(
            store.delete(&questions[0].id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.set_favorited("desconhecida", true).await,
            Err(StoreError::NotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_bank_fails_init() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("bank.json");
        std::fs::write(&path, b"{not json")?;

        let store = JsonQuestionStore::new(&path);
        assert!(matches!(store.init().await, Err(StoreError::Serialization(_))));
        Ok(())
    }
}
