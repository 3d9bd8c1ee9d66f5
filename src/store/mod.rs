// src/store/mod.rs

//! Storage port for the question bank and the account store.
//!
//! Two adapters implement it: [`SqliteStore`] (durable; a local file URL
//! gives the local-only mode) and [`MemoryStore`] (in-process, development
//! and tests only). The adapter is picked once from configuration.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{Config, StorageBackend},
    error::AppError,
    models::{
        account::{Account, NewAccount},
        class_level::ClassLevel,
        question::{NewQuestion, Question},
        quiz_record::WrongAnswer,
    },
};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persistent collection of class-scoped questions.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Questions ordered by id; only `class` when given.
    async fn list_questions(&self, class: Option<ClassLevel>) -> Result<Vec<Question>, AppError>;

    async fn get_question(&self, id: i64) -> Result<Option<Question>, AppError>;

    /// Assigns id and creation timestamp.
    async fn insert_question(&self, new: NewQuestion) -> Result<Question, AppError>;

    /// Replaces every editable field. `NotFound` if the id is gone.
    async fn update_question(&self, id: i64, question: NewQuestion) -> Result<Question, AppError>;

    /// `NotFound` if the id is gone.
    async fn delete_question(&self, id: i64) -> Result<(), AppError>;

    /// Question count per class; every class 1..=10 is present.
    async fn counts_by_class(&self) -> Result<BTreeMap<u8, u64>, AppError>;
}

/// Persistent collection of student accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `ValidationError` when the email is already taken (any case).
    async fn insert_account(&self, new: NewAccount) -> Result<Account, AppError>;

    /// Case-insensitive lookup.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn get_account(&self, id: i64) -> Result<Option<Account>, AppError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError>;

    /// Sets the class and clears the attempt flag, score and wrong answers.
    async fn set_class(&self, id: i64, class: ClassLevel) -> Result<Account, AppError>;

    /// Marks the account attempted with the given score and mistakes.
    /// Overwrites on a second call; callers guard against that.
    async fn record_attempt(
        &self,
        id: i64,
        score: u32,
        wrong_answers: &[WrongAnswer],
    ) -> Result<(), AppError>;
}

/// Both halves of the storage port behind one object.
pub trait Store: QuestionStore + AccountStore {}

impl<T: QuestionStore + AccountStore> Store for T {}

/// Zero-filled per-class counts.
pub(crate) fn empty_counts() -> BTreeMap<u8, u64> {
    ClassLevel::all().map(|class| (class.get(), 0)).collect()
}

/// Opens the adapter named by the configuration.
pub async fn connect(config: &Config) -> Result<Arc<dyn Store>, AppError> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; accounts and attempts are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Sqlite => {
            let store = SqliteStore::connect(&config.database_url).await?;
            Ok(Arc::new(store))
        }
    }
}
