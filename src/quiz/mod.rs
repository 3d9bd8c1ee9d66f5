// src/quiz/mod.rs

//! Quiz core: grading, the port the engine talks to, and the engine itself.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        account::Account,
        class_level::ClassLevel,
        question::{OptionId, PublicQuestion},
        quiz_record::{AnswerEntry, QuizReport, QuizResult},
    },
    services::accounts,
    store::Store,
};

pub mod engine;
pub mod grading;

pub use engine::{Phase, QuizEngine, Step};

/// Warning attached to a result that was graded but could not be persisted.
pub const UNSAVED_WARNING: &str = "Your result could not be saved. Please contact your teacher.";

/// What the quiz engine needs from a backend: the class-scoped questions and
/// a one-shot submission.
#[async_trait]
pub trait QuizPort: Send + Sync {
    async fn load_questions(&self, class: ClassLevel) -> Result<Vec<PublicQuestion>, AppError>;

    /// Grades and records one attempt for `account`.
    async fn submit(&self, account: &Account, answers: &[AnswerEntry]) -> Result<QuizReport, AppError>;
}

/// Report for an attempt already stored on the account, if any.
pub fn stored_report(account: &Account) -> Option<QuizReport> {
    if !account.quiz_attempted {
        return None;
    }
    let score = account.quiz_score?;
    let total = account.attempt_total()?;
    Some(QuizReport::saved(QuizResult {
        score,
        total,
        wrong_answers: account.wrong_answers.clone().unwrap_or_default(),
    }))
}

/// Class-scoped questions as a student sees them.
pub async fn questions_for_class<S: Store + ?Sized>(
    store: &S,
    class: ClassLevel,
) -> Result<Vec<PublicQuestion>, AppError> {
    Ok(store
        .list_questions(Some(class))
        .await?
        .iter()
        .map(|q| q.to_public())
        .collect())
}

/// Grades `answers` against the account's current class and records the
/// attempt once.
///
/// Refuses accounts that already attempted and classes without questions.
/// If recording fails after grading, the result is still returned, marked
/// unsaved.
pub async fn grade_and_record<S: Store + ?Sized>(
    store: &S,
    account_id: i64,
    answers: &[AnswerEntry],
) -> Result<QuizReport, AppError> {
    let account = accounts::lookup(store, account_id)
        .await?
        .ok_or(AppError::NotFound("Account not found".to_string()))?;

    if account.quiz_attempted {
        return Err(AppError::StateError(format!(
            "Quiz already attempted for class {}",
            account.class_level
        )));
    }

    let questions = store.list_questions(Some(account.class_level)).await?;
    if questions.is_empty() {
        return Err(AppError::StateError("No questions for your class".to_string()));
    }

    let selections: HashMap<i64, OptionId> = answers
        .iter()
        .filter_map(|entry| entry.selected_option_id.map(|opt| (entry.question_id, opt)))
        .collect();
    let result = grading::grade(&questions, &selections);

    match accounts::record_attempt(store, account.id, result.score, &result.wrong_answers).await {
        Ok(()) => Ok(QuizReport::saved(result)),
        Err(err) => {
            tracing::warn!(id = account.id, "Graded attempt not saved: {}", err);
            Ok(QuizReport::unsaved(result, UNSAVED_WARNING))
        }
    }
}

/// In-process backend: grades locally against the store.
#[derive(Clone)]
pub struct LocalQuiz {
    store: Arc<dyn Store>,
}

impl LocalQuiz {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QuizPort for LocalQuiz {
    async fn load_questions(&self, class: ClassLevel) -> Result<Vec<PublicQuestion>, AppError> {
        questions_for_class(self.store.as_ref(), class).await
    }

    async fn submit(&self, account: &Account, answers: &[AnswerEntry]) -> Result<QuizReport, AppError> {
        grade_and_record(self.store.as_ref(), account.id, answers).await
    }
}
