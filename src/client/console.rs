// src/client/console.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    client::api::PortalClient,
    error::AppError,
    models::{
        account::{Account, StudentStats},
        class_level::ClassLevel,
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
    },
    services::{console, question_bank},
    store::Store,
};

/// What the admin console needs: question CRUD plus read access to students.
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    async fn questions(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Question>, AppError>;
    async fn add_question(&self, req: CreateQuestionRequest) -> Result<Question, AppError>;
    async fn edit_question(&self, id: i64, patch: UpdateQuestionRequest) -> Result<Question, AppError>;
    async fn delete_question(&self, id: i64) -> Result<(), AppError>;
    async fn question_counts(&self) -> Result<BTreeMap<u8, u64>, AppError>;
    async fn students(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Account>, AppError>;
    async fn student(&self, id: i64) -> Result<Account, AppError>;
    async fn stats(&self) -> Result<StudentStats, AppError>;
}

/// In-process: straight onto the store.
#[async_trait]
impl<S: Store + ?Sized> ConsoleBackend for S {
    async fn questions(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Question>, AppError> {
        question_bank::list(self, class, search).await
    }

    async fn add_question(&self, req: CreateQuestionRequest) -> Result<Question, AppError> {
        question_bank::create(self, req).await
    }

    async fn edit_question(&self, id: i64, patch: UpdateQuestionRequest) -> Result<Question, AppError> {
        question_bank::update(self, id, patch).await
    }

    async fn delete_question(&self, id: i64) -> Result<(), AppError> {
        question_bank::delete(self, id).await
    }

    async fn question_counts(&self) -> Result<BTreeMap<u8, u64>, AppError> {
        question_bank::counts_by_class(self).await
    }

    async fn students(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Account>, AppError> {
        console::list_students(self, class, search).await
    }

    async fn student(&self, id: i64) -> Result<Account, AppError> {
        console::get_student(self, id).await
    }

    async fn stats(&self) -> Result<StudentStats, AppError> {
        console::stats(self).await
    }
}

/// Remote mode: needs an admin token on the client.
#[async_trait]
impl ConsoleBackend for PortalClient {
    async fn questions(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Question>, AppError> {
        PortalClient::questions(self, class, search).await
    }

    async fn add_question(&self, req: CreateQuestionRequest) -> Result<Question, AppError> {
        self.create_question(&req).await
    }

    async fn edit_question(&self, id: i64, patch: UpdateQuestionRequest) -> Result<Question, AppError> {
        self.update_question(id, &patch).await
    }

    async fn delete_question(&self, id: i64) -> Result<(), AppError> {
        PortalClient::delete_question(self, id).await
    }

    async fn question_counts(&self) -> Result<BTreeMap<u8, u64>, AppError> {
        PortalClient::question_counts(self).await
    }

    async fn students(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Account>, AppError> {
        PortalClient::students(self, class, search).await
    }

    async fn student(&self, id: i64) -> Result<Account, AppError> {
        PortalClient::student(self, id).await
    }

    async fn stats(&self) -> Result<StudentStats, AppError> {
        PortalClient::stats(self).await
    }
}

/// Admin screens over either backend.
pub struct AdminConsole<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: ConsoleBackend + ?Sized> AdminConsole<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn questions(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Question>, AppError> {
        self.backend.questions(class, search).await
    }

    pub async fn add(&self, req: CreateQuestionRequest) -> Result<Question, AppError> {
        self.backend.add_question(req).await
    }

    pub async fn edit(&self, id: i64, patch: UpdateQuestionRequest) -> Result<Question, AppError> {
        self.backend.edit_question(id, patch).await
    }

    /// Deletes after `confirm` approves the question about to go.
    /// Returns whether it was deleted.
    pub async fn remove<F>(&self, id: i64, confirm: F) -> Result<bool, AppError>
    where
        F: FnOnce(&Question) -> bool + Send,
    {
        let question = self
            .backend
            .questions(None, None)
            .await?
            .into_iter()
            .find(|q| q.id == id)
            .ok_or(AppError::NotFound("Question not found".to_string()))?;

        if !confirm(&question) {
            tracing::debug!(id, "Question removal cancelled");
            return Ok(false);
        }

        self.backend.delete_question(id).await?;
        Ok(true)
    }

    pub async fn counts(&self) -> Result<BTreeMap<u8, u64>, AppError> {
        self.backend.question_counts().await
    }

    pub async fn students(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Account>, AppError> {
        self.backend.students(class, search).await
    }

    pub async fn student(&self, id: i64) -> Result<Account, AppError> {
        self.backend.student(id).await
    }

    pub async fn stats(&self) -> Result<StudentStats, AppError> {
        self.backend.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{OptionId, QuizOption};
    use crate::store::MemoryStore;

    fn question(class_level: i64) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question: "Pick y".to_string(),
            options: OptionId::ALL
                .iter()
                .zip(["x", "y", "z"])
                .map(|(id, text)| QuizOption { id: *id, text: text.to_string() })
                .collect(),
            correct_option_id: OptionId::B,
            class_level,
        }
    }

    #[tokio::test]
    async fn remove_asks_first() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let admin = AdminConsole::new(store);
        let q = admin.add(question(3)).await.unwrap();

        let kept = admin
            .remove(q.id, |shown| {
                assert_eq!(shown.question, "Pick y");
                false
            })
            .await
            .unwrap();
        assert!(!kept);
        assert_eq!(admin.counts().await.unwrap()[&3], 1);

        assert!(admin.remove(q.id, |_| true).await.unwrap());
        assert_eq!(admin.counts().await.unwrap()[&3], 0);
        assert!(matches!(
            admin.remove(q.id, |_| true).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn edit_goes_through_validation() {
        let admin = AdminConsole::new(Arc::new(MemoryStore::new()));
        let q = admin.add(question(3)).await.unwrap();
        let err = admin
            .edit(
                q.id,
                UpdateQuestionRequest { question: Some("   ".to_string()), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(admin.questions(None, Some("pick")).await.unwrap().len(), 1);
    }
}
