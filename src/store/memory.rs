// src/store/memory.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        account::{Account, NewAccount},
        class_level::ClassLevel,
        question::{NewQuestion, Question},
        quiz_record::WrongAnswer,
    },
    store::{AccountStore, QuestionStore, empty_counts},
};

#[derive(Default)]
struct Tables {
    questions: BTreeMap<i64, Question>,
    accounts: BTreeMap<i64, Account>,
    /// Lower-cased email -> account id.
    emails: HashMap<String, i64>,
    next_question_id: i64,
    next_account_id: i64,
}

/// In-process store. Nothing survives the process; writes are visible to the
/// next read immediately.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn list_questions(&self, class: Option<ClassLevel>) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .questions
            .values()
            .filter(|q| class.is_none_or(|c| q.class_level == c))
            .cloned()
            .collect())
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.tables.read().await.questions.get(&id).cloned())
    }

    async fn insert_question(&self, new: NewQuestion) -> Result<Question, AppError> {
        let mut tables = self.tables.write().await;
        tables.next_question_id += 1;
        let question = Question {
            id: tables.next_question_id,
            question: new.question,
            options: new.options,
            correct_option_id: new.correct_option_id,
            class_level: new.class_level,
            created_at: Utc::now(),
        };
        tables.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn update_question(&self, id: i64, new: NewQuestion) -> Result<Question, AppError> {
        let mut tables = self.tables.write().await;
        let question = tables
            .questions
            .get_mut(&id)
            .ok_or(AppError::NotFound("Question not found".to_string()))?;
        question.question = new.question;
        question.options = new.options;
        question.correct_option_id = new.correct_option_id;
        question.class_level = new.class_level;
        Ok(question.clone())
    }

    async fn delete_question(&self, id: i64) -> Result<(), AppError> {
        self.tables
            .write()
            .await
            .questions
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound("Question not found".to_string()))
    }

    async fn counts_by_class(&self) -> Result<BTreeMap<u8, u64>, AppError> {
        let tables = self.tables.read().await;
        let mut counts = empty_counts();
        for question in tables.questions.values() {
            *counts.entry(question.class_level.get()).or_default() += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, new: NewAccount) -> Result<Account, AppError> {
        let mut tables = self.tables.write().await;
        let key = new.email.to_lowercase();
        if tables.emails.contains_key(&key) {
            return Err(AppError::ValidationError("Email already registered".to_string()));
        }
        tables.next_account_id += 1;
        let account = Account {
            id: tables.next_account_id,
            name: new.name,
            email: key.clone(),
            password_hash: new.password_hash,
            class_level: new.class_level,
            quiz_attempted: false,
            quiz_score: None,
            wrong_answers: None,
            created_at: Utc::now(),
        };
        tables.emails.insert(key, account.id);
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(&email.trim().to_lowercase())
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>, AppError> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.tables.read().await.accounts.values().cloned().collect())
    }

    async fn set_class(&self, id: i64, class: ClassLevel) -> Result<Account, AppError> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(&id)
            .ok_or(AppError::NotFound("Account not found".to_string()))?;
        account.class_level = class;
        account.quiz_attempted = false;
        account.quiz_score = None;
        account.wrong_answers = None;
        Ok(account.clone())
    }

    async fn record_attempt(
        &self,
        id: i64,
        score: u32,
        wrong_answers: &[WrongAnswer],
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(&id)
            .ok_or(AppError::NotFound("Account not found".to_string()))?;
        account.quiz_attempted = true;
        account.quiz_score = Some(score);
        account.wrong_answers = Some(wrong_answers.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{OptionId, QuizOption};

    fn new_question(class: i64) -> NewQuestion {
        NewQuestion {
            question: format!("Class {class} question"),
            options: OptionId::ALL
                .iter()
                .map(|id| QuizOption { id: *id, text: id.as_str().to_uppercase() })
                .collect(),
            correct_option_id: OptionId::A,
            class_level: ClassLevel::new(class).unwrap(),
        }
    }

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            name: "Alice".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            class_level: ClassLevel::new(5).unwrap(),
        }
    }

    #[tokio::test]
    async fn list_is_class_scoped_and_ordered() {
        let store = MemoryStore::new();
        for class in [3, 5, 3, 7] {
            store.insert_question(new_question(class)).await.unwrap();
        }
        let three = store.list_questions(Some(ClassLevel::new(3).unwrap())).await.unwrap();
        assert_eq!(three.iter().map(|q| q.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(store.list_questions(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn counts_include_empty_classes() {
        let store = MemoryStore::new();
        store.insert_question(new_question(3)).await.unwrap();
        let counts = store.counts_by_class().await.unwrap();
        assert_eq!(counts.len(), 10);
        assert_eq!(counts[&3], 1);
        assert_eq!(counts[&10], 0);
    }

    #[tokio::test]
    async fn update_and_delete_missing_question_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_question(42, new_question(1)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(store.delete_question(42).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_email_any_case_is_rejected() {
        let store = MemoryStore::new();
        store.insert_account(new_account("alice@example.com")).await.unwrap();
        let err = store
            .insert_account(new_account("ALICE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(store.list_accounts().await.unwrap().len(), 1);
        assert!(store
            .find_account_by_email("Alice@Example.com")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn set_class_resets_attempt_fields() {
        let store = MemoryStore::new();
        let account = store.insert_account(new_account("bob@example.com")).await.unwrap();
        store.record_attempt(account.id, 3, &[]).await.unwrap();
        let attempted = store.get_account(account.id).await.unwrap().unwrap();
        assert!(attempted.quiz_attempted);
        assert_eq!(attempted.quiz_score, Some(3));

        let moved = store.set_class(account.id, ClassLevel::new(7).unwrap()).await.unwrap();
        assert!(!moved.quiz_attempted);
        assert_eq!(moved.quiz_score, None);
        assert_eq!(moved.wrong_answers, None);
        assert_eq!(moved.class_level.get(), 7);
        assert_eq!(moved.email, attempted.email);
        assert_eq!(moved.password_hash, attempted.password_hash);
    }
}
