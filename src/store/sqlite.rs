// src/store/sqlite.rs

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    FromRow, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    types::Json,
};

use crate::{
    error::AppError,
    models::{
        account::{Account, NewAccount},
        class_level::ClassLevel,
        question::{NewQuestion, OptionId, Question, QuizOption},
        quiz_record::WrongAnswer,
    },
    store::{AccountStore, QuestionStore, empty_counts},
};

const QUESTION_COLUMNS: &str = "id, question, options, correct_option_id, class_level, created_at";

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, class_level, quiz_attempted, \
     quiz_score, wrong_answers, created_at";

/// Row of the 'questions' table.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    question: String,
    options: Json<Vec<QuizOption>>,
    correct_option_id: String,
    class_level: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let correct_option_id = OptionId::parse(&row.correct_option_id).ok_or_else(|| {
            AppError::InternalServerError(format!("question {} has a corrupt answer key", row.id))
        })?;
        Ok(Question {
            id: row.id,
            question: row.question,
            options: row.options.0,
            correct_option_id,
            class_level: stored_class(row.class_level)?,
            created_at: row.created_at,
        })
    }
}

/// Row of the 'accounts' table.
#[derive(FromRow)]
struct AccountRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    class_level: i64,
    quiz_attempted: bool,
    quiz_score: Option<i64>,
    wrong_answers: Option<Json<Vec<WrongAnswer>>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let quiz_score = row
            .quiz_score
            .map(u32::try_from)
            .transpose()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        Ok(Account {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            class_level: stored_class(row.class_level)?,
            quiz_attempted: row.quiz_attempted,
            quiz_score,
            wrong_answers: row.wrong_answers.map(|json| json.0),
            created_at: row.created_at,
        })
    }
}

fn stored_class(level: i64) -> Result<ClassLevel, AppError> {
    ClassLevel::try_from(level).map_err(AppError::InternalServerError)
}

/// SQLite-backed store. Schema lives in `migrations/` and is applied on connect.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database and applies migrations.
    ///
    /// An in-memory URL keeps a single, never-recycled connection so the
    /// database lives as long as the pool.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        tracing::info!("Database connected, running migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        tracing::info!("Migrations applied successfully.");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_account(&self, id: i64) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::try_from)
            .transpose()
    }
}

#[async_trait]
impl QuestionStore for SqliteStore {
    async fn list_questions(&self, class: Option<ClassLevel>) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE (?1 IS NULL OR class_level = ?1) ORDER BY id ASC"
        );
        let rows = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(class.map(i64::from))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list questions: {:?}", e);
                AppError::from(e)
            })?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1");
        sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Question::try_from)
            .transpose()
    }

    async fn insert_question(&self, new: NewQuestion) -> Result<Question, AppError> {
        let sql = format!(
            "INSERT INTO questions (question, options, correct_option_id, class_level, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {QUESTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(&new.question)
            .bind(Json(&new.options))
            .bind(new.correct_option_id.as_str())
            .bind(i64::from(new.class_level))
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create question: {:?}", e);
                AppError::from(e)
            })?;

        Question::try_from(row)
    }

    async fn update_question(&self, id: i64, new: NewQuestion) -> Result<Question, AppError> {
        let sql = format!(
            "UPDATE questions SET question = ?1, options = ?2, correct_option_id = ?3, \
             class_level = ?4 WHERE id = ?5 RETURNING {QUESTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(&new.question)
            .bind(Json(&new.options))
            .bind(new.correct_option_id.as_str())
            .bind(i64::from(new.class_level))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update question: {:?}", e);
                AppError::from(e)
            })?
            .ok_or(AppError::NotFound("Question not found".to_string()))?;

        Question::try_from(row)
    }

    async fn delete_question(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete question: {:?}", e);
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        Ok(())
    }

    async fn counts_by_class(&self) -> Result<BTreeMap<u8, u64>, AppError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT class_level, COUNT(*) FROM questions GROUP BY class_level",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = empty_counts();
        for (class, count) in rows {
            let class = stored_class(class)?;
            counts.insert(class.get(), count.max(0) as u64);
        }
        Ok(counts)
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn insert_account(&self, new: NewAccount) -> Result<Account, AppError> {
        let sql = format!(
            "INSERT INTO accounts (name, email, password_hash, class_level, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(&new.name)
            .bind(new.email.to_lowercase())
            .bind(&new.password_hash)
            .bind(i64::from(new.class_level))
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::ValidationError("Email already registered".to_string())
                }
                e => {
                    tracing::error!("Failed to register account: {:?}", e);
                    AppError::from(e)
                }
            })?;

        Account::try_from(row)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1");
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Login DB error: {:?}", e);
                AppError::from(e)
            })?
            .map(Account::try_from)
            .transpose()
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>, AppError> {
        self.fetch_account(id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id ASC");
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list accounts: {:?}", e);
                AppError::from(e)
            })?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn set_class(&self, id: i64, class: ClassLevel) -> Result<Account, AppError> {
        let sql = format!(
            "UPDATE accounts SET class_level = ?1, quiz_attempted = 0, quiz_score = NULL, \
             wrong_answers = NULL WHERE id = ?2 RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(i64::from(class))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Account not found".to_string()))?;

        Account::try_from(row)
    }

    async fn record_attempt(
        &self,
        id: i64,
        score: u32,
        wrong_answers: &[WrongAnswer],
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE accounts SET quiz_attempted = 1, quiz_score = ?1, wrong_answers = ?2 \
             WHERE id = ?3",
        )
        .bind(i64::from(score))
        .bind(Json(wrong_answers))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record attempt: {:?}", e);
            AppError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    fn new_question(class: i64, correct: OptionId) -> NewQuestion {
        NewQuestion {
            question: "Which one?".to_string(),
            options: vec![
                QuizOption { id: OptionId::A, text: "x".to_string() },
                QuizOption { id: OptionId::B, text: "y".to_string() },
                QuizOption { id: OptionId::C, text: "z".to_string() },
            ],
            correct_option_id: correct,
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
    async fn question_crud_round_trip() {
        let store = store().await;
        let created = store.insert_question(new_question(3, OptionId::B)).await.unwrap();
        assert_eq!(created.correct_option_id, OptionId::B);
        assert_eq!(created.option_text(OptionId::B), Some("y"));

        let updated = store
            .update_question(created.id, new_question(4, OptionId::C))
            .await
            .unwrap();
        assert_eq!(updated.class_level.get(), 4);
        assert_eq!(updated.created_at, created.created_at);

        let counts = store.counts_by_class().await.unwrap();
        assert_eq!(counts[&3], 0);
        assert_eq!(counts[&4], 1);

        store.delete_question(created.id).await.unwrap();
        assert!(store.get_question(created.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete_question(created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_filters_by_class() {
        let store = store().await;
        store.insert_question(new_question(2, OptionId::A)).await.unwrap();
        store.insert_question(new_question(5, OptionId::A)).await.unwrap();
        store.insert_question(new_question(2, OptionId::C)).await.unwrap();

        let two = store.list_questions(Some(ClassLevel::new(2).unwrap())).await.unwrap();
        assert_eq!(two.len(), 2);
        assert!(two.iter().all(|q| q.class_level.get() == 2));
        assert!(two[0].id < two[1].id);
        assert_eq!(store.list_questions(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let store = store().await;
        store.insert_account(new_account("Alice@Example.com")).await.unwrap();
        let err = store.insert_account(new_account("alice@example.COM")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let found = store.find_account_by_email("ALICE@example.com").await.unwrap();
        assert_eq!(found.map(|a| a.email), Some("alice@example.com".to_string()));
    }

    #[tokio::test]
    async fn attempt_fields_persist_and_reset() {
        let store = store().await;
        let account = store.insert_account(new_account("carol@example.com")).await.unwrap();
        let wrong = vec![WrongAnswer {
            question_id: 9,
            question_text: "Q".to_string(),
            selected_option: "x".to_string(),
            correct_option: "y".to_string(),
        }];
        store.record_attempt(account.id, 4, &wrong).await.unwrap();

        let attempted = store.get_account(account.id).await.unwrap().unwrap();
        assert!(attempted.quiz_attempted);
        assert_eq!(attempted.quiz_score, Some(4));
        assert_eq!(attempted.wrong_answers, Some(wrong));

        let moved = store.set_class(account.id, ClassLevel::new(8).unwrap()).await.unwrap();
        assert!(!moved.quiz_attempted);
        assert_eq!(moved.quiz_score, None);
        assert_eq!(moved.wrong_answers, None);
        assert_eq!(moved.name, attempted.name);

        assert!(matches!(
            store.record_attempt(999, 1, &[]).await,
            Err(AppError::NotFound(_))
        ));
    }
}
