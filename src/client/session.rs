// src/client/session.rs

//! Who is signed in, across restarts.
//!
//! The student token and the current-user pointer are persisted. The admin
//! token lives only as long as this manager (one tab, one process).

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    client::api::PortalClient,
    error::AppError,
    models::account::{Account, LoginResponse},
    store::AccountStore,
};

/// Resolves a current-user pointer to an account.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// `None` when the account no longer exists.
    async fn find_account(&self, id: i64) -> Result<Option<Account>, AppError>;
}

#[async_trait]
impl<S: AccountStore + ?Sized> AccountLookup for S {
    async fn find_account(&self, id: i64) -> Result<Option<Account>, AppError> {
        self.get_account(id).await
    }
}

/// The server only reveals the account behind the client's own token.
#[async_trait]
impl AccountLookup for PortalClient {
    async fn find_account(&self, id: i64) -> Result<Option<Account>, AppError> {
        match self.me().await {
            Ok(account) if account.id == id => Ok(Some(account)),
            Ok(_) | Err(AppError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// What survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user: Option<i64>,
}

pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<PersistedSession, AppError>;
    fn save(&self, session: &PersistedSession) -> Result<(), AppError>;
}

/// JSON file on disk. A missing file is an empty session.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<PersistedSession, AppError> {
        if !self.path.exists() {
            return Ok(PersistedSession::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&contents) {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Discarding unreadable session: {}", e);
                Ok(PersistedSession::default())
            }
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        // Write then rename so a crash never leaves half a file behind.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Process-local storage; forgets everything on drop.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    inner: Arc<Mutex<PersistedSession>>,
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<PersistedSession, AppError> {
        self.inner
            .lock()
            .map(|session| session.clone())
            .map_err(|_| AppError::InternalServerError("session storage poisoned".to_string()))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), AppError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| AppError::InternalServerError("session storage poisoned".to_string()))?;
        *guard = session.clone();
        Ok(())
    }
}

/// Student side of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum StudentState {
    Anonymous,
    /// Signed in, quiz not taken for the current class.
    QuizPending(Account),
    /// Signed in, quiz taken. Only a class change leaves this state.
    QuizCompleted(Account),
}

/// Both tracks. The admin track is independent of the student one.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub student: StudentState,
    pub admin: bool,
}

pub struct SessionManager<St> {
    storage: St,
    persisted: PersistedSession,
    admin_token: Option<String>,
}

impl<St: SessionStorage> SessionManager<St> {
    /// Restores the persisted part of the session.
    pub fn load(storage: St) -> Result<Self, AppError> {
        let persisted = storage.load()?;
        Ok(Self {
            storage,
            persisted,
            admin_token: None,
        })
    }

    /// Resolves the pointer. A dangling pointer reads as nobody.
    pub async fn get_current_user<L>(&self, lookup: &L) -> Result<Option<Account>, AppError>
    where
        L: AccountLookup + ?Sized,
    {
        match self.persisted.current_user {
            Some(id) => lookup.find_account(id).await,
            None => Ok(None),
        }
    }

    /// Writes or clears the pointer. Clearing also drops the student token.
    pub fn set_current_user(&mut self, account: Option<&Account>) -> Result<(), AppError> {
        let mut next = self.persisted.clone();
        match account {
            Some(account) => next.current_user = Some(account.id),
            None => next = PersistedSession::default(),
        }
        self.commit(next)
    }

    /// Stores a successful student login or registration.
    pub fn sign_in(&mut self, login: &LoginResponse) -> Result<(), AppError> {
        self.commit(PersistedSession {
            student_token: Some(login.token.clone()),
            current_user: Some(login.user.id),
        })
    }

    pub fn logout(&mut self) -> Result<(), AppError> {
        self.set_current_user(None)
    }

    /// Runs a class change against the backend and, once it succeeds, signs
    /// the student out. A failed change leaves the session as it was.
    pub async fn change_class<T, F>(&mut self, change: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let changed = change.await?;
        self.logout()?;
        Ok(changed)
    }

    pub fn student_token(&self) -> Option<&str> {
        self.persisted.student_token.as_deref()
    }

    pub fn is_admin_session_active(&self) -> bool {
        self.admin_token.is_some()
    }

    /// `None` ends the admin session.
    pub fn set_admin_session(&mut self, token: Option<String>) {
        self.admin_token = token;
    }

    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    /// Copies the session's tokens onto a client.
    pub fn authorize(&self, client: &mut PortalClient) {
        client.set_student_token(self.persisted.student_token.clone());
        client.set_admin_token(self.admin_token.clone());
    }

    pub async fn state<L>(&self, lookup: &L) -> Result<SessionState, AppError>
    where
        L: AccountLookup + ?Sized,
    {
        let student = match self.get_current_user(lookup).await? {
            None => StudentState::Anonymous,
            Some(account) if account.quiz_attempted => StudentState::QuizCompleted(account),
            Some(account) => StudentState::QuizPending(account),
        };
        Ok(SessionState {
            student,
            admin: self.is_admin_session_active(),
        })
    }

    fn commit(&mut self, next: PersistedSession) -> Result<(), AppError> {
        self.storage.save(&next)?;
        self.persisted = next;
        Ok(())
    }
}
