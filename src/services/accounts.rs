// src/services/accounts.rs

use validator::Validate;

use crate::{
    error::AppError,
    models::{
        account::{Account, ChangeClassRequest, NewAccount, RegisterRequest},
        class_level::ClassLevel,
        quiz_record::WrongAnswer,
    },
    store::AccountStore,
    utils::{
        hash::{AdminCredential, hash_password, verify_against_decoy, verify_password},
        validation::first_violation,
    },
};

/// Registers a new student.
///
/// Checks run in form order and stop at the first violation: name, email
/// shape, password length, class range, then email uniqueness.
pub async fn register<S: AccountStore + ?Sized>(
    store: &S,
    req: RegisterRequest,
) -> Result<Account, AppError> {
    let req = req.normalized();

    if let Err(validation_errors) = req.validate() {
        return Err(first_violation(&validation_errors, &RegisterRequest::CHECK_ORDER));
    }

    if let Some(role) = req.role.as_deref() {
        if !role.eq_ignore_ascii_case("student") {
            return Err(AppError::ValidationError(
                "Only student accounts can be registered".to_string(),
            ));
        }
    }

    let class_level = ClassLevel::new(req.class_level)?;

    if store.find_account_by_email(&req.email).await?.is_some() {
        return Err(AppError::ValidationError("Email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let account = store
        .insert_account(NewAccount {
            name: req.name,
            email: req.email,
            password_hash,
            class_level,
        })
        .await?;

    tracing::info!(id = account.id, class = %account.class_level, "Student registered");
    Ok(account)
}

/// Case-insensitive email, exact password. Any mismatch is the same AuthError.
pub async fn login<S: AccountStore + ?Sized>(
    store: &S,
    email: &str,
    password: &str,
) -> Result<Account, AppError> {
    let Some(account) = store.find_account_by_email(email).await? else {
        verify_against_decoy(password);
        return Err(AppError::invalid_credentials());
    };

    if !verify_password(password, &account.password_hash)? {
        return Err(AppError::invalid_credentials());
    }

    Ok(account)
}

/// Re-authenticates, then moves the student to `new_class` and clears the
/// attempt so the quiz can be taken again.
pub async fn change_class<S: AccountStore + ?Sized>(
    store: &S,
    req: ChangeClassRequest,
) -> Result<Account, AppError> {
    let account = login(store, &req.email, &req.password).await?;
    let class_level = ClassLevel::new(req.new_class)?;

    let updated = store.set_class(account.id, class_level).await?;
    tracing::info!(id = updated.id, class = %updated.class_level, "Student changed class");
    Ok(updated)
}

/// Persists a graded attempt. The quiz engine guarantees one call per attempt.
pub async fn record_attempt<S: AccountStore + ?Sized>(
    store: &S,
    account_id: i64,
    score: u32,
    wrong_answers: &[WrongAnswer],
) -> Result<(), AppError> {
    store.record_attempt(account_id, score, wrong_answers).await?;
    tracing::info!(id = account_id, score, "Quiz attempt recorded");
    Ok(())
}

/// Resolves an account pointer; `None` when the account no longer exists.
pub async fn lookup<S: AccountStore + ?Sized>(
    store: &S,
    account_id: i64,
) -> Result<Option<Account>, AppError> {
    store.get_account(account_id).await
}

/// Checks the configured admin credential. No credential configured means
/// nobody can sign in as admin.
pub fn admin_login(
    admin: Option<&AdminCredential>,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    let Some(admin) = admin else {
        verify_against_decoy(password);
        return Err(AppError::invalid_credentials());
    };

    if !admin.verify(email, password)? {
        return Err(AppError::invalid_credentials());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn alice() -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret1".to_string(),
            class_level: 5,
            role: Some("student".to_string()),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let store = MemoryStore::new();
        let account = register(&store, alice()).await.unwrap();
        assert!(!account.quiz_attempted);
        assert_eq!(account.quiz_score, None);
        assert_ne!(account.password_hash, "secret1");

        let logged_in = login(&store, "ALICE@example.com", "secret1").await.unwrap();
        assert_eq!(logged_in.id, account.id);
        assert_eq!(logged_in.class_level.get(), 5);
    }

    #[tokio::test]
    async fn password_whitespace_is_kept_exactly() {
        let store = MemoryStore::new();
        let mut req = alice();
        req.password = " secret1 ".to_string();
        let account = register(&store, req).await.unwrap();

        let logged_in = login(&store, "alice@example.com", " secret1 ").await.unwrap();
        assert_eq!(logged_in.id, account.id);
        assert!(matches!(
            login(&store, "alice@example.com", "secret1").await,
            Err(AppError::AuthError(_))
        ));

        let moved = change_class(
            &store,
            ChangeClassRequest {
                email: "alice@example.com".to_string(),
                password: " secret1 ".to_string(),
                new_class: 6,
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.class_level.get(), 6);
    }

    #[tokio::test]
    async fn duplicate_email_is_validation_error() {
        let store = MemoryStore::new();
        register(&store, alice()).await.unwrap();
        let mut again = alice();
        again.email = "Alice@Example.COM".to_string();
        let err = register(&store, again).await.unwrap_err();
        assert_eq!(err, AppError::ValidationError("Email already registered".to_string()));
        assert_eq!(store.list_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn admin_role_cannot_self_register() {
        let store = MemoryStore::new();
        let mut req = alice();
        req.role = Some("admin".to_string());
        assert!(matches!(register(&store, req).await, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn login_failures_are_uniform() {
        let store = MemoryStore::new();
        register(&store, alice()).await.unwrap();
        let wrong_password = login(&store, "alice@example.com", "nope123").await.unwrap_err();
        let unknown_email = login(&store, "bob@example.com", "secret1").await.unwrap_err();
        assert_eq!(wrong_password, unknown_email);
    }

    #[tokio::test]
    async fn change_class_requires_password_and_resets_attempt() {
        let store = MemoryStore::new();
        let account = register(&store, alice()).await.unwrap();
        record_attempt(&store, account.id, 1, &[]).await.unwrap();

        let denied = change_class(
            &store,
            ChangeClassRequest {
                email: "alice@example.com".to_string(),
                password: "wrong!!".to_string(),
                new_class: 7,
            },
        )
        .await;
        assert!(matches!(denied, Err(AppError::AuthError(_))));

        let out_of_range = change_class(
            &store,
            ChangeClassRequest {
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
                new_class: 11,
            },
        )
        .await;
        assert!(matches!(out_of_range, Err(AppError::ValidationError(_))));

        let moved = change_class(
            &store,
            ChangeClassRequest {
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
                new_class: 7,
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.class_level.get(), 7);
        assert!(!moved.quiz_attempted);
        assert_eq!(moved.quiz_score, None);
        assert_eq!(moved.wrong_answers, None);
        assert_eq!(moved.name, account.name);
        assert_eq!(moved.email, account.email);
        assert_eq!(moved.password_hash, account.password_hash);
    }

    #[test]
    fn admin_login_without_credential_is_refused() {
        assert!(matches!(
            admin_login(None, "admin@school.org", "whatever"),
            Err(AppError::AuthError(_))
        ));
        let admin = AdminCredential::new("admin@school.org", "hunter22").unwrap();
        assert!(admin_login(Some(&admin), "admin@school.org", "hunter22").is_ok());
    }
}
