// src/services/console.rs

use std::cmp::Ordering;

use crate::{
    error::AppError,
    models::{
        account::{Account, StudentStats},
        class_level::ClassLevel,
    },
    store::AccountStore,
};

/// Students for the admin console.
///
/// Filters by class and by a case-insensitive substring of name OR email.
/// Attempted students come first, then ascending class, then name.
pub async fn list_students<S: AccountStore + ?Sized>(
    store: &S,
    class: Option<ClassLevel>,
    search: Option<&str>,
) -> Result<Vec<Account>, AppError> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut students: Vec<Account> = store
        .list_accounts()
        .await?
        .into_iter()
        .filter(|a| class.is_none_or(|c| a.class_level == c))
        .filter(|a| {
            needle.as_deref().is_none_or(|needle| {
                a.name.to_lowercase().contains(needle) || a.email.to_lowercase().contains(needle)
            })
        })
        .collect();

    students.sort_by(console_order);
    Ok(students)
}

fn console_order(a: &Account, b: &Account) -> Ordering {
    b.quiz_attempted
        .cmp(&a.quiz_attempted)
        .then_with(|| a.class_level.cmp(&b.class_level))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}

pub async fn get_student<S: AccountStore + ?Sized>(
    store: &S,
    id: i64,
) -> Result<Account, AppError> {
    store
        .get_account(id)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))
}

pub async fn stats<S: AccountStore + ?Sized>(store: &S) -> Result<StudentStats, AppError> {
    let accounts = store.list_accounts().await?;
    let total_students = accounts.len() as u64;
    let attempted_quiz = accounts.iter().filter(|a| a.quiz_attempted).count() as u64;
    Ok(StudentStats {
        total_students,
        attempted_quiz,
        not_attempted: total_students - attempted_quiz,
    })
}
