// src/handlers/quiz.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError,
    models::quiz_record::SubmitQuizRequest,
    quiz::{self, stored_report},
    services::accounts,
    state::AppState,
    utils::jwt::Claims,
};

/// Grades the submitted answers for the student's class and records the
/// attempt. A second submission is refused with 409.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = claims.student_id()?;
    let report = quiz::grade_and_record(state.store.as_ref(), id, &payload.answers).await?;

    tracing::info!(id, score = report.score, total = report.total, "Quiz submitted");
    Ok(Json(report))
}

/// The stored result of the student's attempt.
pub async fn get_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let id = claims.student_id()?;
    let account = accounts::lookup(state.store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound("Account not found".to_string()))?;

    let report = stored_report(&account)
        .ok_or(AppError::NotFound("No quiz result yet".to_string()))?;
    Ok(Json(report))
}
