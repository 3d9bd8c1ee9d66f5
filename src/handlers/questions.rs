// src/handlers/questions.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    models::{
        class_level::ClassLevel,
        question::{CreateQuestionRequest, QuestionListParams, UpdateQuestionRequest},
    },
    quiz,
    services::{accounts, question_bank},
    state::AppState,
    utils::jwt::Claims,
};

/// Lists questions.
///
/// Students get their own class only, without correct answers; asking for
/// another class is forbidden. Admins get full questions, optionally filtered
/// by class and search term.
pub async fn list_questions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<QuestionListParams>,
) -> Result<Response, AppError> {
    let class = params.class.map(ClassLevel::new).transpose()?;

    if claims.is_admin() {
        let questions =
            question_bank::list(state.store.as_ref(), class, params.search.as_deref()).await?;
        return Ok(Json(questions).into_response());
    }

    let id = claims.student_id()?;
    let account = accounts::lookup(state.store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound("Account not found".to_string()))?;

    if class.is_some_and(|requested| requested != account.class_level) {
        return Err(AppError::Forbidden(
            "Students can only see questions for their own class".to_string(),
        ));
    }

    let questions = quiz::questions_for_class(state.store.as_ref(), account.class_level).await?;
    Ok(Json(questions).into_response())
}

/// Admin only.
pub async fn create_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let question = question_bank::create(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Partial update. Admin only.
pub async fn update_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let question = question_bank::update(state.store.as_ref(), id, payload).await?;
    Ok(Json(question))
}

/// Admin only.
pub async fn delete_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    question_bank::delete(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Per-class inventory, every class present. Admin only.
pub async fn question_counts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let counts = question_bank::counts_by_class(state.store.as_ref()).await?;
    Ok(Json(counts))
}
