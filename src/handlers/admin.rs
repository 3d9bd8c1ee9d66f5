// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{account::StudentListParams, class_level::ClassLevel},
    services::console,
    state::AppState,
};

/// Lists students, attempted first.
/// Admin only.
pub async fn list_students(
    State(state): State<AppState>,
    Query(params): Query<StudentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let class = params.class.map(ClassLevel::new).transpose()?;
    let students =
        console::list_students(state.store.as_ref(), class, params.search.as_deref()).await?;
    Ok(Json(students))
}

/// Admin only.
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student = console::get_student(state.store.as_ref(), id).await?;
    Ok(Json(student))
}

/// Admin only.
pub async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = console::stats(state.store.as_ref()).await?;
    Ok(Json(stats))
}
