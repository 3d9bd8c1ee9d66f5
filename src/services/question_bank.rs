// src/services/question_bank.rs

use std::collections::BTreeMap;

use validator::Validate;

use crate::{
    error::AppError,
    models::{
        class_level::ClassLevel,
        question::{CreateQuestionRequest, NewQuestion, Question, QuizOption, UpdateQuestionRequest},
    },
    store::QuestionStore,
    utils::{html::clean_text, validation::first_violation},
};

const QUESTION_CHECK_ORDER: [&str; 3] = ["question", "options", "class"];

/// Questions for one class (or all), optionally narrowed by a case-insensitive
/// search over the question text.
pub async fn list<S: QuestionStore + ?Sized>(
    store: &S,
    class: Option<ClassLevel>,
    search: Option<&str>,
) -> Result<Vec<Question>, AppError> {
    let questions = store.list_questions(class).await?;
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    Ok(match needle {
        Some(needle) => questions
            .into_iter()
            .filter(|q| q.question.to_lowercase().contains(&needle))
            .collect(),
        None => questions,
    })
}

pub async fn create<S: QuestionStore + ?Sized>(
    store: &S,
    req: CreateQuestionRequest,
) -> Result<Question, AppError> {
    let new = prepare(req)?;
    let question = store.insert_question(new).await?;
    tracing::info!(id = question.id, class = %question.class_level, "Question created");
    Ok(question)
}

/// Merges the patch onto the stored question and re-validates the whole.
pub async fn update<S: QuestionStore + ?Sized>(
    store: &S,
    id: i64,
    patch: UpdateQuestionRequest,
) -> Result<Question, AppError> {
    let existing = store
        .get_question(id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    if patch.is_empty() {
        return Ok(existing);
    }

    let new = prepare(patch.merged_onto(&existing))?;
    let question = store.update_question(id, new).await?;
    tracing::info!(id, "Question updated");
    Ok(question)
}

pub async fn delete<S: QuestionStore + ?Sized>(store: &S, id: i64) -> Result<(), AppError> {
    store.delete_question(id).await?;
    tracing::info!(id, "Question deleted");
    Ok(())
}

pub async fn counts_by_class<S: QuestionStore + ?Sized>(
    store: &S,
) -> Result<BTreeMap<u8, u64>, AppError> {
    store.counts_by_class().await
}

/// Validates, strips markup, and validates again: text that was nothing but
/// markup must not slip through as empty.
fn prepare(req: CreateQuestionRequest) -> Result<NewQuestion, AppError> {
    req.validate()
        .map_err(|errors| first_violation(&errors, &QUESTION_CHECK_ORDER))?;

    let mut options: Vec<QuizOption> = req
        .options
        .into_iter()
        .map(|opt| QuizOption { id: opt.id, text: clean_text(&opt.text) })
        .collect();
    options.sort_by_key(|opt| opt.id);

    let cleaned = CreateQuestionRequest {
        question: clean_text(&req.question),
        options,
        correct_option_id: req.correct_option_id,
        class_level: req.class_level,
    };
    cleaned
        .validate()
        .map_err(|errors| first_violation(&errors, &QUESTION_CHECK_ORDER))?;

    Ok(NewQuestion {
        question: cleaned.question,
        options: cleaned.options,
        correct_option_id: cleaned.correct_option_id,
        class_level: ClassLevel::new(cleaned.class_level)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::OptionId;
    use crate::store::MemoryStore;

    fn request(class_level: i64, texts: [&str; 3], correct: OptionId) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question: "Pick one".to_string(),
            options: OptionId::ALL
                .iter()
                .zip(texts)
                .map(|(id, text)| QuizOption { id: *id, text: text.to_string() })
                .collect(),
            correct_option_id: correct,
            class_level,
        }
    }

    #[tokio::test]
    async fn create_then_delete_moves_count_by_one() {
        let store = MemoryStore::new();
        let before = counts_by_class(&store).await.unwrap()[&3];

        let q = create(&store, request(3, ["x", "y", "z"], OptionId::B)).await.unwrap();
        assert_eq!(counts_by_class(&store).await.unwrap()[&3], before + 1);
        assert_eq!(q.option_text(q.correct_option_id), Some("y"));

        delete(&store, q.id).await.unwrap();
        assert_eq!(counts_by_class(&store).await.unwrap()[&3], before);
    }

    #[tokio::test]
    async fn markup_only_option_is_rejected() {
        let store = MemoryStore::new();
        let err = create(&store, request(3, ["x", "<b></b>", "z"], OptionId::A))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(store.list_questions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comparison_text_is_stored_whole() {
        let store = MemoryStore::new();
        let mut req = request(6, ["a<b", "a>b", "a = b"], OptionId::A);
        req.question = "If a<b and b<c, how do a and c compare?".to_string();
        let q = create(&store, req).await.unwrap();
        assert_eq!(q.question, "If a<b and b<c, how do a and c compare?");
        assert_eq!(q.option_text(OptionId::A), Some("a<b"));
        assert_eq!(q.option_text(OptionId::B), Some("a>b"));
    }

    #[tokio::test]
    async fn violations_follow_field_order() {
        let store = MemoryStore::new();

        let mut req = request(11, ["x", "y", "z"], OptionId::C);
        req.options.pop();
        let err = create(&store, req).await.unwrap_err();
        assert_eq!(
            err,
            AppError::ValidationError("Exactly 3 options (a, b, c) are required".to_string())
        );

        let err = create(&store, request(11, ["x", "y", "z"], OptionId::C)).await.unwrap_err();
        assert_eq!(
            err,
            AppError::ValidationError("Class must be between 1 and 10".to_string())
        );
    }

    #[tokio::test]
    async fn update_merges_patch_and_revalidates() {
        let store = MemoryStore::new();
        let q = create(&store, request(2, ["x", "y", "z"], OptionId::A)).await.unwrap();

        let moved = update(
            &store,
            q.id,
            UpdateQuestionRequest { class_level: Some(4), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(moved.class_level.get(), 4);
        assert_eq!(moved.options, q.options);

        let err = update(
            &store,
            q.id,
            UpdateQuestionRequest { class_level: Some(0), ..Default::default() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let missing = update(&store, 999, UpdateQuestionRequest::default()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let store = MemoryStore::new();
        let mut req = request(1, ["x", "y", "z"], OptionId::A);
        req.question = "Capital of France?".to_string();
        create(&store, req).await.unwrap();
        create(&store, request(1, ["x", "y", "z"], OptionId::A)).await.unwrap();

        let hits = list(&store, None, Some("FRANCE")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(list(&store, None, Some("  ")).await.unwrap().len(), 2);
    }
}
