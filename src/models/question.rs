// src/models/question.rs

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::class_level::ClassLevel;

/// Identifier of one of the three answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionId {
    A,
    B,
    C,
}

impl OptionId {
    pub const ALL: [OptionId; 3] = [OptionId::A, OptionId::B, OptionId::C];

    pub fn as_str(self) -> &'static str {
        match self {
            OptionId::A => "a",
            OptionId::B => "b",
            OptionId::C => "c",
        }
    }

    /// Case-insensitive parse; `None` for anything but a, b or c.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a" => Some(OptionId::A),
            "b" => Some(OptionId::B),
            "c" => Some(OptionId::C),
            _ => None,
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer option: its identifier and display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: OptionId,
    pub text: String,
}

/// A multiple-choice question scoped to one class level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    /// The question text.
    pub question: String,

    /// Exactly three options, identified a, b and c.
    pub options: Vec<QuizOption>,

    pub correct_option_id: OptionId,

    #[serde(rename = "class")]
    pub class_level: ClassLevel,

    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Display text of the given option, if the question carries it.
    pub fn option_text(&self, id: OptionId) -> Option<&str> {
        self.options
            .iter()
            .find(|opt| opt.id == id)
            .map(|opt| opt.text.as_str())
    }

    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            question: self.question.clone(),
            options: self.options.clone(),
            class_level: self.class_level,
        }
    }
}

/// DTO for sending a question to a student (excludes the correct option).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<QuizOption>,
    #[serde(rename = "class")]
    pub class_level: ClassLevel,
}

/// Validated, sanitized question data ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub question: String,
    pub options: Vec<QuizOption>,
    pub correct_option_id: OptionId,
    pub class_level: ClassLevel,
}

/// DTO for creating a new question.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_correct_option))]
pub struct CreateQuestionRequest {
    #[validate(
        custom(function = not_blank),
        length(max = 1000, message = "Question text must be at most 1000 characters.")
    )]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<QuizOption>,
    pub correct_option_id: OptionId,
    #[serde(rename = "class")]
    #[validate(range(min = 1, max = 10, message = "Class must be between 1 and 10"))]
    pub class_level: i64,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuizOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<OptionId>,
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub class_level: Option<i64>,
}

impl UpdateQuestionRequest {
    pub fn is_empty(&self) -> bool {
        self.question.is_none()
            && self.options.is_none()
            && self.correct_option_id.is_none()
            && self.class_level.is_none()
    }

    /// Applies the patch on top of an existing question. The result still
    /// has to pass validation as a whole.
    pub fn merged_onto(self, existing: &Question) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question: self.question.unwrap_or_else(|| existing.question.clone()),
            options: self.options.unwrap_or_else(|| existing.options.clone()),
            correct_option_id: self.correct_option_id.unwrap_or(existing.correct_option_id),
            class_level: self
                .class_level
                .unwrap_or_else(|| i64::from(existing.class_level)),
        }
    }
}

/// Query parameters for listing questions.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QuestionListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<i64>,
    /// Case-insensitive substring over the question text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Question text is required".into()));
    }
    Ok(())
}

fn validate_options(options: &[QuizOption]) -> Result<(), ValidationError> {
    if options.len() != OptionId::ALL.len() {
        return Err(ValidationError::new("options_count")
            .with_message("Exactly 3 options (a, b, c) are required".into()));
    }
    let ids: BTreeSet<OptionId> = options.iter().map(|opt| opt.id).collect();
    if ids.len() != OptionId::ALL.len() {
        return Err(ValidationError::new("options_duplicate")
            .with_message("Option identifiers must be a, b and c without duplicates".into()));
    }
    for opt in options {
        if opt.text.trim().is_empty() {
            return Err(ValidationError::new("option_empty")
                .with_message("Option text cannot be empty".into()));
        }
        if opt.text.len() > 500 {
            return Err(ValidationError::new("option_too_long")
                .with_message("Option text must be at most 500 characters".into()));
        }
    }
    Ok(())
}

fn validate_correct_option(req: &CreateQuestionRequest) -> Result<(), ValidationError> {
    if !req.options.iter().any(|opt| opt.id == req.correct_option_id) {
        return Err(ValidationError::new("correct_option_missing")
            .with_message("Correct option must be one of the options".into()));
    }
    Ok(())
}
