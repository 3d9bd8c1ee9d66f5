// src/models/quiz_record.rs

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::question::OptionId;

/// Shown in place of the selected option text when a question was skipped.
pub const NOT_ANSWERED: &str = "Not answered";

/// Snapshot of a missed question taken at grading time.
/// Later edits to the question bank never alter it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongAnswer {
    pub question_id: i64,
    pub question_text: String,
    /// Text of the option the student picked, or `NOT_ANSWERED`.
    pub selected_option: String,
    pub correct_option: String,
}

/// Outcome of grading one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub wrong_answers: Vec<WrongAnswer>,
}

/// One answered (or skipped) question in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: i64,
    /// Empty string or null means "not answered".
    #[serde(default, deserialize_with = "blank_as_none")]
    pub selected_option_id: Option<OptionId>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<AnswerEntry>,
}

/// A graded attempt as reported to the student.
///
/// `saved` is false when grading succeeded but persisting the attempt did not;
/// the score is still shown, together with `warning`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizReport {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub band: crate::quiz::grading::Band,
    pub wrong_answers: Vec<WrongAnswer>,
    pub saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl QuizReport {
    pub fn saved(result: QuizResult) -> Self {
        Self::build(result, true, None)
    }

    pub fn unsaved(result: QuizResult, warning: impl Into<String>) -> Self {
        Self::build(result, false, Some(warning.into()))
    }

    fn build(result: QuizResult, saved: bool, warning: Option<String>) -> Self {
        let percentage = crate::quiz::grading::percentage(result.score, result.total);
        Self {
            score: result.score,
            total: result.total,
            percentage,
            band: crate::quiz::grading::Band::for_percentage(percentage),
            wrong_answers: result.wrong_answers,
            saved,
            warning,
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<OptionId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => OptionId::parse(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown option id '{value}'"))),
    }
}
