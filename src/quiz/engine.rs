// src/quiz/engine.rs

//! One student's walk through the quiz: load, answer, navigate, submit once.

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{
        account::Account,
        question::{OptionId, PublicQuestion},
        quiz_record::{AnswerEntry, QuizReport},
    },
    quiz::{QuizPort, stored_report},
};

/// Where the engine is in its lifecycle.
///
/// `Completed` is terminal for the session: the engine never offers the
/// questions again once a result exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    /// The student's class has no questions; nothing can be submitted.
    NoQuestions,
    Answering,
    /// A submission is in flight. Further submissions are refused.
    Submitting,
    Completed(QuizReport),
    /// Loading failed, or the backend refused the attempt outright.
    Failed(AppError),
}

/// Outcome of moving forward.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Now showing the question at this index.
    Moved(usize),
    /// The last question was passed; the attempt was submitted.
    Submitted(QuizReport),
}

pub struct QuizEngine<P> {
    port: P,
    account: Account,
    questions: Vec<PublicQuestion>,
    answers: HashMap<i64, OptionId>,
    cursor: usize,
    phase: Phase,
}

impl<P: QuizPort> QuizEngine<P> {
    pub fn new(port: P, account: Account) -> Self {
        Self {
            port,
            account,
            questions: Vec::new(),
            answers: HashMap::new(),
            cursor: 0,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn questions(&self) -> &[PublicQuestion] {
        &self.questions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&PublicQuestion> {
        match self.phase {
            Phase::Answering => self.questions.get(self.cursor),
            _ => None,
        }
    }

    pub fn answer_for(&self, question_id: i64) -> Option<OptionId> {
        self.answers.get(&question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Loads the questions for the student's class.
    ///
    /// An account that already attempted goes straight to its stored result
    /// without touching the port. If that result is missing the engine stops
    /// in `Failed` rather than offering the quiz again.
    pub async fn start(&mut self) -> Result<&Phase, AppError> {
        match self.phase {
            Phase::Idle | Phase::Failed(_) => {}
            Phase::Answering | Phase::Submitting => {
                return Err(AppError::StateError("Quiz already in progress".to_string()));
            }
            Phase::NoQuestions | Phase::Completed(_) => return Ok(&self.phase),
        }

        if self.account.quiz_attempted {
            let Some(report) = stored_report(&self.account) else {
                let err = AppError::StateError("Quiz already submitted".to_string());
                self.phase = Phase::Failed(err.clone());
                return Err(err);
            };
            self.phase = Phase::Completed(report);
            return Ok(&self.phase);
        }

        match self.port.load_questions(self.account.class_level).await {
            Ok(questions) if questions.is_empty() => {
                self.phase = Phase::NoQuestions;
            }
            Ok(questions) => {
                tracing::debug!(
                    class = %self.account.class_level,
                    count = questions.len(),
                    "Quiz started"
                );
                self.questions = questions;
                self.answers.clear();
                self.cursor = 0;
                self.phase = Phase::Answering;
            }
            Err(err) => {
                self.phase = Phase::Failed(err.clone());
                return Err(err);
            }
        }
        Ok(&self.phase)
    }

    /// Records (or replaces) the choice for a question of this quiz.
    pub fn select_answer(&mut self, question_id: i64, option: OptionId) -> Result<(), AppError> {
        self.ensure_answering()?;
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(AppError::ValidationError(format!(
                "Question {question_id} is not part of this quiz"
            )));
        }
        self.answers.insert(question_id, option);
        Ok(())
    }

    /// Moves to the next question, or submits when already on the last one.
    pub async fn advance(&mut self) -> Result<Step, AppError> {
        self.ensure_answering()?;
        if self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
            return Ok(Step::Moved(self.cursor));
        }
        self.submit().await.map(Step::Submitted)
    }

    /// Moves to the previous question; stays put on the first.
    pub fn retreat(&mut self) -> Result<usize, AppError> {
        self.ensure_answering()?;
        self.cursor = self.cursor.saturating_sub(1);
        Ok(self.cursor)
    }

    /// Submits the attempt exactly once.
    ///
    /// While a submission is in flight, or after one completed, further calls
    /// are refused without reaching the port. Unanswered questions are sent
    /// without a selection.
    pub async fn submit(&mut self) -> Result<QuizReport, AppError> {
        match &self.phase {
            Phase::Answering => {}
            Phase::Submitting | Phase::Completed(_) => {
                return Err(AppError::StateError("Quiz already submitted".to_string()));
            }
            _ => return Err(AppError::StateError("No quiz in progress".to_string())),
        }
        self.phase = Phase::Submitting;

        let entries: Vec<AnswerEntry> = self
            .questions
            .iter()
            .map(|q| AnswerEntry {
                question_id: q.id,
                selected_option_id: self.answers.get(&q.id).copied(),
            })
            .collect();

        match self.port.submit(&self.account, &entries).await {
            Ok(report) => {
                self.account.quiz_attempted = true;
                self.account.quiz_score = Some(report.score);
                self.account.wrong_answers = Some(report.wrong_answers.clone());
                self.phase = Phase::Completed(report.clone());
                Ok(report)
            }
            Err(err @ AppError::StateError(_)) => {
                self.phase = Phase::Failed(err.clone());
                Err(err)
            }
            Err(err) => {
                // Transport or server trouble: keep the answers so the
                // student can try again.
                tracing::warn!("Quiz submission failed: {}", err);
                self.phase = Phase::Answering;
                Err(err)
            }
        }
    }

    /// The result, once there is one.
    pub fn result(&self) -> Option<&QuizReport> {
        match &self.phase {
            Phase::Completed(report) => Some(report),
            _ => None,
        }
    }

    fn ensure_answering(&self) -> Result<(), AppError> {
        match self.phase {
            Phase::Answering => Ok(()),
            _ => Err(AppError::StateError("No quiz in progress".to_string())),
        }
    }
}
