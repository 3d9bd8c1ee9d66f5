// src/client/view.rs

use crate::{
    client::session::{SessionState, StudentState},
    error::AppError,
    quiz::Phase,
};

/// Where the user asked to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Register,
    Login,
    ChangeClass,
    Quiz,
    Result,
    AdminLogin,
    Admin,
}

/// The screen to render.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Landing,
    Register,
    Login,
    ChangeClass,
    /// The answer loop; `start` has not run yet when the engine is idle.
    Quiz,
    NoQuestions,
    Result,
    /// Loading the quiz failed; the message is shown with a way back.
    LoadError(String),
    AdminLogin,
    AdminPanel,
}

impl View {
    /// Picks the screen for a requested route.
    ///
    /// `engine` is the phase of the student's quiz engine, if one exists. A
    /// completed attempt always wins over the answer loop.
    pub fn resolve(route: Route, session: &SessionState, engine: Option<&Phase>) -> View {
        match route {
            Route::Home => View::Landing,
            Route::ChangeClass => View::ChangeClass,
            Route::AdminLogin | Route::Admin => {
                if session.admin {
                    View::AdminPanel
                } else {
                    View::AdminLogin
                }
            }
            Route::Register | Route::Login => match session.student {
                StudentState::Anonymous if route == Route::Register => View::Register,
                StudentState::Anonymous => View::Login,
                _ => Self::student_view(session, engine),
            },
            Route::Quiz | Route::Result => match session.student {
                StudentState::Anonymous => View::Login,
                _ => Self::student_view(session, engine),
            },
        }
    }

    fn student_view(session: &SessionState, engine: Option<&Phase>) -> View {
        if let StudentState::QuizCompleted(_) = session.student {
            return View::Result;
        }
        match engine {
            None | Some(Phase::Idle) | Some(Phase::Answering) | Some(Phase::Submitting) => View::Quiz,
            Some(Phase::NoQuestions) => View::NoQuestions,
            Some(Phase::Completed(_)) => View::Result,
            // Refused by the backend (e.g. already submitted elsewhere).
            Some(Phase::Failed(AppError::StateError(_))) => View::Landing,
            Some(Phase::Failed(err)) => View::LoadError(err.message().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{
        account::Account,
        class_level::ClassLevel,
        quiz_record::{QuizReport, QuizResult},
    };

    fn account(attempted: bool) -> Account {
        Account {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            class_level: ClassLevel::new(5).unwrap(),
            quiz_attempted: attempted,
            quiz_score: attempted.then_some(1),
            wrong_answers: attempted.then(Vec::new),
            created_at: Utc::now(),
        }
    }

    fn session(student: StudentState, admin: bool) -> SessionState {
        SessionState { student, admin }
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        let anon = session(StudentState::Anonymous, false);
        assert_eq!(View::resolve(Route::Quiz, &anon, None), View::Login);
        assert_eq!(View::resolve(Route::Result, &anon, None), View::Login);
        assert_eq!(View::resolve(Route::Register, &anon, None), View::Register);
        assert_eq!(View::resolve(Route::Home, &anon, None), View::Landing);
    }

    #[test]
    fn completed_attempt_never_reenters_quiz() {
        let done = session(StudentState::QuizCompleted(account(true)), false);
        assert_eq!(View::resolve(Route::Quiz, &done, None), View::Result);
        assert_eq!(View::resolve(Route::Login, &done, Some(&Phase::Answering)), View::Result);
    }

    #[test]
    fn pending_student_follows_engine() {
        let pending = session(StudentState::QuizPending(account(false)), false);
        assert_eq!(View::resolve(Route::Quiz, &pending, Some(&Phase::Idle)), View::Quiz);
        assert_eq!(
            View::resolve(Route::Quiz, &pending, Some(&Phase::NoQuestions)),
            View::NoQuestions
        );
        let report = QuizReport::saved(QuizResult { score: 1, total: 1, wrong_answers: vec![] });
        assert_eq!(
            View::resolve(Route::Quiz, &pending, Some(&Phase::Completed(report))),
            View::Result
        );
        assert_eq!(
            View::resolve(
                Route::Quiz,
                &pending,
                Some(&Phase::Failed(AppError::StateError("twice".to_string())))
            ),
            View::Landing
        );
        assert_eq!(
            View::resolve(
                Route::Quiz,
                &pending,
                Some(&Phase::Failed(AppError::TransportError("down".to_string())))
            ),
            View::LoadError("down".to_string())
        );
    }

    #[test]
    fn admin_track_is_independent() {
        let both = session(StudentState::QuizPending(account(false)), true);
        assert_eq!(View::resolve(Route::Admin, &both, None), View::AdminPanel);
        assert_eq!(View::resolve(Route::Quiz, &both, None), View::Quiz);
        let anon = session(StudentState::Anonymous, false);
        assert_eq!(View::resolve(Route::Admin, &anon, None), View::AdminLogin);
    }
}
