// src/client/api.rs

//! HTTP client for the portal API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::{
    error::AppError,
    models::{
        account::{
            Account, AdminLoginResponse, ChangeClassRequest, LoginRequest, LoginResponse,
            RegisterRequest, StudentListParams, StudentStats,
        },
        class_level::ClassLevel,
        question::{
            CreateQuestionRequest, PublicQuestion, Question, QuestionListParams,
            UpdateQuestionRequest,
        },
        quiz_record::{AnswerEntry, QuizReport, SubmitQuizRequest},
    },
    quiz::QuizPort,
};

/// Which bearer token a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bearer {
    None,
    Student,
    Admin,
}

/// Talks to the `/api` surface of a running portal.
///
/// Student and admin tokens are independent; both may be set at once.
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base: Url,
    student_token: Option<String>,
    admin_token: Option<String>,
}

impl PortalClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| AppError::ValidationError(format!("Invalid base url: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base,
            student_token: None,
            admin_token: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn set_student_token(&mut self, token: Option<String>) {
        self.student_token = token;
    }

    pub fn set_admin_token(&mut self, token: Option<String>) {
        self.admin_token = token;
    }

    pub fn student_token(&self) -> Option<&str> {
        self.student_token.as_deref()
    }

    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    // ----- auth -----

    /// Registers and keeps the returned student token.
    pub async fn register(&mut self, req: &RegisterRequest) -> Result<LoginResponse, AppError> {
        let resp: LoginResponse = self
            .send(self.request(Method::POST, "api/auth/register", Bearer::None)?.json(req))
            .await?;
        self.student_token = Some(resp.token.clone());
        Ok(resp)
    }

    /// Logs in and keeps the returned student token.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self
            .send(self.request(Method::POST, "api/auth/login", Bearer::None)?.json(&body))
            .await?;
        self.student_token = Some(resp.token.clone());
        Ok(resp)
    }

    /// Changes class. The student token is dropped: a fresh login is required.
    pub async fn change_class(&mut self, req: &ChangeClassRequest) -> Result<(), AppError> {
        let _: Value = self
            .send(self.request(Method::POST, "api/auth/change-class", Bearer::None)?.json(req))
            .await?;
        self.student_token = None;
        Ok(())
    }

    /// Logs in as admin and keeps the returned admin token.
    pub async fn admin_login(&mut self, email: &str, password: &str) -> Result<String, AppError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: AdminLoginResponse = self
            .send(self.request(Method::POST, "api/auth/admin-login", Bearer::None)?.json(&body))
            .await?;
        self.admin_token = Some(resp.token.clone());
        Ok(resp.token)
    }

    pub async fn me(&self) -> Result<Account, AppError> {
        self.send(self.request(Method::GET, "api/auth/me", Bearer::Student)?)
            .await
    }

    // ----- questions -----

    /// Questions for the signed-in student's class, without answers.
    pub async fn class_questions(&self, class: ClassLevel) -> Result<Vec<PublicQuestion>, AppError> {
        let params = QuestionListParams {
            class: Some(class.into()),
            search: None,
        };
        self.send(
            self.request(Method::GET, "api/questions", Bearer::Student)?
                .query(&params),
        )
        .await
    }

    /// Full questions for the admin console.
    pub async fn questions(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Question>, AppError> {
        let params = QuestionListParams {
            class: class.map(i64::from),
            search: search.map(str::to_string),
        };
        self.send(
            self.request(Method::GET, "api/questions", Bearer::Admin)?
                .query(&params),
        )
        .await
    }

    pub async fn create_question(&self, req: &CreateQuestionRequest) -> Result<Question, AppError> {
        self.send(self.request(Method::POST, "api/questions", Bearer::Admin)?.json(req))
            .await
    }

    pub async fn update_question(
        &self,
        id: i64,
        patch: &UpdateQuestionRequest,
    ) -> Result<Question, AppError> {
        let path = format!("api/questions/{id}");
        self.send(self.request(Method::PUT, &path, Bearer::Admin)?.json(patch))
            .await
    }

    pub async fn delete_question(&self, id: i64) -> Result<(), AppError> {
        let path = format!("api/questions/{id}");
        let resp = self.request(Method::DELETE, &path, Bearer::Admin)?.send().await?;
        check(resp).await.map(|_| ())
    }

    pub async fn question_counts(&self) -> Result<BTreeMap<u8, u64>, AppError> {
        self.send(self.request(Method::GET, "api/questions/counts", Bearer::Admin)?)
            .await
    }

    // ----- quiz -----

    pub async fn submit_quiz(&self, answers: &[AnswerEntry]) -> Result<QuizReport, AppError> {
        let body = SubmitQuizRequest {
            answers: answers.to_vec(),
        };
        self.send(self.request(Method::POST, "api/quiz/submit", Bearer::Student)?.json(&body))
            .await
    }

    pub async fn quiz_result(&self) -> Result<QuizReport, AppError> {
        self.send(self.request(Method::GET, "api/quiz/result", Bearer::Student)?)
            .await
    }

    // ----- admin -----

    pub async fn students(
        &self,
        class: Option<ClassLevel>,
        search: Option<&str>,
    ) -> Result<Vec<Account>, AppError> {
        let params = StudentListParams {
            class: class.map(i64::from),
            search: search.map(str::to_string),
        };
        self.send(
            self.request(Method::GET, "api/admin/students", Bearer::Admin)?
                .query(&params),
        )
        .await
    }

    pub async fn student(&self, id: i64) -> Result<Account, AppError> {
        let path = format!("api/admin/students/{id}");
        self.send(self.request(Method::GET, &path, Bearer::Admin)?).await
    }

    pub async fn stats(&self) -> Result<StudentStats, AppError> {
        self.send(self.request(Method::GET, "api/admin/stats", Bearer::Admin)?)
            .await
    }

    fn request(&self, method: Method, path: &str, bearer: Bearer) -> Result<RequestBuilder, AppError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        let builder = self.http.request(method, url);

        let token = match bearer {
            Bearer::None => return Ok(builder),
            Bearer::Student => self.student_token.as_deref(),
            Bearer::Admin => self.admin_token.as_deref(),
        };
        match token {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Err(AppError::AuthError("Not signed in".to_string())),
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AppError> {
        let resp = check(builder.send().await?).await?;
        Ok(resp.json::<T>().await?)
    }
}

/// Passes 2xx responses through; turns anything else back into an `AppError`.
async fn check(resp: Response) -> Result<Response, AppError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);

    tracing::debug!(%status, "Request failed: {}", message);
    Err(AppError::from_status(status, message))
}

#[async_trait]
impl QuizPort for PortalClient {
    async fn load_questions(&self, class: ClassLevel) -> Result<Vec<PublicQuestion>, AppError> {
        self.class_questions(class).await
    }

    async fn submit(&self, _account: &Account, answers: &[AnswerEntry]) -> Result<QuizReport, AppError> {
        self.submit_quiz(answers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = PortalClient::new("http://127.0.0.1:3000/portal").unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:3000/portal/");
        assert_eq!(
            client.base_url().join("api/auth/login").unwrap().as_str(),
            "http://127.0.0.1:3000/portal/api/auth/login"
        );
    }

    #[test]
    fn bad_base_url_is_validation_error() {
        assert!(matches!(
            PortalClient::new("not a url"),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn token_required_for_protected_calls() {
        let client = PortalClient::new("http://127.0.0.1:3000").unwrap();
        let err = client
            .request(Method::GET, "api/auth/me", Bearer::Student)
            .unwrap_err();
        assert_eq!(err, AppError::AuthError("Not signed in".to_string()));
        assert!(client.request(Method::POST, "api/auth/login", Bearer::None).is_ok());
    }
}
