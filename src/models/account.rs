// src/models/account.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{class_level::ClassLevel, quiz_record::WrongAnswer};

/// Basic `local@domain.tld` shape; no whitespace, exactly one `@`.
pub static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Represents the 'accounts' table: one student account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,

    pub name: String,

    /// Stored lower-cased; unique case-insensitively.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    #[serde(rename = "class")]
    pub class_level: ClassLevel,

    /// Set by the first graded submission; only a class change clears it.
    pub quiz_attempted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrong_answers: Option<Vec<WrongAnswer>>,

    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Number of questions in the recorded attempt. Every question is either
    /// scored or listed as a wrong answer.
    pub fn attempt_total(&self) -> Option<u32> {
        let score = self.quiz_score?;
        let wrong = self.wrong_answers.as_ref().map_or(0, Vec::len) as u32;
        Some(score + wrong)
    }
}

/// Validated account data ready for the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub class_level: ClassLevel,
}

/// DTO for creating a new account (Registration).
///
/// Field order matters: the first violation in declaration order is the one
/// reported.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(regex(path = *EMAIL_RE, message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(rename = "class")]
    #[validate(range(min = 1, max = 10, message = "Please select a valid class (1-10)"))]
    pub class_level: i64,
    /// Accepted for wire compatibility; only "student" is allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl RegisterRequest {
    /// Field names in the order violations are reported.
    /// Renamed fields are keyed by their serde name.
    pub const CHECK_ORDER: [&'static str; 4] = ["name", "email", "password", "class"];

    /// Trims name and email the way the registration form does. The password
    /// is kept as sent; login compares it exactly.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password,
            class_level: self.class_level,
            role: self.role,
        }
    }
}

/// DTO for student and admin login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// DTO for the password-gated class change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeClassRequest {
    pub email: String,
    pub password: String,
    pub new_class: i64,
}

/// Response to a successful student login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Account,
}

/// Response to a successful admin login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub token: String,
}

/// Query parameters for the admin student listing.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StudentListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<i64>,
    /// Case-insensitive substring over name or email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Aggregate counts shown on the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub total_students: u64,
    pub attempted_quiz: u64,
    pub not_attempted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(EMAIL_RE.is_match("alice@example.com"));
        assert!(!EMAIL_RE.is_match("alice@example"));
        assert!(!EMAIL_RE.is_match("alice example@x.com"));
        assert!(!EMAIL_RE.is_match("@example.com"));
    }

    #[test]
    fn normalized_trims_name_and_email_only() {
        let req = RegisterRequest {
            name: "  Alice ".to_string(),
            email: " Alice@Example.COM ".to_string(),
            password: " secret1 ".to_string(),
            class_level: 5,
            role: None,
        }
        .normalized();
        assert_eq!(req.name, "Alice");
        assert_eq!(req.email, "alice@example.com");
        assert_eq!(req.password, " secret1 ");
    }

    #[test]
    fn password_hash_never_serialized() {
        let account = Account {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            class_level: ClassLevel::new(5).unwrap(),
            quiz_attempted: false,
            quiz_score: None,
            wrong_answers: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("quizScore").is_none());
        assert_eq!(json["quizAttempted"], false);
        assert_eq!(json["class"], 5);
    }
}
