#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt::Display, str::FromStr};

use anyhow::bail;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the two languages the platform grades and tutors in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// French, the platform default.
    #[default]
    Fr,
    /// English.
    En,
}

impl Language {
    /// Returns the two-letter language code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fr" | "french" | "français" => Ok(Language::Fr),
            "en" | "english" => Ok(Language::En),
            other => bail!("Unsupported language `{other}`, expected `fr` or `en`"),
        }
    }
}

/// Identity of a student, as known to the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for StudentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity of a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeacherId(pub String);

impl From<&str> for TeacherId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Who is making a request. Checked once at the boundary of every action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// A student acting on their own records.
    Student(StudentId),
    /// A teacher reviewing remediation work.
    Teacher(TeacherId),
    /// Platform administrator; may act wherever a teacher may.
    Admin,
}

/// Request-scoped context carried into every remediation action.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Role of the caller.
    pub role:     Role,
    /// Display language of the caller.
    pub language: Language,
}

impl RequestContext {
    /// Context for a student request.
    pub fn student(id: impl Into<StudentId>, language: Language) -> Self {
        Self {
            role: Role::Student(id.into()),
            language,
        }
    }

    /// Context for a teacher request.
    pub fn teacher(id: impl Into<TeacherId>, language: Language) -> Self {
        Self {
            role: Role::Teacher(id.into()),
            language,
        }
    }

    /// Context for an administrator request.
    pub fn admin(language: Language) -> Self {
        Self {
            role: Role::Admin,
            language,
        }
    }

    /// Returns the student identity when the caller is a student.
    pub fn as_student(&self) -> Option<&StudentId> {
        match &self.role {
            Role::Student(id) => Some(id),
            Role::Teacher(_) | Role::Admin => None,
        }
    }

    /// True for teachers and administrators.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Teacher(_) | Role::Admin)
    }
}

/// A student's answer, created on submit and immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(on(String, into))]
pub struct Submission {
    /// Record identifier.
    #[builder(default = Uuid::new_v4())]
    pub id:          Uuid,
    /// Who submitted the answer.
    pub student_id:  StudentId,
    /// Exercise answered; `None` for answers to remediation exercises.
    pub exercise_id: Option<String>,
    /// Free-text answer as typed by the student.
    pub answer_text: String,
    /// Language the answer is graded in.
    #[builder(default)]
    pub language:    Language,
    /// Submission time.
    #[builder(default = Utc::now())]
    pub created_at:  DateTime<Utc>,
}
