#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::{
    access::RemediationGrant,
    dialogue::TutorSession,
    types::{Language, StudentId},
};

/// State tied to one student's browsing session. Owned by the caller and
/// passed by reference into the engine; never shared between students.
#[derive(Debug, Clone)]
pub struct StudentSession {
    /// Logged-in student.
    pub student_id:        StudentId,
    /// Display language.
    pub language:          Language,
    /// School level, e.g. "6ème"; used in tutor prompts.
    pub level:             Option<String>,
    /// Guided dialogue state.
    pub tutor:             TutorSession,
    /// Dialogue access opened by the latest low score, if any.
    pub remediation_grant: Option<RemediationGrant>,
}

impl StudentSession {
    /// Starts a fresh session.
    pub fn new(student_id: impl Into<StudentId>, language: Language) -> Self {
        Self {
            student_id: student_id.into(),
            language,
            level: None,
            tutor: TutorSession::default(),
            remediation_grant: None,
        }
    }

    /// Sets the student's school level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}
