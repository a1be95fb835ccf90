#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Guided (Socratic) dialogue between a student and the tutor persona.

/// Pinned-question extraction from tutor turns.
pub mod questions;

use std::{collections::VecDeque, sync::Arc};

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub use self::questions::extract_question;
use crate::{
    access::{AccessDecision, AccessGate, AccessWindow},
    completion::{CompletionRequest, CompletionService},
    constants::{
        CONTEXT_WINDOW, DIALOGUE_CONTINUE_MAX_TOKENS, DIALOGUE_START_MAX_TOKENS,
        DIALOGUE_TEMPERATURE, MIN_MESSAGE_LEN, TRANSCRIPT_CAP,
    },
    prompts::{PromptCatalog, Subject},
    session::StudentSession,
    types::Language,
};

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The student.
    Student,
    /// The tutor persona.
    Tutor,
}

/// One line of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Author of the line.
    pub speaker: Speaker,
    /// Line content.
    pub text:    String,
}

impl TranscriptEntry {
    /// A student line.
    pub fn student(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Student,
            text:    text.into(),
        }
    }

    /// A tutor line.
    pub fn tutor(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Tutor,
            text:    text.into(),
        }
    }
}

/// Where a dialogue stands, derived from its last transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    /// Nothing said yet.
    Empty,
    /// The tutor spoke last.
    AwaitingStudent,
    /// The student spoke last.
    AwaitingTutor,
}

/// Dialogue state of one browsing session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TutorSession {
    /// Most recent lines, oldest first, never more than `TRANSCRIPT_CAP`.
    transcript:             VecDeque<TranscriptEntry>,
    /// Question the tutor asked last, if one was recognised.
    pending_tutor_question: Option<String>,
    /// Subject the tutor persona teaches.
    pub subject:            Subject,
    /// Hints only, no step-by-step guidance.
    pub exam_mode:          bool,
}

impl TutorSession {
    /// A session on `subject`.
    pub fn new(subject: Subject, exam_mode: bool) -> Self {
        Self {
            subject,
            exam_mode,
            ..Default::default()
        }
    }

    /// Transcript lines, oldest first.
    pub fn transcript(&self) -> impl ExactSizeIterator<Item = &TranscriptEntry> {
        self.transcript.iter()
    }

    /// Number of transcript lines.
    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    /// True before the first message.
    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// Question pinned by the last tutor turn.
    pub fn pending_question(&self) -> Option<&str> {
        self.pending_tutor_question.as_deref()
    }

    /// Current state.
    pub fn state(&self) -> DialogueState {
        match self.transcript.back() {
            None => DialogueState::Empty,
            Some(entry) if entry.speaker == Speaker::Tutor => DialogueState::AwaitingStudent,
            Some(_) => DialogueState::AwaitingTutor,
        }
    }

    /// Appends a line, dropping the oldest lines beyond the cap.
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.transcript.push_back(entry);
        while self.transcript.len() > TRANSCRIPT_CAP {
            self.transcript.pop_front();
        }
    }

    /// Clears the transcript, the pinned question, subject and exam mode.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Renders the last `CONTEXT_WINDOW` lines with speaker labels.
    fn recent_history(&self, prompts: &PromptCatalog, language: Language) -> String {
        let skip = self.transcript.len().saturating_sub(CONTEXT_WINDOW);
        self.transcript
            .iter()
            .skip(skip)
            .map(|entry| {
                let label = match entry.speaker {
                    Speaker::Student => prompts.student_label(language),
                    Speaker::Tutor => prompts.tutor_label(language),
                };
                format!("{label} {}", entry.text)
            })
            .join("\n")
    }
}

/// Prompt mode used for a tutor turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Reformulate the problem and ask the first question.
    Start,
    /// Build on the pinned question and the student's reply.
    Continue,
}

/// What a dialogue turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorTurn {
    /// Tutor line appended to the transcript.
    pub reply:    String,
    /// Prompt mode used.
    pub mode:     PromptMode,
    /// True when the completion failed and the apology was used instead.
    pub degraded: bool,
}

/// Result of a gated dialogue turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueReply {
    /// The turn ran.
    Turn(TutorTurn),
    /// Dialogue is closed to this student; redirect to the upgrade page.
    Upgrade,
}

/// Errors that reject a student message before anything happens.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DialogueError {
    /// The message is too short to be a reply.
    #[error("message must be at least {min} characters long")]
    MessageTooShort {
        /// Minimum accepted length.
        min: usize,
    },
}

/// Runs tutor turns against the completion service.
#[derive(Clone)]
pub struct DialogueEngine {
    /// Completion service for tutor turns.
    completion: Arc<dyn CompletionService>,
    /// Prompt templates.
    prompts:    Arc<PromptCatalog>,
    /// Access rules for the dialogue surface.
    gate:       AccessGate,
}

impl DialogueEngine {
    /// Creates an engine.
    pub fn new(
        completion: Arc<dyn CompletionService>,
        prompts: Arc<PromptCatalog>,
        gate: AccessGate,
    ) -> Self {
        Self {
            completion,
            prompts,
            gate,
        }
    }

    /// Checks dialogue access first, then runs the turn.
    pub async fn respond_gated(
        &self,
        window: &AccessWindow,
        session: &mut StudentSession,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<DialogueReply, DialogueError> {
        match self.gate.dialogue_access(window, session, now) {
            AccessDecision::Granted(reason) => {
                debug!(student_id = %session.student_id, ?reason, "dialogue access granted");
                Ok(DialogueReply::Turn(self.respond(session, message).await?))
            }
            AccessDecision::Upgrade => Ok(DialogueReply::Upgrade),
        }
    }

    /// Records the student's message and appends the tutor's next turn.
    ///
    /// The first message of a session is preceded by the canned welcome line
    /// and answered in start mode. Later messages are answered in continue
    /// mode when a question is pinned. A failed completion appends the
    /// apology instead; the pinned question is then left as it was so the
    /// student can answer it again.
    pub async fn respond(
        &self,
        session: &mut StudentSession,
        message: &str,
    ) -> Result<TutorTurn, DialogueError> {
        let message = message.trim();
        if message.chars().count() < MIN_MESSAGE_LEN {
            return Err(DialogueError::MessageTooShort {
                min: MIN_MESSAGE_LEN,
            });
        }

        let language = session.language;
        let level = session.level.as_deref();
        let tutor = &mut session.tutor;

        if tutor.is_empty() {
            tutor.push(TranscriptEntry::tutor(self.prompts.welcome(language)));
        }
        tutor.push(TranscriptEntry::student(message));

        let system = self
            .prompts
            .tutor_system(language, tutor.subject, tutor.exam_mode);
        let (mode, prompt, max_tokens) = match tutor.pending_question() {
            Some(last_question) => (
                PromptMode::Continue,
                self.prompts.dialogue_continue(
                    language,
                    tutor.subject,
                    level,
                    &tutor.recent_history(&self.prompts, language),
                    last_question,
                    message,
                    tutor.exam_mode,
                ),
                DIALOGUE_CONTINUE_MAX_TOKENS,
            ),
            None => (
                PromptMode::Start,
                self.prompts.dialogue_start(
                    language,
                    tutor.subject,
                    level,
                    message,
                    tutor.exam_mode,
                ),
                DIALOGUE_START_MAX_TOKENS,
            ),
        };

        let request = CompletionRequest::builder()
            .prompt(prompt)
            .system_instructions(system)
            .temperature(DIALOGUE_TEMPERATURE)
            .max_tokens(max_tokens)
            .build();

        let turn = match self.completion.complete(request).await {
            Ok(reply) => {
                tutor.pending_tutor_question = extract_question(&reply, language);
                info!(
                    student_id = %session.student_id,
                    ?mode,
                    pinned = tutor.pending_tutor_question.is_some(),
                    "tutor turn"
                );
                TutorTurn {
                    reply,
                    mode,
                    degraded: false,
                }
            }
            Err(e) => {
                error!(student_id = %session.student_id, ?mode, "tutor turn failed: {e}");
                TutorTurn {
                    reply: self.prompts.apology(language).to_string(),
                    mode,
                    degraded: true,
                }
            }
        };

        session.tutor.push(TranscriptEntry::tutor(turn.reply.clone()));
        Ok(turn)
    }

    /// Starts a new exercise: clears the whole tutor session, whatever state
    /// the dialogue is in.
    pub fn new_exercise(&self, session: &mut StudentSession) {
        session.tutor.reset();
        info!(student_id = %session.student_id, "dialogue reset for a new exercise");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_last_speaker() {
        let mut session = TutorSession::default();
        assert_eq!(session.state(), DialogueState::Empty);
        session.push(TranscriptEntry::tutor("Bonjour"));
        assert_eq!(session.state(), DialogueState::AwaitingStudent);
        session.push(TranscriptEntry::student("2x = 6"));
        assert_eq!(session.state(), DialogueState::AwaitingTutor);
    }

    #[test]
    fn history_keeps_last_ten_lines() {
        let prompts = PromptCatalog::load();
        let mut session = TutorSession::default();
        for i in 0..14 {
            session.push(TranscriptEntry::student(format!("line {i}")));
        }
        let history = session.recent_history(&prompts, Language::En);
        assert_eq!(history.lines().count(), CONTEXT_WINDOW);
        assert!(history.starts_with("👤 Student: line 4"));
        assert!(history.ends_with("line 13"));
    }
}
