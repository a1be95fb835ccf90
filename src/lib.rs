//! # remedia
//!
//! Assessment and remediation engine for a tutoring platform: grades free-text
//! answers with a language model, proposes follow-up exercises after low
//! scores, and runs a guided Socratic dialogue behind trial and subscription
//! access rules.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Trial, subscription and remediation-grant access rules
pub mod access;
/// Text-completion service abstraction and its OpenAI-backed implementation
pub mod completion;
/// Process-wide configuration read from the environment
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Guided tutoring dialogue
pub mod dialogue;
/// Grading of student submissions
pub mod grading;
/// Prompt templates and canned phrases
pub mod prompts;
/// Remediation suggestions: generation, text format and lifecycle
pub mod remediation;
/// Score line extraction from grading completions
pub mod score;
/// Per-student session state
pub mod session;
/// Durable storage
pub mod store;
/// Shared identifiers and records
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use completion::{CompletionService, OpenAiCompletion};
use store::{MemoryStore, PostgrestStore, Store};

use crate::{
    access::AccessGate, dialogue::DialogueEngine, grading::Grader, prompts::PromptCatalog,
    remediation::RemediationDesk,
};

/// The wired-up engine: grading, remediation desk and dialogue sharing one
/// completion service and one store.
#[derive(Clone)]
pub struct Engine {
    /// Grades submissions and triggers remediation.
    pub grader:   Grader,
    /// Teacher review and student attempts.
    pub desk:     RemediationDesk,
    /// Guided dialogue.
    pub dialogue: DialogueEngine,
    /// Access rules.
    pub gate:     AccessGate,
    /// Store shared by every component.
    pub store:    Arc<dyn Store>,
}

impl Engine {
    /// Wires the engine with default prompts and a 24-hour grant lifetime.
    pub fn new(completion: Arc<dyn CompletionService>, store: Arc<dyn Store>) -> Self {
        Self::with_parts(
            completion,
            store,
            Arc::new(PromptCatalog::load()),
            AccessGate::default(),
        )
    }

    /// Wires the engine from explicit parts.
    pub fn with_parts(
        completion: Arc<dyn CompletionService>,
        store: Arc<dyn Store>,
        prompts: Arc<PromptCatalog>,
        gate: AccessGate,
    ) -> Self {
        let grader = Grader::new(
            Arc::clone(&completion),
            Arc::clone(&store),
            Arc::clone(&prompts),
            gate,
        );
        let desk = RemediationDesk::new(Arc::clone(&store), grader.clone());
        let dialogue = DialogueEngine::new(completion, prompts, gate);

        Self {
            grader,
            desk,
            dialogue,
            gate,
            store,
        }
    }

    /// Wires the engine from the environment. Uses Supabase when configured,
    /// the in-memory store otherwise.
    pub fn from_config() -> Result<Self> {
        let config = config::ensure_initialized()?;
        let completion =
            OpenAiCompletion::from_config().context("Could not set up the completion service")?;

        let store: Arc<dyn Store> = if config.postgrest().is_some() {
            Arc::new(PostgrestStore::from_config()?)
        } else {
            tracing::info!("SUPABASE_URL not set, keeping records in memory");
            Arc::new(MemoryStore::new())
        };

        Ok(Self::with_parts(
            Arc::new(completion),
            store,
            config.prompts(),
            AccessGate::new(config.grant_ttl()),
        ))
    }
}
