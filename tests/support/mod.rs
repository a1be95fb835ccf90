#![allow(dead_code)]

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use remedia::{
    Engine,
    access::AccessWindow,
    completion::{CompletionError, CompletionRequest, CompletionService},
    grading::ExerciseContext,
    store::MemoryStore,
    types::StudentId,
};
use tokio::sync::Mutex;

/// One scripted answer of the completion service.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
}

/// Completion service answering from a FIFO script. An exhausted script
/// fails the call, so unexpected calls show up as failures.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies:  Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies:  Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every reply succeeds with the given texts, in order.
    pub fn texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Arc<Self> {
        Self::new(texts.into_iter().map(|t| Reply::Text(t.into())))
    }

    pub async fn push(&self, reply: Reply) {
        self.replies.lock().await.push_back(reply);
    }

    pub async fn calls(&self) -> usize {
        self.requests.lock().await.len()
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().await.push(request);
        match self.replies.lock().await.pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail) => Err(CompletionError::Timeout(std::time::Duration::from_secs(60))),
            None => Err(CompletionError::Other("script exhausted".into())),
        }
    }
}

pub const REMEDIATION_TEXT: &str = "Question: Solve 3x = 12.\nExpected answer: x = 4\nHint: \
                                    divide both sides by 3";

pub fn engine(completion: Arc<ScriptedCompletion>) -> (Engine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(completion, store.clone());
    (engine, store)
}

pub fn linear_equation() -> ExerciseContext {
    ExerciseContext::builder()
        .exercise_id("ex-1".to_string())
        .question("Solve 2x + 3 = 7.")
        .expected_answer("x = 2")
        .theme("Equations")
        .lesson_label("Linear equations")
        .build()
}

/// A student whose trial ended a day ago and who never paid.
pub fn expired_window(student: &str) -> AccessWindow {
    AccessWindow::with_default_trial(StudentId::from(student), Utc::now() - Duration::hours(72))
}
