// src/external.rs

//! Non-transactional collaborators.
//!
//! Calls that cannot participate in a store transaction live behind these
//! traits. The ordering contract for attempt creation is: external call
//! first, transaction second, dependent follow-up side effects scheduled
//! asynchronously. An external call never runs inside the transaction.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;

/// Third-party conversational assistant backing the explain variant.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Create a conversation thread for one (student, exercise) pair and
    /// return its id. Timeouts surface as ordinary errors; the caller must
    /// not have persisted anything yet.
    async fn create_thread(
        &self,
        student_id: &str,
        exercise_id: &str,
        instructions: Option<&str>,
    ) -> Result<String, AppError>;

    async fn send_message(&self, thread_id: &str, text: &str) -> Result<(), AppError>;
}

/// Stand-in assistant for tests and local runs: hands out synthetic thread
/// ids and logs outgoing messages.
pub struct NoopAssistant;

#[async_trait]
impl Assistant for NoopAssistant {
    async fn create_thread(
        &self,
        student_id: &str,
        exercise_id: &str,
        _instructions: Option<&str>,
    ) -> Result<String, AppError> {
        let thread_id = format!("thread-{}", uuid::Uuid::new_v4());
        tracing::debug!(
            "Created assistant thread {} for student {} on exercise {}",
            thread_id,
            student_id,
            exercise_id
        );
        Ok(thread_id)
    }

    async fn send_message(&self, thread_id: &str, text: &str) -> Result<(), AppError> {
        tracing::debug!("Assistant message to {}: {}", thread_id, text);
        Ok(())
    }
}

/// Asynchronous follow-up work dispatched outside any transaction.
#[derive(Debug, Clone)]
pub enum Job {
    SendAssistantMessage { thread_id: String, text: String },
}

/// Fire-and-forget dispatch. Failures are logged, never propagated into the
/// operation that scheduled the job.
pub trait Scheduler: Send + Sync {
    fn run_after(&self, delay: Duration, job: Job);
}

/// Scheduler backed by `tokio::spawn`.
pub struct TokioScheduler {
    assistant: Arc<dyn Assistant>,
}

impl TokioScheduler {
    pub fn new(assistant: Arc<dyn Assistant>) -> Self {
        Self { assistant }
    }
}

impl Scheduler for TokioScheduler {
    fn run_after(&self, delay: Duration, job: Job) {
        let assistant = self.assistant.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match job {
                Job::SendAssistantMessage { thread_id, text } => {
                    if let Err(e) = assistant.send_message(&thread_id, &text).await {
                        tracing::error!("Scheduled assistant message failed: {:?}", e);
                    }
                }
            }
        });
    }
}
