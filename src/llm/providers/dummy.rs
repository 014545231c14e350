//! Dummy LLM provider. Replays queued replies, then answers `{}`.
//!
//! `{}` is a valid "nothing extracted" answer for extraction prompts and an
//! "unknown" answer for confirmation prompts, so an unscripted dummy keeps
//! the agent inert instead of inventing data.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::llm::ProviderError;

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    replies: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl DummyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that answers with `replies` in order.
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let p = Self::new();
        for r in replies {
            p.push(r);
        }
        p
    }

    pub fn push(&self, reply: impl Into<String>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(reply.into());
        }
    }

    /// Every user prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub async fn complete(&self, content: &str, _system: Option<&str>) -> Result<String, ProviderError> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(content.to_string());
        }
        let next = self
            .replies
            .lock()
            .map_err(|_| ProviderError::Request("dummy provider lock poisoned".into()))?
            .pop_front();
        Ok(next.unwrap_or_else(|| "{}".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_empty_object() {
        let p = DummyProvider::scripted(["one", "two"]);
        assert_eq!(p.complete("a", None).await.unwrap(), "one");
        assert_eq!(p.complete("b", Some("sys")).await.unwrap(), "two");
        assert_eq!(p.complete("c", None).await.unwrap(), "{}");
        assert_eq!(p.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn clones_share_the_queue() {
        let p = DummyProvider::new();
        let q = p.clone();
        q.push("later");
        assert_eq!(p.complete("x", None).await.unwrap(), "later");
    }
}
