#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use lumira::domains::message::ChatMessage;
use lumira::error::{LumiraError, Result};
use lumira::interfaces::providers::LlmProvider;
use lumira::store::LumiraStore;

/// Replies with queued texts in order and records every conversation it was sent.
pub struct QueueLlmProvider {
    queue: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl QueueLlmProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl LlmProvider for QueueLlmProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.calls.lock().await.push(messages);
        self.queue
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| LumiraError::Runtime("no scripted reply left".to_string()))
    }
}

pub async fn temp_store() -> (NamedTempFile, Arc<LumiraStore>) {
    let db = NamedTempFile::new().unwrap();
    let store = LumiraStore::new(db.path().to_str().unwrap()).await.unwrap();
    (db, Arc::new(store))
}
