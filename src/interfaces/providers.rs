use async_trait::async_trait;

use crate::domains::message::ChatMessage;
use crate::error::Result;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends the whole conversation and returns the assistant reply text.
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String>;

    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::system(system_prompt));
        }
        messages.push(ChatMessage::user(prompt));
        self.chat(messages).await
    }
}
