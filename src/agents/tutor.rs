use crate::domains::message::ChatMessage;
use crate::error::Result;
use crate::interfaces::providers::LlmProvider;

const TUTOR_PROMPT: &str = "You are Lumira, a friendly tutor.\n\
Explain topics clearly and step by step, use simple examples, and check \
understanding with a short follow-up question when it helps.\n\
Answer in the language the student writes in.";

/// Messages of earlier turns sent along with a new question.
pub const CONTEXT_WINDOW: usize = 10;
/// Messages kept in the dialog state.
pub const MAX_HISTORY: usize = 20;

pub async fn run(
    llm: &dyn LlmProvider,
    text: &str,
    mut history: Vec<ChatMessage>,
) -> Result<(String, Vec<ChatMessage>)> {
    let context_start = history.len().saturating_sub(CONTEXT_WINDOW);
    let mut messages = Vec::with_capacity(CONTEXT_WINDOW + 2);
    messages.push(ChatMessage::system(TUTOR_PROMPT));
    messages.extend(history[context_start..].iter().cloned());
    messages.push(ChatMessage::user(text));

    let answer = llm.chat(messages).await?;

    history.push(ChatMessage::user(text));
    history.push(ChatMessage::assistant(answer.clone()));
    if history.len() > MAX_HISTORY {
        history.drain(..history.len() - MAX_HISTORY);
    }
    Ok((answer, history))
}
