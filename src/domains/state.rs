use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domains::message::ChatMessage;

/// Step-by-step walkthrough of a single problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemSolverState {
    pub active: bool,
    pub topic: Option<String>,
    pub steps: Vec<String>,
    pub current_step: usize,
}

/// Everything the assistant remembers about one dialog between turns.
///
/// Stored as JSON in `dialogs.state_json`. Rows written by older builds may
/// miss keys or carry loosely typed answer maps, so loading always goes
/// through [`DialogState::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogState {
    pub tutor_history: Vec<ChatMessage>,
    pub last_topic: Option<String>,
    /// Question number to the correct option letter (upper case).
    pub current_test: Option<BTreeMap<u32, String>>,
    pub problem_solver: ProblemSolverState,
}

impl DialogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(value: Option<Value>) -> Self {
        let Some(Value::Object(mut map)) = value else {
            return Self::new();
        };

        // keys decode independently; a malformed one falls back to its default
        let tutor_history = match map.remove("tutor_history") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<ChatMessage>(item).ok())
                .collect(),
            _ => Vec::new(),
        };
        let last_topic = match map.remove("last_topic") {
            Some(Value::String(topic)) => Some(topic),
            _ => None,
        };
        let problem_solver = map
            .remove("problem_solver")
            .and_then(|value| serde_json::from_value::<ProblemSolverState>(value).ok())
            .unwrap_or_default();

        DialogState {
            tutor_history,
            last_topic,
            current_test: map.remove("current_test").and_then(normalize_test),
            problem_solver,
        }
    }
}

fn normalize_test(value: Value) -> Option<BTreeMap<u32, String>> {
    let Value::Object(entries) = value else {
        return None;
    };
    let answers: BTreeMap<u32, String> = entries
        .into_iter()
        .filter_map(|(key, value)| {
            let number = key.trim().parse::<u32>().ok()?;
            let letter = match value {
                Value::String(s) => s,
                Value::Null => return None,
                other => other.to_string(),
            };
            Some((number, letter.trim().to_uppercase()))
        })
        .collect();
    if answers.is_empty() {
        None
    } else {
        Some(answers)
    }
}
