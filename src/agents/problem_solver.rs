use once_cell::sync::Lazy;
use regex::Regex;

use crate::domains::state::ProblemSolverState;
use crate::error::Result;
use crate::interfaces::providers::LlmProvider;

const SOLVER_PROMPT: &str = "You are the Problem Solver of a study assistant.\n\
Solve the user's problem as a numbered list of short steps, one step per item:\n\
1. <first step>\n\
2. <second step>\n\
...\n\
The last step states the final answer. Use the language of the problem. \
Do not add text before or after the list.";

const EXPLAIN_PROMPT: &str = "You are a patient tutor. The student did not understand \
one step of a solution. Explain that step again in more detail, with a simple example \
if it helps. Use the language of the problem.";

const YES_WORDS: &[&str] = &["yes", "y", "да", "ага", "понял", "поняла", "понял.", "поняла."];
const NO_WORDS: &[&str] = &["no", "n", "нет", "неа", "не", "не понял", "не поняла"];

static STEP_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)[.)]\s*(.*)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Understood,
    NotUnderstood,
}

impl Reply {
    pub fn classify(text: &str) -> Option<Self> {
        let normalized = text.trim().to_lowercase();
        if YES_WORDS.contains(&normalized.as_str()) {
            Some(Reply::Understood)
        } else if NO_WORDS.contains(&normalized.as_str()) {
            Some(Reply::NotUnderstood)
        } else {
            None
        }
    }
}

pub fn parse_steps(reply: &str) -> Vec<String> {
    let mut steps: Vec<String> = Vec::new();
    for line in reply.lines() {
        if let Some(caps) = STEP_START.captures(line) {
            steps.push(caps[2].trim().to_string());
        } else if let Some(last) = steps.last_mut() {
            let extra = line.trim();
            if !extra.is_empty() {
                last.push('\n');
                last.push_str(extra);
            }
        }
    }
    steps.retain(|step| !step.is_empty());
    if steps.is_empty() && !reply.trim().is_empty() {
        steps.push(reply.trim().to_string());
    }
    steps
}

fn show_step(state: &ProblemSolverState) -> String {
    let step = state
        .steps
        .get(state.current_step)
        .map(String::as_str)
        .unwrap_or_default();
    format!(
        "Шаг {} из {}:\n{}\n\nПонятно? (да/нет)",
        state.current_step + 1,
        state.steps.len(),
        step
    )
}

pub async fn start(llm: &dyn LlmProvider, problem: &str) -> Result<(String, ProblemSolverState)> {
    let reply = llm.generate_text(problem, SOLVER_PROMPT).await?;
    let steps = parse_steps(&reply);
    if steps.is_empty() {
        return Ok((
            "Не удалось разобрать решение. Попробуйте сформулировать задачу иначе.".to_string(),
            ProblemSolverState::default(),
        ));
    }

    let state = ProblemSolverState {
        active: true,
        topic: Some(problem.trim().to_string()),
        steps,
        current_step: 0,
    };
    let answer = format!("Разберём задачу по шагам.\n\n{}", show_step(&state));
    Ok((answer, state))
}

/// Advances on "yes", re-explains the current step on "no". Anything else
/// leaves the state untouched.
pub async fn proceed(
    llm: &dyn LlmProvider,
    mut state: ProblemSolverState,
    reply: &str,
) -> Result<(String, ProblemSolverState)> {
    match Reply::classify(reply) {
        Some(Reply::Understood) => {
            state.current_step += 1;
            if state.current_step >= state.steps.len() {
                return Ok((
                    "Отлично, задача решена! Если появятся новые вопросы, спрашивайте.".to_string(),
                    ProblemSolverState::default(),
                ));
            }
            Ok((show_step(&state), state))
        }
        Some(Reply::NotUnderstood) => {
            let step = state
                .steps
                .get(state.current_step)
                .cloned()
                .unwrap_or_default();
            let prompt = format!(
                "Problem: {}\nStep {}: {}",
                state.topic.as_deref().unwrap_or_default(),
                state.current_step + 1,
                step
            );
            let explanation = llm.generate_text(&prompt, EXPLAIN_PROMPT).await?;
            Ok((format!("{}\n\nТеперь понятно? (да/нет)", explanation.trim()), state))
        }
        None => Ok((show_step(&state), state)),
    }
}
