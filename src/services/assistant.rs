use std::sync::Arc;

use tracing::{debug, info};

use crate::agents::moderator::{self, AgentKind};
use crate::agents::{analyser, examiner, problem_solver, summarizer, tutor};
use crate::domains::state::DialogState;
use crate::error::Result;
use crate::interfaces::providers::LlmProvider;
use crate::store::{calc_average, LumiraStore};

pub const EMPTY_REQUEST: &str = "Пожалуйста, введите запрос.";
pub const NO_TEST_TO_CHECK: &str = "Нет теста для проверки!";
pub const UNKNOWN_MODE: &str = "Неизвестный режим, модератор вернул странный код.";
const EXAM_FAILED: &str = "Не удалось составить тест. Попробуйте ещё раз или уточните тему.";
const PROGRESS_LIMIT: usize = 200;

/// Returns the topic filter when `text` is a `progress [topic]` command.
pub fn parse_progress_command(text: &str) -> Option<Option<String>> {
    let trimmed = text.trim();
    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };
    let command = command.to_lowercase();
    if command != "progress" && command != "прогресс" {
        return None;
    }
    if rest.is_empty() {
        Some(None)
    } else {
        Some(Some(rest.to_string()))
    }
}

/// Runs one user turn: routes the text to an agent and threads the dialog
/// state through it.
pub struct Assistant {
    llm: Arc<dyn LlmProvider>,
    store: Arc<LumiraStore>,
}

impl Assistant {
    pub fn new(llm: Arc<dyn LlmProvider>, store: Arc<LumiraStore>) -> Self {
        Self { llm, store }
    }

    pub fn store(&self) -> &Arc<LumiraStore> {
        &self.store
    }

    pub async fn process(&self, text: &str, mut state: DialogState) -> Result<(String, DialogState)> {
        let request = text.trim();
        if request.is_empty() {
            return Ok((EMPTY_REQUEST.to_string(), state));
        }

        if let Some(filter) = parse_progress_command(request) {
            let report = self.show_progress(filter.as_deref()).await?;
            return Ok((report, state));
        }

        if state.problem_solver.active && problem_solver::Reply::classify(request).is_some() {
            let (answer, solver) =
                problem_solver::proceed(self.llm.as_ref(), state.problem_solver, request).await?;
            state.problem_solver = solver;
            return Ok((answer, state));
        }

        let routing = moderator::route(self.llm.as_ref(), request).await?;
        info!(agent = ?routing.agent, change_topic = routing.change_topic, "routing request");
        if routing.change_topic {
            state.last_topic = Some(request.to_string());
        }

        let answer = match routing.agent {
            AgentKind::Tutor => {
                let history = std::mem::take(&mut state.tutor_history);
                let (answer, history) = tutor::run(self.llm.as_ref(), request, history).await?;
                state.tutor_history = history;
                answer
            }
            AgentKind::Examiner => {
                let topic = state
                    .last_topic
                    .get_or_insert_with(|| request.to_string())
                    .clone();
                let raw = examiner::run(self.llm.as_ref(), &topic).await?;
                let exam = examiner::format_exam(&raw, &topic);
                if exam.answers.is_empty() {
                    debug!(raw = %raw, "examiner reply had no answer key");
                    EXAM_FAILED.to_string()
                } else {
                    state.last_topic = Some(exam.theme);
                    state.current_test = Some(exam.answers);
                    format!("{}\n\n{}", examiner::ANSWER_INSTRUCTIONS, exam.questions_text)
                }
            }
            AgentKind::Analyser => match state.current_test.take() {
                None => NO_TEST_TO_CHECK.to_string(),
                Some(answer_key) => {
                    let report = analyser::run(&answer_key, request);
                    self.store
                        .save_test_result(
                            state.last_topic.as_deref(),
                            report.score,
                            report.total,
                            report.percent(),
                            request,
                        )
                        .await?;
                    report.text
                }
            },
            AgentKind::ProblemSolver => {
                let (answer, solver) = problem_solver::start(self.llm.as_ref(), request).await?;
                state.problem_solver = solver;
                answer
            }
            AgentKind::Summarizer => summarizer::run(self.llm.as_ref(), request).await?,
            AgentKind::Unknown(_) => UNKNOWN_MODE.to_string(),
        };

        Ok((answer, state))
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        summarizer::run(self.llm.as_ref(), text).await
    }

    /// Test history, oldest first, followed by the running average.
    pub async fn show_progress(&self, topic_filter: Option<&str>) -> Result<String> {
        let results = self
            .store
            .load_test_results(PROGRESS_LIMIT, topic_filter)
            .await?;

        if results.is_empty() {
            return Ok(match topic_filter {
                Some(topic) => format!("Пока нет ни одного теста по теме, содержащей: '{topic}'."),
                None => "Пока нет ни одного завершённого теста.".to_string(),
            });
        }

        let mut lines = vec![match topic_filter {
            Some(topic) => format!("История тестов (фильтр по теме: '{topic}'):"),
            None => "История тестов:".to_string(),
        }];
        for (i, result) in results.iter().rev().enumerate() {
            let topic = result.topic.as_deref().unwrap_or("(неизвестная тема)");
            lines.push(format!(
                "{}. Тема: {} — результат: {}/{} ({}%)",
                i + 1,
                topic,
                result.score,
                result.total,
                result.percent
            ));
        }

        let average = calc_average(&results);
        lines.push(format!(
            "\nСредний результат: {}/{} ({}%)",
            average.correct, average.total, average.percent
        ));
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_command_variants() {
        assert_eq!(parse_progress_command("progress"), Some(None));
        assert_eq!(
            parse_progress_command("Progress  planets "),
            Some(Some("planets".to_string()))
        );
        assert_eq!(parse_progress_command("прогресс"), Some(None));
        assert_eq!(parse_progress_command("progressive rock"), None);
        assert_eq!(parse_progress_command("show progress"), None);
    }
}
