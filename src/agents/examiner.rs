use std::collections::BTreeMap;

use crate::agents::parse_answer_pairs;
use crate::error::Result;
use crate::interfaces::providers::LlmProvider;

pub const QUESTION_COUNT: usize = 5;

const EXAMINER_PROMPT: &str = "You are the Examiner of a study assistant.\n\
Write a multiple-choice test on the topic the user gives. Use the language of the topic.\n\
Each question has exactly four options a) b) c) d) and one correct answer.\n\
Follow this layout exactly and add nothing else:\n\
\n\
THEME: <short name of the topic>\n\
QUESTIONS:\n\
1. <question>\n\
a) <option>\n\
b) <option>\n\
c) <option>\n\
d) <option>\n\
...\n\
ANSWERS:\n\
1-<letter>\n\
2-<letter>\n\
...";

pub const ANSWER_INSTRUCTIONS: &str = "\nКак отвечать на тесты\n\
Пишите только в формате:\n\
1a 2c 3b 4d 5a\n\
Где:\n\
число — номер вопроса,\n\
буква — выбранный вариант ответа.";

/// A generated test split into what the student sees and the answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exam {
    pub questions_text: String,
    pub answers: BTreeMap<u32, String>,
    pub theme: String,
}

pub async fn run(llm: &dyn LlmProvider, topic: &str) -> Result<String> {
    let prompt = format!("Topic: {topic}\nNumber of questions: {QUESTION_COUNT}");
    llm.generate_text(&prompt, EXAMINER_PROMPT).await
}

enum Section {
    Preamble,
    Questions,
    Answers,
}

fn header_value<'a>(line: &'a str, names: &[&str]) -> Option<&'a str> {
    let trimmed = line.trim().trim_start_matches(['*', '#']).trim_start();
    names.iter().find_map(|name| {
        let head = trimmed.get(..name.len())?;
        if head.eq_ignore_ascii_case(name) || head.to_lowercase() == name.to_lowercase() {
            Some(trimmed[name.len()..].trim().trim_matches('*').trim())
        } else {
            None
        }
    })
}

/// Splits a raw examiner reply into questions, answer key and theme.
/// `fallback_topic` is used as the theme when the reply has none.
pub fn format_exam(raw: &str, fallback_topic: &str) -> Exam {
    let mut theme = None;
    let mut section = Section::Preamble;
    let mut questions = Vec::new();
    let mut answers_text = String::new();

    for line in raw.lines() {
        if let Some(value) = header_value(line, &["THEME:", "ТЕМА:"]) {
            if !value.is_empty() {
                theme = Some(value.to_string());
            }
            continue;
        }
        if let Some(rest) = header_value(line, &["QUESTIONS:", "ВОПРОСЫ:"]) {
            section = Section::Questions;
            if !rest.is_empty() {
                questions.push(rest.to_string());
            }
            continue;
        }
        if let Some(rest) = header_value(line, &["ANSWERS:", "ОТВЕТЫ:"]) {
            section = Section::Answers;
            answers_text.push_str(rest);
            answers_text.push('\n');
            continue;
        }
        match section {
            Section::Preamble | Section::Questions => questions.push(line.trim_end().to_string()),
            Section::Answers => {
                answers_text.push_str(line);
                answers_text.push('\n');
            }
        }
    }

    let answers: BTreeMap<u32, String> = parse_answer_pairs(&answers_text).into_iter().collect();
    let questions_text = questions.join("\n").trim().to_string();
    Exam {
        questions_text,
        answers,
        theme: theme.unwrap_or_else(|| fallback_topic.trim().to_string()),
    }
}
