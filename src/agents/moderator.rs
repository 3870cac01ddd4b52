use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::interfaces::providers::LlmProvider;

const MODERATOR_PROMPT: &str = "You are the Moderator of a study assistant.\n\
Classify the user's request and reply with exactly two integers separated by a space:\n\
<agent> <change_topic>\n\
\n\
agent:\n\
1 - tutor: explain a topic, answer a question, discuss material\n\
2 - examiner: the user asks for a test or quiz\n\
3 - analyser: the user sends answers to a test, e.g. \"1a 2c 3b\"\n\
4 - problem solver: the user wants a concrete problem solved step by step\n\
5 - summarizer: the user sends a long text (article, lecture, OCR output) to summarize\n\
\n\
change_topic: 1 if the request introduces a new study topic, otherwise 0.\n\
Reply with the two numbers only.";

static WHOLE_ANSWER_SHEET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d+\s*[-.:)]?\s*[a-d]\s*[,;]?\s*)+$").unwrap()
});
static NUMBERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Tutor,
    Examiner,
    Analyser,
    ProblemSolver,
    Summarizer,
    Unknown(u32),
}

impl AgentKind {
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => AgentKind::Tutor,
            2 => AgentKind::Examiner,
            3 => AgentKind::Analyser,
            4 => AgentKind::ProblemSolver,
            5 => AgentKind::Summarizer,
            other => AgentKind::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    pub agent: AgentKind,
    pub change_topic: bool,
}

/// True when the whole message is a test answer sheet like `1a 2c 3b`.
pub fn is_answer_sheet(text: &str) -> bool {
    WHOLE_ANSWER_SHEET.is_match(text)
}

pub async fn route(llm: &dyn LlmProvider, text: &str) -> Result<Routing> {
    if is_answer_sheet(text) {
        return Ok(Routing {
            agent: AgentKind::Analyser,
            change_topic: false,
        });
    }

    let reply = llm.generate_text(text, MODERATOR_PROMPT).await?;
    let routing = parse_reply(&reply);
    debug!(?routing, reply = %reply.trim(), "moderator decision");
    Ok(routing)
}

pub fn parse_reply(reply: &str) -> Routing {
    let mut numbers = NUMBERS
        .find_iter(reply)
        .filter_map(|m| m.as_str().parse::<u32>().ok());
    match numbers.next() {
        Some(agent) => Routing {
            agent: AgentKind::from_id(agent),
            change_topic: numbers.next() == Some(1),
        },
        None => Routing {
            agent: AgentKind::Tutor,
            change_topic: false,
        },
    }
}
