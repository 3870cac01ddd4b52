use std::io::Write;

use clap::Parser;
use tokio::io::{self, AsyncBufReadExt};
use tracing_subscriber::EnvFilter;

use lumira::domains::state::DialogState;
use lumira::error::{LumiraError, Result};
use lumira::{Config, Lumira};

const WELCOME: &str = "Привет! Я Lumira, помощник в учёбе.\n\
Задайте вопрос, попросите тест по теме, пришлите ответы на тест\n\
или напишите «прогресс», чтобы посмотреть результаты. Для выхода введите exit.";

#[derive(Parser, Debug)]
#[command(name = "lumira")]
#[command(about = "Lumira study assistant (console)")]
struct Cli {
    #[arg(long, help = "SQLite database path (overrides LUMIRA_DB_PATH and DATABASE_URL)")]
    db: Option<String>,

    #[arg(short, long, help = "Answer a single prompt and exit")]
    prompt: Option<String>,
}

fn print_prompt() -> Result<()> {
    print!("> ");
    std::io::stdout()
        .flush()
        .map_err(|e| LumiraError::Runtime(e.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,lumira=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.database.sqlite_path = db;
    }
    let lumira = Lumira::from_config(config).await?;
    let assistant = lumira.assistant();
    let mut state = DialogState::new();

    if let Some(prompt) = &cli.prompt {
        let (answer, _) = assistant.process(prompt, state).await?;
        println!("{answer}");
        return Ok(());
    }

    println!("{WELCOME}");
    let stdin = io::BufReader::new(io::stdin());
    let mut lines = stdin.lines();
    loop {
        print_prompt()?;
        let line = lines
            .next_line()
            .await
            .map_err(|e| LumiraError::Runtime(e.to_string()))?;
        let Some(line) = line else {
            println!();
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("exit") {
            println!("До встречи!");
            break;
        }
        match assistant.process(text, state.clone()).await {
            Ok((answer, next)) => {
                state = next;
                println!("{answer}\n");
            }
            Err(err) => eprintln!("Ошибка: {err}\n"),
        }
    }

    Ok(())
}
