use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

use epicanimes_chatbot::{ChatbotEngine, Role, Settings};

/// Usage: `chatbot [CONFIG] [ROLE]`. Answers one question per stdin line,
/// printing one JSON object per answer.
fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    // a config named on the command line must exist; the default one is optional
    let (config_name, config_required) = match args.next() {
        Some(name) => (name, true),
        None => ("Config".to_string(), false),
    };
    let role = match args.next() {
        Some(label) => Some(label.parse::<Role>().map_err(anyhow::Error::msg)?),
        None => None,
    };

    let settings = Settings::load(&config_name, config_required)
        .with_context(|| format!("Failed to load settings from '{}'", config_name))?;
    let engine = ChatbotEngine::from_settings(&settings);
    if let Err(e) = engine.warm_up() {
        log::error!("FAQ resource unusable, chatbot disabled: {}", e);
        return Err(e.into());
    }
    log::info!("Chatbot ready (role: {})", role.unwrap_or_default());

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let result = engine.answer(&line, role);
        writeln!(stdout, "{}", serde_json::to_string(&result)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}
