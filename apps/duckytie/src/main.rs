mod cli;
mod config;

use clap::Parser;
use cli::Cli;
use config::AppConfig;
use duckytie_audio::{SayOptions, Speaker};
use duckytie_core::supported_languages;
use std::time::Duration;
use tokio::signal;
use tracing::info;

const DEMO_SCRIPT: [&str; 3] = [
    "Marshall Eriksen says: \
     Hey, what do you guys think of my new ducky tie? \
     Pretty cute, right? \
     And not that much more expensive than a regular tie.",
    "The ducky tie team has a special message for you. \
     Remember: you are worthy of love!",
    "This is the main module. This program has finished. Thanks for running it!",
];

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    if cli.list_languages {
        for lang in supported_languages() {
            println!("{:<6} {}", lang.code, lang.name);
        }
        return Ok(());
    }

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = AppConfig::load(cli.config.as_deref())?;
    let opts = cli.say_options(cfg.say.clone());
    let mut speaker = Speaker::new(cfg.speaker)?;

    tokio::select! {
        res = run(&mut speaker, cli.text.as_deref(), &opts) => res?,
        _ = signal::ctrl_c() => {
            info!(target = "duckytie", "Interrupted; audio device released");
            println!("Program was interrupted by the user.");
        }
    }
    Ok(())
}

async fn run(speaker: &mut Speaker, text: Option<&str>, opts: &SayOptions) -> duckytie_core::Result<()> {
    match text {
        Some(text) => {
            speaker.say(text, opts).await?;
        }
        None => {
            for (i, line) in DEMO_SCRIPT.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                speaker.say(line, opts).await?;
            }
        }
    }
    Ok(())
}
