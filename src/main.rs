//! Tolk - Conversational Translator
//!
//! Entry point for the `tolk` binary: loads configuration, sets up logging and
//! runs the requested command against the translation dispatcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use tracing_appender::{non_blocking, rolling};

use tolk::chat::ChatSession;
use tolk::cli::{Args, Commands};
use tolk::config::Config;
use tolk::dispatcher::TranslationDispatcher;
use tolk::error::TolkError;

const DEFAULT_CONFIG_FILE: &str = "tolk.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Writing the default configuration needs neither logging nor the data directory
    if let Commands::Init { output } = &args.command {
        return write_default_config(output);
    }

    // Load configuration
    let config = load_config(args.config.as_deref())?;

    // Setup logging to both console and file
    setup_logging(&config.storage.data_dir, args.verbose)?;
    info!("Starting Tolk - Conversational Translator");

    let mut dispatcher = TranslationDispatcher::from_config(&config).await?;
    run(args.command, &config, &mut dispatcher).await?;

    info!("Tolk finished");
    Ok(())
}

/// Explicit `--config`, else `./tolk.toml` when present, else defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Config::from_file(DEFAULT_CONFIG_FILE)?,
        None => Config::default(),
    };
    Ok(config)
}

fn write_default_config(output: &Path) -> Result<()> {
    Config::default().save_to_file(output)?;
    println!("Wrote default configuration to {}", output.display());
    Ok(())
}

async fn run(command: Commands, config: &Config, dispatcher: &mut TranslationDispatcher) -> Result<()> {
    match command {
        Commands::Chat { user } => {
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            ChatSession::new(dispatcher, &user, config.chat.clone())
                .run(stdin, &mut stdout)
                .await?;
        }
        Commands::Register { user, lang } => {
            let mut stdin = BufReader::new(tokio::io::stdin()).lines();
            let user = match user {
                Some(user) => user,
                None => prompt(&mut stdin, "User id: ").await?,
            };
            let lang = match lang {
                Some(lang) => lang,
                None => prompt(&mut stdin, "Target language code: ").await?,
            };

            let profile = dispatcher.register(&user, &lang.to_lowercase()).await?;
            println!("Registered {} with target language {}", user, profile.target_lang);
        }
        Commands::Translate { user, text } => {
            let text = text.join(" ");

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} [{elapsed}]")
                    .map_err(|e| anyhow::anyhow!("Invalid progress template: {}", e))?,
            );
            spinner.set_message("Translating...");
            spinner.enable_steady_tick(Duration::from_millis(100));

            let result = dispatcher.translate(&text, &user).await;
            spinner.finish_and_clear();

            match result {
                Ok(translation) => {
                    println!("Translated Text: {}", translation.text);
                    if let Some(e) = translation.history_error {
                        eprintln!("Warning: {}", e.user_message());
                    }
                }
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    return Err(e.into());
                }
            }
        }
        Commands::Profile { user } => {
            let known = dispatcher.profiles().contains(&user);
            let profile = dispatcher.profile(&user);
            println!("User:            {}", user);
            println!("Target language: {}", profile.target_lang);
            if !known {
                println!("(not registered, using the default)");
            }
        }
        Commands::History { user, limit } => {
            let entries = match &user {
                Some(user) => dispatcher.history().entries_for(user, limit).await?,
                None => {
                    let mut entries = dispatcher.history().entries().await?;
                    if let Some(limit) = limit {
                        let skip = entries.len().saturating_sub(limit);
                        entries.drain(..skip);
                    }
                    entries
                }
            };

            if entries.is_empty() {
                println!("No translations recorded.");
            } else {
                println!("{:<28} {:<8} {:<12} {:<30} {:<30}", "Time", "Zone", "User", "Input", "Translation");
                println!("{}", "-".repeat(110));
                for entry in entries {
                    println!(
                        "{:<28} {:<8} {:<12} {:<30} {:<30}",
                        entry.timestamp.datetime,
                        entry.timestamp.timezone,
                        entry.user_id,
                        preview(&entry.input_text, 30),
                        preview(&entry.translated_text, 30)
                    );
                }
            }
        }
        Commands::Init { output } => write_default_config(&output)?,
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(data_dir: &Path, verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir: PathBuf = data_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "tolk.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level; the console stays quiet so it does not clutter the chat
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    let console_level = if verbose { Level::DEBUG } else { Level::WARN };

    // Console layer goes to stderr, stdout belongs to the conversation
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(tracing_subscriber::filter::LevelFilter::from_level(console_level));

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - level: {}, file: {}", log_level, log_dir.join("tolk.log").display());

    Ok(())
}

/// Ask for a value on stdin until a non-empty line is given
async fn prompt<R>(lines: &mut tokio::io::Lines<R>, label: &str) -> Result<String>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(label.as_bytes()).await?;
        stdout.flush().await?;

        match lines.next_line().await? {
            Some(line) if !line.trim().is_empty() => return Ok(line.trim().to_string()),
            Some(_) => continue,
            None => return Err(TolkError::Config(format!("No value given for '{}'", label.trim_end_matches(": "))).into()),
        }
    }
}

/// Shorten text for table output
fn preview(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
