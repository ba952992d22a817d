use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::config::ChatConfig;
use crate::dispatcher::TranslationDispatcher;
use crate::error::Result;

const RECENT_HISTORY: usize = 5;

/// In-loop commands; any other line is text to translate
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatCommand {
    Lang(Option<String>),
    History,
    Help,
}

impl ChatCommand {
    /// `:lang [code]`, `:history` or `:help`. Other text starting with ':' is
    /// not a command, so messages such as ":) merci" still get translated.
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.strip_prefix(':')?.split_whitespace();
        let command = match parts.next()? {
            "lang" => Self::Lang(parts.next().map(str::to_lowercase)),
            "history" => Self::History,
            "help" => Self::Help,
            _ => return None,
        };
        Some(command)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatStats {
    pub translated: usize,
    pub failed: usize,
}

/// Line-oriented conversation for one user
pub struct ChatSession<'a> {
    dispatcher: &'a mut TranslationDispatcher,
    user_id: String,
    config: ChatConfig,
}

impl<'a> ChatSession<'a> {
    pub fn new(dispatcher: &'a mut TranslationDispatcher, user_id: &str, config: ChatConfig) -> Self {
        Self {
            dispatcher,
            user_id: user_id.to_string(),
            config,
        }
    }

    /// Run until the exit word or end of input.
    /// Errors from a single line are reported to `output` and the loop goes on.
    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> Result<ChatStats>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let profile = self.dispatcher.profile(&self.user_id);
        write_line(output, "Welcome to the Conversational Translator!").await?;
        write_line(
            output,
            &format!(
                "Type '{}' to end the conversation, ':lang <code>' to change your target language ({}).",
                self.config.exit_word, profile.target_lang
            ),
        )
        .await?;

        let mut stats = ChatStats::default();
        let mut lines = input.lines();

        loop {
            output.write_all(self.config.prompt.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                write_line(output, "").await?;
                break;
            };
            let line = line.trim();

            if line.eq_ignore_ascii_case(&self.config.exit_word) {
                write_line(output, "Goodbye!").await?;
                break;
            }
            if line.is_empty() {
                continue;
            }

            if let Some(command) = ChatCommand::parse(line) {
                self.run_command(command, output).await?;
                continue;
            }

            match self.dispatcher.translate(line, &self.user_id).await {
                Ok(translation) => {
                    stats.translated += 1;
                    write_line(output, &format!("Translated Text: {}", translation.text)).await?;
                    if let Some(e) = translation.history_error {
                        write_line(output, &format!("(not saved to history: {})", e.user_message()))
                            .await?;
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!("Translation failed for {}: {}", self.user_id, e);
                    write_line(output, &e.user_message()).await?;
                }
            }
        }

        info!(
            "Chat with {} ended: {} translated, {} failed",
            self.user_id, stats.translated, stats.failed
        );
        Ok(stats)
    }

    async fn run_command<W>(&mut self, command: ChatCommand, output: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            ChatCommand::Lang(Some(code)) => {
                match self.dispatcher.register(&self.user_id, &code).await {
                    Ok(profile) => {
                        write_line(output, &format!("Target language set to {}", profile.target_lang))
                            .await?
                    }
                    Err(e) => write_line(output, &e.user_message()).await?,
                }
            }
            ChatCommand::Lang(None) => {
                let profile = self.dispatcher.profile(&self.user_id);
                write_line(output, &format!("Target language is {}", profile.target_lang)).await?;
            }
            ChatCommand::History => {
                match self
                    .dispatcher
                    .history()
                    .entries_for(&self.user_id, Some(RECENT_HISTORY))
                    .await
                {
                    Ok(entries) if entries.is_empty() => {
                        write_line(output, "No translations yet.").await?
                    }
                    Ok(entries) => {
                        for entry in entries {
                            write_line(
                                output,
                                &format!("{}  {} -> {}", entry.timestamp.datetime, entry.input_text, entry.translated_text),
                            )
                            .await?;
                        }
                    }
                    Err(e) => write_line(output, &e.user_message()).await?,
                }
            }
            ChatCommand::Help => {
                write_line(output, "Commands: :lang [code], :history, :help").await?;
            }
        }
        Ok(())
    }
}

async fn write_line<W>(output: &mut W, line: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    Ok(())
}
