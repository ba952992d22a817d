use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive translation chat
    Chat {
        /// User id whose profile and history are used
        #[arg(short, long)]
        user: String,
    },

    /// Register a user and their target language
    Register {
        /// User id (prompted for when omitted)
        #[arg(short, long)]
        user: Option<String>,

        /// Target language code (prompted for when omitted)
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Translate a single piece of text
    Translate {
        /// User id whose target language is used
        #[arg(short, long)]
        user: String,

        /// Text to translate
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show a user's profile
    Profile {
        /// User id
        #[arg(short, long)]
        user: String,
    },

    /// List recorded translations
    History {
        /// Only show entries for this user
        #[arg(short, long)]
        user: Option<String>,

        /// Show at most this many of the most recent entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Write the default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(short, long, default_value = "tolk.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_joins_words() {
        let args = Args::parse_from(["tolk", "translate", "--user", "alice", "Bonjour", "le", "monde"]);
        match args.command {
            Commands::Translate { user, text } => {
                assert_eq!(user, "alice");
                assert_eq!(text.join(" "), "Bonjour le monde");
            }
            _ => panic!("expected translate command"),
        }
    }

    #[test]
    fn test_register_values_are_optional() {
        let args = Args::parse_from(["tolk", "-v", "register", "-u", "bob"]);
        assert!(args.verbose);
        match args.command {
            Commands::Register { user, lang } => {
                assert_eq!(user.as_deref(), Some("bob"));
                assert!(lang.is_none());
            }
            _ => panic!("expected register command"),
        }
    }
}
