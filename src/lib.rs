//! Tolk - Conversational Translator
//!
//! Detects the language of each message, translates it with the pretrained
//! model for the detected language pair, and keeps per-user profiles and
//! translation history in JSON files.

pub mod cli;
pub mod config;
pub mod error;
pub mod store;
pub mod profile;
pub mod history;
pub mod detect;
pub mod translate;
pub mod dispatcher;
pub mod chat;
