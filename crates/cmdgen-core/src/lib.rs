//! # cmdgen-core
//!
//! Core pipeline for the cmdgen command generator.
//!
//! This crate provides:
//! - Layered settings resolution (flag > env > config file > default)
//! - Availability probing and bootstrap of the local inference server
//! - A chat-completion client speaking two wire protocols
//! - Prompt construction per language/shell mode
//! - Response cleaning and one-liner/script classification
//! - Script materialization under a date-partitioned output directory
//! - The edit/append workflow with diff review and confirm/revert

mod availability;
mod classify;
mod client;
mod config;
mod edit;
mod error;
mod label;
mod materialize;
mod mode;
mod prompt;

pub use availability::{BackendKind, ensure_available};
pub use classify::{ONELINER_MAX_CHARS, ReplyKind, classify, clean};
pub use client::{ChatExchange, OLLAMA_DEFAULT_MODEL, query};
pub use config::{
    ConfigFile, Overrides, PromptOverrides, PromptsSection, Settings, find_config, load_config,
};
pub use edit::{
    EditOutcome, EditSession, FileOp, MAX_RETRY_ROUNDS, accepts_change, lowered_temperature,
    run_edit_workflow, wants_retry,
};
pub use error::Error;
pub use materialize::save_script;
pub use mode::Mode;
pub use prompt::{PromptFlags, build_prompts};
