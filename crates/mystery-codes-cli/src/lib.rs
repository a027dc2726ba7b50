//! Mystery Codes CLI — batch generation and history on top of the acquisition pipeline.

pub mod batch;
pub mod commands;
pub mod config;
pub mod history;

pub use batch::{describe_failure, run_batch, BatchReport};
pub use config::{resolve_config_path, resolve_history_path};
pub use history::{HistoryStore, StoredCode};
