//! Shared types, error model, and configuration for the link catalog bot.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`LinkCatalogError`]: the unified error type
//! - Domain types ([`ExtractedContent`], [`CategoryKey`], [`CatalogEntry`],
//!   [`PendingSession`], [`ConversationId`])
//! - Configuration ([`AppConfig`], config loading, secret lookup)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, GitHubConfig, OpenAiConfig, ServerConfig, SocialPlatform,
    TelegramConfig, config_dir, config_file_path, init_config_at, load_config,
    load_config_from, read_secret,
};
pub use error::{LinkCatalogError, Result};
pub use types::{
    CatalogEntry, CategoryKey, ContentEntry, ConversationId, ExtractedContent, PendingSession,
    PersonEntry, PromptEntry, ToolEntry,
};
