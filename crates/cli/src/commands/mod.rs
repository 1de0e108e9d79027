//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod token;

use storekeep_admin::config::ConfigError;
use storekeep_admin::services::IdentityError;

/// Errors surfaced by any subcommand.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid seed data: {0}")]
    Seed(String),

    #[error("token error: {0}")]
    Token(#[from] IdentityError),
}
