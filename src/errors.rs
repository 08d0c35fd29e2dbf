//! Unified application error type.
//! All modules (db, core, cli, export) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Identity
    // ---------------------------
    #[error("Authentication required: log in with `pomodash login <user>` or pass --user")]
    AuthRequired,

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid phase: {0}")]
    InvalidPhase(String),

    #[error("Invalid session status: {0}")]
    InvalidStatus(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    // ---------------------------
    // Timer logic errors
    // ---------------------------
    #[error("No active timer")]
    NoActiveTimer,

    #[error("A timer is already running")]
    TimerAlreadyRunning,

    #[error("Invalid timer transition: {0}")]
    InvalidTransition(String),

    #[error("Session {0} not found")]
    SessionNotFound(i64),

    #[error("Active timer for '{user}' was changed by another client")]
    VersionConflict { user: String },

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// True for the optimistic-locking failure on the checkpoint row.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::VersionConflict { .. })
    }
}

pub type AppResult<T> = Result<T, AppError>;
