//! Error types for the import pipeline.
//!
//! This module defines one error type per layer:
//!
//! - [`ImportError`] - reading, routing and mapping a single file
//! - [`StoreError`] - dataset store persistence
//! - [`TransactionError`] - preview/confirm/cancel lifecycle
//! - [`ServerError`] - HTTP surface
//! - [`ConfigError`] - environment configuration
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. User-facing messages are
//! Portuguese, like the rest of the registry.

use thiserror::Error;

// =============================================================================
// Import Errors
// =============================================================================

/// Errors raised while turning a file into canonical records.
///
/// Every variant is terminal for the current import attempt; the caller
/// recovers by retrying with another file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// File name and content match none of the routed formats.
    #[error("Formato não suportado: {0}")]
    UnsupportedFormat(String),

    /// JSON syntax error, empty JSON array or zero usable CSV rows.
    #[error("{0}")]
    EmptyOrInvalidPayload(String),

    /// The census table was reached but no row carried both id and name.
    #[error("Nenhum aluno encontrado no arquivo do Educacenso.")]
    EducacensoNoRecords,

    /// The underlying read failed (I/O level, not format level).
    #[error("Erro de leitura do arquivo: {0}")]
    ReadFailure(String),

    /// A backup payload was rejected by the embedded schema.
    #[error("Backup inválido: {}", .0.join("; "))]
    InvalidBackup(Vec<String>),

    /// JSON (de)serialization failure.
    #[error("Formato JSON inválido ou vazio: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::ReadFailure(err.to_string())
    }
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from a dataset store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Transaction Errors
// =============================================================================

/// Errors from the import transaction lifecycle.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Confirm or cancel was called without a held preview.
    #[error("Nenhuma importação pendente")]
    NoPreview,

    /// A file is already being processed in this context.
    #[error("Já existe uma importação em andamento")]
    Busy,

    /// Import failed while processing.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// The store rejected the commit.
    #[error("Erro ao gravar dados: {0}")]
    Store(#[from] StoreError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Transaction error.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
