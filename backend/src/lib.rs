//! # Educa Import - school registry import pipeline
//!
//! Educa Import turns heterogeneous registry files (generic CSV, JSON record
//! arrays, JSON backups and the Educacenso class-roster export) into
//! canonical [`School`] and [`Student`] records, and merges them into a
//! dataset only after explicit confirmation.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌──────────────────┐   ┌────────────┐   ┌─────────┐
//! │ File bytes │──▶│  Decoder   │──▶│     Router       │──▶│ Transaction│──▶│  Store  │
//! │ (Latin-1)  │   │ (+chardet) │   │ CSV │ JSON │ Edu │   │  (preview) │   │(confirm)│
//! └────────────┘   └────────────┘   └──────────────────┘   └────────────┘   └─────────┘
//!                                     │ parser + mapper
//!                                     │ educacenso extractor
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use educa_import::{ImportOptions, ImportOutcome, ImportTransaction, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! let mut tx = ImportTransaction::new();
//!
//! let bytes = std::fs::read("alunos.csv")?;
//! if let ImportOutcome::Preview(preview) =
//!     tx.process("alunos.csv", &bytes, &mut store, ImportOptions::default())?
//! {
//!     println!("{} records to import", preview.batch.len());
//!     let summary = tx.confirm(&mut store)?;
//!     println!("{}", summary.message);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (School, Student, Dataset)
//! - [`parser`] - Decoding, key normalization and CSV parsing
//! - [`transform`] - Coercers, alias tables, mappers, Educacenso, routing
//! - [`transaction`] - Preview / confirm / cancel
//! - [`store`] - Dataset stores and backup export
//! - [`validation`] - Backup schema validation
//! - [`allocation`] - Unallocated students and per-school stats
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Import lifecycle
pub mod transaction;

// Persistence
pub mod store;

// Validation
pub mod validation;

// Dataset helpers
pub mod allocation;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ImportError, ImportResult, ServerError, StoreError, StoreResult,
    TransactionError, TransactionResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    BackupPayload, Dataset, EnrollmentStatus, School, SchoolCategory, Shift, Student,
    UNALLOCATED_SCHOOL,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, decode_json_content, detect_delimiter, detect_encoding, fold_text,
    normalize_key, parse_csv, ParseResult, TextEncoding,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    classify_school_categories, classify_shift, classify_status, detect_format,
    extract_educacenso, format_date, map_schools, map_students, parse_affirmative,
    parse_coordinate, route, EducacensoExtract, FileFormat, ImportKind, MappedBatch,
    RoutedImport,
};

// =============================================================================
// Re-exports - Transaction & Store
// =============================================================================

pub use transaction::{
    CommitSummary, ImportOptions, ImportOutcome, ImportTransaction, Preview, TransactionState,
};

pub use store::{backup, backup_file_name, DatasetStore, FileStore, MemoryStore};

// =============================================================================
// Re-exports - Validation, Allocation, Config
// =============================================================================

pub use validation::{is_valid_backup, validate, validate_backup};

pub use allocation::{
    allocate_unallocated, allocation_stats, class_names, school_stats, unallocated_count,
    AllocationStats,
};

pub use config::Config;

// =============================================================================
// Re-exports - Server
// =============================================================================

pub use api::server;
