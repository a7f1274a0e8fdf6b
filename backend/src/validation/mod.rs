//! JSON Schema validation for registry backups.
//!
//! A backup restore bypasses the mappers and goes straight to the store, so
//! its shape is checked first against an embedded Draft 7 schema:
//! an object with optional `schools`/`students` arrays (at least one of
//! them present) whose items carry an `id` (string or number) and a `name`.
//!
//! The schema is embedded at compile time from `schemas/backup.json`.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use educa_import::validate_backup;
//!
//! let backup = json!({ "schools": [{ "id": 1, "name": "Creche Sol" }] });
//! assert!(validate_backup(&backup).is_ok());
//!
//! assert!(validate_backup(&json!({ "students": "nope" })).is_err());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static BACKUP_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/backup.json"))
        .expect("Invalid embedded schema")
});

/// Validate `data` against `schema`.
///
/// Returns every validation error as a readable string.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Esquema inválido: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a backup payload against the embedded backup schema.
pub fn validate_backup(data: &Value) -> Result<(), Vec<String>> {
    validate(&BACKUP_SCHEMA, data)
}

/// Quick check against the backup schema.
pub fn is_valid_backup(data: &Value) -> bool {
    jsonschema::draft7::is_valid(&BACKUP_SCHEMA, data)
}
