//! Format routing: decide what a file is and send it to the right mapper.
//!
//! Decision order:
//!
//! 1. `*.json` - a `{ schools, students }` object is a backup restore,
//!    a non-empty array is mapped as schools or students.
//! 2. `*.csv`, or any content carrying the ministry marker - a census export
//!    goes to the Educacenso extractor, anything else to the CSV parser.
//! 3. Anything else is unsupported.
//!
//! Extension checks are case-insensitive.

use serde::Serialize;
use serde_json::Value;

use super::aliases::{CSV_SCHOOL_KEYS, JSON_SCHOOL_KEYS};
use super::educacenso::extract_educacenso;
use super::mapper::{batch_millis, canonicalize_keys, map_schools_at, map_students_at, MappedBatch};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{ImportError, ImportResult};
use crate::models::{BackupPayload, School};
use crate::parser::parse_csv;
use crate::validation::validate_backup;

/// Literal that identifies a government census export.
pub const MINISTRY_MARKER: &str = "Ministério da Educação";
/// Secondary census marker.
pub const EDUCACENSO_MARKER: &str = "Educacenso";

const EMPTY_JSON_MESSAGE: &str = "Formato JSON inválido ou vazio.";
const EMPTY_CSV_MESSAGE: &str = "Arquivo CSV vazio ou inválido.";

/// Detected file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Educacenso,
    Csv,
}

/// What kind of data an import carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Backup,
    Schools,
    Students,
    Educacenso,
}

/// Outcome of routing one file.
#[derive(Debug, Clone)]
pub enum RoutedImport {
    /// Full backup; committed without preview.
    Backup(BackupPayload),
    /// Mapped records awaiting confirmation.
    Records(MappedBatch),
}

impl RoutedImport {
    pub fn kind(&self) -> ImportKind {
        match self {
            Self::Backup(_) => ImportKind::Backup,
            Self::Records(batch) => batch.kind(),
        }
    }
}

impl MappedBatch {
    pub fn kind(&self) -> ImportKind {
        match self {
            Self::Schools { .. } => ImportKind::Schools,
            Self::Students { .. } => ImportKind::Students,
            Self::Educacenso { .. } => ImportKind::Educacenso,
        }
    }
}

fn has_extension(file_name: &str, ext: &str) -> bool {
    file_name.to_lowercase().ends_with(ext)
}

/// True for `.json` file names, in any case.
pub fn is_json_file(file_name: &str) -> bool {
    has_extension(file_name, ".json")
}

/// Detect the format of a file from its name and decoded content.
pub fn detect_format(file_name: &str, text: &str) -> ImportResult<FileFormat> {
    if has_extension(file_name, ".json") {
        return Ok(FileFormat::Json);
    }

    let ministry = text.contains(MINISTRY_MARKER);
    if has_extension(file_name, ".csv") || ministry {
        if ministry || text.contains(EDUCACENSO_MARKER) {
            return Ok(FileFormat::Educacenso);
        }
        return Ok(FileFormat::Csv);
    }

    Err(ImportError::UnsupportedFormat(file_name.to_string()))
}

/// Route a decoded file to the matching mapper.
///
/// `existing_schools` is only consulted for census exports, to decide
/// whether the export's school must be created.
pub fn route(file_name: &str, text: &str, existing_schools: &[School]) -> ImportResult<RoutedImport> {
    let format = detect_format(file_name, text)?;
    log_info(format!("Formato detectado: {:?}", format));

    match format {
        FileFormat::Json => route_json(text),
        FileFormat::Educacenso => route_educacenso(text, existing_schools),
        FileFormat::Csv => route_csv(text),
    }
}

fn route_json(text: &str) -> ImportResult<RoutedImport> {
    let value: Value = serde_json::from_str(text)?;
    let is_backup = value
        .as_object()
        .is_some_and(|obj| obj.contains_key("schools") || obj.contains_key("students"));

    match value {
        Value::Object(_) if is_backup => {
            validate_backup(&value).map_err(ImportError::InvalidBackup)?;
            let payload: BackupPayload = serde_json::from_value(value)?;
            log_success(format!(
                "Backup: {} escolas, {} alunos",
                payload.schools.as_ref().map_or(0, Vec::len),
                payload.students.as_ref().map_or(0, Vec::len)
            ));
            Ok(RoutedImport::Backup(payload))
        }
        Value::Array(items) if !items.is_empty() => {
            let sample = canonicalize_keys(&items[0]);
            let millis = batch_millis();
            let batch = if JSON_SCHOOL_KEYS.iter().any(|k| sample.contains_key(*k)) {
                MappedBatch::Schools { schools: map_schools_at(&items, millis) }
            } else {
                MappedBatch::Students { students: map_students_at(&items, millis) }
            };
            log_success(format!("{} registros JSON mapeados como {:?}", batch.len(), batch.kind()));
            Ok(RoutedImport::Records(batch))
        }
        _ => Err(ImportError::EmptyOrInvalidPayload(EMPTY_JSON_MESSAGE.to_string())),
    }
}

fn route_educacenso(text: &str, existing_schools: &[School]) -> ImportResult<RoutedImport> {
    let extract = extract_educacenso(text, existing_schools).ok_or(ImportError::EducacensoNoRecords)?;

    let meta = &extract.metadata;
    log_info_indent(
        format!("Escola: {} (código '{}', {})", meta.school_name, meta.school_code, meta.municipality),
        1,
    );
    match &extract.pending_school {
        Some(school) => log_warning(format!("Escola nova será criada: {}", school.name)),
        None => log_info_indent("Escola já cadastrada", 1),
    }
    log_success(format!("{} alunos extraídos do Educacenso", extract.students.len()));

    Ok(RoutedImport::Records(extract.into()))
}

fn route_csv(text: &str) -> ImportResult<RoutedImport> {
    let parsed = parse_csv(text);
    log_info_indent(
        format!("Delimitador '{}', {} linhas", parsed.delimiter, parsed.records.len()),
        1,
    );

    if parsed.records.is_empty() {
        return Err(ImportError::EmptyOrInvalidPayload(EMPTY_CSV_MESSAGE.to_string()));
    }

    let is_school_list = parsed
        .headers
        .iter()
        .any(|h| CSV_SCHOOL_KEYS.contains(&h.as_str()));
    let millis = batch_millis();
    let batch = if is_school_list {
        MappedBatch::Schools { schools: map_schools_at(&parsed.records, millis) }
    } else {
        MappedBatch::Students { students: map_students_at(&parsed.records, millis) }
    };
    log_success(format!("{} registros CSV mapeados como {:?}", batch.len(), batch.kind()));

    Ok(RoutedImport::Records(batch))
}
