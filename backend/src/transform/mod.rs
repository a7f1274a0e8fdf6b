//! Transformation module.
//!
//! This module turns decoded files into canonical records:
//! - Coerce: scalar coercers and free-text classifiers
//! - Aliases: canonical field → accepted source keys
//! - Mapper: generic school/student record mapping
//! - Educacenso: fixed-column census extraction
//! - Router: format detection and dispatch

pub mod aliases;
pub mod coerce;
pub mod educacenso;
pub mod mapper;
pub mod router;

pub use aliases::{AliasTable, SchoolField, StudentField, SCHOOL_ALIASES, STUDENT_ALIASES};
pub use coerce::*;
pub use educacenso::{
    classify_shift, extract_educacenso, CensusColumns, CensusMetadata, EducacensoExtract,
    EDUCACENSO_COLUMNS,
};
pub use mapper::{canonicalize_keys, map_schools, map_students, MappedBatch};
pub use router::{detect_format, is_json_file, route, FileFormat, ImportKind, RoutedImport};
