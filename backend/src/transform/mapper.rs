//! Record mappers: loosely-keyed rows to canonical [`School`] / [`Student`].
//!
//! Mapping is total. A row with nothing recognizable still yields a record
//! filled with defaults; only the caller decides whether a whole batch is
//! unusable.

use serde::Serialize;
use serde_json::{Map, Value};

use super::aliases::{SchoolField, StudentField, SCHOOL_ALIASES, STUDENT_ALIASES};
use super::coerce::{
    classify_school_categories, classify_status, digits_only, format_date, parse_affirmative,
    parse_capacity, parse_coordinate, parse_rating,
};
use crate::models::{School, Student, DEFAULT_SCHOOL_IMAGE};
use crate::parser::normalize_key;

const DEFAULT_SCHOOL_NAME: &str = "Escola Importada";
const DEFAULT_ADDRESS: &str = "Endereço não informado";
const DEFAULT_STUDENT_NAME: &str = "Aluno Sem Nome";

/// What an import produced, ready to be previewed.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MappedBatch {
    Schools {
        schools: Vec<School>,
    },
    Students {
        students: Vec<Student>,
    },
    /// Census students plus the school to create, if it is new.
    #[serde(rename_all = "camelCase")]
    Educacenso {
        students: Vec<Student>,
        pending_school: Option<School>,
    },
}

impl MappedBatch {
    /// Number of mapped records, not counting a pending school.
    pub fn len(&self) -> usize {
        match self {
            Self::Schools { schools } => schools.len(),
            Self::Students { students } | Self::Educacenso { students, .. } => students.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Current time in milliseconds, shared by every synthesized id of a batch.
pub(crate) fn batch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Copy a record with every key passed through [`normalize_key`].
///
/// When two source keys collapse to the same canonical key, the first
/// non-empty value is kept. Non-object records become empty rows.
pub fn canonicalize_keys(record: &Value) -> Map<String, Value> {
    let mut row = Map::new();
    let Some(obj) = record.as_object() else {
        return row;
    };

    for (key, value) in obj {
        let key = normalize_key(key);
        let replace = match row.get(&key) {
            None => true,
            Some(existing) => is_blank(existing) && !is_blank(value),
        };
        if replace {
            row.insert(key, value.clone());
        }
    }
    row
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// =============================================================================
// Schools
// =============================================================================

/// Map one canonical row to a school.
pub fn map_school(row: &Map<String, Value>, index: usize, batch_millis: i64) -> School {
    let get = |field| SCHOOL_ALIASES.resolve(row, field);
    let text = |field| SCHOOL_ALIASES.resolve_or_empty(row, field);

    School {
        id: get(SchoolField::Id).unwrap_or_else(|| format!("school_{}_{}", batch_millis, index)),
        inep: text(SchoolField::Inep),
        name: get(SchoolField::Name).unwrap_or_else(|| DEFAULT_SCHOOL_NAME.to_string()),
        address: get(SchoolField::Address).unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
        types: classify_school_categories(&text(SchoolField::Category)),
        image: get(SchoolField::Image).unwrap_or_else(|| DEFAULT_SCHOOL_IMAGE.to_string()),
        rating: parse_rating(&text(SchoolField::Rating)),
        available_slots: parse_capacity(&text(SchoolField::Capacity)),
        lat: parse_coordinate(&text(SchoolField::Latitude)),
        lng: parse_coordinate(&text(SchoolField::Longitude)),
    }
}

/// Map records to schools, preserving order.
pub fn map_schools(records: &[Value]) -> Vec<School> {
    map_schools_at(records, batch_millis())
}

/// [`map_schools`] with an explicit timestamp for synthesized ids.
pub fn map_schools_at(records: &[Value], batch_millis: i64) -> Vec<School> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| map_school(&canonicalize_keys(record), index, batch_millis))
        .collect()
}

// =============================================================================
// Students
// =============================================================================

/// Map one canonical row to a student.
pub fn map_student(row: &Map<String, Value>, index: usize, batch_millis: i64) -> Student {
    let get = |field| STUDENT_ALIASES.resolve(row, field);
    let text = |field| STUDENT_ALIASES.resolve_or_empty(row, field);

    let name = get(StudentField::Name).unwrap_or_else(|| DEFAULT_STUDENT_NAME.to_string());

    Student {
        id: get(StudentField::Id).unwrap_or_else(|| format!("student_{}_{}", batch_millis, index)),
        enrollment_id: text(StudentField::EnrollmentId),
        name: name.to_uppercase(),
        birth_date: format_date(&text(StudentField::BirthDate)),
        cpf: digits_only(&text(StudentField::NationalId)),
        status: classify_status(&text(StudentField::Status)),
        school: text(StudentField::School),
        grade: text(StudentField::Grade),
        shift: text(StudentField::Shift),
        class_name: text(StudentField::ClassName),
        class_id: text(StudentField::ClassId),
        transport_request: parse_affirmative(&text(StudentField::Transport)),
        transport_type: get(StudentField::TransportType),
        special_needs: parse_affirmative(&text(StudentField::SpecialNeeds)),
    }
}

/// Map records to students, preserving order.
pub fn map_students(records: &[Value]) -> Vec<Student> {
    map_students_at(records, batch_millis())
}

/// [`map_students`] with an explicit timestamp for synthesized ids.
pub fn map_students_at(records: &[Value], batch_millis: i64) -> Vec<Student> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| map_student(&canonicalize_keys(record), index, batch_millis))
        .collect()
}
