//! Domain models for the registry import pipeline.
//!
//! This module contains the canonical records produced by every import path:
//!
//! - [`School`] - a school unit with categories, capacity and coordinates
//! - [`Student`] - an enrollment record referencing a school by display name
//! - [`SchoolCategory`] - education stage offered by a school
//! - [`EnrollmentStatus`] - enrollment workflow status
//! - [`Shift`] - class shift derived from census schedules
//! - [`Dataset`] - the `{ schools, students }` backup shape
//!
//! Field names serialize in camelCase so backups written by the web
//! registry round-trip unchanged.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sentinel school name meaning "not allocated to any school".
///
/// An empty school reference means the same thing; see
/// [`Student::is_unallocated`].
pub const UNALLOCATED_SCHOOL: &str = "Não alocada";

/// Image used when a source row has none.
pub const DEFAULT_SCHOOL_IMAGE: &str =
    "https://images.unsplash.com/photo-1523050854058-8df90110c9f1?auto=format&fit=crop&q=80";

/// Rating used when a source row has no usable rating.
pub const DEFAULT_RATING: f64 = 4.5;

// =============================================================================
// School Category
// =============================================================================

/// Education stage offered by a school.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SchoolCategory {
    /// Creche and pre-school.
    #[serde(rename = "Educação Infantil")]
    EarlyChildhood,
    /// Primary school, years 1-5.
    #[serde(rename = "Fundamental I")]
    PrimaryEarly,
    /// Primary school, years 6-9.
    #[serde(rename = "Fundamental II")]
    PrimaryLate,
    /// Secondary school.
    #[serde(rename = "Ensino Médio")]
    Secondary,
    /// Youth and adult education.
    #[serde(rename = "EJA")]
    AdultEducation,
}

impl SchoolCategory {
    /// Display label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EarlyChildhood => "Educação Infantil",
            Self::PrimaryEarly => "Fundamental I",
            Self::PrimaryLate => "Fundamental II",
            Self::Secondary => "Ensino Médio",
            Self::AdultEducation => "EJA",
        }
    }
}

// =============================================================================
// Enrollment Status
// =============================================================================

/// Enrollment status of a student.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum EnrollmentStatus {
    #[default]
    #[serde(rename = "Matriculado")]
    Enrolled,
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Em Análise")]
    UnderReview,
}

impl EnrollmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Enrolled => "Matriculado",
            Self::Pending => "Pendente",
            Self::UnderReview => "Em Análise",
        }
    }
}

// =============================================================================
// Shift
// =============================================================================

/// Class shift as classified from census schedule text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shift {
    Morning,
    Afternoon,
    #[default]
    FullDay,
}

impl Shift {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Matutino",
            Self::Afternoon => "Vespertino",
            Self::FullDay => "Integral",
        }
    }
}

// =============================================================================
// School
// =============================================================================

/// A school unit.
///
/// `types` is never empty for records built by the mappers; backups are
/// trusted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct School {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// INEP registry code.
    #[serde(default)]
    pub inep: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub types: Vec<SchoolCategory>,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_rating")]
    pub rating: f64,
    /// Capacity in seats.
    #[serde(default)]
    pub available_slots: i64,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
}

fn default_image() -> String {
    DEFAULT_SCHOOL_IMAGE.to_string()
}

fn default_rating() -> f64 {
    DEFAULT_RATING
}

/// Registry ids written by older tools may be numeric.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

// =============================================================================
// Student
// =============================================================================

/// A student enrollment record.
///
/// `school` references a [`School`] by display name, not by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Enrollment or protocol number.
    #[serde(default)]
    pub enrollment_id: String,
    /// Always upper-cased.
    pub name: String,
    /// `DD/MM/YYYY`, or empty.
    #[serde(default)]
    pub birth_date: String,
    /// National id (CPF), digits only.
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub shift: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub transport_request: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<String>,
    #[serde(default)]
    pub special_needs: bool,
}

impl Student {
    /// True when the school reference is empty or the "Não alocada" sentinel.
    pub fn is_unallocated(&self) -> bool {
        self.school.is_empty() || self.school == UNALLOCATED_SCHOOL
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Full registry contents, as written by a backup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    #[serde(default)]
    pub schools: Vec<School>,
    #[serde(default)]
    pub students: Vec<Student>,
}

/// A backup restore payload; either collection may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupPayload {
    pub schools: Option<Vec<School>>,
    pub students: Option<Vec<Student>>,
}

// =============================================================================
// Tests
// =============================================================================
