//! Field alias tables.
//!
//! Each canonical field lists the normalized source keys it accepts, in
//! priority order. [`AliasTable::resolve`] takes the first alias whose value
//! is non-empty. Adding a new source label means adding one string here.
//!
//! Aliases are compared against keys already passed through
//! [`crate::parser::normalize_key`], so they must be lower-case ASCII
//! alphanumerics.

use serde_json::{Map, Value};

/// Canonical school fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchoolField {
    Id,
    Inep,
    Name,
    Address,
    Category,
    Image,
    Rating,
    Capacity,
    Latitude,
    Longitude,
}

/// Canonical student fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudentField {
    Id,
    EnrollmentId,
    Name,
    NationalId,
    BirthDate,
    Status,
    School,
    Grade,
    Shift,
    ClassName,
    ClassId,
    Transport,
    TransportType,
    SpecialNeeds,
}

/// An ordered alias list per canonical field.
#[derive(Debug)]
pub struct AliasTable<F: 'static> {
    entries: &'static [(F, &'static [&'static str])],
}

impl<F: Copy + PartialEq> AliasTable<F> {
    pub const fn new(entries: &'static [(F, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    /// Accepted aliases for `field`, in priority order.
    pub fn aliases(&self, field: F) -> &'static [&'static str] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }

    /// Every `(field, aliases)` entry.
    pub fn entries(&self) -> &'static [(F, &'static [&'static str])] {
        self.entries
    }

    /// First non-empty value among the aliases of `field`, trimmed.
    pub fn resolve(&self, row: &Map<String, Value>, field: F) -> Option<String> {
        self.aliases(field)
            .iter()
            .filter_map(|alias| row.get(*alias))
            .filter_map(value_text)
            .find(|text| !text.is_empty())
    }

    /// Like [`resolve`](Self::resolve) but returns an empty string when absent.
    pub fn resolve_or_empty(&self, row: &Map<String, Value>, field: F) -> String {
        self.resolve(row, field).unwrap_or_default()
    }
}

/// Text of a scalar JSON value; null, arrays and objects have none.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

const SCHOOL_ENTRIES: &[(SchoolField, &[&str])] = &[
    (SchoolField::Id, &["id", "codigo"]),
    (SchoolField::Inep, &["inep", "codigo", "codinep"]),
    (SchoolField::Name, &["nome", "name", "escola", "unidade"]),
    (SchoolField::Address, &["endereco", "address", "localizacao"]),
    (SchoolField::Category, &["tipo", "types", "modalidade"]),
    (SchoolField::Image, &["image", "imagem"]),
    (SchoolField::Rating, &["rating", "nota", "avaliacao"]),
    (SchoolField::Capacity, &["capacidade", "vagas", "availableslots"]),
    (SchoolField::Latitude, &["lat", "latitude"]),
    (SchoolField::Longitude, &["lng", "longitude"]),
];

pub static SCHOOL_ALIASES: AliasTable<SchoolField> = AliasTable::new(SCHOOL_ENTRIES);

const STUDENT_ENTRIES: &[(StudentField, &[&str])] = &[
    (StudentField::Id, &["id", "matricula", "codigo", "ra"]),
    (StudentField::EnrollmentId, &["enrollmentid", "protocolo", "matricula", "codigomatricula"]),
    (StudentField::Name, &["name", "nome", "nomedoaluno", "aluno"]),
    (StudentField::NationalId, &["cpf", "doc", "documento"]),
    (StudentField::BirthDate, &["birthdate", "nascimento", "datadenascimento", "dtnasc"]),
    (StudentField::Status, &["status", "situacao"]),
    (StudentField::School, &["school", "escola", "unidadeescolar", "creche"]),
    (StudentField::Grade, &["grade", "etapa", "serie", "ano"]),
    (StudentField::Shift, &["shift", "turno", "periodo"]),
    (StudentField::ClassName, &["classname", "turma", "nometurma"]),
    (StudentField::ClassId, &["classid", "codturma", "codigoturma"]),
    (StudentField::Transport, &["transport", "transporte", "utilizatransporte"]),
    (StudentField::TransportType, &["transporttype", "tipotransporte", "veiculo"]),
    (StudentField::SpecialNeeds, &["specialneeds", "deficiencia", "nee", "aee"]),
];

pub static STUDENT_ALIASES: AliasTable<StudentField> = AliasTable::new(STUDENT_ENTRIES);

/// CSV header keys that mark a file as a school list.
pub const CSV_SCHOOL_KEYS: &[&str] = &[
    "lat", "latitude", "capacidade", "vagas", "endereco", "address", "tipo",
];

/// Keys of the first JSON record that mark an array as a school list.
pub const JSON_SCHOOL_KEYS: &[&str] = &[
    "nome", "name", "capacidade", "capacity", "vagas", "availableslots", "lat", "latitude",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::normalize_key;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_first_non_empty_alias_wins() {
        let r = row(json!({ "nome": "", "name": "  Escola B ", "escola": "Escola C" }));
        assert_eq!(
            SCHOOL_ALIASES.resolve(&r, SchoolField::Name).as_deref(),
            Some("Escola B")
        );
    }

    #[test]
    fn test_scalar_values_are_stringified() {
        let r = row(json!({ "capacidade": 120, "lat": null, "latitude": -12.5 }));
        assert_eq!(SCHOOL_ALIASES.resolve_or_empty(&r, SchoolField::Capacity), "120");
        assert_eq!(SCHOOL_ALIASES.resolve_or_empty(&r, SchoolField::Latitude), "-12.5");
    }

    #[test]
    fn test_missing_field_is_none() {
        let r = row(json!({}));
        assert!(STUDENT_ALIASES.resolve(&r, StudentField::ClassId).is_none());
        assert_eq!(STUDENT_ALIASES.resolve_or_empty(&r, StudentField::ClassId), "");
    }

    #[test]
    fn test_aliases_are_canonical_keys() {
        let school = SCHOOL_ALIASES.entries().iter().flat_map(|(_, a)| a.iter());
        let student = STUDENT_ALIASES.entries().iter().flat_map(|(_, a)| a.iter());
        for alias in school
            .chain(student)
            .chain(CSV_SCHOOL_KEYS)
            .chain(JSON_SCHOOL_KEYS)
        {
            assert_eq!(normalize_key(alias), alias.to_string());
        }
    }

    #[test]
    fn test_every_field_has_aliases() {
        assert_eq!(SCHOOL_ALIASES.entries().len(), 10);
        assert_eq!(STUDENT_ALIASES.entries().len(), 14);
        assert_eq!(STUDENT_ALIASES.aliases(StudentField::Id)[0], "id");
    }
}
