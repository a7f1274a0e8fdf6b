//! Educacenso class-roster export extraction.
//!
//! The census export is a `;`-separated report: a few metadata lines
//! (school name, school code, municipality), a column-header line, then one
//! line per student. Columns are positional; every index lives in
//! [`EDUCACENSO_COLUMNS`] so a layout change touches one table.
//!
//! ```text
//!  HEADER ──(line has "Identificação única" and "Nome")──▶ TABLE_BODY
//!    │ metadata markers update running defaults              │ one student per valid line
//! ```


use super::coerce::{digits_only, format_date};
use super::mapper::{batch_millis, MappedBatch};
use crate::models::{
    EnrollmentStatus, School, SchoolCategory, Shift, Student, DEFAULT_SCHOOL_IMAGE,
};

const SCHOOL_NAME_LABEL: &str = "Nome da escola";
const SCHOOL_CODE_LABEL: &str = "Código da escola";
const MUNICIPALITY_LABEL: &str = "Município";

const TABLE_HEADER_MARKERS: [&str; 2] = ["Identificação única", "Nome"];

const DEFAULT_SCHOOL_NAME: &str = "Escola Municipal";
const DEFAULT_MUNICIPALITY: &str = "Município";
const DEFAULT_STATE: &str = "BA";
const DEFAULT_TRANSPORT_TYPE: &str = "Vans/Kombis";
const NEW_SCHOOL_RATING: f64 = 5.0;
/// Municipal centre, used until a school is geocoded.
const DEFAULT_COORDINATES: (f64, f64) = (-12.5253, -40.2917);

/// Zero-based column positions of the student table.
#[derive(Debug, Clone, Copy)]
pub struct CensusColumns {
    pub id: usize,
    pub name: usize,
    pub birth_date: usize,
    pub national_id: usize,
    pub special_needs: usize,
    pub transport: usize,
    pub enrollment_id: usize,
    pub class_id: usize,
    pub class_name: usize,
    pub grade: usize,
    pub grade_fallback: usize,
    pub schedule: usize,
}

pub const EDUCACENSO_COLUMNS: CensusColumns = CensusColumns {
    id: 2,
    name: 4,
    birth_date: 7,
    national_id: 9,
    special_needs: 15,
    transport: 22,
    enrollment_id: 26,
    class_id: 27,
    class_name: 28,
    grade: 31,
    grade_fallback: 30,
    schedule: 34,
};

/// School metadata read from the report header.
#[derive(Debug, Clone, PartialEq)]
pub struct CensusMetadata {
    pub school_name: String,
    pub school_code: String,
    pub municipality: String,
}

impl Default for CensusMetadata {
    fn default() -> Self {
        Self {
            school_name: DEFAULT_SCHOOL_NAME.to_string(),
            school_code: String::new(),
            municipality: DEFAULT_MUNICIPALITY.to_string(),
        }
    }
}

/// Students extracted from one export, plus the school to create if new.
#[derive(Debug, Clone, PartialEq)]
pub struct EducacensoExtract {
    pub students: Vec<Student>,
    pub pending_school: Option<School>,
    pub metadata: CensusMetadata,
}

impl From<EducacensoExtract> for MappedBatch {
    fn from(extract: EducacensoExtract) -> Self {
        MappedBatch::Educacenso {
            students: extract.students,
            pending_school: extract.pending_school,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Header,
    TableBody,
}

/// Value of a `Label:;;value` metadata line: the first non-empty segment
/// that is not the label itself.
fn marker_value(line: &str, label: &str) -> Option<String> {
    if !line.contains(&format!("{}:", label)) {
        return None;
    }
    line.split(';')
        .map(str::trim)
        .find(|part| !part.is_empty() && !part.contains(label))
        .map(str::to_string)
}

fn update_metadata(line: &str, metadata: &mut CensusMetadata) {
    if let Some(name) = marker_value(line, SCHOOL_NAME_LABEL) {
        metadata.school_name = name;
    }
    if let Some(code) = marker_value(line, SCHOOL_CODE_LABEL) {
        metadata.school_code = code;
    }
    if let Some(city) = marker_value(line, MUNICIPALITY_LABEL) {
        metadata.municipality = city;
    }
}

fn is_table_header(line: &str) -> bool {
    TABLE_HEADER_MARKERS.iter().all(|marker| line.contains(marker))
}

/// Shift from the class schedule text and class name.
///
/// Afternoon if the schedule mentions 13:00 or the class is VESPERTINO;
/// morning if it starts at 08:00 without running to 17:00, or the class is
/// MATUTINO; full day otherwise.
pub fn classify_shift(schedule: &str, class_name: &str) -> Shift {
    let schedule = schedule.to_lowercase();
    let class_name = class_name.to_uppercase();

    if schedule.contains("13:00") || class_name.contains("VESPERTINO") {
        Shift::Afternoon
    } else if (schedule.contains("08:00") && !schedule.contains("17:00"))
        || class_name.contains("MATUTINO")
    {
        Shift::Morning
    } else {
        Shift::FullDay
    }
}

/// Build a student from one table line, or `None` when id or name is missing.
fn extract_student(line: &str, school_name: &str, columns: &CensusColumns) -> Option<Student> {
    let cols: Vec<&str> = line.split(';').collect();
    let cell = |index: usize| cols.get(index).map(|c| c.trim()).unwrap_or("");

    let id = cell(columns.id);
    let name = cell(columns.name);
    if id.is_empty() || name.is_empty() {
        return None;
    }

    let class_name = cell(columns.class_name);
    let grade = match cell(columns.grade) {
        "" => cell(columns.grade_fallback),
        grade => grade,
    };
    let special_needs = match cell(columns.special_needs) {
        "" | "--" => false,
        _ => true,
    };
    let transport = cell(columns.transport).eq_ignore_ascii_case("sim");
    let schedule = cols.get(columns.schedule).copied().unwrap_or("");

    Some(Student {
        id: id.to_string(),
        enrollment_id: cell(columns.enrollment_id).to_string(),
        name: name.to_uppercase(),
        birth_date: format_date(cell(columns.birth_date)),
        cpf: digits_only(cell(columns.national_id)),
        status: EnrollmentStatus::Enrolled,
        school: school_name.to_string(),
        grade: grade.to_string(),
        shift: classify_shift(schedule, class_name).label().to_string(),
        class_name: class_name.to_string(),
        class_id: cell(columns.class_id).to_string(),
        transport_request: transport,
        transport_type: transport.then(|| DEFAULT_TRANSPORT_TYPE.to_string()),
        special_needs,
    })
}

fn synthesize_school(metadata: &CensusMetadata, batch_millis: i64) -> School {
    let id = if metadata.school_code.is_empty() {
        batch_millis.to_string()
    } else {
        metadata.school_code.clone()
    };

    School {
        id,
        inep: metadata.school_code.clone(),
        name: metadata.school_name.clone(),
        address: format!("{} - {}", metadata.municipality, DEFAULT_STATE),
        types: vec![SchoolCategory::EarlyChildhood, SchoolCategory::PrimaryEarly],
        image: DEFAULT_SCHOOL_IMAGE.to_string(),
        rating: NEW_SCHOOL_RATING,
        available_slots: 0,
        lat: DEFAULT_COORDINATES.0,
        lng: DEFAULT_COORDINATES.1,
    }
}

/// Extract students from an Educacenso export.
///
/// Returns `None` when no line produced a student; callers treat that as
/// "no data", not as a parse error. When students were found and neither
/// the extracted name nor code matches `existing_schools`, a new school is
/// proposed in `pending_school`.
pub fn extract_educacenso(text: &str, existing_schools: &[School]) -> Option<EducacensoExtract> {
    extract_with_columns(text, existing_schools, &EDUCACENSO_COLUMNS)
}

/// [`extract_educacenso`] with an explicit column layout.
pub fn extract_with_columns(
    text: &str,
    existing_schools: &[School],
    columns: &CensusColumns,
) -> Option<EducacensoExtract> {
    let mut metadata = CensusMetadata::default();
    let mut mode = Mode::Header;
    let mut students = Vec::new();

    for line in text.lines() {
        update_metadata(line, &mut metadata);

        // multi-section exports repeat the column header
        if is_table_header(line) {
            mode = Mode::TableBody;
            continue;
        }
        if mode == Mode::Header || line.trim().is_empty() {
            continue;
        }
        if let Some(student) = extract_student(line, &metadata.school_name, columns) {
            students.push(student);
        }
    }

    if students.is_empty() {
        return None;
    }

    let known = existing_schools
        .iter()
        .any(|s| s.name == metadata.school_name || s.inep == metadata.school_code);
    let pending_school = (!known).then(|| synthesize_school(&metadata, batch_millis()));

    Some(EducacensoExtract {
        students,
        pending_school,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A data line with the given cells placed at their census columns.
    fn census_line(cells: &[(usize, &str)]) -> String {
        let mut cols = vec![""; 36];
        for &(index, value) in cells {
            cols[index] = value;
        }
        cols.join(";")
    }

    fn export(rows: &[String]) -> String {
        let mut lines = vec![
            "Ministério da Educação;;".to_string(),
            "Nome da escola:;;ACME".to_string(),
            "Código da escola:;;001".to_string(),
            "Município:;;Jequié".to_string(),
            "Nº;;Identificação única;;Nome;;;Data de nascimento".to_string(),
        ];
        lines.extend_from_slice(rows);
        lines.join("\r\n")
    }

    #[test]
    fn test_single_student_end_to_end() {
        let row = census_line(&[(2, "10"), (4, "ana"), (22, "sim"), (28, "GRUPO 4 MATUTINO")]);
        let extract = extract_educacenso(&export(&[row]), &[]).unwrap();

        assert_eq!(extract.students.len(), 1);
        let student = &extract.students[0];
        assert_eq!(student.id, "10");
        assert_eq!(student.name, "ANA");
        assert!(student.transport_request);
        assert_eq!(student.transport_type.as_deref(), Some("Vans/Kombis"));
        assert_eq!(student.shift, "Matutino");
        assert_eq!(student.school, "ACME");
        assert_eq!(student.status, EnrollmentStatus::Enrolled);

        let school = extract.pending_school.unwrap();
        assert_eq!(school.inep, "001");
        assert_eq!(school.id, "001");
        assert_eq!(school.name, "ACME");
        assert_eq!(school.address, "Jequié - BA");
        assert_eq!(school.rating, 5.0);
        assert_eq!(
            school.types,
            vec![SchoolCategory::EarlyChildhood, SchoolCategory::PrimaryEarly]
        );
    }

    #[test]
    fn test_repeated_header_is_not_a_student() {
        let rows = [
            census_line(&[(2, "10"), (4, "ana")]),
            "Nº;;Identificação única;;Nome;;;Data de nascimento".to_string(),
            census_line(&[(2, "11"), (4, "bia")]),
        ];
        let extract = extract_educacenso(&export(&rows), &[]).unwrap();

        let ids: Vec<_> = extract.students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "11"]);
        assert!(extract.students.iter().all(|s| s.name != "NOME"));
    }

    #[test]
    fn test_all_columns_read() {
        let row = census_line(&[
            (2, " 10 "),
            (4, "Bruno Lima"),
            (7, "01/02/2019"),
            (9, "12345678909"),
            (15, "Autismo"),
            (22, "Não"),
            (26, "MAT-1"),
            (27, "T99"),
            (28, "PRE I A"),
            (30, "Pré-escola"),
            (34, "13:00 - 17:00"),
        ]);
        let extract = extract_educacenso(&export(&[row]), &[]).unwrap();
        let student = &extract.students[0];

        assert_eq!(student.id, "10");
        assert_eq!(student.birth_date, "01/02/2019");
        assert_eq!(student.cpf, "12345678909");
        assert!(student.special_needs);
        assert!(!student.transport_request);
        assert!(student.transport_type.is_none());
        assert_eq!(student.enrollment_id, "MAT-1");
        assert_eq!(student.class_id, "T99");
        assert_eq!(student.class_name, "PRE I A");
        assert_eq!(student.grade, "Pré-escola");
        assert_eq!(student.shift, "Vespertino");
    }

    #[test]
    fn test_rows_without_id_or_name_are_skipped() {
        let rows = vec![
            census_line(&[(2, "1"), (4, "")]),
            census_line(&[(2, ""), (4, "Sem Id")]),
            String::new(),
            census_line(&[(2, "3"), (4, "Caio"), (15, "--")]),
        ];
        let extract = extract_educacenso(&export(&rows), &[]).unwrap();

        assert_eq!(extract.students.len(), 1);
        assert!(!extract.students[0].special_needs);
    }

    #[test]
    fn test_header_line_is_not_data() {
        // the marker line itself has values at columns 2 and 4
        let text = "Identificação única;x;y;z;Nome\n";
        assert!(extract_educacenso(text, &[]).is_none());
    }

    #[test]
    fn test_no_students_is_none() {
        assert!(extract_educacenso(&export(&[]), &[]).is_none());
        assert!(extract_educacenso("", &[]).is_none());
        // rows before the header marker are never data
        let text = format!("{}\nNome da escola:;;X", census_line(&[(2, "1"), (4, "Ana")]));
        assert!(extract_educacenso(&text, &[]).is_none());
    }

    #[test]
    fn test_existing_school_is_not_synthesized() {
        let row = census_line(&[(2, "10"), (4, "ana")]);
        let mut existing = synthesize_school(&CensusMetadata::default(), 1);
        existing.name = "Outra".into();
        existing.inep = "001".into();

        let extract = extract_educacenso(&export(&[row.clone()]), &[existing.clone()]).unwrap();
        assert!(extract.pending_school.is_none());

        existing.inep = "999".into();
        existing.name = "ACME".into();
        let extract = extract_educacenso(&export(&[row]), &[existing]).unwrap();
        assert!(extract.pending_school.is_none());
    }

    #[test]
    fn test_metadata_defaults() {
        let text = format!(
            "Identificação única;Nome\n{}",
            census_line(&[(2, "1"), (4, "Ana")])
        );
        let extract = extract_educacenso(&text, &[]).unwrap();

        assert_eq!(extract.metadata, CensusMetadata::default());
        assert_eq!(extract.students[0].school, "Escola Municipal");
        let school = extract.pending_school.unwrap();
        assert_eq!(school.address, "Município - BA");
        assert!(!school.id.is_empty());
        assert_eq!(school.inep, "");
    }

    #[test]
    fn test_grade_prefers_column_31() {
        let row = census_line(&[(2, "1"), (4, "Ana"), (30, "Etapa"), (31, "1º Ano")]);
        let extract = extract_educacenso(&export(&[row]), &[]).unwrap();
        assert_eq!(extract.students[0].grade, "1º Ano");
    }

    #[test]
    fn test_classify_shift() {
        assert_eq!(classify_shift("13:00 - 17:00", ""), Shift::Afternoon);
        assert_eq!(classify_shift("", "TURMA VESPERTINO"), Shift::Afternoon);
        assert_eq!(classify_shift("08:00 - 12:00", ""), Shift::Morning);
        assert_eq!(classify_shift("", "turma matutino"), Shift::Morning);
        assert_eq!(classify_shift("08:00 - 17:00", ""), Shift::FullDay);
        assert_eq!(classify_shift("", ""), Shift::FullDay);
    }

    #[test]
    fn test_marker_value() {
        assert_eq!(
            marker_value("Nome da escola:;;ACME;", SCHOOL_NAME_LABEL).as_deref(),
            Some("ACME")
        );
        assert_eq!(marker_value("Nome da escola:;;", SCHOOL_NAME_LABEL), None);
        assert_eq!(marker_value("ACME", SCHOOL_NAME_LABEL), None);
    }
}
