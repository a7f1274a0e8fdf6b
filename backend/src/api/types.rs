//! REST API response types.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transaction::{CommitSummary, ImportOutcome, Preview, TransactionState};
use crate::transform::MappedBatch;

/// Response to an upload, confirm or cancel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    /// Identifier of the upload this response belongs to
    pub job_id: String,
    pub status: TransactionState,
    /// Held records, while in preview
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
    /// What was written, once committed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CommitSummary>,
    pub counts: PreviewCounts,
}

/// Record counts shown next to a preview.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewCounts {
    pub schools: usize,
    pub students: usize,
    /// A census import will also create its school
    pub pending_school: bool,
}

impl PreviewCounts {
    fn of(batch: &MappedBatch) -> Self {
        match batch {
            MappedBatch::Schools { schools } => Self {
                schools: schools.len(),
                ..Self::default()
            },
            MappedBatch::Students { students } => Self {
                students: students.len(),
                ..Self::default()
            },
            MappedBatch::Educacenso { students, pending_school } => Self {
                schools: usize::from(pending_school.is_some()),
                students: students.len(),
                pending_school: pending_school.is_some(),
            },
        }
    }
}

impl ImportResponse {
    pub fn new_job_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn from_outcome(job_id: String, outcome: ImportOutcome) -> Self {
        match outcome {
            ImportOutcome::Preview(preview) => Self {
                job_id,
                status: TransactionState::Preview,
                counts: PreviewCounts::of(&preview.batch),
                preview: Some(preview),
                summary: None,
            },
            ImportOutcome::Committed(summary) => Self::committed(job_id, summary),
        }
    }

    pub fn committed(job_id: String, summary: CommitSummary) -> Self {
        Self {
            job_id,
            status: TransactionState::Committed,
            preview: None,
            counts: PreviewCounts {
                schools: summary.schools,
                students: summary.students,
                pending_school: false,
            },
            summary: Some(summary),
        }
    }

    pub fn cancelled(job_id: String) -> Self {
        Self {
            job_id,
            status: TransactionState::Cancelled,
            preview: None,
            summary: None,
            counts: PreviewCounts::default(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TextEncoding;
    use crate::transform::{extract_educacenso, ImportKind};

    #[test]
    fn test_preview_response_shape() {
        let text = "Nome da escola:;;ACME\nIdentificação única;Nome\n;;10;;ana\n";
        let extract = extract_educacenso(text, &[]).unwrap();
        let outcome = ImportOutcome::Preview(Preview {
            file_name: "turma.csv".into(),
            encoding: TextEncoding::Latin1,
            batch: extract.into(),
        });

        let response = ImportResponse::from_outcome("job".into(), outcome);
        assert_eq!(
            response.counts,
            PreviewCounts { schools: 1, students: 1, pending_school: true }
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["jobId"], "job");
        assert_eq!(json["status"], "preview");
        assert_eq!(json["preview"]["kind"], "educacenso");
        assert_eq!(json["preview"]["fileName"], "turma.csv");
        assert_eq!(json["preview"]["students"][0]["name"], "ANA");
        assert_eq!(json["preview"]["pendingSchool"]["name"], "ACME");
        assert!(json.get("summary").is_none());
    }

    #[test]
    fn test_committed_response() {
        let summary = CommitSummary {
            kind: ImportKind::Schools,
            schools: 3,
            students: 0,
            message: "3 escolas importadas com sucesso.".into(),
        };
        let json = serde_json::to_value(ImportResponse::committed("j".into(), summary)).unwrap();
        assert_eq!(json["status"], "committed");
        assert_eq!(json["summary"]["kind"], "schools");
        assert_eq!(json["counts"]["schools"], 3);
    }

    #[test]
    fn test_error_response() {
        let json = error_response("Formato não suportado: a.xlsx");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "Formato não suportado: a.xlsx");
    }
}
