//! Import transaction: preview, confirm, cancel.
//!
//! ```text
//!  IDLE ──process──▶ PROCESSING ──ok──▶ PREVIEW ──confirm──▶ COMMITTED
//!   ▲                    │  │                 └──cancel───▶ CANCELLED
//!   │                    │  └──backup──────────────────────▶ COMMITTED
//!   └──── (next file) ── FAILED ◀──err──┘
//! ```
//!
//! Processing never writes to the store, except for a backup restore which
//! commits directly. A preview is only written on [`ImportTransaction::confirm`].
//! Committed, cancelled and failed transactions accept the next file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::error::{ImportError, TransactionError, TransactionResult};
use crate::models::BackupPayload;
use crate::parser::{decode_content, decode_json_content, TextEncoding};
use crate::store::DatasetStore;
use crate::transform::{is_json_file, route, ImportKind, MappedBatch, RoutedImport};

/// Per-import knobs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    /// How file bytes are decoded.
    pub encoding: TextEncoding,
}

/// Lifecycle state of an [`ImportTransaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    #[default]
    Idle,
    Processing,
    Preview,
    Committed,
    Cancelled,
    Failed,
}

/// Mapped records held until confirm or cancel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub file_name: String,
    /// Encoding actually used to decode the file.
    pub encoding: TextEncoding,
    #[serde(flatten)]
    pub batch: MappedBatch,
}

/// What a commit wrote.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub kind: ImportKind,
    pub schools: usize,
    pub students: usize,
    /// User-facing confirmation message.
    pub message: String,
}

/// Result of processing one file.
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    /// Records are held; nothing was written.
    Preview(Preview),
    /// A backup was restored immediately.
    Committed(CommitSummary),
}

/// One import at a time, owned by the caller.
#[derive(Debug, Default)]
pub struct ImportTransaction {
    state: TransactionState,
    preview: Option<Preview>,
    last_error: Option<String>,
}

impl ImportTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// The held preview, if any.
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Message of the last failure, kept until the next file is processed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Drop any held preview and go back to idle.
    pub fn reset(&mut self) {
        self.state = TransactionState::Idle;
        self.preview = None;
        self.last_error = None;
    }

    /// Decode, route and map a file.
    ///
    /// On success the records are held as a preview (or, for a backup,
    /// written straight to `store`). On failure the transaction is FAILED and
    /// the store is untouched.
    pub fn process(
        &mut self,
        file_name: &str,
        bytes: &[u8],
        store: &mut dyn DatasetStore,
        options: ImportOptions,
    ) -> TransactionResult<ImportOutcome> {
        if matches!(self.state, TransactionState::Processing | TransactionState::Preview) {
            return Err(TransactionError::Busy);
        }

        self.state = TransactionState::Processing;
        self.preview = None;
        self.last_error = None;
        log_info(format!("Processando {} ({} bytes)", file_name, bytes.len()));

        let (text, encoding) = if is_json_file(file_name) {
            decode_json_content(bytes, options.encoding)
        } else {
            decode_content(bytes, options.encoding)
        };
        log_info_indent(format!("Decodificado como {}", encoding), 1);

        let routed = match route(file_name, &text, store.schools()) {
            Ok(routed) => routed,
            Err(e) => return Err(self.fail(e.into())),
        };

        match routed {
            RoutedImport::Backup(payload) => match restore_backup(payload, store) {
                Ok(summary) => {
                    self.state = TransactionState::Committed;
                    log_success(&summary.message);
                    Ok(ImportOutcome::Committed(summary))
                }
                Err(e) => Err(self.fail(e)),
            },
            RoutedImport::Records(batch) => {
                let preview = Preview {
                    file_name: file_name.to_string(),
                    encoding,
                    batch,
                };
                log_success(format!("Pré-visualização pronta: {} registros", preview.batch.len()));
                self.preview = Some(preview.clone());
                self.state = TransactionState::Preview;
                Ok(ImportOutcome::Preview(preview))
            }
        }
    }

    /// Read a file from disk, then [`process`](Self::process) it.
    ///
    /// Reading is the only suspension point; a read error fails the
    /// transaction like any other import error.
    pub async fn process_file(
        &mut self,
        path: &Path,
        store: &mut dyn DatasetStore,
        options: ImportOptions,
    ) -> TransactionResult<ImportOutcome> {
        if matches!(self.state, TransactionState::Processing | TransactionState::Preview) {
            return Err(TransactionError::Busy);
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(ImportError::from(e).into())),
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.process(&file_name, &bytes, store, options)
    }

    /// Write the held preview to `store`.
    ///
    /// A pending census school is written before the students. The two
    /// writes are sequential, not atomic; a store error after the first
    /// leaves it in place.
    pub fn confirm(&mut self, store: &mut dyn DatasetStore) -> TransactionResult<CommitSummary> {
        if self.state != TransactionState::Preview {
            return Err(TransactionError::NoPreview);
        }
        let preview = self.preview.take().ok_or(TransactionError::NoPreview)?;

        match commit_batch(preview.batch, store) {
            Ok(summary) => {
                self.state = TransactionState::Committed;
                log_success(&summary.message);
                Ok(summary)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Discard the held preview without touching any store.
    pub fn cancel(&mut self) -> TransactionResult<()> {
        if self.state != TransactionState::Preview {
            return Err(TransactionError::NoPreview);
        }
        self.preview = None;
        self.state = TransactionState::Cancelled;
        log_warning("Importação cancelada");
        Ok(())
    }

    fn fail(&mut self, err: TransactionError) -> TransactionError {
        let message = err.to_string();
        log_error(&message);
        self.state = TransactionState::Failed;
        self.preview = None;
        self.last_error = Some(message);
        err
    }
}

fn restore_backup(payload: BackupPayload, store: &mut dyn DatasetStore) -> TransactionResult<CommitSummary> {
    let mut summary = CommitSummary {
        kind: ImportKind::Backup,
        schools: 0,
        students: 0,
        message: "Backup restaurado com sucesso!".to_string(),
    };

    if let Some(schools) = payload.schools {
        summary.schools = schools.len();
        store.update_schools(schools)?;
    }
    if let Some(students) = payload.students {
        summary.students = students.len();
        store.update_students(students)?;
    }
    Ok(summary)
}

fn commit_batch(batch: MappedBatch, store: &mut dyn DatasetStore) -> TransactionResult<CommitSummary> {
    let kind = batch.kind();

    let summary = match batch {
        MappedBatch::Schools { schools } => {
            let count = schools.len();
            store.update_schools(schools)?;
            CommitSummary {
                kind,
                schools: count,
                students: 0,
                message: format!("{} escolas importadas com sucesso.", count),
            }
        }
        MappedBatch::Students { students } => {
            let count = students.len();
            store.update_students(students)?;
            CommitSummary {
                kind,
                schools: 0,
                students: count,
                message: format!("{} alunos importados com sucesso.", count),
            }
        }
        MappedBatch::Educacenso { students, pending_school } => {
            let schools = match pending_school {
                Some(school) => {
                    log_info(format!("Criando escola {}", school.name));
                    store.update_schools(vec![school])?;
                    1
                }
                None => 0,
            };
            let count = students.len();
            store.update_students(students)?;
            CommitSummary {
                kind,
                schools,
                students: count,
                message: format!("{} alunos do Educacenso importados.", count),
            }
        }
    };

    Ok(summary)
}
