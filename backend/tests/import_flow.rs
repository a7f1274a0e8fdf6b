//! End-to-end import flows through the public API.

use educa_import::{
    backup, school_stats, unallocated_count, Dataset, DatasetStore, FileStore, ImportError, ImportKind,
    ImportOptions, ImportOutcome, ImportTransaction, MappedBatch, MemoryStore, School, Student,
    SchoolCategory, StoreResult, TextEncoding, TransactionError, TransactionState,
};

/// Store that records every update call.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    calls: Vec<&'static str>,
}

impl DatasetStore for RecordingStore {
    fn schools(&self) -> &[School] {
        self.inner.schools()
    }

    fn students(&self) -> &[Student] {
        self.inner.students()
    }

    fn update_schools(&mut self, records: Vec<School>) -> StoreResult<()> {
        self.calls.push("schools");
        self.inner.update_schools(records)
    }

    fn update_students(&mut self, records: Vec<Student>) -> StoreResult<()> {
        self.calls.push("students");
        self.inner.update_students(records)
    }
}

/// A census line with the given cells at their column positions.
fn census_line(cells: &[(usize, &str)]) -> String {
    let mut cols = vec![""; 36];
    for &(index, value) in cells {
        cols[index] = value;
    }
    cols.join(";")
}

fn census_export() -> Vec<u8> {
    let lines = [
        "MINISTÉRIO;Ministério da Educação;".to_string(),
        "Nome da escola:;;ACME".to_string(),
        "Código da escola:;;001".to_string(),
        "Município:;;Jequié".to_string(),
        "Nº;;Identificação única;;Nome;;;Data de nascimento".to_string(),
        census_line(&[(2, "10"), (4, "ana"), (22, "sim"), (28, "GRUPO 4 MATUTINO")]),
    ];
    // census exports are ISO-8859-1
    lines
        .join("\r\n")
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap())
        .collect()
}

#[test]
fn educacenso_preview_then_confirm() {
    let mut store = RecordingStore::default();
    let mut tx = ImportTransaction::new();

    let outcome = tx
        .process("turma.csv", &census_export(), &mut store, ImportOptions::default())
        .unwrap();

    let ImportOutcome::Preview(preview) = outcome else {
        panic!("expected a preview");
    };
    assert!(store.calls.is_empty());

    let MappedBatch::Educacenso { students, pending_school } = &preview.batch else {
        panic!("expected an Educacenso batch");
    };
    let student = &students[0];
    assert_eq!(student.name, "ANA");
    assert!(student.transport_request);
    assert_eq!(student.transport_type.as_deref(), Some("Vans/Kombis"));
    assert_eq!(student.shift, "Matutino");
    assert_eq!(student.school, "ACME");
    let school = pending_school.as_ref().unwrap();
    assert_eq!(school.inep, "001");
    assert_eq!(school.address, "Jequié - BA");

    let summary = tx.confirm(&mut store).unwrap();
    assert_eq!(summary.kind, ImportKind::Educacenso);
    assert_eq!(summary.message, "1 alunos do Educacenso importados.");
    assert_eq!(store.calls, vec!["schools", "students"]);
    assert_eq!(store.schools()[0].name, "ACME");

    // a second import of the same export finds the school
    let mut tx = ImportTransaction::new();
    let outcome = tx
        .process("turma.csv", &census_export(), &mut store, ImportOptions::default())
        .unwrap();
    let ImportOutcome::Preview(preview) = outcome else {
        panic!("expected a preview");
    };
    assert!(matches!(
        preview.batch,
        MappedBatch::Educacenso { pending_school: None, .. }
    ));
}

#[test]
fn repeated_census_header_adds_no_student() {
    let lines = [
        "Ministério da Educação;;".to_string(),
        "Nome da escola:;;ACME".to_string(),
        "Nº;;Identificação única;;Nome".to_string(),
        census_line(&[(2, "10"), (4, "ana")]),
        "Nº;;Identificação única;;Nome".to_string(),
        census_line(&[(2, "11"), (4, "bia")]),
    ];
    let mut store = RecordingStore::default();
    let mut tx = ImportTransaction::new();

    let options = ImportOptions {
        encoding: TextEncoding::Utf8,
    };
    tx.process("turma.csv", lines.join("\n").as_bytes(), &mut store, options)
        .unwrap();
    tx.confirm(&mut store).unwrap();

    let names: Vec<_> = store.students().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["ANA", "BIA"]);
}

#[test]
fn exported_backup_restores_with_default_options() {
    let dataset: Dataset = serde_json::from_str(
        r#"{
            "schools": [{ "id": "1", "name": "Creche Sol", "types": ["Educação Infantil"] }],
            "students": [
                { "id": "a", "name": "JOÃO", "school": "Creche Sol" },
                { "id": "b", "name": "BIA", "school": "Não alocada" }
            ]
        }"#,
    )
    .unwrap();
    let source = MemoryStore::with_dataset(dataset);
    let exported = serde_json::to_string_pretty(&backup(&source)).unwrap();

    let mut store = RecordingStore::default();
    let mut tx = ImportTransaction::new();
    let outcome = tx
        .process(
            "backup_educa_2024-03-05.json",
            exported.as_bytes(),
            &mut store,
            ImportOptions::default(),
        )
        .unwrap();

    assert!(matches!(outcome, ImportOutcome::Committed(_)));
    assert_eq!(store.schools()[0].types, vec![SchoolCategory::EarlyChildhood]);
    assert_eq!(store.students()[0].name, "JOÃO");
    assert_eq!(unallocated_count(store.students()), 1);
}

#[test]
fn utf8_decoding_corrupts_nothing_when_configured() {
    let text = "Nome;Situação\nJoão;Pendente\n";
    let mut store = RecordingStore::default();
    let mut tx = ImportTransaction::new();

    let options = ImportOptions {
        encoding: TextEncoding::Utf8,
    };
    tx.process("alunos.csv", text.as_bytes(), &mut store, options)
        .unwrap();
    tx.confirm(&mut store).unwrap();

    assert_eq!(store.students()[0].name, "JOÃO");
    assert_eq!(store.students()[0].status.label(), "Pendente");
}

#[test]
fn cancelled_import_never_reaches_store() {
    let mut store = RecordingStore::default();
    let mut tx = ImportTransaction::new();

    tx.process(
        "escolas.csv",
        b"Nome;Vagas;Latitude;Longitude\nCreche Sol;40;-12,52;-40,29\n",
        &mut store,
        ImportOptions::default(),
    )
    .unwrap();
    assert_eq!(tx.preview().unwrap().batch.kind(), ImportKind::Schools);

    tx.cancel().unwrap();
    assert_eq!(tx.state(), TransactionState::Cancelled);
    assert!(store.calls.is_empty());
    assert!(store.schools().is_empty());
}

#[test]
fn failures_are_single_messages() {
    let mut store = RecordingStore::default();

    let cases: [(&str, &[u8], &str); 3] = [
        ("foto.png", b"\x89PNG", "Formato não suportado"),
        ("vazio.csv", b"Nome;Turma\n", "Arquivo CSV vazio ou inválido."),
        ("turma.csv", "Ministério da Educação\n".as_bytes(), "Nenhum aluno encontrado"),
    ];

    for (name, bytes, expected) in cases {
        let mut tx = ImportTransaction::new();
        let err = tx
            .process(name, bytes, &mut store, ImportOptions { encoding: TextEncoding::Utf8 })
            .unwrap_err();
        assert!(matches!(err, TransactionError::Import(_)));
        assert!(
            tx.last_error().unwrap().starts_with(expected),
            "{}: {:?}",
            name,
            tx.last_error()
        );
        assert_eq!(tx.state(), TransactionState::Failed);
    }
    assert!(store.calls.is_empty());
}

#[test]
fn invalid_backup_changes_nothing() {
    let mut store = RecordingStore::default();
    let mut tx = ImportTransaction::new();

    let err = tx
        .process(
            "backup.json",
            br#"{ "schools": [{ "name": "Sem id" }] }"#,
            &mut store,
            ImportOptions::default(),
        )
        .unwrap_err();

    assert!(matches!(err, TransactionError::Import(ImportError::InvalidBackup(_))));
    assert!(store.calls.is_empty());
}

#[tokio::test]
async fn backup_restores_into_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let backup_path = dir.path().join("backup_educa_2024-03-05.json");
    std::fs::write(
        &backup_path,
        r#"{
            "schools": [{ "id": 1, "name": "Creche Sol", "types": ["Educação Infantil"] }],
            "students": [
                { "id": "a", "name": "ANA", "school": "Creche Sol" },
                { "id": "b", "name": "BIA", "school": "Não alocada" },
                { "id": "c", "name": "CAIO", "school": "" }
            ]
        }"#,
    )
    .unwrap();

    let store_path = dir.path().join("store").join("dataset.json");
    let mut store = FileStore::open(&store_path).unwrap();
    let mut tx = ImportTransaction::new();

    let outcome = tx
        .process_file(&backup_path, &mut store, ImportOptions::default())
        .await
        .unwrap();
    assert!(matches!(outcome, ImportOutcome::Committed(_)));
    assert_eq!(tx.state(), TransactionState::Committed);

    let reopened = FileStore::open(&store_path).unwrap();
    assert_eq!(reopened.schools()[0].id, "1");
    assert_eq!(unallocated_count(reopened.students()), 2);
    assert_eq!(school_stats(reopened.students()).get("Não alocada"), Some(&2));
}
