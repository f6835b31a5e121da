// MindGarden/backend/src/db.rs
use crate::error_handler::ServiceError;
use crate::schema::{self, Schema};
use actix_web::web;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

// --- Store errors ---

#[derive(Debug)]
pub enum StoreError {
    SchemaMismatch(String),
    DuplicateId(String),
    RecordNotFound(String),
    InvalidValue { column: String, value: String },
    PersistFailure { path: PathBuf, source: io::Error },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::SchemaMismatch(msg) => write!(f, "Schema mismatch: {}", msg),
            StoreError::DuplicateId(id) => write!(f, "Record id {} already exists", id),
            StoreError::RecordNotFound(id) => write!(f, "Record with id {} not found", id),
            StoreError::InvalidValue { column, value } => {
                write!(f, "Invalid value '{}' for column '{}'", value, column)
            }
            StoreError::PersistFailure { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::PersistFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

// --- Record / Table ---

/// One row before it is placed in a table: column name -> cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.fields.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn require(&self, column: &str) -> Result<&str, StoreError> {
        self.get(column)
            .ok_or_else(|| StoreError::SchemaMismatch(format!("missing column '{}'", column)))
    }

    fn matches(&self, schema: &Schema) -> bool {
        self.fields.len() == schema.columns.len()
            && schema.columns.iter().all(|c| self.fields.contains_key(*c))
    }
}

/// Ordered rows sharing one fixed column schema. Cells are kept as the
/// text that goes to disk so a load/persist cycle is lossless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    schema: Schema,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn empty(schema: Schema) -> Self {
        Table {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    #[cfg(test)]
    pub fn columns(&self) -> &'static [&'static str] {
        self.schema.columns
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows.iter().map(move |row| self.row_to_record(row))
    }

    pub fn get(&self, id: &str) -> Option<Record> {
        self.rows
            .iter()
            .find(|row| row[0] == id)
            .map(|row| self.row_to_record(row))
    }

    pub fn append(mut self, record: Record) -> Result<Self, StoreError> {
        if !record.matches(&self.schema) {
            let got: Vec<&String> = record.fields.keys().collect();
            return Err(StoreError::SchemaMismatch(format!(
                "{} expects columns {:?}, got {:?}",
                self.schema.name, self.schema.columns, got
            )));
        }
        let row: Vec<String> = self
            .schema
            .columns
            .iter()
            .map(|c| record.fields[*c].clone())
            .collect();
        if self.rows.iter().any(|existing| existing[0] == row[0]) {
            return Err(StoreError::DuplicateId(row[0].clone()));
        }
        self.rows.push(row);
        Ok(self)
    }

    pub fn update_field(
        mut self,
        id: &str,
        field: &str,
        value: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let position = self.schema.position(field).ok_or_else(|| {
            StoreError::SchemaMismatch(format!(
                "{} has no column '{}'",
                self.schema.name, field
            ))
        })?;
        if position == 0 {
            return Err(StoreError::SchemaMismatch(format!(
                "column '{}' is the record id and cannot be rewritten",
                field
            )));
        }
        let row = self
            .rows
            .iter_mut()
            .find(|row| row[0] == id)
            .ok_or_else(|| StoreError::RecordNotFound(id.to_string()))?;
        row[position] = value.into();
        Ok(self)
    }

    /// Header plus rows, exactly as written to disk.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, csv::Error> {
        let mut buffer = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            writer.write_record(self.schema.columns)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        Ok(buffer)
    }

    fn parse(schema: Schema, bytes: &[u8]) -> Result<Self, LoadIssue> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);
        let header = reader.headers().map_err(LoadIssue::Csv)?;
        if !header.iter().eq(schema.columns.iter().copied()) {
            return Err(LoadIssue::Header(header.iter().map(String::from).collect()));
        }
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(LoadIssue::Csv)?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(Table { schema, rows })
    }

    fn row_to_record(&self, row: &[String]) -> Record {
        let fields = self
            .schema
            .columns
            .iter()
            .zip(row)
            .map(|(c, v)| (c.to_string(), v.clone()))
            .collect();
        Record { fields }
    }
}

#[derive(Debug)]
enum LoadIssue {
    Io(io::Error),
    Csv(csv::Error),
    Header(Vec<String>),
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadIssue::Io(e) => write!(f, "unreadable: {}", e),
            LoadIssue::Csv(e) => write!(f, "malformed csv: {}", e),
            LoadIssue::Header(found) => write!(f, "unexpected header {:?}", found),
        }
    }
}

// --- Record store ---

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    schema: Schema,
}

impl RecordStore {
    pub fn new(data_dir: &Path, schema: Schema) -> Self {
        RecordStore {
            path: data_dir.join(schema.file_name),
            schema,
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Makes sure the backing file holds at least a header row. A valid
    /// file is left untouched; an unparseable one is moved aside first.
    pub fn initialize(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.persist_failure(e))?;
        }

        match self.read_table() {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                log::info!(
                    "Writing empty {} table to {}",
                    self.schema.name,
                    self.path.display()
                );
                self.persist(&Table::empty(self.schema))
            }
            Err(LoadIssue::Io(e)) => Err(self.persist_failure(e)),
            Err(issue) => {
                let backup = self.corrupt_backup_path();
                fs::rename(&self.path, &backup).map_err(|e| self.persist_failure(e))?;
                log::warn!(
                    "{} is {}; moved it to {} and started a fresh table",
                    self.path.display(),
                    issue,
                    backup.display()
                );
                self.persist(&Table::empty(self.schema))
            }
        }
    }

    /// Never fails: a missing, empty or unparseable file reads as an empty table.
    pub fn load(&self) -> Table {
        match self.read_table() {
            Ok(Some(table)) => table,
            Ok(None) => Table::empty(self.schema),
            Err(issue) => {
                log::warn!(
                    "Treating {} as empty, file is {}",
                    self.path.display(),
                    issue
                );
                Table::empty(self.schema)
            }
        }
    }

    /// Writes to a sibling temp file and renames it over the target.
    pub fn persist(&self, table: &Table) -> Result<(), StoreError> {
        if table.schema != self.schema {
            return Err(StoreError::SchemaMismatch(format!(
                "cannot write a {} table into the {} store",
                table.schema.name, self.schema.name
            )));
        }
        let bytes = table
            .to_csv_bytes()
            .map_err(|e| self.persist_failure(e.into()))?;

        let tmp_path = self.path.with_extension("csv.tmp");
        fs::write(&tmp_path, bytes).map_err(|e| {
            log::error!("Failed to write temp file {}: {}", tmp_path.display(), e);
            self.persist_failure(e)
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            log::error!(
                "Failed to replace {} with {}: {}",
                self.path.display(),
                tmp_path.display(),
                e
            );
            self.persist_failure(e)
        })?;

        log::debug!(
            "Persisted {} rows to {}",
            table.len(),
            self.path.display()
        );
        Ok(())
    }

    fn read_table(&self) -> Result<Option<Table>, LoadIssue> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LoadIssue::Io(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Table::parse(self.schema, &bytes).map(Some)
    }

    fn corrupt_backup_path(&self) -> PathBuf {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(self.schema.name);
        self.path.with_file_name(format!("{}.corrupt-{}.csv", stem, stamp))
    }

    fn persist_failure(&self, source: io::Error) -> StoreError {
        StoreError::PersistFailure {
            path: self.path.clone(),
            source,
        }
    }
}

// --- Tracked collections ---

/// A record store plus a gate that lets one user action at a time run its
/// load -> mutate -> persist cycle. The gate holds no table data.
#[derive(Debug)]
pub struct Collection {
    store: RecordStore,
    gate: Mutex<()>,
}

impl Collection {
    pub fn new(store: RecordStore) -> Self {
        Collection {
            store,
            gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub async fn read(&self) -> Result<Table, ServiceError> {
        let _turn = self.gate.lock().await;
        let store = self.store.clone();
        let table = web::block(move || store.load()).await?;
        Ok(table)
    }

    /// Returns the table as it was persisted, for re-rendering.
    pub async fn mutate<F>(&self, change: F) -> Result<Table, ServiceError>
    where
        F: FnOnce(Table) -> Result<Table, StoreError> + Send + 'static,
    {
        let _turn = self.gate.lock().await;
        let store = self.store.clone();
        let table = web::block(move || {
            let table = change(store.load())?;
            store.persist(&table)?;
            Ok::<_, StoreError>(table)
        })
        .await??;
        Ok(table)
    }
}

#[derive(Debug)]
pub struct Trackers {
    pub data_dir: PathBuf,
    pub medications: Collection,
    pub emotions: Collection,
    pub priorities: Collection,
}

// Initializes all three tables under data_dir before handing them out.
pub fn create_trackers(data_dir: &Path) -> Result<Trackers, StoreError> {
    let stores = [
        RecordStore::new(data_dir, schema::MEDICATIONS),
        RecordStore::new(data_dir, schema::EMOTIONS),
        RecordStore::new(data_dir, schema::PRIORITIES),
    ];
    for store in &stores {
        store.initialize()?;
    }
    let [medications, emotions, priorities] = stores;

    Ok(Trackers {
        data_dir: data_dir.to_path_buf(),
        medications: Collection::new(medications),
        emotions: Collection::new(emotions),
        priorities: Collection::new(priorities),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{medications, priorities, EMOTIONS, MEDICATIONS, PRIORITIES};
    use tempfile::tempdir;

    fn med_record(id: &str, drug: &str) -> Record {
        Record::new()
            .with(medications::ID, id)
            .with(medications::DRUG_NAME, drug)
            .with(medications::TIME, "09:00")
            .with(medications::DOSAGE, "50mg")
            .with(medications::COMPLETED, "false")
    }

    fn task_record(id: &str, name: &str) -> Record {
        Record::new()
            .with(priorities::ID, id)
            .with(priorities::TASK, name)
            .with(priorities::URGENCY, "높음")
            .with(priorities::IMPORTANCE, "보통")
            .with(priorities::STATUS, "미완료")
    }

    #[test]
    fn initialize_then_load_yields_empty_table_with_schema() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(&dir.path().join("data"), MEDICATIONS);
        store.initialize().unwrap();

        let table = store.load();
        assert!(table.is_empty());
        assert_eq!(table.columns(), MEDICATIONS.columns);
        let on_disk = fs::read_to_string(store.path()).unwrap();
        assert_eq!(on_disk, "ID,약물 이름,복약 시간,복용 용량,복약 완료\n");
    }

    #[test]
    fn initialize_twice_leaves_valid_file_alone() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path(), MEDICATIONS);
        store.initialize().unwrap();
        let table = store.load().append(med_record("a", "항우울제")).unwrap();
        store.persist(&table).unwrap();
        let before = fs::read(store.path()).unwrap();

        store.initialize().unwrap();
        store.initialize().unwrap();

        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn initialize_rewrites_zero_length_file() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path(), PRIORITIES);
        fs::write(store.path(), "").unwrap();

        store.initialize().unwrap();

        let on_disk = fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.starts_with("ID,작업명,긴급도,중요도,상태"));
    }

    #[test]
    fn initialize_moves_malformed_file_aside() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path(), EMOTIONS);
        fs::write(store.path(), "not,the,right\nheader,at,all\n").unwrap();

        store.initialize().unwrap();

        assert!(store.load().is_empty());
        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        let saved = fs::read_to_string(backups[0].path()).unwrap();
        assert_eq!(saved, "not,the,right\nheader,at,all\n");
    }

    #[test]
    fn load_of_missing_emotion_file_has_five_columns_and_no_rows() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path(), EMOTIONS);

        let table = store.load();
        assert_eq!(table.columns(), &["ID", "날짜", "감정", "점수", "기록"]);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn load_of_ragged_file_falls_back_to_empty() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path(), MEDICATIONS);
        fs::write(
            store.path(),
            "ID,약물 이름,복약 시간,복용 용량,복약 완료\nx,only-two\n",
        )
        .unwrap();

        let table = store.load();
        assert!(table.is_empty());
        assert_eq!(table.schema(), MEDICATIONS);
    }

    #[test]
    fn append_preserves_insertion_order() {
        let table = Table::empty(MEDICATIONS)
            .append(med_record("1", "a"))
            .unwrap()
            .append(med_record("2", "b"))
            .unwrap();

        let ids: Vec<&str> = table.rows().iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn append_rejects_missing_and_extra_columns() {
        let missing = Record::new().with(medications::ID, "1");
        let err = Table::empty(MEDICATIONS).append(missing).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch(_)));

        let extra = med_record("1", "a").with("메모", "x");
        let err = Table::empty(MEDICATIONS).append(extra).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch(_)));
    }

    #[test]
    fn append_rejects_reused_id() {
        let table = Table::empty(MEDICATIONS)
            .append(med_record("1", "a"))
            .unwrap();
        let err = table.append(med_record("1", "b")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == "1"));
    }

    #[test]
    fn update_field_touches_only_the_target_cell() {
        let table = Table::empty(PRIORITIES)
            .append(task_record("1", "청소"))
            .unwrap()
            .append(task_record("2", "운동"))
            .unwrap();
        let before = table.clone();

        let after = table.update_field("2", priorities::STATUS, "완료").unwrap();

        assert_eq!(after.rows()[0], before.rows()[0]);
        assert_eq!(after.rows()[1][..4], before.rows()[1][..4]);
        assert_eq!(after.rows()[1][4], "완료");
    }

    #[test]
    fn update_field_reports_unknown_id_and_column() {
        let table = Table::empty(PRIORITIES)
            .append(task_record("1", "청소"))
            .unwrap();

        let err = table
            .clone()
            .update_field("nope", priorities::STATUS, "완료")
            .unwrap_err();
        assert!(matches!(err, StoreError::RecordNotFound(_)));

        let err = table
            .clone()
            .update_field("1", "없는 열", "x")
            .unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch(_)));

        let err = table.update_field("1", priorities::ID, "2").unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch(_)));
    }

    #[test]
    fn persist_then_load_round_trips_awkward_text() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path(), MEDICATIONS);
        let table = Table::empty(MEDICATIONS)
            .append(med_record("1", "약, \"따옴표\" 포함"))
            .unwrap()
            .append(med_record("2", "여러\n줄"))
            .unwrap();

        store.persist(&table).unwrap();

        assert_eq!(store.load(), table);
        assert!(!store.path().with_extension("csv.tmp").exists());
    }

    #[test]
    fn medication_completion_scenario() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path(), MEDICATIONS);
        store.initialize().unwrap();

        let table = store.load().append(med_record("m1", "항우울제")).unwrap();
        store.persist(&table).unwrap();
        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.rows()[0][4], "false");

        let updated = loaded
            .update_field("m1", medications::COMPLETED, "true")
            .unwrap();
        store.persist(&updated).unwrap();
        let reloaded = store.load();
        assert_eq!(
            reloaded.rows()[0],
            vec!["m1", "항우울제", "09:00", "50mg", "true"]
        );
    }

    #[test]
    fn persist_rejects_foreign_table() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path(), MEDICATIONS);
        let err = store.persist(&Table::empty(EMOTIONS)).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch(_)));
    }

    #[test]
    fn persist_into_missing_directory_surfaces_failure() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(&dir.path().join("absent"), MEDICATIONS);
        let err = store.persist(&Table::empty(MEDICATIONS)).unwrap_err();
        assert!(matches!(err, StoreError::PersistFailure { .. }));
    }

    #[test]
    fn create_trackers_initializes_all_files() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let trackers = create_trackers(&data_dir).unwrap();

        for file in ["medications.csv", "emotions.csv", "priorities.csv"] {
            assert!(data_dir.join(file).exists(), "{} missing", file);
        }
        assert_eq!(trackers.priorities.store().schema(), PRIORITIES);
    }

    #[actix_web::test]
    async fn collection_mutate_persists_before_returning() {
        let dir = tempdir().unwrap();
        let trackers = create_trackers(dir.path()).unwrap();

        let table = trackers
            .priorities
            .mutate(|t| t.append(task_record("t1", "산책")))
            .await
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(trackers.priorities.store().load(), table);
    }

    #[actix_web::test]
    async fn collection_mutate_failure_leaves_file_unchanged() {
        let dir = tempdir().unwrap();
        let trackers = create_trackers(dir.path()).unwrap();
        let before = fs::read(trackers.priorities.store().path()).unwrap();

        let result = trackers
            .priorities
            .mutate(|t| t.update_field("missing", priorities::STATUS, "완료"))
            .await;

        assert!(result.is_err());
        assert_eq!(
            fs::read(trackers.priorities.store().path()).unwrap(),
            before
        );
    }
}
