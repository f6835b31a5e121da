use crate::db::{Record, StoreError, Table};
use crate::schema::{self, emotions, medications, priorities, Schema};
use crate::sentiment::Sentiment;
use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// --- Serde helpers ---

// Times travel as "HH:MM" everywhere, on disk and over the wire.
mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid time '{}', expected HH:MM", raw))
        })
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, hh_mm::FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn default_medication_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}

fn default_mood_date() -> NaiveDate {
    Local::now().date_naive()
}

fn default_mood_score() -> u8 {
    5
}

pub const DEFAULT_MOOD_NOTE: &str = "오늘의 기분을 기록하세요.";

fn default_mood_note() -> String {
    DEFAULT_MOOD_NOTE.to_string()
}

// --- Enumerations ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MoodLabel {
    #[serde(rename = "😀 행복", alias = "happy")]
    Happy,
    #[serde(rename = "😞 슬픔", alias = "sad")]
    Sad,
    #[serde(rename = "😠 화남", alias = "angry")]
    Angry,
    #[serde(rename = "😨 불안", alias = "anxious")]
    Anxious,
    #[serde(rename = "😐 보통", alias = "neutral")]
    Neutral,
}

impl MoodLabel {
    pub const ALL: [MoodLabel; 5] = [
        MoodLabel::Happy,
        MoodLabel::Sad,
        MoodLabel::Angry,
        MoodLabel::Anxious,
        MoodLabel::Neutral,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "😀 행복",
            MoodLabel::Sad => "😞 슬픔",
            MoodLabel::Angry => "😠 화남",
            MoodLabel::Anxious => "😨 불안",
            MoodLabel::Neutral => "😐 보통",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    #[serde(rename = "높음", alias = "high")]
    High,
    #[serde(rename = "보통", alias = "medium")]
    Medium,
    #[serde(rename = "낮음", alias = "low")]
    Low,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::High, Level::Medium, Level::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Level::High => "높음",
            Level::Medium => "보통",
            Level::Low => "낮음",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    #[serde(rename = "미완료", alias = "pending")]
    Pending,
    #[serde(rename = "완료", alias = "done")]
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 2] = [TaskStatus::Pending, TaskStatus::Done];

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "미완료",
            TaskStatus::Done => "완료",
        }
    }
}

macro_rules! labelled_enum {
    ($($ty:ident),+ $(,)?) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .into_iter()
                    .find(|v| v.label() == s.trim())
                    .ok_or(())
            }
        }
    )+};
}

labelled_enum!(MoodLabel, Level, TaskStatus);

// --- Record conversion ---

/// A typed row of one of the tracked tables.
pub trait TrackedRecord: Sized {
    const SCHEMA: Schema;

    fn id(&self) -> Uuid;
    fn to_record(&self) -> Record;
    fn from_record(record: &Record) -> Result<Self, StoreError>;
}

fn invalid(column: &str, value: &str) -> StoreError {
    StoreError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn cell<T: FromStr>(record: &Record, column: &str) -> Result<T, StoreError> {
    let raw = record.require(column)?;
    raw.trim().parse::<T>().map_err(|_| invalid(column, raw))
}

// Older files carry Python-style True/False.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Typed view of a table. Rows that do not coerce are skipped.
pub fn entries<T: TrackedRecord>(table: &Table) -> Vec<T> {
    table
        .records()
        .filter_map(|record| match T::from_record(&record) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!(
                    "Skipping unreadable {} row {:?}: {}",
                    T::SCHEMA.name,
                    record.get(T::SCHEMA.id_column()),
                    e
                );
                None
            }
        })
        .collect()
}

pub fn find_entry<T: TrackedRecord>(table: &Table, id: Uuid) -> Result<T, StoreError> {
    let record = table
        .get(&id.to_string())
        .ok_or_else(|| StoreError::RecordNotFound(id.to_string()))?;
    T::from_record(&record)
}

// --- Medication Model ---
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MedicationEntry {
    pub id: Uuid,
    pub drug_name: String,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    pub dosage: String,
    pub completed: bool,
}

impl TrackedRecord for MedicationEntry {
    const SCHEMA: Schema = schema::MEDICATIONS;

    fn id(&self) -> Uuid {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with(medications::ID, self.id.to_string())
            .with(medications::DRUG_NAME, self.drug_name.clone())
            .with(medications::TIME, self.time.format(hh_mm::FORMAT).to_string())
            .with(medications::DOSAGE, self.dosage.clone())
            .with(medications::COMPLETED, self.completed.to_string())
    }

    fn from_record(record: &Record) -> Result<Self, StoreError> {
        let time_raw = record.require(medications::TIME)?;
        let completed_raw = record.require(medications::COMPLETED)?;
        Ok(MedicationEntry {
            id: cell(record, medications::ID)?,
            drug_name: record.require(medications::DRUG_NAME)?.to_string(),
            time: parse_time(time_raw).ok_or_else(|| invalid(medications::TIME, time_raw))?,
            dosage: record.require(medications::DOSAGE)?.to_string(),
            completed: parse_bool(completed_raw)
                .ok_or_else(|| invalid(medications::COMPLETED, completed_raw))?,
        })
    }
}

impl From<CreateMedicationPayload> for MedicationEntry {
    fn from(payload: CreateMedicationPayload) -> Self {
        MedicationEntry {
            id: Uuid::new_v4(),
            drug_name: payload.drug_name,
            time: payload.time,
            dosage: payload.dosage,
            completed: false,
        }
    }
}

// --- Mood Model ---
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoodEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub mood: MoodLabel,
    pub score: u8,
    pub note: String,
}

impl TrackedRecord for MoodEntry {
    const SCHEMA: Schema = schema::EMOTIONS;

    fn id(&self) -> Uuid {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with(emotions::ID, self.id.to_string())
            .with(emotions::DATE, self.date.to_string())
            .with(emotions::MOOD, self.mood.label())
            .with(emotions::SCORE, self.score.to_string())
            .with(emotions::NOTE, self.note.clone())
    }

    fn from_record(record: &Record) -> Result<Self, StoreError> {
        Ok(MoodEntry {
            id: cell(record, emotions::ID)?,
            date: cell(record, emotions::DATE)?,
            mood: cell(record, emotions::MOOD)?,
            score: cell(record, emotions::SCORE)?,
            note: record.require(emotions::NOTE)?.to_string(),
        })
    }
}

impl TryFrom<CreateMoodPayload> for MoodEntry {
    type Error = StoreError;

    fn try_from(payload: CreateMoodPayload) -> Result<Self, Self::Error> {
        if payload.score > MAX_MOOD_SCORE {
            return Err(invalid(emotions::SCORE, &payload.score.to_string()));
        }
        Ok(MoodEntry {
            id: Uuid::new_v4(),
            date: payload.date,
            mood: payload.mood,
            score: payload.score,
            note: payload.note,
        })
    }
}

pub const MAX_MOOD_SCORE: u8 = 10;

#[derive(Serialize, Debug, Clone)]
pub struct MoodEntryResponse {
    #[serde(flatten)]
    pub entry: MoodEntry,
    pub sentiment: Sentiment,
    pub message: Option<String>,
}

impl From<MoodEntry> for MoodEntryResponse {
    fn from(entry: MoodEntry) -> Self {
        let sentiment = Sentiment::of_note(&entry.note);
        MoodEntryResponse {
            message: sentiment.supportive_message().map(str::to_string),
            sentiment,
            entry,
        }
    }
}

// --- Task Model ---
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskEntry {
    pub id: Uuid,
    pub task: String,
    pub urgency: Level,
    pub importance: Level,
    pub status: TaskStatus,
}

impl TrackedRecord for TaskEntry {
    const SCHEMA: Schema = schema::PRIORITIES;

    fn id(&self) -> Uuid {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with(priorities::ID, self.id.to_string())
            .with(priorities::TASK, self.task.clone())
            .with(priorities::URGENCY, self.urgency.label())
            .with(priorities::IMPORTANCE, self.importance.label())
            .with(priorities::STATUS, self.status.label())
    }

    fn from_record(record: &Record) -> Result<Self, StoreError> {
        Ok(TaskEntry {
            id: cell(record, priorities::ID)?,
            task: record.require(priorities::TASK)?.to_string(),
            urgency: cell(record, priorities::URGENCY)?,
            importance: cell(record, priorities::IMPORTANCE)?,
            status: cell(record, priorities::STATUS)?,
        })
    }
}

impl From<CreateTaskPayload> for TaskEntry {
    fn from(payload: CreateTaskPayload) -> Self {
        TaskEntry {
            id: Uuid::new_v4(),
            task: payload.task,
            urgency: payload.urgency,
            importance: payload.importance,
            status: TaskStatus::Pending,
        }
    }
}

// --- PAYLOAD DTOs ---
// Shared by the JSON API and the urlencoded dashboard forms.

#[derive(Deserialize, Debug)]
pub struct CreateMedicationPayload {
    pub drug_name: String,
    #[serde(with = "hh_mm", default = "default_medication_time")]
    pub time: NaiveTime,
    pub dosage: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateMoodPayload {
    #[serde(default = "default_mood_date")]
    pub date: NaiveDate,
    pub mood: MoodLabel,
    #[serde(default = "default_mood_score")]
    pub score: u8,
    #[serde(default = "default_mood_note")]
    pub note: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateTaskPayload {
    pub task: String,
    pub urgency: Level,
    pub importance: Level,
}

// --- Analytics Models ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoodScoreStat {
    pub mood: MoodLabel,
    pub average_score: f64,
    pub entries: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskStatusCount {
    pub status: TaskStatus,
    pub count: usize,
}
