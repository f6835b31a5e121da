// MindGarden/backend/src/schema.rs
// Fixed column layouts of the three tracked tables.
// Column names match the files written by earlier versions of the app.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub file_name: &'static str,
    /// columns[0] is always the id column
    pub columns: &'static [&'static str],
}

impl Schema {
    pub fn id_column(&self) -> &'static str {
        self.columns[0]
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }
}

pub mod medications {
    pub const ID: &str = "ID";
    pub const DRUG_NAME: &str = "약물 이름";
    pub const TIME: &str = "복약 시간";
    pub const DOSAGE: &str = "복용 용량";
    pub const COMPLETED: &str = "복약 완료";
}

pub mod emotions {
    pub const ID: &str = "ID";
    pub const DATE: &str = "날짜";
    pub const MOOD: &str = "감정";
    pub const SCORE: &str = "점수";
    pub const NOTE: &str = "기록";
}

pub mod priorities {
    pub const ID: &str = "ID";
    pub const TASK: &str = "작업명";
    pub const URGENCY: &str = "긴급도";
    pub const IMPORTANCE: &str = "중요도";
    pub const STATUS: &str = "상태";
}

pub const MEDICATIONS: Schema = Schema {
    name: "medications",
    file_name: "medications.csv",
    columns: &[
        medications::ID,
        medications::DRUG_NAME,
        medications::TIME,
        medications::DOSAGE,
        medications::COMPLETED,
    ],
};

pub const EMOTIONS: Schema = Schema {
    name: "emotions",
    file_name: "emotions.csv",
    columns: &[
        emotions::ID,
        emotions::DATE,
        emotions::MOOD,
        emotions::SCORE,
        emotions::NOTE,
    ],
};

pub const PRIORITIES: Schema = Schema {
    name: "priorities",
    file_name: "priorities.csv",
    columns: &[
        priorities::ID,
        priorities::TASK,
        priorities::URGENCY,
        priorities::IMPORTANCE,
        priorities::STATUS,
    ],
};
