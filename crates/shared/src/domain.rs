use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Column titles of the log file header row, in column order.
pub const LOG_HEADER: [&str; 4] = ["ID", "Date/Time", "Category", "Issue Type"];

/// Slot reserved in every category for "return to category selection".
pub const RETURN_SLOT: Slot = Slot(0);

/// Button-grid position, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot(pub u8);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

macro_rules! label_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(label: impl Into<String>) -> Self {
                Self(label.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

label_newtype!(Category);
label_newtype!(Issue);

/// A finished two-level choice, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub category: Category,
    pub issue: Issue,
}

impl Selection {
    pub fn new(category: Category, issue: Issue) -> Self {
        Self { category, issue }
    }
}

/// One persisted row of the issue log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "Date/Time", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Issue Type")]
    pub issue: String,
}

/// How the id of a newly appended record is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// Previous record id + 1; the first record gets 1.
    #[default]
    Sequential,
    /// The 1-based row the record lands on (header is row 1), the numbering
    /// the legacy workbook logger used. The first record gets 2. Only the
    /// ids match; the log is still CSV and cannot continue a workbook file.
    LegacyRowNumber,
}

impl std::str::FromStr for IdPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(Self::Sequential),
            "legacy_row_number" | "legacy" => Ok(Self::LegacyRowNumber),
            other => Err(format!("unknown id policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// A single key transition reported by an input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub slot: Slot,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn pressed(slot: u8) -> Self {
        Self {
            slot: Slot(slot),
            state: KeyState::Pressed,
        }
    }

    pub fn released(slot: u8) -> Self {
        Self {
            slot: Slot(slot),
            state: KeyState::Released,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.state == KeyState::Pressed
    }
}

pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}
