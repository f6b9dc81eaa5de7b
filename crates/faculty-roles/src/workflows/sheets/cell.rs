use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single spreadsheet cell as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    /// Build a cell from raw exported text. Blank text becomes [`CellValue::Empty`].
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Self::from_text(&text),
            serde_json::Value::Number(number) => number
                .as_f64()
                .map(Self::Number)
                .unwrap_or_else(|| Self::from_text(&number.to_string())),
            serde_json::Value::Bool(flag) => Self::Bool(flag),
            serde_json::Value::Null => Self::Empty,
            other => Self::from_text(&other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }

    /// Like [`CellValue::to_text`], but a number is read as a spreadsheet
    /// date serial and rendered as a timestamp.
    pub fn to_timestamp_text(&self) -> String {
        match self {
            Self::Number(serial) => serial_to_datetime(*serial)
                .map(|at| at.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| self.to_text()),
            _ => self.to_text(),
        }
    }

    /// Render the cell as display text, trimming surrounding whitespace.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                format!("{}", *number as i64)
            }
            Self::Number(number) => number.to_string(),
            Self::Bool(flag) => flag.to_string(),
            Self::Empty => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::from_text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::from_text(&value)
    }
}

/// Date serials count days (with fractional time of day) from 1899-12-30.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}

/// Text of the cell at `index`, or empty text when the row is shorter.
pub fn cell_text(row: &[CellValue], index: usize) -> String {
    row.get(index).map(CellValue::to_text).unwrap_or_default()
}

pub fn row_is_blank(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_empty)
}
