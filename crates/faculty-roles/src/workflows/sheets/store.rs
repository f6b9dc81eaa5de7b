use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use super::cell::CellValue;

pub type SheetRows = Vec<Vec<CellValue>>;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("spreadsheet {0} not found")]
    SpreadsheetNotFound(String),
    #[error("tab '{tab}' not found in spreadsheet {spreadsheet_id}")]
    TabNotFound { spreadsheet_id: String, tab: String },
    #[error("invalid sheet export: {0}")]
    Csv(#[from] csv::Error),
    #[error("sheet export i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("sheet backend unavailable: {0}")]
    Backend(String),
    #[error("sheet runtime unavailable: {0}")]
    Runtime(String),
}

/// Read access to the hosted spreadsheet store.
pub trait SheetStore: Debug + Send + Sync {
    /// Every populated row of `tab`, header row included.
    fn read_rows(&self, spreadsheet_id: &str, tab: &str) -> Result<SheetRows, SheetError>;
}

/// Write access used to record form responses.
pub trait ResponseSheet: Debug + Send + Sync {
    /// Appends one row of labelled answers to `tab`. The header row is written
    /// when the tab is empty and extended with labels it does not have yet.
    fn append_response(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        answers: &[(String, String)],
    ) -> Result<(), SheetError>;
}

/// Lays `answers` out under `header`. Returns the header to keep (the
/// existing one plus any new labels, in first-seen order) and the row.
pub fn layout_response(header: &[String], answers: &[(String, String)]) -> (Vec<String>, Vec<String>) {
    let mut header = header.to_vec();
    for (label, _) in answers {
        if !header.contains(label) {
            header.push(label.clone());
        }
    }

    let row = header
        .iter()
        .map(|label| {
            answers
                .iter()
                .find(|(candidate, _)| candidate == label)
                .map(|(_, answer)| answer.clone())
                .unwrap_or_default()
        })
        .collect();
    (header, row)
}

/// Spreadsheet store held in memory, keyed by spreadsheet id and tab name.
#[derive(Debug, Default)]
pub struct InMemorySheetStore {
    tabs: Mutex<HashMap<(String, String), SheetRows>>,
}

impl InMemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tab(self, spreadsheet_id: &str, tab: &str, rows: SheetRows) -> Self {
        self.put_tab(spreadsheet_id, tab, rows);
        self
    }

    pub fn put_tab(&self, spreadsheet_id: &str, tab: &str, rows: SheetRows) {
        self.tabs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((spreadsheet_id.to_string(), tab.to_string()), rows);
    }
}

impl SheetStore for InMemorySheetStore {
    fn read_rows(&self, spreadsheet_id: &str, tab: &str) -> Result<SheetRows, SheetError> {
        let tabs = self.tabs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(rows) = tabs.get(&(spreadsheet_id.to_string(), tab.to_string())) {
            return Ok(rows.clone());
        }

        if tabs.keys().any(|(id, _)| id == spreadsheet_id) {
            Err(SheetError::TabNotFound {
                spreadsheet_id: spreadsheet_id.to_string(),
                tab: tab.to_string(),
            })
        } else {
            Err(SheetError::SpreadsheetNotFound(spreadsheet_id.to_string()))
        }
    }
}

impl ResponseSheet for InMemorySheetStore {
    fn append_response(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        answers: &[(String, String)],
    ) -> Result<(), SheetError> {
        let mut tabs = self.tabs.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tabs
            .entry((spreadsheet_id.to_string(), tab.to_string()))
            .or_default();

        let existing: Vec<String> = rows
            .first()
            .map(|header| header.iter().map(CellValue::to_text).collect())
            .unwrap_or_default();
        let (header, row) = layout_response(&existing, answers);

        let header: Vec<CellValue> = header.iter().map(|label| CellValue::from_text(label)).collect();
        match rows.first_mut() {
            Some(first) => *first = header,
            None => rows.push(header),
        }
        rows.push(row.iter().map(|answer| CellValue::from_text(answer)).collect());
        Ok(())
    }
}

/// Convenience for building rows from string literals in fixtures.
pub fn text_rows<const N: usize>(rows: &[[&str; N]]) -> SheetRows {
    rows.iter()
        .map(|row| row.iter().map(|cell| CellValue::from_text(cell)).collect())
        .collect()
}
