use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use super::cell::CellValue;
use super::store::{layout_response, ResponseSheet, SheetError, SheetRows, SheetStore};

/// Reads spreadsheet tabs exported as CSV files laid out as
/// `<root>/<spreadsheet_id>/<tab>.csv`. Responses are appended to the same
/// files.
#[derive(Debug, Clone)]
pub struct CsvSheetStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvSheetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn spreadsheet_dir(&self, spreadsheet_id: &str) -> Option<PathBuf> {
        let unsafe_id = spreadsheet_id.is_empty()
            || spreadsheet_id.contains(['/', '\\'])
            || spreadsheet_id.starts_with('.');
        if unsafe_id {
            return None;
        }
        let dir = self.root.join(spreadsheet_id);
        dir.is_dir().then_some(dir)
    }
}

impl SheetStore for CsvSheetStore {
    fn read_rows(&self, spreadsheet_id: &str, tab: &str) -> Result<SheetRows, SheetError> {
        let dir = self
            .spreadsheet_dir(spreadsheet_id)
            .ok_or_else(|| SheetError::SpreadsheetNotFound(spreadsheet_id.to_string()))?;

        let path = dir.join(format!("{tab}.csv"));
        if tab.contains(['/', '\\']) || !path.is_file() {
            return Err(SheetError::TabNotFound {
                spreadsheet_id: spreadsheet_id.to_string(),
                tab: tab.to_string(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(CellValue::from_text).collect());
        }

        Ok(rows)
    }
}

impl ResponseSheet for CsvSheetStore {
    fn append_response(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        answers: &[(String, String)],
    ) -> Result<(), SheetError> {
        let dir = self
            .spreadsheet_dir(spreadsheet_id)
            .ok_or_else(|| SheetError::SpreadsheetNotFound(spreadsheet_id.to_string()))?;
        if tab.is_empty() || tab.contains(['/', '\\']) {
            return Err(SheetError::TabNotFound {
                spreadsheet_id: spreadsheet_id.to_string(),
                tab: tab.to_string(),
            });
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = dir.join(format!("{tab}.csv"));
        let existing = if path.is_file() {
            self.read_rows(spreadsheet_id, tab)?
        } else {
            Vec::new()
        };
        let header: Vec<String> = existing
            .first()
            .map(|cells| cells.iter().map(CellValue::to_text).collect())
            .unwrap_or_default();
        let (layout, row) = layout_response(&header, answers);

        if layout == header {
            let file = OpenOptions::new().append(true).open(&path)?;
            let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
            writer.write_record(&row)?;
            writer.flush()?;
            return Ok(());
        }

        // The header changed, so the export is rewritten in full.
        let tmp = path.with_extension("csv.tmp");
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&tmp)?;
        writer.write_record(&layout)?;
        for cells in existing.iter().skip(1) {
            writer.write_record(cells.iter().map(CellValue::to_text))?;
        }
        writer.write_record(&row)?;
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
