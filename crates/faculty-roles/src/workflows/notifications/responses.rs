use std::sync::Arc;

use super::submission::Submission;
use crate::events::{DashboardEvent, EventSink};
use crate::workflows::forms::{PropertyStore, RESPONSE_SHEET_ID_KEY};
use crate::workflows::sheets::{row_is_blank, SheetStore};

/// Reads submissions back out of the response spreadsheet recorded by the
/// provisioner.
#[derive(Debug, Clone)]
pub struct ResponseFeed {
    sheets: Arc<dyn SheetStore>,
    properties: Arc<dyn PropertyStore>,
    tab: String,
    events: Arc<dyn EventSink>,
}

impl ResponseFeed {
    pub fn new(
        sheets: Arc<dyn SheetStore>,
        properties: Arc<dyn PropertyStore>,
        tab: impl Into<String>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            sheets,
            properties,
            tab: tab.into(),
            events,
        }
    }

    /// The last non-blank response row, keyed by the header row.
    pub fn latest_submission(&self) -> Option<Submission> {
        let spreadsheet_id = match self.properties.get(RESPONSE_SHEET_ID_KEY) {
            Ok(Some(id)) if !id.trim().is_empty() => id,
            Ok(_) => {
                self.unavailable("no response spreadsheet recorded".to_string());
                return None;
            }
            Err(err) => {
                self.events.emit(DashboardEvent::PropertiesUnavailable {
                    key: RESPONSE_SHEET_ID_KEY,
                    reason: err.to_string(),
                });
                return None;
            }
        };

        let rows = match self.sheets.read_rows(&spreadsheet_id, &self.tab) {
            Ok(rows) => rows,
            Err(err) => {
                self.unavailable(err.to_string());
                return None;
            }
        };

        let (headers, responses) = rows.split_first()?;
        let latest = responses.iter().rev().find(|row| !row_is_blank(row))?;
        Some(Submission::from_row(headers, latest))
    }

    fn unavailable(&self, reason: String) {
        self.events
            .emit(DashboardEvent::ResponsesUnavailable { reason });
    }
}
