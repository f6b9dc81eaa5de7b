use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::domain::Listing;
use crate::events::{DashboardEvent, EventSink};
use crate::workflows::sheets::{row_is_blank, CellValue, SheetStore};

/// Where the roles tab lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSource {
    pub spreadsheet_id: String,
    pub tab: String,
}

/// Counts shown by the administrator check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub role_count: usize,
    pub roles_with_form_url: usize,
    pub divisions: Vec<String>,
}

/// Reads the roles tab and shapes it into open listings.
///
/// Read failures never reach the caller: they are reported through the event
/// sink and the reader answers with an empty list, so "no roles" and "roles
/// tab unreachable" look the same from the outside.
#[derive(Debug, Clone)]
pub struct ListingReader {
    sheets: Arc<dyn SheetStore>,
    source: ListingSource,
    events: Arc<dyn EventSink>,
}

impl ListingReader {
    pub fn new(
        sheets: Arc<dyn SheetStore>,
        source: ListingSource,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            sheets,
            source,
            events,
        }
    }

    pub fn source(&self) -> &ListingSource {
        &self.source
    }

    pub fn list_open_roles(&self) -> Vec<Listing> {
        match self
            .sheets
            .read_rows(&self.source.spreadsheet_id, &self.source.tab)
        {
            Ok(rows) => {
                let listings = open_listings(&rows);
                self.events.emit(DashboardEvent::ListingsLoaded {
                    rows: rows.len().saturating_sub(1),
                    open: listings.len(),
                });
                listings
            }
            Err(err) => {
                self.events.emit(DashboardEvent::ListingsUnavailable {
                    reason: err.to_string(),
                });
                Vec::new()
            }
        }
    }

    pub fn list_divisions(&self) -> Vec<String> {
        divisions(&self.list_open_roles())
    }

    pub fn summary(&self) -> DashboardSummary {
        let listings = self.list_open_roles();
        let roles_with_form_url = listings
            .iter()
            .filter(|listing| listing.interest_form_url.is_some())
            .count();

        DashboardSummary {
            role_count: listings.len(),
            roles_with_form_url,
            divisions: divisions(&listings),
        }
    }
}

/// Drops the header row and blank rows, then keeps rows whose status is open.
pub fn open_listings(rows: &[Vec<CellValue>]) -> Vec<Listing> {
    rows.iter()
        .skip(1)
        .filter(|row| !row_is_blank(row))
        .map(|row| Listing::from_row(row))
        .filter(Listing::is_open)
        .collect()
}

/// Distinct non-empty divisions, sorted ascending.
pub fn divisions(listings: &[Listing]) -> Vec<String> {
    listings
        .iter()
        .map(|listing| listing.division.as_str())
        .filter(|division| !division.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
