use google_sheets4::api::{Scope, ValueRange};
use google_sheets4::Sheets;
use tokio::runtime::Handle;

use super::cell::CellValue;
use super::store::{layout_response, ResponseSheet, SheetError, SheetRows, SheetStore};

/// Thin wrapper around the generated google-sheets4 client so the synchronous
/// workflows can read tabs without exposing async details.
///
/// Calls block on the given runtime handle, so they must run off the async
/// workers (inside `spawn_blocking` or on a plain thread).
pub struct GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    hub: Sheets<C>,
    runtime: Handle,
}

impl<C> GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    pub fn new(hub: Sheets<C>, runtime: Handle) -> Self {
        Self { hub, runtime }
    }

    /// Binds to the runtime the caller is running in.
    pub fn on_current_runtime(hub: Sheets<C>) -> Result<Self, SheetError> {
        let runtime = Handle::try_current().map_err(|err| SheetError::Runtime(err.to_string()))?;
        Ok(Self::new(hub, runtime))
    }

    fn map_error<E: std::fmt::Display>(err: E) -> SheetError {
        SheetError::Backend(err.to_string())
    }
}

impl<C> std::fmt::Debug for GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsClient").finish_non_exhaustive()
    }
}

impl<C> SheetStore for GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    fn read_rows(&self, spreadsheet_id: &str, tab: &str) -> Result<SheetRows, SheetError> {
        let range = a1_tab_range(tab);
        // Formatted values keep response timestamps as the dates the sheet shows.
        let result = self.runtime.block_on(async {
            self.hub
                .spreadsheets()
                .values_get(spreadsheet_id, &range)
                .value_render_option("FORMATTED_VALUE")
                .major_dimension("ROWS")
                .doit()
                .await
        });

        let (_, value_range) = result.map_err(GoogleSheetsClient::<C>::map_error)?;
        Ok(rows_from_values(value_range.values))
    }
}

impl<C> ResponseSheet for GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    fn append_response(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        answers: &[(String, String)],
    ) -> Result<(), SheetError> {
        let range = a1_tab_range(tab);
        let header_range = format!("{range}!1:1");

        self.runtime.block_on(async {
            let (_, current) = self
                .hub
                .spreadsheets()
                .values_get(spreadsheet_id, &header_range)
                .value_render_option("FORMATTED_VALUE")
                .add_scope(Scope::Spreadsheet)
                .doit()
                .await
                .map_err(GoogleSheetsClient::<C>::map_error)?;

            let header: Vec<String> = rows_from_values(current.values)
                .into_iter()
                .next()
                .map(|cells| cells.iter().map(CellValue::to_text).collect())
                .unwrap_or_default();
            let (layout, row) = layout_response(&header, answers);

            if layout != header {
                self.hub
                    .spreadsheets()
                    .values_update(row_values(&layout), spreadsheet_id, &header_range)
                    .value_input_option("RAW")
                    .add_scope(Scope::Spreadsheet)
                    .doit()
                    .await
                    .map_err(GoogleSheetsClient::<C>::map_error)?;
            }

            self.hub
                .spreadsheets()
                .values_append(row_values(&row), spreadsheet_id, &range)
                .value_input_option("RAW")
                .insert_data_option("INSERT_ROWS")
                .add_scope(Scope::Spreadsheet)
                .doit()
                .await
                .map_err(GoogleSheetsClient::<C>::map_error)?;
            Ok::<(), SheetError>(())
        })
    }
}

fn row_values(cells: &[String]) -> ValueRange {
    ValueRange {
        major_dimension: Some("ROWS".to_string()),
        values: Some(vec![cells
            .iter()
            .map(|cell| serde_json::Value::String(cell.clone()))
            .collect()]),
        ..ValueRange::default()
    }
}

/// A1 range covering a whole tab; quotes inside the tab name are doubled.
fn a1_tab_range(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

fn rows_from_values(values: Option<Vec<Vec<serde_json::Value>>>) -> SheetRows {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|row| row.into_iter().map(CellValue::from_json).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tab_names_are_quoted_for_a1_ranges() {
        assert_eq!(a1_tab_range("Faculty Roles"), "'Faculty Roles'");
        assert_eq!(a1_tab_range("Dean's List"), "'Dean''s List'");
    }

    #[test]
    fn formatted_timestamps_stay_readable() {
        let rows = rows_from_values(Some(vec![
            vec![json!("Timestamp"), json!("Full Name")],
            vec![json!("3/2/2026 9:09:56"), json!("Kim Tan")],
        ]));

        assert_eq!(rows[1][0].to_text(), "3/2/2026 9:09:56");
        assert_eq!(rows[1][1], CellValue::Text("Kim Tan".into()));
    }

    #[test]
    fn appended_rows_are_sent_as_raw_strings() {
        let request = row_values(&["2026-03-02 09:09:56".to_string(), String::new()]);

        assert_eq!(request.major_dimension.as_deref(), Some("ROWS"));
        assert_eq!(
            request.values,
            Some(vec![vec![json!("2026-03-02 09:09:56"), json!("")]])
        );
    }

    #[test]
    fn empty_range_has_no_rows() {
        assert!(rows_from_values(None).is_empty());
    }
}
