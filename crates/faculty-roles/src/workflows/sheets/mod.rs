//! Spreadsheet access shared by the listing reader, the staff directory lookup,
//! and the form response feed.

mod cell;
mod csv_export;
mod google;
mod store;

pub use cell::{cell_text, row_is_blank, serial_to_datetime, CellValue, TIMESTAMP_FORMAT};
pub use csv_export::CsvSheetStore;
pub use google::GoogleSheetsClient;
pub use store::{
    layout_response, text_rows, InMemorySheetStore, ResponseSheet, SheetError, SheetRows,
    SheetStore,
};
