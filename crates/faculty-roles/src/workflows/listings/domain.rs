use serde::{Deserialize, Serialize};

use crate::workflows::sheets::{cell_text, CellValue};

/// Column positions of the roles tab.
pub mod columns {
    pub const DIVISION: usize = 0;
    pub const ROLE_TITLE: usize = 1;
    pub const SUMMARY: usize = 2;
    pub const DESCRIPTION_LINK: usize = 3;
    pub const INTEREST_FORM_URL: usize = 4;
    pub const STATUS: usize = 5;
}

const OPEN_MARKERS: [&str; 2] = ["available", "open"];
const CLOSED_MARKERS: [&str; 2] = ["closed", "filled"];

/// One advertised faculty role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub division: String,
    pub role_title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_form_url: Option<String>,
    pub status: String,
}

impl Listing {
    pub fn from_row(row: &[CellValue]) -> Self {
        Self {
            division: cell_text(row, columns::DIVISION),
            role_title: cell_text(row, columns::ROLE_TITLE),
            summary: cell_text(row, columns::SUMMARY),
            description_link: non_empty(cell_text(row, columns::DESCRIPTION_LINK)),
            interest_form_url: non_empty(cell_text(row, columns::INTEREST_FORM_URL)),
            status: cell_text(row, columns::STATUS),
        }
    }

    pub fn is_open(&self) -> bool {
        status_is_open(&self.status)
    }

    /// Choice label used for this role on the interest form.
    pub fn choice_label(&self) -> String {
        role_choice(&self.division, &self.role_title)
    }
}

/// `"<division> - <role title>"`, the label shared by the form and the pre-filled link.
pub fn role_choice(division: &str, role_title: &str) -> String {
    format!("{division} - {role_title}")
}

/// Open unless the status mentions "closed" or "filled". An explicit
/// "available"/"open" marker always wins, and an empty status counts as open.
pub fn status_is_open(status: &str) -> bool {
    let status = status.trim().to_lowercase();
    if OPEN_MARKERS.iter().any(|marker| status.contains(marker)) {
        return true;
    }
    !CLOSED_MARKERS.iter().any(|marker| status.contains(marker))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::sheets::CellValue;

    fn row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|cell| CellValue::from_text(cell)).collect()
    }

    #[test]
    fn status_policy_matches_markers() {
        for open in ["", "Available", "OPEN", "Re-opened", "Pending review", "tbd"] {
            assert!(status_is_open(open), "{open:?} should be open");
        }
        for closed in ["Closed", "position FILLED", "closed - internal"] {
            assert!(!status_is_open(closed), "{closed:?} should be closed");
        }
    }

    #[test]
    fn projects_fixed_columns() {
        let listing = Listing::from_row(&row(&[
            "Elementary",
            "Grade 3 Teacher",
            "Teach grade 3",
            "http://doc",
            "http://form",
            "Available",
        ]));

        assert_eq!(listing.division, "Elementary");
        assert_eq!(listing.role_title, "Grade 3 Teacher");
        assert_eq!(listing.description_link.as_deref(), Some("http://doc"));
        assert_eq!(listing.interest_form_url.as_deref(), Some("http://form"));
        assert_eq!(listing.status, "Available");
        assert_eq!(listing.choice_label(), "Elementary - Grade 3 Teacher");
    }

    #[test]
    fn short_rows_default_to_empty_text() {
        let listing = Listing::from_row(&row(&["Middle School", "Librarian"]));

        assert_eq!(listing.summary, "");
        assert_eq!(listing.description_link, None);
        assert_eq!(listing.interest_form_url, None);
        assert_eq!(listing.status, "");
        assert!(listing.is_open());
    }
}
