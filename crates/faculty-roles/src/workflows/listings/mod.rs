mod domain;
mod reader;

pub use domain::{columns, role_choice, status_is_open, Listing};
pub use reader::{divisions, open_listings, DashboardSummary, ListingReader, ListingSource};
