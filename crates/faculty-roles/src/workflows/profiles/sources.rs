use std::collections::HashMap;
use std::fmt::Debug;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use super::domain::ProfileFragment;
use super::inference;
use crate::workflows::sheets::{cell_text, SheetError, SheetStore};

/// How a source's contribution is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAuthority {
    /// Replaces every field it carries and ends the lookup.
    Authoritative,
    /// Fills fields that are still empty; the lookup continues.
    Supplementary,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileSourceError {
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// One step of the profile fallback chain.
pub trait ProfileSource: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn authority(&self) -> SourceAuthority {
        SourceAuthority::Supplementary
    }

    fn lookup(&self, email: &str) -> Result<Option<ProfileFragment>, ProfileSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileTableError {
    #[error("failed to read profile table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid profile table: {0}")]
    Json(#[from] serde_json::Error),
}

/// Hand-maintained profiles keyed by exact email.
#[derive(Debug, Clone, Default)]
pub struct StaticProfileTable {
    entries: HashMap<String, ProfileFragment>,
}

impl StaticProfileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, email: impl Into<String>, fragment: ProfileFragment) -> Self {
        self.entries.insert(email.into(), fragment);
        self
    }

    /// Loads a JSON object mapping email to profile fields.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ProfileTableError> {
        let entries: HashMap<String, ProfileFragment> = serde_json::from_reader(reader)?;
        Ok(Self { entries })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProfileTableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProfileSource for StaticProfileTable {
    fn name(&self) -> &'static str {
        "static_table"
    }

    fn authority(&self) -> SourceAuthority {
        SourceAuthority::Authoritative
    }

    fn lookup(&self, email: &str) -> Result<Option<ProfileFragment>, ProfileSourceError> {
        Ok(self.entries.get(email).cloned())
    }
}

/// Staff directory tab with columns Email, Full Name, Job Title, Department, Phone.
#[derive(Debug, Clone)]
pub struct DirectorySheetSource {
    sheets: Arc<dyn SheetStore>,
    spreadsheet_id: String,
    tab: String,
}

impl DirectorySheetSource {
    pub fn new(
        sheets: Arc<dyn SheetStore>,
        spreadsheet_id: impl Into<String>,
        tab: impl Into<String>,
    ) -> Self {
        Self {
            sheets,
            spreadsheet_id: spreadsheet_id.into(),
            tab: tab.into(),
        }
    }
}

impl ProfileSource for DirectorySheetSource {
    fn name(&self) -> &'static str {
        "directory_sheet"
    }

    fn authority(&self) -> SourceAuthority {
        SourceAuthority::Authoritative
    }

    fn lookup(&self, email: &str) -> Result<Option<ProfileFragment>, ProfileSourceError> {
        let rows = match self.sheets.read_rows(&self.spreadsheet_id, &self.tab) {
            Ok(rows) => rows,
            // The directory tab is optional.
            Err(SheetError::TabNotFound { .. }) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let fragment = rows
            .iter()
            .skip(1)
            .find(|row| cell_text(row, 0) == email)
            .map(|row| ProfileFragment {
                name: Some(cell_text(row, 1)),
                job_title: Some(cell_text(row, 2)),
                department: Some(cell_text(row, 3)),
                phone: Some(cell_text(row, 4)),
            });

        Ok(fragment)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory service unavailable: {0}")]
    Unavailable(String),
    #[error("directory access denied: {0}")]
    Forbidden(String),
}

/// Lookup by email against an external people directory (contacts service,
/// people/profile API). Any field of the answer may be absent.
pub trait DirectoryLookup: Debug + Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<ProfileFragment>, DirectoryError>;
}

/// Adapts a [`DirectoryLookup`] into a supplementary profile source.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    name: &'static str,
    lookup: Arc<dyn DirectoryLookup>,
}

impl DirectorySource {
    pub fn contacts(lookup: Arc<dyn DirectoryLookup>) -> Self {
        Self {
            name: "contacts",
            lookup,
        }
    }

    pub fn people(lookup: Arc<dyn DirectoryLookup>) -> Self {
        Self {
            name: "people_api",
            lookup,
        }
    }
}

impl ProfileSource for DirectorySource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn lookup(&self, email: &str) -> Result<Option<ProfileFragment>, ProfileSourceError> {
        Ok(self.lookup.find_by_email(email)?)
    }
}

/// Directory answered from a fixed set of entries. Local runs load an export
/// in the profile table's JSON shape.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: HashMap<String, ProfileFragment>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, email: impl Into<String>, fragment: ProfileFragment) -> Self {
        self.entries.insert(email.into(), fragment);
        self
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProfileTableError> {
        let table = StaticProfileTable::from_path(path)?;
        Ok(Self {
            entries: table.entries,
        })
    }
}

impl DirectoryLookup for StaticDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<ProfileFragment>, DirectoryError> {
        Ok(self.entries.get(email).cloned())
    }
}

/// Last resort: guesses a department from the email's local part. Never
/// guesses a job title.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailPatternSource;

impl ProfileSource for EmailPatternSource {
    fn name(&self) -> &'static str {
        "email_pattern"
    }

    fn lookup(&self, email: &str) -> Result<Option<ProfileFragment>, ProfileSourceError> {
        Ok(inference::infer_department(email).map(|department| ProfileFragment {
            department: Some(department.to_string()),
            ..ProfileFragment::default()
        }))
    }
}
