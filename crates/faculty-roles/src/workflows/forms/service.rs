use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::questions::{FormQuestion, ItemId};

/// A form as the hosting service knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormHandle {
    pub form_id: String,
    pub title: String,
    pub published_url: String,
    pub edit_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSettings {
    pub title: String,
    pub description: String,
    pub collect_email: bool,
    pub require_login: bool,
    pub limit_one_response: bool,
    pub show_link_to_respond_again: bool,
}

impl FormSettings {
    /// Signed-in respondents, email collected, any number of submissions.
    pub fn interest_form(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            collect_email: true,
            require_login: true,
            limit_one_response: false,
            show_link_to_respond_again: false,
        }
    }
}

/// Spreadsheet receiving form submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseStore {
    pub spreadsheet_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefilledAnswer {
    pub item: ItemId,
    pub value: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FormServiceError {
    #[error("form {0} not found")]
    FormNotFound(String),
    #[error("spreadsheet {0} not found")]
    SpreadsheetNotFound(String),
    #[error("form {form_id} has no item {item}")]
    UnknownItem { form_id: String, item: String },
    #[error("{value:?} is not a choice of item {item}")]
    InvalidChoice { item: String, value: String },
    #[error("form service request failed: {0}")]
    Backend(String),
    #[error("form service runtime unavailable: {0}")]
    Runtime(String),
    #[error("form store unreadable: {0}")]
    Storage(String),
}

/// The hosted form builder.
pub trait FormService: Debug + Send + Sync {
    fn create_form(&self, title: &str) -> Result<FormHandle, FormServiceError>;
    fn open_form(&self, form_id: &str) -> Result<FormHandle, FormServiceError>;
    fn apply_settings(&self, form_id: &str, settings: &FormSettings)
        -> Result<(), FormServiceError>;
    fn clear_items(&self, form_id: &str) -> Result<(), FormServiceError>;
    /// Appends a question and returns the id the service assigned to it.
    fn add_item(&self, form_id: &str, question: &FormQuestion) -> Result<ItemId, FormServiceError>;
    fn set_destination(&self, form_id: &str, spreadsheet_id: &str)
        -> Result<(), FormServiceError>;
    fn response_count(&self, form_id: &str) -> Result<usize, FormServiceError>;
    /// Shareable link with the given answers filled in. Never submits.
    fn prefilled_url(
        &self,
        form_id: &str,
        answers: &[PrefilledAnswer],
    ) -> Result<String, FormServiceError>;
}

/// Opens or creates the spreadsheet that collects responses.
pub trait ResponseStoreGateway: Debug + Send + Sync {
    fn open(&self, spreadsheet_id: &str) -> Result<ResponseStore, FormServiceError>;
    fn create(&self, name: &str) -> Result<ResponseStore, FormServiceError>;
}
