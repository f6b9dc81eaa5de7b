//! Interest form provisioning and pre-filled links.
//!
//! The form is rebuilt from the open listings on every provisioning call. The
//! item id of each question is recorded in a [`QuestionLayout`] next to the
//! form id, and pre-filled links are composed from that layout rather than by
//! matching question titles.

mod drive;
mod intake;
mod local;
mod properties;
mod provisioner;
mod questions;
mod service;

pub use drive::GoogleDriveResponseStores;
pub use intake::{IntakeError, LocalIntake};
pub use local::{
    CsvResponseStores, FormRegistry, FormView, HostedForm, InMemoryResponseStores,
    LocalFormService, QuestionView,
};
pub use properties::{
    InMemoryPropertyStore, JsonFilePropertyStore, PropertyStore, PropertyStoreError, FORM_ID_KEY,
    FORM_LAYOUT_KEY, RESPONSE_SHEET_ID_KEY,
};
pub use provisioner::{
    prefill_answers, FormBackends, FormManagementInfo, FormProvisioner, PrefilledListing,
    ProvisionError, ProvisionedForm, ResponseSpreadsheetStatus,
};
pub use questions::{
    FormQuestion, FormQuestionSet, ItemId, QuestionKind, QuestionLayout, QuestionRole,
    AVAILABILITY_OPTIONS,
};
pub use service::{
    FormHandle, FormService, FormServiceError, FormSettings, PrefilledAnswer, ResponseStore,
    ResponseStoreGateway,
};
