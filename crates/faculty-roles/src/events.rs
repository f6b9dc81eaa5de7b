//! Structured events emitted by the dashboard workflows.
//!
//! Workflows never log directly; they hand a [`DashboardEvent`] to the injected
//! [`EventSink`]. The service wires in [`TracingEventSink`], tests use
//! [`RecordingEventSink`] to assert on what happened.

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    ListingsLoaded {
        rows: usize,
        open: usize,
    },
    ListingsUnavailable {
        reason: String,
    },
    FormCreated {
        form_id: String,
    },
    FormReopened {
        form_id: String,
    },
    FormUnavailable {
        form_id: String,
        reason: String,
    },
    FormRebuilt {
        form_id: String,
        role_choices: usize,
        questions: usize,
    },
    ProvisioningFailed {
        reason: String,
    },
    ResponseStoreLinked {
        spreadsheet_id: String,
        created: bool,
    },
    ResponseStoreUnavailable {
        reason: String,
    },
    PropertiesUnavailable {
        key: &'static str,
        reason: String,
    },
    ProfileSourceFailed {
        source: &'static str,
        reason: String,
    },
    ProfileResolved {
        email: String,
        sources: Vec<&'static str>,
    },
    PrefillFallback {
        reason: String,
    },
    PrefillSkippedChoice {
        choice: String,
    },
    NotificationSent {
        recipient: String,
        applicant: String,
    },
    NotificationFailed {
        recipient: String,
        reason: String,
    },
    ResponsesUnavailable {
        reason: String,
    },
    ResponseRecorded {
        form_id: String,
        spreadsheet_id: Option<String>,
    },
}

/// Receiver for workflow events.
pub trait EventSink: Debug + Send + Sync {
    fn emit(&self, event: DashboardEvent);
}

/// Renders every event as a `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: DashboardEvent) {
        match event {
            DashboardEvent::ListingsLoaded { rows, open } => {
                info!(rows, open, "faculty role listings loaded")
            }
            DashboardEvent::ListingsUnavailable { reason } => {
                warn!(%reason, "faculty role listings unavailable; serving none")
            }
            DashboardEvent::FormCreated { form_id } => info!(%form_id, "interest form created"),
            DashboardEvent::FormReopened { form_id } => {
                debug!(%form_id, "reusing stored interest form")
            }
            DashboardEvent::FormUnavailable { form_id, reason } => {
                warn!(%form_id, %reason, "stored interest form could not be opened")
            }
            DashboardEvent::FormRebuilt {
                form_id,
                role_choices,
                questions,
            } => info!(%form_id, role_choices, questions, "interest form rebuilt"),
            DashboardEvent::ProvisioningFailed { reason } => {
                warn!(%reason, "interest form provisioning failed")
            }
            DashboardEvent::ResponseStoreLinked {
                spreadsheet_id,
                created,
            } => info!(%spreadsheet_id, created, "form responses routed to spreadsheet"),
            DashboardEvent::ResponseStoreUnavailable { reason } => {
                warn!(%reason, "form response collection not configured")
            }
            DashboardEvent::PropertiesUnavailable { key, reason } => {
                warn!(key, %reason, "property store unavailable")
            }
            DashboardEvent::ProfileSourceFailed { source, reason } => {
                debug!(source, %reason, "profile source contributed nothing")
            }
            DashboardEvent::ProfileResolved { email, sources } => {
                debug!(%email, ?sources, "respondent profile resolved")
            }
            DashboardEvent::PrefillFallback { reason } => {
                warn!(%reason, "serving plain interest form link")
            }
            DashboardEvent::PrefillSkippedChoice { choice } => {
                debug!(%choice, "role is not a choice on the current form")
            }
            DashboardEvent::NotificationSent {
                recipient,
                applicant,
            } => info!(%recipient, %applicant, "HR notification sent"),
            DashboardEvent::NotificationFailed { recipient, reason } => {
                warn!(%recipient, %reason, "HR notification not delivered")
            }
            DashboardEvent::ResponsesUnavailable { reason } => {
                warn!(%reason, "form responses could not be read")
            }
            DashboardEvent::ResponseRecorded {
                form_id,
                spreadsheet_id,
            } => info!(
                %form_id,
                spreadsheet_id = spreadsheet_id.as_deref().unwrap_or("none"),
                "form response recorded"
            ),
        }
    }
}

/// Keeps every emitted event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DashboardEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DashboardEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: DashboardEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
