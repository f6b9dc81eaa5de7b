//! The surface the page and the administrator tools call into.

use crate::workflows::forms::{
    FormManagementInfo, FormProvisioner, PrefilledListing, ProvisionError, ProvisionedForm,
};
use crate::workflows::listings::{DashboardSummary, Listing, ListingReader};
use crate::workflows::notifications::{Delivery, HrNotifier, ResponseFeed, Submission};
use crate::workflows::profiles::RespondentProfile;

/// Listing reads plus, when enabled, the interest form workflows.
#[derive(Debug, Clone)]
pub struct Dashboard {
    listings: ListingReader,
    interest_forms: Option<InterestForms>,
}

impl Dashboard {
    pub fn new(listings: ListingReader) -> Self {
        Self {
            listings,
            interest_forms: None,
        }
    }

    pub fn with_interest_forms(mut self, interest_forms: InterestForms) -> Self {
        self.interest_forms = Some(interest_forms);
        self
    }

    pub fn list_open_roles(&self) -> Vec<Listing> {
        self.listings.list_open_roles()
    }

    pub fn list_divisions(&self) -> Vec<String> {
        self.listings.list_divisions()
    }

    pub fn summary(&self) -> DashboardSummary {
        self.listings.summary()
    }

    /// `None` while form provisioning is disabled.
    pub fn interest_forms(&self) -> Option<&InterestForms> {
        self.interest_forms.as_ref()
    }
}

/// Form provisioning, pre-filled links and HR notification.
#[derive(Debug, Clone)]
pub struct InterestForms {
    provisioner: FormProvisioner,
    notifier: HrNotifier,
    responses: ResponseFeed,
}

impl InterestForms {
    pub fn new(provisioner: FormProvisioner, notifier: HrNotifier, responses: ResponseFeed) -> Self {
        Self {
            provisioner,
            notifier,
            responses,
        }
    }

    pub fn provision_form(&self) -> Result<ProvisionedForm, ProvisionError> {
        self.provisioner.provision_form()
    }

    pub fn interest_form_url(&self) -> Option<String> {
        self.provisioner.interest_form_url()
    }

    pub fn management_info(&self) -> Result<FormManagementInfo, ProvisionError> {
        self.provisioner.management_info()
    }

    pub fn resolve_profile(&self, email: &str) -> RespondentProfile {
        self.provisioner.resolve_profile(email)
    }

    pub fn prefilled_url(
        &self,
        role_title: &str,
        division: &str,
        respondent_email: &str,
    ) -> Option<String> {
        self.provisioner
            .prefilled_url(role_title, division, respondent_email)
    }

    pub fn listings_with_prefilled_urls(&self, respondent_email: &str) -> Vec<PrefilledListing> {
        self.provisioner
            .listings_with_prefilled_urls(respondent_email)
    }

    pub fn notify_hr(&self, submission: &Submission) -> Delivery {
        self.notifier.notify_hr(submission)
    }

    pub fn notify_latest_response(&self) -> Option<Delivery> {
        self.notifier.notify_latest_response(&self.responses)
    }
}
