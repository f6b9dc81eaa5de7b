use std::sync::Arc;

use faculty_roles::events::{DashboardEvent, RecordingEventSink};
use faculty_roles::workflows::forms::{
    FormBackends, FormProvisioner, FormSettings, InMemoryPropertyStore, InMemoryResponseStores,
    JsonFilePropertyStore, LocalFormService, PropertyStore, ProvisionError, QuestionKind,
    QuestionRole, ResponseSpreadsheetStatus, FORM_ID_KEY, FORM_LAYOUT_KEY, RESPONSE_SHEET_ID_KEY,
};
use faculty_roles::workflows::listings::{ListingReader, ListingSource};
use faculty_roles::workflows::profiles::{
    EmailPatternSource, ProfileFragment, ProfileResolver, StaticProfileTable,
};
use faculty_roles::workflows::sheets::{text_rows, InMemorySheetStore, SheetRows};

const FORM_TITLE: &str = "Expression of Interest: Internal Transfer (Faculty Roles)";

struct Harness {
    forms: Arc<LocalFormService>,
    stores: Arc<InMemoryResponseStores>,
    properties: Arc<dyn PropertyStore>,
    sheets: Arc<InMemorySheetStore>,
    events: Arc<RecordingEventSink>,
}

impl Harness {
    fn new() -> Self {
        Self::with_properties(Arc::new(InMemoryPropertyStore::new()))
    }

    fn with_properties(properties: Arc<dyn PropertyStore>) -> Self {
        let sheets = InMemorySheetStore::new().with_tab("roles-sheet", "Faculty Roles", roles());
        Self {
            forms: Arc::new(LocalFormService::with_base_url("https://forms.test")),
            stores: Arc::new(InMemoryResponseStores::new()),
            properties,
            sheets: Arc::new(sheets),
            events: Arc::new(RecordingEventSink::new()),
        }
    }

    fn provisioner(&self) -> FormProvisioner {
        let listings = ListingReader::new(
            self.sheets.clone(),
            ListingSource {
                spreadsheet_id: "roles-sheet".to_string(),
                tab: "Faculty Roles".to_string(),
            },
            self.events.clone(),
        );
        let profiles = ProfileResolver::new(self.events.clone())
            .with_source(StaticProfileTable::new().with_entry(
                "kim.tan@org.example",
                ProfileFragment::named("Kim Tan")
                    .with_job_title("Counselor")
                    .with_phone("+65 6000 0000"),
            ))
            .with_source(EmailPatternSource);

        FormProvisioner::new(
            FormBackends {
                forms: self.forms.clone(),
                response_stores: self.stores.clone(),
                properties: self.properties.clone(),
            },
            listings,
            profiles,
            FormSettings::interest_form(FORM_TITLE, "Express your interest."),
            self.events.clone(),
        )
    }

    fn stored(&self, key: &str) -> Option<String> {
        self.properties.get(key).expect("property read")
    }
}

fn roles() -> SheetRows {
    text_rows(&[
        ["Division", "Role Title", "Summary", "Description", "Form", "Status"],
        ["Elementary", "Grade 3 Teacher", "Teach grade 3", "", "", "Available"],
        ["High School", "Counselor", "Guide students", "", "", "Open"],
        ["High School", "Drama", "", "", "", "Filled"],
    ])
}

fn query_pairs(url: &str) -> Vec<(String, String)> {
    let (_, query) = url.split_once('?').expect("url has a query");
    serde_urlencoded::from_str(query).expect("query decodes")
}

#[test]
fn first_provision_builds_form_and_links_responses() {
    let harness = Harness::new();

    let provisioned = harness.provisioner().provision_form().expect("provisioned");

    assert_eq!(
        harness.stored(FORM_ID_KEY).as_deref(),
        Some(provisioned.form_id.as_str())
    );
    assert_eq!(provisioned.role_choices, 2);
    assert!(harness.stored(FORM_LAYOUT_KEY).is_some());

    let form = harness.forms.form(&provisioned.form_id).expect("form hosted");
    let settings = form.settings.clone().expect("settings applied");
    assert!(settings.collect_email);
    assert!(settings.require_login);
    assert!(!settings.limit_one_response);
    assert!(!settings.show_link_to_respond_again);
    assert_eq!(form.handle.title, FORM_TITLE);

    let (_, role_question) = &form.items[0];
    assert_eq!(
        role_question.kind,
        QuestionKind::SingleSelect {
            choices: vec![
                "Elementary - Grade 3 Teacher".to_string(),
                "High School - Counselor".to_string(),
            ]
        }
    );
    assert_eq!(form.items.len(), 11);

    let response_store = provisioned.response_store.expect("responses linked");
    assert_eq!(
        form.destination.as_deref(),
        Some(response_store.spreadsheet_id.as_str())
    );
    assert_eq!(response_store.name, format!("{FORM_TITLE} - Responses"));
    assert_eq!(
        harness.stored(RESPONSE_SHEET_ID_KEY).as_deref(),
        Some(response_store.spreadsheet_id.as_str())
    );
}

#[test]
fn reprovisioning_reuses_form_and_replaces_items() {
    let harness = Harness::new();
    let provisioner = harness.provisioner();

    let first = provisioner.provision_form().expect("first build");
    harness.sheets.put_tab(
        "roles-sheet",
        "Faculty Roles",
        text_rows(&[
            ["Division", "Role Title", "Summary", "Description", "Form", "Status"],
            ["Middle School", "Science", "", "", "", "Available"],
        ]),
    );
    let second = provisioner.provision_form().expect("second build");

    assert_eq!(first.form_id, second.form_id);
    assert_eq!(harness.forms.form_count(), 1);
    assert_eq!(harness.stores.len(), 1);

    let form = harness.forms.form(&second.form_id).expect("form hosted");
    assert_eq!(form.items.len(), 11);
    assert_eq!(
        form.items[0].1.kind.choices(),
        ["Middle School - Science".to_string()]
    );
    assert!(harness.events.events().contains(&DashboardEvent::ResponseStoreLinked {
        spreadsheet_id: second
            .response_store
            .map(|store| store.spreadsheet_id)
            .expect("linked"),
        created: false,
    }));
}

#[test]
fn vanished_form_is_replaced() {
    let harness = Harness::new();
    let provisioner = harness.provisioner();
    let first = provisioner.provision_form().expect("first build");

    harness.forms.remove_form(&first.form_id);
    let second = provisioner.provision_form().expect("rebuilt");

    assert_ne!(first.form_id, second.form_id);
    assert_eq!(
        harness.stored(FORM_ID_KEY).as_deref(),
        Some(second.form_id.as_str())
    );
    assert!(harness.events.events().iter().any(|event| matches!(
        event,
        DashboardEvent::FormUnavailable { form_id, .. } if *form_id == first.form_id
    )));
}

#[test]
fn no_open_roles_installs_notice_and_still_links_responses() {
    let harness = Harness::new();
    harness.sheets.put_tab(
        "roles-sheet",
        "Faculty Roles",
        text_rows(&[
            ["Division", "Role Title", "Summary", "Description", "Form", "Status"],
            ["High School", "Drama", "", "", "", "Closed"],
        ]),
    );

    let provisioned = harness.provisioner().provision_form().expect("provisioned");

    let form = harness.forms.form(&provisioned.form_id).expect("form hosted");
    assert_eq!(form.question_titles(), vec!["No Faculty Roles Available"]);
    assert_eq!(form.items[0].1.role, QuestionRole::NoOpenings);
    assert!(form.destination.is_some());
}

#[test]
fn provisioning_failure_is_returned_and_reported() {
    let harness = Harness::new();
    harness.forms.set_unavailable(true);

    let err = harness
        .provisioner()
        .provision_form()
        .expect_err("service down");

    assert!(matches!(err, ProvisionError::Forms(_)));
    assert!(harness
        .events
        .events()
        .iter()
        .any(|event| matches!(event, DashboardEvent::ProvisioningFailed { .. })));
}

#[test]
fn prefilled_url_answers_role_and_known_profile_fields() {
    let harness = Harness::new();
    let provisioner = harness.provisioner();
    let provisioned = provisioner.provision_form().expect("provisioned");

    let url = provisioner
        .prefilled_url("Counselor", "High School", "kim.tan@org.example")
        .expect("link");

    assert!(url.starts_with(&provisioned.published_url));
    let pairs = query_pairs(&url);
    assert_eq!(pairs[0], ("usp".to_string(), "pp_url".to_string()));

    let values: Vec<&str> = pairs[1..].iter().map(|(_, value)| value.as_str()).collect();
    assert_eq!(
        values,
        vec![
            "High School - Counselor",
            "Kim Tan",
            "Counselor",
            "+65 6000 0000"
        ]
    );
    assert!(pairs.iter().all(|(_, value)| !value.is_empty()));
}

#[test]
fn prefilled_url_never_writes_empty_answers() {
    let harness = Harness::new();
    let provisioner = harness.provisioner();
    provisioner.provision_form().expect("provisioned");

    let url = provisioner
        .prefilled_url("Grade 3 Teacher", "Elementary", "jane.doe@org.example")
        .expect("link");

    let pairs = query_pairs(&url);
    let values: Vec<&str> = pairs[1..].iter().map(|(_, value)| value.as_str()).collect();
    assert_eq!(values, vec!["Elementary - Grade 3 Teacher", "Jane Doe"]);
}

#[test]
fn role_missing_from_form_is_skipped() {
    let harness = Harness::new();
    let provisioner = harness.provisioner();
    provisioner.provision_form().expect("provisioned");

    let url = provisioner
        .prefilled_url("Drama", "High School", "jane.doe@org.example")
        .expect("link");

    let values: Vec<String> = query_pairs(&url).into_iter().map(|(_, v)| v).collect();
    assert!(!values.iter().any(|value| value.contains("Drama")));
    assert!(harness
        .events
        .events()
        .contains(&DashboardEvent::PrefillSkippedChoice {
            choice: "High School - Drama".to_string()
        }));
}

#[test]
fn missing_layout_falls_back_to_plain_url() {
    let harness = Harness::new();
    let provisioner = harness.provisioner();
    let provisioned = provisioner.provision_form().expect("provisioned");
    harness.properties.clear(FORM_LAYOUT_KEY).expect("clear layout");

    let url = provisioner
        .prefilled_url("Counselor", "High School", "kim.tan@org.example")
        .expect("plain link");

    assert_eq!(url, provisioned.published_url);
    assert!(harness
        .events
        .events()
        .iter()
        .any(|event| matches!(event, DashboardEvent::PrefillFallback { .. })));
}

#[test]
fn interest_form_url_provisions_lazily() {
    let harness = Harness::new();
    let provisioner = harness.provisioner();

    let url = provisioner.interest_form_url().expect("form url");

    let form_id = harness.stored(FORM_ID_KEY).expect("form id stored");
    assert_eq!(url, format!("https://forms.test/d/e/{form_id}/viewform"));
    assert_eq!(provisioner.interest_form_url().as_deref(), Some(url.as_str()));
    assert_eq!(harness.forms.form_count(), 1);
}

#[test]
fn interest_form_url_is_none_when_nothing_can_be_created() {
    let harness = Harness::new();
    harness.forms.set_unavailable(true);

    assert_eq!(harness.provisioner().interest_form_url(), None);
}

#[test]
fn listings_with_prefilled_urls_cover_every_open_role() {
    let harness = Harness::new();
    let provisioner = harness.provisioner();
    provisioner.provision_form().expect("provisioned");

    let listings = provisioner.listings_with_prefilled_urls("kim.tan@org.example");

    assert_eq!(listings.len(), 2);
    for entry in &listings {
        let url = entry.prefilled_form_url.as_deref().expect("link");
        let expected = format!("{} - {}", entry.listing.division, entry.listing.role_title);
        assert!(query_pairs(url).iter().any(|(_, value)| *value == expected));
    }
}

#[test]
fn management_info_reports_form_and_response_sheet() {
    let harness = Harness::new();
    let provisioner = harness.provisioner();

    assert!(matches!(
        provisioner.management_info(),
        Err(ProvisionError::NotProvisioned)
    ));

    let provisioned = provisioner.provision_form().expect("provisioned");
    harness
        .forms
        .record_response(&provisioned.form_id)
        .expect("response recorded");

    let info = provisioner.management_info().expect("info");
    assert_eq!(info.form_id, provisioned.form_id);
    assert_eq!(info.title, FORM_TITLE);
    assert_eq!(info.response_count, 1);
    assert!(matches!(
        info.response_spreadsheet,
        Some(ResponseSpreadsheetStatus::Accessible(_))
    ));

    let spreadsheet_id = harness.stored(RESPONSE_SHEET_ID_KEY).expect("sheet id");
    harness.stores.remove(&spreadsheet_id);
    let info = provisioner.management_info().expect("info");
    assert!(matches!(
        info.response_spreadsheet,
        Some(ResponseSpreadsheetStatus::Inaccessible { .. })
    ));
}

#[test]
fn stored_ids_survive_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("properties.json");

    let harness = Harness::with_properties(Arc::new(JsonFilePropertyStore::new(&path)));
    let first = harness.provisioner().provision_form().expect("first run");

    let restarted = Harness {
        properties: Arc::new(JsonFilePropertyStore::new(&path)),
        ..harness
    };
    let second = restarted.provisioner().provision_form().expect("second run");

    assert_eq!(first.form_id, second.form_id);
    assert_eq!(restarted.forms.form_count(), 1);
}

#[test]
fn persisted_form_serves_prefilled_links_in_a_later_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let forms_path = dir.path().join("forms.json");
    let properties_path = dir.path().join("properties.json");
    let run = || Harness {
        forms: Arc::new(LocalFormService::persistent(
            &forms_path,
            "https://forms.test",
        )),
        ..Harness::with_properties(Arc::new(JsonFilePropertyStore::new(&properties_path)))
    };

    let first = run().provisioner().provision_form().expect("first run");

    let later = run();
    let url = later
        .provisioner()
        .prefilled_url("Counselor", "High School", "kim.tan@org.example")
        .expect("prefilled link");

    assert!(url.starts_with(&first.published_url));
    assert!(url.contains("usp=pp_url"));
    assert_eq!(later.forms.form_count(), 1);
    assert_eq!(later.stored(FORM_ID_KEY), Some(first.form_id));
}
