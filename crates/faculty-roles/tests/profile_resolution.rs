use std::sync::Arc;

use faculty_roles::events::{DashboardEvent, RecordingEventSink};
use faculty_roles::workflows::profiles::{
    DirectoryError, DirectoryLookup, DirectorySheetSource, DirectorySource, EmailPatternSource,
    ProfileFragment, ProfileResolver, StaticDirectory, StaticProfileTable,
};
use faculty_roles::workflows::sheets::{text_rows, InMemorySheetStore};

#[derive(Debug)]
struct BrokenDirectory;

impl DirectoryLookup for BrokenDirectory {
    fn find_by_email(&self, _email: &str) -> Result<Option<ProfileFragment>, DirectoryError> {
        Err(DirectoryError::Forbidden("scope not granted".to_string()))
    }
}

fn directory_sheet() -> InMemorySheetStore {
    InMemorySheetStore::new().with_tab(
        "roles-sheet",
        "Staff Directory",
        text_rows(&[
            ["Email", "Full Name", "Job Title", "Department", "Phone"],
            [
                "kim.tan@org.example",
                "Kim Tan",
                "Counselor",
                "High School",
                "",
            ],
        ]),
    )
}

/// Full production chain: table, directory sheet, contacts, people API, pattern.
fn full_chain(
    table: StaticProfileTable,
    contacts: StaticDirectory,
    people: Arc<dyn DirectoryLookup>,
    events: Arc<RecordingEventSink>,
) -> ProfileResolver {
    ProfileResolver::new(events)
        .with_source(table)
        .with_source(DirectorySheetSource::new(
            Arc::new(directory_sheet()),
            "roles-sheet",
            "Staff Directory",
        ))
        .with_source(DirectorySource::contacts(Arc::new(contacts)))
        .with_source(DirectorySource::people(people))
        .with_source(EmailPatternSource)
}

#[test]
fn unknown_email_falls_back_to_default_name() {
    let resolver = full_chain(
        StaticProfileTable::new(),
        StaticDirectory::new(),
        Arc::new(StaticDirectory::new()),
        Arc::new(RecordingEventSink::new()),
    );

    let profile = resolver.resolve("jane.doe@org.example");

    assert_eq!(profile.email, "jane.doe@org.example");
    assert_eq!(profile.name, "Jane Doe");
    assert_eq!(profile.department, "");
    assert_eq!(profile.job_title, "");
    assert_eq!(profile.phone, "");
}

#[test]
fn pattern_inference_guesses_department_only() {
    let resolver = full_chain(
        StaticProfileTable::new(),
        StaticDirectory::new(),
        Arc::new(StaticDirectory::new()),
        Arc::new(RecordingEventSink::new()),
    );

    let profile = resolver.resolve("es.coordinator@org.example");

    assert_eq!(profile.department, "Elementary School");
    assert_eq!(profile.job_title, "");
    assert_eq!(profile.name, "Es Coordinator");
}

#[test]
fn static_table_hit_ignores_every_other_source() {
    let table = StaticProfileTable::new().with_entry(
        "es.coordinator@org.example",
        ProfileFragment::named("Alex Rivera").with_job_title("Coordinator"),
    );
    let contacts = StaticDirectory::new().with_entry(
        "es.coordinator@org.example",
        ProfileFragment::named("Someone Else").with_phone("+65 6000 0001"),
    );

    let resolver = full_chain(
        table,
        contacts,
        Arc::new(BrokenDirectory),
        Arc::new(RecordingEventSink::new()),
    );
    let profile = resolver.resolve("es.coordinator@org.example");

    assert_eq!(profile.name, "Alex Rivera");
    assert_eq!(profile.job_title, "Coordinator");
    assert_eq!(profile.phone, "");
    assert_eq!(profile.department, "");
}

#[test]
fn blank_static_table_entry_still_ends_the_lookup() {
    let table = StaticProfileTable::new()
        .with_entry("es.coordinator@org.example", ProfileFragment::default());
    let contacts = StaticDirectory::new().with_entry(
        "es.coordinator@org.example",
        ProfileFragment::named("Someone Else").with_phone("+65 6000 0001"),
    );
    let events = Arc::new(RecordingEventSink::new());

    let resolver = full_chain(table, contacts, Arc::new(BrokenDirectory), events.clone());
    let profile = resolver.resolve("es.coordinator@org.example");

    assert_eq!(profile.name, "Es Coordinator");
    assert_eq!(profile.phone, "");
    assert_eq!(profile.department, "");
    assert_eq!(
        events.events(),
        vec![DashboardEvent::ProfileResolved {
            email: "es.coordinator@org.example".to_string(),
            sources: vec!["static_table"],
        }]
    );
}

#[test]
fn directory_sheet_is_authoritative() {
    let contacts = StaticDirectory::new().with_entry(
        "kim.tan@org.example",
        ProfileFragment::default().with_phone("+65 6000 0002"),
    );
    let events = Arc::new(RecordingEventSink::new());
    let resolver = full_chain(
        StaticProfileTable::new(),
        contacts,
        Arc::new(StaticDirectory::new()),
        events.clone(),
    );

    let profile = resolver.resolve("kim.tan@org.example");

    assert_eq!(profile.name, "Kim Tan");
    assert_eq!(profile.job_title, "Counselor");
    assert_eq!(profile.department, "High School");
    assert_eq!(profile.phone, "");
    assert!(events.events().contains(&DashboardEvent::ProfileResolved {
        email: "kim.tan@org.example".to_string(),
        sources: vec!["directory_sheet"],
    }));
}

#[test]
fn people_api_only_fills_fields_left_empty_by_contacts() {
    let contacts = StaticDirectory::new().with_entry(
        "pat.lee@org.example",
        ProfileFragment::named("Patricia Lee").with_phone("+65 6000 0003"),
    );
    let people = StaticDirectory::new().with_entry(
        "pat.lee@org.example",
        ProfileFragment::named("P. Lee")
            .with_job_title("Technology Coach")
            .with_department("Technology")
            .with_phone("+65 9999 9999"),
    );

    let resolver = full_chain(
        StaticProfileTable::new(),
        contacts,
        Arc::new(people),
        Arc::new(RecordingEventSink::new()),
    );
    let profile = resolver.resolve("pat.lee@org.example");

    assert_eq!(profile.name, "Patricia Lee");
    assert_eq!(profile.phone, "+65 6000 0003");
    assert_eq!(profile.job_title, "Technology Coach");
    assert_eq!(profile.department, "Technology");
}

#[test]
fn failing_source_is_skipped_and_reported() {
    let events = Arc::new(RecordingEventSink::new());
    let resolver = full_chain(
        StaticProfileTable::new(),
        StaticDirectory::new(),
        Arc::new(BrokenDirectory),
        events.clone(),
    );

    let profile = resolver.resolve("hs.counselor@org.example");

    assert_eq!(profile.email, "hs.counselor@org.example");
    assert_eq!(profile.department, "High School");
    assert!(events.events().iter().any(|event| matches!(
        event,
        DashboardEvent::ProfileSourceFailed { source: "people_api", .. }
    )));
}

#[test]
fn email_is_returned_exactly_as_given() {
    let resolver = full_chain(
        StaticProfileTable::new(),
        StaticDirectory::new(),
        Arc::new(StaticDirectory::new()),
        Arc::new(RecordingEventSink::new()),
    );

    for email in ["Jane.Doe@Org.Example", "no-at-sign", ""] {
        assert_eq!(resolver.resolve(email).email, email);
    }
}
