use faculty_roles::config::{AppConfig, ConfigError, FormsConfig, SheetBackend, SheetsConfig};
use faculty_roles::dashboard::{Dashboard, InterestForms};
use faculty_roles::error::AppError;
use faculty_roles::events::{EventSink, TracingEventSink};
use faculty_roles::workflows::forms::{
    CsvResponseStores, FormBackends, FormProvisioner, FormSettings, JsonFilePropertyStore,
    LocalFormService, LocalIntake, PropertyStore, ResponseStoreGateway,
};
use faculty_roles::workflows::google_workspace::GoogleWorkspace;
use faculty_roles::workflows::listings::{ListingReader, ListingSource};
use faculty_roles::workflows::notifications::{HrNotifier, ResponseFeed, SpoolMailer};
use faculty_roles::workflows::profiles::{
    DirectorySheetSource, DirectorySource, EmailPatternSource, ProfileResolver, StaticDirectory,
    StaticProfileTable,
};
use faculty_roles::workflows::sheets::{CsvSheetStore, ResponseSheet, SheetStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::runtime::Handle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) dashboard: Arc<Dashboard>,
    /// Respondent side of the locally hosted form, present with the form module.
    pub(crate) intake: Option<Arc<LocalIntake>>,
}

impl AppState {
    pub(crate) fn new(services: Services, metrics: PrometheusHandle) -> Self {
        Self {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(metrics),
            dashboard: Arc::new(services.dashboard),
            intake: services.intake.map(Arc::new),
        }
    }
}

/// The dashboard plus the intake serving its form.
pub(crate) struct Services {
    pub(crate) dashboard: Dashboard,
    pub(crate) intake: Option<LocalIntake>,
}

/// Spreadsheet access for one backend: reads, response appends and the
/// response spreadsheet gateway.
struct SheetBackends {
    sheets: Arc<dyn SheetStore>,
    responses: Arc<dyn ResponseSheet>,
    stores: Arc<dyn ResponseStoreGateway>,
}

async fn sheet_backends(config: &SheetsConfig) -> Result<SheetBackends, AppError> {
    match config.backend {
        SheetBackend::Csv => {
            let store = Arc::new(CsvSheetStore::new(&config.export_dir));
            Ok(SheetBackends {
                sheets: store.clone(),
                responses: store,
                stores: Arc::new(CsvResponseStores::new(&config.export_dir)),
            })
        }
        SheetBackend::Google => {
            let key = config
                .google_key_path
                .as_deref()
                .ok_or(ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_KEY"))?;
            let (sheets, drive) = GoogleWorkspace::connect(key)
                .await?
                .into_adapters(Handle::current());
            let sheets = Arc::new(sheets);
            Ok(SheetBackends {
                sheets: sheets.clone(),
                responses: sheets,
                stores: Arc::new(drive),
            })
        }
    }
}

/// Static table, staff directory tab, contacts and people exports when
/// configured, then the email pattern.
fn profile_chain(
    forms: &FormsConfig,
    sheets: &SheetsConfig,
    store: Arc<dyn SheetStore>,
    events: Arc<dyn EventSink>,
) -> Result<ProfileResolver, AppError> {
    let table = match &forms.profile_table_path {
        Some(path) => StaticProfileTable::from_path(path)?,
        None => StaticProfileTable::new(),
    };
    let mut profiles = ProfileResolver::new(events)
        .with_source(table)
        .with_source(DirectorySheetSource::new(
            store,
            sheets.roles_spreadsheet_id.clone(),
            sheets.directory_tab.clone(),
        ));

    if let Some(path) = &forms.contacts_directory_path {
        profiles = profiles.with_source(DirectorySource::contacts(Arc::new(
            StaticDirectory::from_path(path)?,
        )));
    }
    if let Some(path) = &forms.people_directory_path {
        profiles = profiles.with_source(DirectorySource::people(Arc::new(
            StaticDirectory::from_path(path)?,
        )));
    }

    Ok(profiles.with_source(EmailPatternSource))
}

/// Wires the dashboard from configuration. Sheets come from CSV exports or
/// Google Sheets; forms are hosted locally and persisted next to the
/// property file. The Google adapters block on the current runtime, so their
/// callers go through [`blocking`].
pub(crate) async fn build_services(config: &AppConfig) -> Result<Services, AppError> {
    let events: Arc<dyn EventSink> = Arc::new(TracingEventSink);
    let backends = sheet_backends(&config.sheets).await?;

    let listings = ListingReader::new(
        backends.sheets.clone(),
        ListingSource {
            spreadsheet_id: config.sheets.roles_spreadsheet_id.clone(),
            tab: config.sheets.roles_tab.clone(),
        },
        events.clone(),
    );

    let dashboard = Dashboard::new(listings.clone());
    if !config.forms.enabled {
        return Ok(Services {
            dashboard,
            intake: None,
        });
    }

    let profiles = profile_chain(
        &config.forms,
        &config.sheets,
        backends.sheets.clone(),
        events.clone(),
    )?;

    let forms = Arc::new(LocalFormService::persistent(
        &config.forms.store_path,
        &config.forms.public_base_url,
    ));
    let properties: Arc<dyn PropertyStore> =
        Arc::new(JsonFilePropertyStore::new(&config.forms.properties_path));
    let provisioner = FormProvisioner::new(
        FormBackends {
            forms: forms.clone(),
            response_stores: backends.stores,
            properties: properties.clone(),
        },
        listings,
        profiles,
        FormSettings::interest_form(&config.forms.title, &config.forms.description),
        events.clone(),
    );

    let notifier = HrNotifier::new(
        Arc::new(SpoolMailer::new(&config.notifications.spool_dir)),
        config.notifications.hr_email.clone(),
        events.clone(),
    );
    let responses = ResponseFeed::new(
        backends.sheets,
        properties,
        config.sheets.responses_tab.clone(),
        events.clone(),
    );
    let intake = LocalIntake::new(
        forms,
        backends.responses,
        config.sheets.responses_tab.clone(),
        events,
    );

    Ok(Services {
        dashboard: dashboard.with_interest_forms(InterestForms::new(
            provisioner,
            notifier,
            responses,
        )),
        intake: Some(intake),
    })
}

pub(crate) fn interest_forms(dashboard: &Dashboard) -> Result<&InterestForms, AppError> {
    dashboard
        .interest_forms()
        .ok_or(AppError::Disabled("form provisioning"))
}

pub(crate) fn intake(state: &AppState) -> Result<Arc<LocalIntake>, AppError> {
    state
        .intake
        .clone()
        .ok_or(AppError::Disabled("form provisioning"))
}

/// Runs synchronous workflow calls off the async workers. The sheet and
/// form adapters may block on network calls.
pub(crate) async fn blocking<C, T, F>(context: Arc<C>, work: F) -> Result<T, AppError>
where
    C: Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(&C) -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&context)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use faculty_roles::config::{
        AppEnvironment, NotificationConfig, ServerConfig, TelemetryConfig,
    };
    use std::fs;
    use std::path::Path;

    fn local_config(root: &Path) -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            telemetry: TelemetryConfig {
                log_level: "warn".to_string(),
            },
            sheets: SheetsConfig {
                roles_spreadsheet_id: "faculty-roles".to_string(),
                roles_tab: "Faculty Roles".to_string(),
                directory_tab: "Staff Directory".to_string(),
                responses_tab: "Form Responses 1".to_string(),
                export_dir: root.join("sheets"),
                backend: SheetBackend::Csv,
                google_key_path: None,
            },
            forms: FormsConfig {
                enabled: true,
                title: "Expression of Interest".to_string(),
                description: "Tell us more.".to_string(),
                properties_path: root.join("properties.json"),
                store_path: root.join("forms.json"),
                public_base_url: "http://127.0.0.1:3000/forms".to_string(),
                profile_table_path: None,
                contacts_directory_path: Some(root.join("contacts.json")),
                people_directory_path: None,
            },
            notifications: NotificationConfig {
                hr_email: "hr@org.example".to_string(),
                spool_dir: root.join("outbox"),
            },
        }
    }

    fn seed_roles(root: &Path) {
        let dir = root.join("sheets").join("faculty-roles");
        fs::create_dir_all(&dir).expect("sheet dir");
        fs::write(
            dir.join("Faculty Roles.csv"),
            "Division,Role Title,Summary,Description,Form,Status\n\
             High School,Counselor,Guide students,,,Open\n",
        )
        .expect("roles export");
        fs::write(
            root.join("contacts.json"),
            r#"{ "kim.tan@org.example": { "phone": "+65 6000 0001" } }"#,
        )
        .expect("contacts export");
    }

    #[tokio::test]
    async fn separate_runs_share_the_provisioned_form() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_roles(dir.path());
        let config = local_config(dir.path());

        let first = build_services(&config).await.expect("first run");
        let provisioned = blocking(Arc::new(first.dashboard), |dashboard: &Dashboard| {
            Ok(interest_forms(dashboard)?.provision_form()?)
        })
        .await
        .expect("provisioned");
        assert!(provisioned
            .published_url
            .starts_with("http://127.0.0.1:3000/forms/d/e/"));

        let second = build_services(&config).await.expect("second run");
        let form_id = provisioned.form_id.clone();
        let url = blocking(Arc::new(second.dashboard), move |dashboard: &Dashboard| {
            let forms = interest_forms(dashboard)?;
            assert_eq!(forms.management_info()?.form_id, form_id);
            Ok(forms.prefilled_url("Counselor", "High School", "kim.tan@org.example"))
        })
        .await
        .expect("prefill")
        .expect("prefilled link");

        assert!(url.contains("usp=pp_url"));
        assert!(url.contains("6000+0001"));
    }

    #[tokio::test]
    async fn google_backend_reports_an_unreadable_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = local_config(dir.path());
        config.sheets.backend = SheetBackend::Google;
        config.sheets.google_key_path = Some(dir.path().join("missing-key.json"));

        assert!(matches!(
            build_services(&config).await,
            Err(AppError::Google(_))
        ));
    }
}
