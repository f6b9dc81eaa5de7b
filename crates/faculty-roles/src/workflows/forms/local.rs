use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::questions::{FormQuestion, ItemId, QuestionKind};
use super::service::{
    FormHandle, FormService, FormServiceError, FormSettings, PrefilledAnswer, ResponseStore,
    ResponseStoreGateway,
};

const DEFAULT_BASE_URL: &str = "http://localhost:3000/forms";
const FIRST_ITEM_ID: u64 = 1_000_000;
const SPREADSHEET_METADATA: &str = "spreadsheet.json";

/// Everything the local service knows about one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedForm {
    pub handle: FormHandle,
    #[serde(default)]
    pub settings: Option<FormSettings>,
    #[serde(default)]
    pub items: Vec<(ItemId, FormQuestion)>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub responses: usize,
}

impl HostedForm {
    pub fn question_titles(&self) -> Vec<&str> {
        self.items
            .iter()
            .map(|(_, question)| question.title.as_str())
            .collect()
    }

    /// Questions that take an answer, section headers left out.
    pub fn answerable(&self) -> impl Iterator<Item = &(ItemId, FormQuestion)> {
        self.items
            .iter()
            .filter(|(_, question)| question.kind != QuestionKind::SectionHeader)
    }
}

/// Every hosted form plus the next item id to hand out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRegistry {
    #[serde(default)]
    forms: BTreeMap<String, HostedForm>,
    #[serde(default)]
    next_item: u64,
}

impl FormRegistry {
    fn next_item_id(&mut self) -> ItemId {
        let id = self.next_item.max(FIRST_ITEM_ID);
        self.next_item = id + 1;
        ItemId(id.to_string())
    }

    fn form_mut(&mut self, form_id: &str) -> Result<&mut HostedForm, FormServiceError> {
        self.forms
            .get_mut(form_id)
            .ok_or_else(|| FormServiceError::FormNotFound(form_id.to_string()))
    }
}

#[derive(Debug)]
enum Storage {
    Memory(Mutex<FormRegistry>),
    /// The file is re-read on every call, so several processes sharing it
    /// see each other's forms.
    File { path: PathBuf, lock: Mutex<()> },
}

/// A question as the respondent page renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// Query and form field name, `entry.<item id>`.
    pub entry: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub kind: QuestionKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub form_id: String,
    pub title: String,
    pub description: String,
    pub collect_email: bool,
    pub questions: Vec<QuestionView>,
}

/// Form service hosted by this application. Links point at the service's own
/// respondent routes under `base_url`.
#[derive(Debug)]
pub struct LocalFormService {
    base_url: String,
    storage: Storage,
    unavailable: AtomicBool,
}

impl Default for LocalFormService {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalFormService {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Forms kept in process only.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_storage(base_url, Storage::Memory(Mutex::new(FormRegistry::default())))
    }

    /// Forms kept in a JSON file that outlives the process.
    pub fn persistent(path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self::with_storage(
            base_url,
            Storage::File {
                path: path.into(),
                lock: Mutex::new(()),
            },
        )
    }

    fn with_storage(base_url: impl Into<String>, storage: Storage) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            storage,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn form(&self, form_id: &str) -> Option<HostedForm> {
        self.with_registry(|registry| Ok(registry.forms.get(form_id).cloned()))
            .ok()
            .flatten()
    }

    pub fn form_count(&self) -> usize {
        self.with_registry(|registry| Ok(registry.forms.len()))
            .unwrap_or_default()
    }

    /// Deletes a form as if it were removed outside the application.
    pub fn remove_form(&self, form_id: &str) -> Option<HostedForm> {
        self.with_registry(|registry| Ok(registry.forms.remove(form_id)))
            .ok()
            .flatten()
    }

    /// Counts one submission and returns the form as it stood.
    pub fn record_response(&self, form_id: &str) -> Result<HostedForm, FormServiceError> {
        self.with_form(form_id, |form| {
            form.responses += 1;
            Ok(form.clone())
        })
    }

    /// While set, every call fails as if the service were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The respondent page, with `entry.<id>` values from a pre-filled link
    /// placed on their questions. Unknown keys are ignored.
    pub fn view(
        &self,
        form_id: &str,
        prefilled: &BTreeMap<String, String>,
    ) -> Result<FormView, FormServiceError> {
        self.with_form(form_id, |form| {
            let settings = form.settings.clone();
            let questions = form
                .items
                .iter()
                .map(|(item, question)| {
                    let entry = format!("entry.{}", item.0);
                    QuestionView {
                        value: prefilled.get(&entry).cloned(),
                        entry,
                        title: question.title.clone(),
                        help_text: question.help_text.clone(),
                        kind: question.kind.clone(),
                        required: question.required,
                    }
                })
                .collect();

            Ok(FormView {
                form_id: form.handle.form_id.clone(),
                title: form.handle.title.clone(),
                description: settings
                    .as_ref()
                    .map(|s| s.description.clone())
                    .unwrap_or_default(),
                collect_email: settings.map(|s| s.collect_email).unwrap_or(false),
                questions,
            })
        })
    }

    fn ensure_available(&self) -> Result<(), FormServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FormServiceError::Backend(
                "form service unreachable".to_string(),
            ));
        }
        Ok(())
    }

    /// Runs `action` against the registry. File storage is saved only when
    /// the action succeeded and changed something.
    fn with_registry<T, F>(&self, action: F) -> Result<T, FormServiceError>
    where
        F: FnOnce(&mut FormRegistry) -> Result<T, FormServiceError>,
    {
        match &self.storage {
            Storage::Memory(registry) => {
                let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
                action(&mut registry)
            }
            Storage::File { path, lock } => {
                let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                let mut registry = load_registry(path)?;
                let before = registry.clone();
                let outcome = action(&mut registry)?;
                if registry != before {
                    save_registry(path, &registry)?;
                }
                Ok(outcome)
            }
        }
    }

    fn with_form<T, F>(&self, form_id: &str, action: F) -> Result<T, FormServiceError>
    where
        F: FnOnce(&mut HostedForm) -> Result<T, FormServiceError>,
    {
        self.ensure_available()?;
        self.with_registry(|registry| action(registry.form_mut(form_id)?))
    }

    fn published_url(&self, form_id: &str) -> String {
        format!("{}/d/e/{form_id}/viewform", self.base_url)
    }
}

fn load_registry(path: &Path) -> Result<FormRegistry, FormServiceError> {
    match fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(FormRegistry::default()),
        Ok(raw) => serde_json::from_str(&raw).map_err(storage_error),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(FormRegistry::default()),
        Err(err) => Err(storage_error(err)),
    }
}

fn save_registry(path: &Path, registry: &FormRegistry) -> Result<(), FormServiceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(storage_error)?;
    }
    let tmp = path.with_extension("json.tmp");
    let raw = serde_json::to_vec_pretty(registry).map_err(storage_error)?;
    fs::write(&tmp, raw).map_err(storage_error)?;
    fs::rename(&tmp, path).map_err(storage_error)
}

fn storage_error<E: std::fmt::Display>(err: E) -> FormServiceError {
    FormServiceError::Storage(err.to_string())
}

impl FormService for LocalFormService {
    fn create_form(&self, title: &str) -> Result<FormHandle, FormServiceError> {
        self.ensure_available()?;
        let form_id = Uuid::new_v4().simple().to_string();
        let handle = FormHandle {
            form_id: form_id.clone(),
            title: title.to_string(),
            published_url: self.published_url(&form_id),
            edit_url: format!("{}/d/{form_id}/edit", self.base_url),
        };

        let hosted = HostedForm {
            handle: handle.clone(),
            settings: None,
            items: Vec::new(),
            destination: None,
            responses: 0,
        };
        self.with_registry(|registry| {
            registry.forms.insert(form_id, hosted);
            Ok(())
        })?;
        Ok(handle)
    }

    fn open_form(&self, form_id: &str) -> Result<FormHandle, FormServiceError> {
        self.with_form(form_id, |form| Ok(form.handle.clone()))
    }

    fn apply_settings(
        &self,
        form_id: &str,
        settings: &FormSettings,
    ) -> Result<(), FormServiceError> {
        self.with_form(form_id, |form| {
            form.handle.title = settings.title.clone();
            form.settings = Some(settings.clone());
            Ok(())
        })
    }

    fn clear_items(&self, form_id: &str) -> Result<(), FormServiceError> {
        self.with_form(form_id, |form| {
            form.items.clear();
            Ok(())
        })
    }

    fn add_item(&self, form_id: &str, question: &FormQuestion) -> Result<ItemId, FormServiceError> {
        self.ensure_available()?;
        self.with_registry(|registry| {
            registry.form_mut(form_id)?;
            let item = registry.next_item_id();
            registry
                .form_mut(form_id)?
                .items
                .push((item.clone(), question.clone()));
            Ok(item)
        })
    }

    fn set_destination(
        &self,
        form_id: &str,
        spreadsheet_id: &str,
    ) -> Result<(), FormServiceError> {
        self.with_form(form_id, |form| {
            form.destination = Some(spreadsheet_id.to_string());
            Ok(())
        })
    }

    fn response_count(&self, form_id: &str) -> Result<usize, FormServiceError> {
        self.with_form(form_id, |form| Ok(form.responses))
    }

    fn prefilled_url(
        &self,
        form_id: &str,
        answers: &[PrefilledAnswer],
    ) -> Result<String, FormServiceError> {
        let published = self.published_url(form_id);
        self.with_form(form_id, |form| {
            let mut pairs = vec![("usp".to_string(), "pp_url".to_string())];
            for answer in answers {
                let (_, question) = form
                    .items
                    .iter()
                    .find(|(item, _)| *item == answer.item)
                    .ok_or_else(|| FormServiceError::UnknownItem {
                        form_id: form_id.to_string(),
                        item: answer.item.0.clone(),
                    })?;

                let choices = question.kind.choices();
                if !choices.is_empty() && !choices.iter().any(|choice| *choice == answer.value) {
                    return Err(FormServiceError::InvalidChoice {
                        item: answer.item.0.clone(),
                        value: answer.value.clone(),
                    });
                }
                pairs.push((format!("entry.{}", answer.item.0), answer.value.clone()));
            }

            let query = serde_urlencoded::to_string(&pairs)
                .map_err(|err| FormServiceError::Backend(err.to_string()))?;
            Ok(format!("{published}?{query}"))
        })
    }
}

/// Response spreadsheets kept in process.
#[derive(Debug, Default)]
pub struct InMemoryResponseStores {
    stores: Mutex<BTreeMap<String, ResponseStore>>,
}

impl InMemoryResponseStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(self, spreadsheet_id: &str, name: &str) -> Self {
        self.lock().insert(
            spreadsheet_id.to_string(),
            ResponseStore {
                spreadsheet_id: spreadsheet_id.to_string(),
                name: name.to_string(),
                url: None,
            },
        );
        self
    }

    pub fn remove(&self, spreadsheet_id: &str) -> Option<ResponseStore> {
        self.lock().remove(spreadsheet_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, ResponseStore>> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResponseStoreGateway for InMemoryResponseStores {
    fn open(&self, spreadsheet_id: &str) -> Result<ResponseStore, FormServiceError> {
        self.lock()
            .get(spreadsheet_id)
            .cloned()
            .ok_or_else(|| FormServiceError::SpreadsheetNotFound(spreadsheet_id.to_string()))
    }

    fn create(&self, name: &str) -> Result<ResponseStore, FormServiceError> {
        let spreadsheet_id = Uuid::new_v4().simple().to_string();
        let store = ResponseStore {
            spreadsheet_id: spreadsheet_id.clone(),
            name: name.to_string(),
            url: None,
        };
        self.lock().insert(spreadsheet_id, store.clone());
        Ok(store)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SpreadsheetMetadata {
    name: String,
}

/// Response spreadsheets as directories of the CSV export root, the same
/// layout [`CsvSheetStore`](crate::workflows::sheets::CsvSheetStore) reads
/// and appends to. A `spreadsheet.json` file carries the display name.
#[derive(Debug, Clone)]
pub struct CsvResponseStores {
    root: PathBuf,
}

impl CsvResponseStores {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn spreadsheet_dir(&self, spreadsheet_id: &str) -> Option<PathBuf> {
        let unsafe_id = spreadsheet_id.is_empty()
            || spreadsheet_id.contains(['/', '\\'])
            || spreadsheet_id.starts_with('.');
        (!unsafe_id).then(|| self.root.join(spreadsheet_id))
    }
}

impl ResponseStoreGateway for CsvResponseStores {
    fn open(&self, spreadsheet_id: &str) -> Result<ResponseStore, FormServiceError> {
        let dir = self
            .spreadsheet_dir(spreadsheet_id)
            .filter(|dir| dir.is_dir())
            .ok_or_else(|| FormServiceError::SpreadsheetNotFound(spreadsheet_id.to_string()))?;

        let name = fs::read_to_string(dir.join(SPREADSHEET_METADATA))
            .ok()
            .and_then(|raw| serde_json::from_str::<SpreadsheetMetadata>(&raw).ok())
            .map(|metadata| metadata.name)
            .unwrap_or_else(|| spreadsheet_id.to_string());

        Ok(ResponseStore {
            spreadsheet_id: spreadsheet_id.to_string(),
            name,
            url: None,
        })
    }

    fn create(&self, name: &str) -> Result<ResponseStore, FormServiceError> {
        let spreadsheet_id = Uuid::new_v4().simple().to_string();
        let dir = self.root.join(&spreadsheet_id);
        fs::create_dir_all(&dir).map_err(storage_error)?;

        let metadata = SpreadsheetMetadata {
            name: name.to_string(),
        };
        let raw = serde_json::to_vec_pretty(&metadata).map_err(storage_error)?;
        fs::write(dir.join(SPREADSHEET_METADATA), raw).map_err(storage_error)?;

        Ok(ResponseStore {
            spreadsheet_id,
            name: name.to_string(),
            url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::forms::questions::QuestionRole;

    fn select(choices: &[&str]) -> FormQuestion {
        FormQuestion {
            role: QuestionRole::RoleSelect,
            kind: QuestionKind::SingleSelect {
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
            title: QuestionRole::RoleSelect.label().to_string(),
            help_text: None,
            required: true,
        }
    }

    #[test]
    fn prefilled_url_encodes_answers() {
        let forms = LocalFormService::with_base_url("https://forms.test/");
        let handle = forms.create_form("Interest").expect("create");
        let item = forms
            .add_item(&handle.form_id, &select(&["High School - Art & Design"]))
            .expect("add item");

        let url = forms
            .prefilled_url(
                &handle.form_id,
                &[PrefilledAnswer {
                    item: item.clone(),
                    value: "High School - Art & Design".to_string(),
                }],
            )
            .expect("prefill");

        assert_eq!(
            url,
            format!(
                "https://forms.test/d/e/{}/viewform?usp=pp_url&entry.{}=High+School+-+Art+%26+Design",
                handle.form_id, item.0
            )
        );
    }

    #[test]
    fn default_links_point_at_the_local_service() {
        let forms = LocalFormService::new();
        let handle = forms.create_form("Interest").expect("create");

        assert!(handle
            .published_url
            .starts_with("http://localhost:3000/forms/d/e/"));
        assert!(!handle.edit_url.contains("google"));
    }

    #[test]
    fn prefilled_url_rejects_unknown_choice() {
        let forms = LocalFormService::new();
        let handle = forms.create_form("Interest").expect("create");
        let item = forms
            .add_item(&handle.form_id, &select(&["Elementary - Art"]))
            .expect("add item");

        let err = forms
            .prefilled_url(
                &handle.form_id,
                &[PrefilledAnswer {
                    item,
                    value: "Elementary - Music".to_string(),
                }],
            )
            .expect_err("choice not offered");
        assert!(matches!(err, FormServiceError::InvalidChoice { .. }));
    }

    #[test]
    fn removed_form_cannot_be_opened() {
        let forms = LocalFormService::new();
        let handle = forms.create_form("Interest").expect("create");
        forms.remove_form(&handle.form_id);

        assert!(matches!(
            forms.open_form(&handle.form_id),
            Err(FormServiceError::FormNotFound(_))
        ));
    }

    #[test]
    fn persistent_forms_are_shared_between_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("forms.json");

        let first = LocalFormService::persistent(&path, "http://forms.test");
        let handle = first.create_form("Interest").expect("create");
        let item = first
            .add_item(&handle.form_id, &select(&["Elementary - Art"]))
            .expect("add item");

        let second = LocalFormService::persistent(&path, "http://forms.test");
        assert_eq!(second.open_form(&handle.form_id).expect("open"), handle);
        let next = second
            .add_item(&handle.form_id, &select(&["Elementary - Music"]))
            .expect("add item");
        assert_ne!(next, item);

        let url = second
            .prefilled_url(
                &handle.form_id,
                &[PrefilledAnswer {
                    item,
                    value: "Elementary - Art".to_string(),
                }],
            )
            .expect("prefill");
        assert!(url.contains("usp=pp_url"));
        assert_eq!(first.form(&handle.form_id).expect("hosted").items.len(), 2);
    }

    #[test]
    fn corrupt_store_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("forms.json");
        fs::write(&path, "{ not json").expect("seed store");

        let forms = LocalFormService::persistent(&path, "http://forms.test");
        assert!(matches!(
            forms.create_form("Interest"),
            Err(FormServiceError::Storage(_))
        ));
    }

    #[test]
    fn view_places_prefilled_values_on_their_questions() {
        let forms = LocalFormService::new();
        let handle = forms.create_form("Interest").expect("create");
        forms
            .apply_settings(
                &handle.form_id,
                &FormSettings::interest_form("Interest", "Tell us more."),
            )
            .expect("settings");
        let item = forms
            .add_item(&handle.form_id, &select(&["Elementary - Art"]))
            .expect("add item");

        let prefilled = BTreeMap::from([
            ("usp".to_string(), "pp_url".to_string()),
            (format!("entry.{}", item.0), "Elementary - Art".to_string()),
        ]);
        let view = forms.view(&handle.form_id, &prefilled).expect("view");

        assert_eq!(view.description, "Tell us more.");
        assert!(view.collect_email);
        assert_eq!(view.questions.len(), 1);
        assert_eq!(view.questions[0].value.as_deref(), Some("Elementary - Art"));
    }

    #[test]
    fn response_stores_open_what_they_created() {
        let stores = InMemoryResponseStores::new();
        let created = stores.create("Interest - Responses").expect("create");

        let opened = stores.open(&created.spreadsheet_id).expect("open");
        assert_eq!(opened, created);
        assert!(stores.open("missing").is_err());
    }

    #[test]
    fn csv_response_stores_keep_the_name_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stores = CsvResponseStores::new(dir.path());
        let created = stores.create("Interest - Responses").expect("create");

        assert!(dir.path().join(&created.spreadsheet_id).is_dir());
        let reopened = CsvResponseStores::new(dir.path())
            .open(&created.spreadsheet_id)
            .expect("open");
        assert_eq!(reopened, created);
        assert!(matches!(
            stores.open("../escape"),
            Err(FormServiceError::SpreadsheetNotFound(_))
        ));
    }
}
