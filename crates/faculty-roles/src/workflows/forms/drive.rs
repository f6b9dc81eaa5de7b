use std::io::Cursor;

use google_drive3::{api::File, api::Scope, DriveHub};
use tokio::runtime::Handle;

use super::service::{FormServiceError, ResponseStore, ResponseStoreGateway};

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Response spreadsheets managed through Drive. Creating a file with the
/// spreadsheet mime type yields an empty native spreadsheet.
///
/// Like the sheets client, calls block on the runtime handle.
pub struct GoogleDriveResponseStores<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    hub: DriveHub<C>,
    runtime: Handle,
}

impl<C> GoogleDriveResponseStores<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    pub fn new(hub: DriveHub<C>, runtime: Handle) -> Self {
        Self { hub, runtime }
    }

    pub fn on_current_runtime(hub: DriveHub<C>) -> Result<Self, FormServiceError> {
        let runtime =
            Handle::try_current().map_err(|err| FormServiceError::Runtime(err.to_string()))?;
        Ok(Self::new(hub, runtime))
    }

    fn map_error<E: std::fmt::Display>(err: E) -> FormServiceError {
        FormServiceError::Backend(err.to_string())
    }
}

impl<C> std::fmt::Debug for GoogleDriveResponseStores<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveResponseStores")
            .finish_non_exhaustive()
    }
}

impl<C> ResponseStoreGateway for GoogleDriveResponseStores<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn open(&self, spreadsheet_id: &str) -> Result<ResponseStore, FormServiceError> {
        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .get(spreadsheet_id)
                .param("fields", "id,name,webViewLink,trashed")
                .supports_all_drives(true)
                .add_scope(Scope::Readonly)
                .doit()
                .await
        });

        let (_, file) = result.map_err(GoogleDriveResponseStores::<C>::map_error)?;
        opened_store(spreadsheet_id, file)
    }

    fn create(&self, name: &str) -> Result<ResponseStore, FormServiceError> {
        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .create(spreadsheet_metadata(name))
                .param("fields", "id,name,webViewLink")
                .supports_all_drives(true)
                .add_scope(Scope::File)
                .upload(Cursor::new(Vec::new()), mime::TEXT_CSV)
                .await
        });

        let (_, file) = result.map_err(GoogleDriveResponseStores::<C>::map_error)?;
        created_store(name, file)
    }
}

fn spreadsheet_metadata(name: &str) -> File {
    File {
        name: Some(name.to_string()),
        mime_type: Some(SPREADSHEET_MIME.to_string()),
        ..File::default()
    }
}

/// A trashed file counts as gone.
fn opened_store(spreadsheet_id: &str, file: File) -> Result<ResponseStore, FormServiceError> {
    if file.trashed.unwrap_or(false) {
        return Err(FormServiceError::SpreadsheetNotFound(
            spreadsheet_id.to_string(),
        ));
    }

    Ok(ResponseStore {
        spreadsheet_id: file.id.unwrap_or_else(|| spreadsheet_id.to_string()),
        name: file.name.unwrap_or_else(|| "untitled".to_string()),
        url: file.web_view_link,
    })
}

fn created_store(name: &str, file: File) -> Result<ResponseStore, FormServiceError> {
    let spreadsheet_id = file
        .id
        .ok_or_else(|| FormServiceError::Backend("drive returned no file id".to_string()))?;

    Ok(ResponseStore {
        spreadsheet_id,
        name: file.name.unwrap_or_else(|| name.to_string()),
        url: file.web_view_link,
    })
}
