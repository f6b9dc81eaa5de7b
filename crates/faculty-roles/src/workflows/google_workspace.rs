//! Service-account access to Google Sheets and Drive.

use std::path::{Path, PathBuf};

use google_drive3::hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use google_drive3::hyper_util::client::legacy::connect::HttpConnector;
use google_drive3::hyper_util::client::legacy::Client;
use google_drive3::hyper_util::rt::TokioExecutor;
use google_drive3::yup_oauth2::{self, ServiceAccountAuthenticator};
use google_drive3::DriveHub;
use google_sheets4::Sheets;
use tokio::runtime::Handle;

use crate::workflows::forms::GoogleDriveResponseStores;
use crate::workflows::sheets::GoogleSheetsClient;

pub type GoogleConnector = HttpsConnector<HttpConnector>;

#[derive(Debug, thiserror::Error)]
pub enum GoogleAuthError {
    #[error("cannot read service account key {}: {source}", .path.display())]
    Key {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot load TLS root certificates: {0}")]
    Tls(std::io::Error),
    #[error("service account authentication failed: {0}")]
    Authenticator(std::io::Error),
}

/// Authenticated hubs for the two Google APIs the dashboard talks to.
pub struct GoogleWorkspace {
    sheets: Sheets<GoogleConnector>,
    drive: DriveHub<GoogleConnector>,
}

impl std::fmt::Debug for GoogleWorkspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleWorkspace").finish_non_exhaustive()
    }
}

impl GoogleWorkspace {
    pub async fn connect(key_path: &Path) -> Result<Self, GoogleAuthError> {
        let key = yup_oauth2::read_service_account_key(key_path)
            .await
            .map_err(|source| GoogleAuthError::Key {
                path: key_path.to_path_buf(),
                source,
            })?;
        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(GoogleAuthError::Authenticator)?;

        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(GoogleAuthError::Tls)?
            .https_only()
            .enable_http1()
            .build();
        let client: google_sheets4::common::Client<GoogleConnector> =
            Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            sheets: Sheets::new(client.clone(), auth.clone()),
            drive: DriveHub::new(client, auth),
        })
    }

    /// Splits into the blocking adapters, bound to `runtime`.
    pub fn into_adapters(
        self,
        runtime: Handle,
    ) -> (
        GoogleSheetsClient<GoogleConnector>,
        GoogleDriveResponseStores<GoogleConnector>,
    ) {
        (
            GoogleSheetsClient::new(self.sheets, runtime.clone()),
            GoogleDriveResponseStores::new(self.drive, runtime),
        )
    }
}
