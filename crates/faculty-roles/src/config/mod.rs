use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_FORM_TITLE: &str = "Expression of Interest: Internal Transfer (Faculty Roles)";
const DEFAULT_FORM_DESCRIPTION: &str = "Express your interest in the following faculty role opportunities. Your information will be pre-filled from your account.";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub sheets: SheetsConfig,
    pub forms: FormsConfig,
    pub notifications: NotificationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&env_or("APP_ENV", "development"));

        let host = env_or("APP_HOST", "127.0.0.1");
        let port = env_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env_or("APP_LOG_LEVEL", "info");

        let sheets = SheetsConfig {
            roles_spreadsheet_id: env_or("ROLES_SPREADSHEET_ID", "faculty-roles"),
            roles_tab: env_or("ROLES_SHEET_NAME", "Faculty Roles"),
            directory_tab: env_or("DIRECTORY_SHEET_NAME", "Staff Directory"),
            responses_tab: env_or("RESPONSES_SHEET_NAME", "Form Responses 1"),
            export_dir: PathBuf::from(env_or("SHEET_EXPORT_DIR", "data/sheets")),
            backend: SheetBackend::parse(&env_or("SHEETS_BACKEND", "csv"))?,
            google_key_path: optional_path("GOOGLE_SERVICE_ACCOUNT_KEY"),
        };

        if sheets.backend == SheetBackend::Google && sheets.google_key_path.is_none() {
            return Err(ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_KEY"));
        }

        let forms = FormsConfig {
            enabled: parse_flag("FORM_PROVISIONING_ENABLED", false)?,
            title: env_or("FORM_TITLE", DEFAULT_FORM_TITLE),
            description: env_or("FORM_DESCRIPTION", DEFAULT_FORM_DESCRIPTION),
            properties_path: PathBuf::from(env_or("PROPERTIES_PATH", "data/properties.json")),
            store_path: PathBuf::from(env_or("FORMS_STORE_PATH", "data/forms.json")),
            public_base_url: env_or("FORMS_BASE_URL", &format!("http://{host}:{port}/forms")),
            profile_table_path: optional_path("PROFILE_TABLE_PATH"),
            contacts_directory_path: optional_path("CONTACTS_DIRECTORY_PATH"),
            people_directory_path: optional_path("PEOPLE_DIRECTORY_PATH"),
        };

        let notifications = NotificationConfig {
            hr_email: env_or("HR_EMAIL", ""),
            spool_dir: PathBuf::from(env_or("MAIL_SPOOL_DIR", "data/outbox")),
        };

        if forms.enabled && notifications.hr_email.trim().is_empty() {
            return Err(ConfigError::Missing("HR_EMAIL"));
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            sheets,
            forms,
            notifications,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which spreadsheet backend serves the roles, directory and response tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetBackend {
    /// CSV exports under [`SheetsConfig::export_dir`].
    Csv,
    /// Google Sheets and Drive through a service account.
    Google,
}

impl SheetBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "google" => Ok(Self::Google),
            _ => Err(ConfigError::InvalidChoice {
                name: "SHEETS_BACKEND",
                value: value.to_string(),
            }),
        }
    }
}

/// Where the roles, directory and response tabs are read from.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub roles_spreadsheet_id: String,
    pub roles_tab: String,
    pub directory_tab: String,
    pub responses_tab: String,
    /// Root of the CSV exports, one directory per spreadsheet id.
    pub export_dir: PathBuf,
    pub backend: SheetBackend,
    pub google_key_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct FormsConfig {
    pub enabled: bool,
    pub title: String,
    pub description: String,
    pub properties_path: PathBuf,
    /// JSON file holding the locally hosted forms.
    pub store_path: PathBuf,
    /// Base of the links handed out for locally hosted forms.
    pub public_base_url: String,
    pub profile_table_path: Option<PathBuf>,
    pub contacts_directory_path: Option<PathBuf>,
    pub people_directory_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub hr_email: String,
    pub spool_dir: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { name: &'static str, value: String },
    InvalidChoice { name: &'static str, value: String },
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false, got '{value}'")
            }
            ConfigError::InvalidChoice { name, value } => {
                write!(f, "{name} does not accept '{value}'")
            }
            ConfigError::Missing(name) => write!(f, "{name} is required by this configuration"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidChoice { .. }
            | ConfigError::Missing(_) => None,
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn parse_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name, value: raw }),
    }
}
