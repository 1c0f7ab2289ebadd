use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Variables that must be present before the relay will bind a port
pub const REQUIRED_ENV_VARS: [&str; 4] = [
    "ANDROID_PACKAGE_IDENTIFIER",
    "TEAM_ID",
    "KEY_ID",
    "KEY_CONTENTS",
];

pub const DEFAULT_APPLE_TOKEN_ENDPOINT: &str = "https://appleid.apple.com/auth/token";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Missing required environment variables: {0:?}")]
    MissingVariables(Vec<&'static str>),

    #[error("Either SERVICE_ID or BUNDLE_ID must be set")]
    MissingClientIdentifier,

    #[error("Unknown credential issuer '{0}' (expected 'session' or 'firebase')")]
    UnknownIssuer(String),

    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to initialize logger: {0}")]
    Logger(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelaySettings {
    pub application: ApplicationSettings,
    pub android: AndroidSettings,
    pub apple: AppleSettings,
    pub issuance: IssuanceSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Log full redirect targets; they can carry Apple's identity token
    pub log_redirect_targets: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AndroidSettings {
    pub package_identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppleSettings {
    pub team_id: String,
    pub key_id: String,
    /// PKCS#8 PEM with every newline replaced by `|`
    pub key_contents: String,
    pub service_id: Option<String>,
    pub bundle_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub token_endpoint: String,
}

/// Which credential the code-exchange route hands back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssuerKind {
    /// Locally fabricated session identifier plus basic profile
    #[default]
    Session,
    /// Firebase custom token minted with a service account
    Firebase,
}

impl std::fmt::Display for IssuerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Firebase => write!(f, "firebase"),
        }
    }
}

impl std::str::FromStr for IssuerKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "firebase" => Ok(Self::Firebase),
            _ => Err(SettingsError::UnknownIssuer(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceSettings {
    pub kind: IssuerKind,
    pub service_account_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_redirect_targets: false,
        }
    }
}

impl Default for AppleSettings {
    fn default() -> Self {
        Self {
            team_id: String::new(),
            key_id: String::new(),
            key_contents: String::new(),
            service_id: None,
            bundle_id: None,
            redirect_uri: None,
            token_endpoint: DEFAULT_APPLE_TOKEN_ENDPOINT.to_string(),
        }
    }
}

impl Default for IssuanceSettings {
    fn default() -> Self {
        Self {
            kind: IssuerKind::Session,
            service_account_path: "serviceAccountKey.json".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RelaySettings {
    /// Load settings from the environment (and optional Settings.toml), then validate
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A settings file cannot be read or parsed
    /// - Logger initialization fails
    /// - A required variable is missing
    /// - Neither `SERVICE_ID` nor `BUNDLE_ID` is set
    /// - `CREDENTIAL_ISSUER` holds an unknown value
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        settings.apply_env_overrides()?;
        settings.logging.init_logger()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Build settings from defaults plus environment variables only
    ///
    /// # Errors
    ///
    /// Returns an error if an override is invalid or validation fails
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings.toml in the current directory, replaced by the one in
    /// `RELAY_SECRETS_DIR` when that exists
    fn load_base_settings() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        let default_config_path = PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::read_settings_file(&default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Some(secrets_dir) = non_empty_env("RELAY_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::read_settings_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ RELAY_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a Settings.toml file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn read_settings_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        basic_toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment variable overrides; empty values are ignored
    ///
    /// # Errors
    ///
    /// Returns an error if `CREDENTIAL_ISSUER` holds an unknown value
    pub fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        Self::apply_application_env_overrides(&mut self.application);
        override_string("ANDROID_PACKAGE_IDENTIFIER", &mut self.android.package_identifier);
        Self::apply_apple_env_overrides(&mut self.apple);
        Self::apply_issuance_env_overrides(&mut self.issuance)?;
        override_string("RUST_LOG", &mut self.logging.level);
        Ok(())
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        override_string("HOST", &mut app_settings.host);
        if let Some(port) = non_empty_env("PORT").and_then(|p| p.parse::<u16>().ok()) {
            app_settings.port = port;
        }
        if let Some(flag) = non_empty_env("LOG_REDIRECT_TARGETS") {
            app_settings.log_redirect_targets = matches!(
                flag.to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            );
        }
    }

    fn apply_apple_env_overrides(apple: &mut AppleSettings) {
        override_string("TEAM_ID", &mut apple.team_id);
        override_string("KEY_ID", &mut apple.key_id);
        override_string("KEY_CONTENTS", &mut apple.key_contents);
        override_optional("SERVICE_ID", &mut apple.service_id);
        override_optional("BUNDLE_ID", &mut apple.bundle_id);
        override_optional("REDIRECT_URI", &mut apple.redirect_uri);
        override_string("APPLE_TOKEN_ENDPOINT", &mut apple.token_endpoint);
    }

    fn apply_issuance_env_overrides(issuance: &mut IssuanceSettings) -> Result<(), SettingsError> {
        if let Some(kind) = non_empty_env("CREDENTIAL_ISSUER") {
            issuance.kind = kind.parse()?;
        }
        override_string(
            "FIREBASE_SERVICE_ACCOUNT_PATH",
            &mut issuance.service_account_path,
        );
        Ok(())
    }

    /// Check that everything the relay needs at request time is present
    ///
    /// # Errors
    ///
    /// Returns the full set of missing required variables, or
    /// `MissingClientIdentifier` when neither client identifier is configured
    pub fn validate(&self) -> Result<(), SettingsError> {
        let values = [
            &self.android.package_identifier,
            &self.apple.team_id,
            &self.apple.key_id,
            &self.apple.key_contents,
        ];
        let missing: Vec<&'static str> = REQUIRED_ENV_VARS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(SettingsError::MissingVariables(missing));
        }

        if !has_value(self.apple.service_id.as_ref()) && !has_value(self.apple.bundle_id.as_ref()) {
            return Err(SettingsError::MissingClientIdentifier);
        }

        Ok(())
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = parse_env_line(line) {
                    // Real environment wins over .env
                    if std::env::var_os(key).is_none() {
                        std::env::set_var(key, value);
                    }
                }
            }
        }
    }
}

impl LoggingSettings {
    /// Logger whose filter comes from the loaded level (`RUST_LOG` syntax)
    #[must_use]
    pub fn logger_builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&self.level);
        builder
    }

    /// Install the global logger
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed
    pub fn init_logger(&self) -> Result<(), SettingsError> {
        self.logger_builder()
            .try_init()
            .map_err(|e| SettingsError::Logger(e.to_string()))
    }
}

/// Split a `.env` line into key and unquoted value
///
/// Comments, blank lines and keys `std::env::set_var` would reject are skipped.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim().trim_matches('"');
    if key.is_empty() || key.contains('\0') || value.contains('\0') {
        return None;
    }
    Some((key, value))
}

impl AppleSettings {
    /// Client identifier for the exchange: bundle id when requested, service id otherwise
    #[must_use]
    pub fn client_id(&self, use_bundle_id: bool) -> Option<&str> {
        let selected = if use_bundle_id {
            self.bundle_id.as_deref()
        } else {
            self.service_id.as_deref()
        };
        selected.filter(|id| !id.is_empty())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn override_string(name: &str, target: &mut String) {
    if let Some(value) = non_empty_env(name) {
        *target = value;
    }
}

fn override_optional(name: &str, target: &mut Option<String>) {
    if let Some(value) = non_empty_env(name) {
        *target = Some(value);
    }
}

fn has_value(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}
