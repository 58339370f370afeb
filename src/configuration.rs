use crate::domain::recipient::models::{
    email::{EmailError, RecipientEmail},
    name::{SenderName, SenderNameError},
};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::{Path, PathBuf};

/// Well-known variables read on top of the `APP_` prefixed ones.
const ENVIRONMENT_ALIASES: [(&str, &str); 4] = [
    ("MSGRAPH_TENANT_ID", "email_client.tenant_id"),
    ("MSGRAPH_CLIENT_ID", "email_client.client_id"),
    ("MSGRAPH_CLIENT_SECRET", "email_client.client_secret"),
    ("EMAILS_MUST_MATCH_REGEX", "application.emails_must_match_regex"),
];

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to load environment file {path}: {reason}")]
    EnvFile { path: String, reason: String },
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub template_path: PathBuf,
    pub csv_path: PathBuf,
    pub subject: String,
    pub importance: String,
    pub dry_run: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_concurrent_sends: usize,
    pub log_level: LogLevel,
    pub log_dir: PathBuf,
    pub failure_report_dir: PathBuf,
    #[serde(default)]
    pub emails_must_match_regex: Option<String>,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct EmailClientSettings {
    pub graph_base_url: String,
    pub authority_base_url: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub sender_email: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<RecipientEmail, EmailError> {
        RecipientEmail::parse(self.sender_email.clone())
    }

    pub fn sender_name(&self) -> Result<Option<SenderName>, SenderNameError> {
        match self.sender_name.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => SenderName::parse(name.to_string()).map(Some),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_base_url.trim_end_matches('/'),
            self.tenant_id
        )
    }

    pub fn scope(&self) -> String {
        format!("{}/.default", self.graph_base_url.trim_end_matches('/'))
    }

    fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.tenant_id.trim().is_empty() {
            missing.push("MSGRAPH_TENANT_ID");
        }
        if self.client_id.trim().is_empty() {
            missing.push("MSGRAPH_CLIENT_ID");
        }
        if self.client_secret.expose_secret().trim().is_empty() {
            missing.push("MSGRAPH_CLIENT_SECRET");
        }
        missing
    }
}

impl Settings {
    /// Checks what can be checked before any adapter is built.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let application = &self.application;
        if application.subject.trim().is_empty() {
            return Err(ConfigurationError::Invalid(
                "No email subject provided. Pass one with --subject.".into(),
            ));
        }
        if !application.template_path.is_file() {
            return Err(ConfigurationError::Invalid(format!(
                "Template path '{}' does not exist.",
                application.template_path.display()
            )));
        }
        if !application.csv_path.is_file() {
            return Err(ConfigurationError::Invalid(format!(
                "CSV path '{}' does not exist.",
                application.csv_path.display()
            )));
        }
        if application.max_concurrent_sends == 0 {
            return Err(ConfigurationError::Invalid(
                "--max-concurrent-sends must be at least 1.".into(),
            ));
        }
        if !application.dry_run {
            let missing = self.email_client.missing_credentials();
            if !missing.is_empty() {
                return Err(ConfigurationError::Invalid(format!(
                    "Missing credentials: {}. Set them in the environment or the .env file.",
                    missing.join(", ")
                )));
            }
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum LogLevel {
    Info,
    Warning,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!(
                "{} is not a supported log level. Use either `INFO`, `WARNING`, `DEBUG` or `TRACE`.",
                other
            )),
        }
    }
}

/// Loads a `.env` file into the process environment. Values from the file
/// replace variables that are already set.
///
/// An explicitly named file must exist; the default `./.env` is optional.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigurationError> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(".env"), false),
    };
    if !required && !path.is_file() {
        return Ok(None);
    }
    let env_file_error = |reason: String| ConfigurationError::EnvFile {
        path: path.display().to_string(),
        reason,
    };

    let entries = dotenv::from_path_iter(&path).map_err(|e| env_file_error(e.to_string()))?;
    for entry in entries {
        let (key, value) = entry.map_err(|e| env_file_error(e.to_string()))?;
        std::env::set_var(key, value);
    }
    Ok(Some(path))
}

/// Layers, lowest precedence first: defaults, the optional configuration
/// file, `APP_` variables, the well-known variables, then `overrides`.
pub fn get_configuration(
    config_file: Option<&Path>,
    overrides: &[(&str, String)],
) -> Result<Settings, ConfigurationError> {
    let mut settings = config::Config::default();

    settings.set_default("application.template_path", "")?;
    settings.set_default("application.csv_path", "")?;
    settings.set_default("application.subject", "")?;
    settings.set_default("application.importance", "high")?;
    settings.set_default("application.dry_run", false)?;
    settings.set_default("application.max_concurrent_sends", 10_i64)?;
    settings.set_default("application.log_level", "info")?;
    settings.set_default("application.log_dir", "logs")?;
    settings.set_default("application.failure_report_dir", ".")?;
    settings.set_default("email_client.graph_base_url", "https://graph.microsoft.com")?;
    settings.set_default(
        "email_client.authority_base_url",
        "https://login.microsoftonline.com",
    )?;
    settings.set_default("email_client.tenant_id", "")?;
    settings.set_default("email_client.client_id", "")?;
    settings.set_default("email_client.client_secret", "")?;
    settings.set_default("email_client.sender_email", "")?;
    settings.set_default("email_client.timeout_milliseconds", 10_000_i64)?;

    if let Some(config_file) = config_file {
        settings.merge(config::File::from(config_file).required(true))?;
    }
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;
    for (variable, key) in ENVIRONMENT_ALIASES {
        if let Ok(value) = std::env::var(variable) {
            settings.set(key, value)?;
        }
    }
    for (key, value) in overrides {
        settings.set(key, value.as_str())?;
    }

    let settings: Settings = settings.try_into()?;
    Ok(settings)
}
