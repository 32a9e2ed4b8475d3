use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LIBRIS_ENV";
const CONFIG_DIR_ENV: &str = "LIBRIS_CONFIG_DIR";
const ENV_PREFIX: &str = "LIBRIS";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Self::Local),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub loans: LoanSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay and `LIBRIS__*` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let parsed: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{environment}.toml"));

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The selected environment always wins over whatever the files say.
        settings.environment = parsed;

        if settings.auth.session_ttl_secs == 0 {
            return Err(anyhow!("auth.session_ttl_secs must be at least 1"));
        }

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Which backend keeps the `books` / `borrowers` documents.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "StorageSettings::default_path")]
    pub path: PathBuf,
}

impl StorageSettings {
    fn default_path() -> PathBuf {
        PathBuf::from("data/library.json")
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "AuthSettings::default_username")]
    pub username: String,
    #[serde(
        default = "AuthSettings::default_password",
        deserialize_with = "deserialize_secret"
    )]
    pub password: SecretString,
    #[serde(default = "AuthSettings::default_session_ttl_secs")]
    /// Inactivity timeout of the login session; must be at least one second.
    pub session_ttl_secs: u32,
    #[serde(default)]
    pub secure_cookies: bool,
}

impl AuthSettings {
    fn default_username() -> String {
        "admin".to_string()
    }

    fn default_password() -> SecretString {
        SecretString::from("admin123".to_string())
    }

    fn default_session_ttl_secs() -> u32 {
        24 * 60 * 60
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            username: Self::default_username(),
            password: Self::default_password(),
            session_ttl_secs: Self::default_session_ttl_secs(),
            secure_cookies: false,
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoanSettings {
    #[serde(default = "LoanSettings::default_period_days")]
    pub period_days: u32,
}

impl LoanSettings {
    fn default_period_days() -> u32 {
        14
    }
}

impl Default for LoanSettings {
    fn default() -> Self {
        Self {
            period_days: Self::default_period_days(),
        }
    }
}

/// Generic mock REST endpoint the catalog can be imported from.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSettings {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "RemoteSettings::default_books_resource")]
    pub books_resource: String,
    #[serde(default = "RemoteSettings::default_borrowers_resource")]
    pub borrowers_resource: String,
    #[serde(default = "RemoteSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl RemoteSettings {
    fn default_books_resource() -> String {
        "books".to_string()
    }

    fn default_borrowers_resource() -> String {
        "borrowers".to_string()
    }

    fn default_timeout_ms() -> u64 {
        10000
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            books_resource: Self::default_books_resource(),
            borrowers_resource: Self::default_borrowers_resource(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info,tower_http=info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn defaults_match_library_conventions() {
        let settings = Settings::default();
        assert_eq!(settings.loans.period_days, 14);
        assert_eq!(settings.storage.backend, StorageBackend::File);
        assert_eq!(settings.auth.username, "admin");
        assert_eq!(settings.server.bind_address(), "0.0.0.0:8080");
        assert!(settings.remote.base_url.is_none());
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_from(dir.path(), "qa").unwrap_err();
        assert!(err.to_string().contains("unsupported environment"));
    }

    #[test]
    fn environment_overlay_overrides_base_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.toml"),
            "[server]\nport = 9000\n\n[auth]\nusername = \"librarian\"\npassword = \"base-secret\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            "[auth]\npassword = \"staging-secret\"\n\n[storage]\nbackend = \"memory\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path(), "staging").unwrap();
        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.auth.username, "librarian");
        assert_eq!(settings.auth.password.expose_secret(), "staging-secret");
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn session_ttl_must_be_positive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("base.toml"), "[auth]\nsession_ttl_secs = 0\n").unwrap();
        let err = Settings::load_from(dir.path(), "local").unwrap_err();
        assert!(err.to_string().contains("session_ttl_secs"));

        std::fs::write(dir.path().join("base.toml"), "[auth]\nsession_ttl_secs = -5\n").unwrap();
        assert!(Settings::load_from(dir.path(), "local").is_err());
    }
}
