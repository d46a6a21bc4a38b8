use anyhow::{Result, anyhow};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    #[serde(default)]
    pub database: Database,
    pub http: Http,
    pub log: Log,
}

#[derive(Deserialize)]
pub struct Auth {
    pub backend: String, // "memory" or "mysql"
    pub signing_secret: String,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("backend", &self.backend)
            .field("signing_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
pub struct Database {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for Database {
    fn default() -> Self {
        Database {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

// The URL carries the database password.
impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.auth.signing_secret.trim().is_empty() {
            return Err(anyhow!("auth.signing_secret must not be empty"));
        }
        match self.auth.backend.as_str() {
            "memory" => {}
            "mysql" if self.database.url.is_none() => {
                return Err(anyhow!("database.url is required for the mysql backend"));
            }
            "mysql" => {}
            other => return Err(anyhow!("Unknown auth backend: {}", other)),
        }
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            return Err(anyhow!("http.cert_path and http.key_path must be set together"));
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "WARBLER";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);
    let builder = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));
    build(builder)
}

pub fn parse_settings_toml(toml: &str) -> Result<Settings> {
    build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    let settings: Settings = builder
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
