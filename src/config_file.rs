use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use failure::Error;
use reqwest::Url;

use crate::errors::ConfigError;

pub const CONFIG_PATH_VAR: &str = "BUILD_TRIGGER_CONFIG";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub jenkins_base_url: String,
    #[serde(default)]
    pub jenkins_username: String,
    #[serde(default)]
    pub jenkins_password: String,
    #[serde(default)]
    pub app_name: String,

    /// Jenkins here sits on a private network behind a self-signed
    /// certificate. Turning this on disables certificate validation entirely.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub retry_interval_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Config {
        Config {
            jenkins_base_url: String::new(),
            jenkins_username: String::new(),
            jenkins_password: String::new(),
            app_name: String::new(),
            accept_invalid_certs: default_accept_invalid_certs(),
            poll_interval_ms: default_interval_ms(),
            retry_interval_ms: default_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Reads `config.toml` (next to the executable, or wherever
    /// `BUILD_TRIGGER_CONFIG` points), then lets the environment override it.
    pub fn load() -> Result<Config, Error> {
        let explicit = env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        let mut config = match locate_config_file(explicit, env::current_exe().ok())? {
            Some(path) => Config::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config, Error> {
        let text = fs::read_to_string(path)
            .map_err(|e| format_err!("Unable to read {}: {}", path.display(), e))?;
        Config::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Config, Error> {
        Ok(toml::from_str::<Config>(text)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("JENKINS_URL") {
            self.jenkins_base_url = value;
        }
        if let Some(value) = lookup("JENKINS_USERNAME") {
            self.jenkins_username = value;
        }
        if let Some(value) = lookup("JENKINS_PASSWORD") {
            self.jenkins_password = value;
        }
        if let Some(value) = lookup("APP_NAME") {
            self.app_name = value;
        }
        if let Some(value) = lookup("JENKINS_ACCEPT_INVALID_CERTS") {
            self.accept_invalid_certs = parse_bool("JENKINS_ACCEPT_INVALID_CERTS", &value)?;
        }
        if let Some(value) = lookup("JENKINS_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_setting("JENKINS_POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("JENKINS_RETRY_INTERVAL_MS") {
            self.retry_interval_ms = parse_setting("JENKINS_RETRY_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("JENKINS_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_setting("JENKINS_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.log_level = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        let required = [
            ("JENKINS_URL", &self.jenkins_base_url),
            ("JENKINS_USERNAME", &self.jenkins_username),
            ("JENKINS_PASSWORD", &self.jenkins_password),
            ("APP_NAME", &self.app_name),
        ];
        for &(name, value) in required.iter() {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingSetting {
                    name: name.to_string(),
                }
                .into());
            }
        }

        if Url::parse(&self.jenkins_base_url).is_err() {
            return Err(ConfigError::InvalidSetting {
                name: "JENKINS_URL".to_string(),
                value: self.jenkins_base_url.clone(),
            }
            .into());
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Printed to stderr regardless of the log level whenever certificate
    /// validation is off.
    pub fn insecure_tls_notice(&self) -> Option<String> {
        if !self.accept_invalid_certs {
            return None;
        }
        Some(format!(
            "TLS certificate validation is DISABLED for {}. Only do this on a trusted network; set JENKINS_ACCEPT_INVALID_CERTS=false to turn it back on.",
            self.jenkins_base_url
        ))
    }
}

/// A file named through `BUILD_TRIGGER_CONFIG` must exist. The one next to
/// the executable (put there by build.rs) is optional.
fn locate_config_file(
    explicit: Option<PathBuf>,
    exe: Option<PathBuf>,
) -> Result<Option<PathBuf>, Error> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::MissingConfigFile {
                name: CONFIG_PATH_VAR.to_string(),
                path: path.display().to_string(),
            }
            .into());
        }
        return Ok(Some(path));
    }

    let beside_exe = exe.and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)));
    Ok(beside_exe.filter(|path| path.is_file()))
}

fn parse_setting<T: FromStr>(name: &str, value: &str) -> Result<T, Error> {
    value.trim().parse::<T>().map_err(|_| {
        ConfigError::InvalidSetting {
            name: name.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidSetting {
            name: name.to_string(),
            value: value.to_string(),
        }
        .into()),
    }
}
