use crate::components::calendar::models::{EventType, TypeFilter};
use crate::error::{config_error, env_error, CalendarResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Default location of the optional calendar settings file
pub const CALENDAR_CONFIG_PATH: &str = "config/calendar.toml";

/// OAuth client credentials for one meeting provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    /// Long-lived refresh token from a previous interactive sign-in
    pub refresh_token: Option<String>,
    /// Azure AD tenant, Teams only
    pub tenant: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the property management REST API
    pub api_base_url: String,
    /// Bearer token for the REST API
    pub api_token: Option<String>,
    /// Time zone used to interpret meeting times and month boundaries
    pub timezone: String,
    /// Locale for user-visible messages
    pub locale: String,
    pub request_timeout_secs: u64,
    /// Agenda refresh interval for the binary, 0 disables watching
    pub refresh_interval_secs: u64,
    pub oauth_redirect_port: u16,
    pub google: Option<ProviderCredentials>,
    pub teams: Option<ProviderCredentials>,
    /// Event types active when the calendar opens
    pub event_types: Vec<EventType>,
}

/// Settings that may come from `config/calendar.toml`
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    event_types: Option<Vec<EventType>>,
}

impl Config {
    /// Configuration with defaults for everything but the API location
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_token: None,
            timezone: String::from("UTC"),
            locale: String::from("en"),
            request_timeout_secs: 30,
            refresh_interval_secs: 0,
            oauth_redirect_port: 8080,
            google: None,
            teams: None,
            event_types: TypeFilter::default().to_vec(),
        }
    }

    /// Load configuration from environment and config file
    pub fn load() -> CalendarResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let api_base_url = env::var("API_BASE_URL").map_err(|_| env_error("API_BASE_URL"))?;
        let mut config = Self::new(api_base_url);

        config.api_token = optional_var("API_TOKEN");
        if let Some(timezone) = optional_var("TIMEZONE") {
            config.timezone = timezone;
        }
        if let Some(locale) = optional_var("LOCALE") {
            config.locale = locale;
        }
        config.request_timeout_secs = numeric_var("REQUEST_TIMEOUT_SECS", 30)?;
        config.refresh_interval_secs = numeric_var("REFRESH_INTERVAL_SECS", 0)?;
        config.oauth_redirect_port = numeric_var("OAUTH_REDIRECT_PORT", 8080)?;

        config.google = optional_var("GOOGLE_CLIENT_ID").map(|client_id| ProviderCredentials {
            client_id,
            client_secret: optional_var("GOOGLE_CLIENT_SECRET"),
            refresh_token: optional_var("GOOGLE_REFRESH_TOKEN"),
            tenant: None,
        });

        config.teams = optional_var("TEAMS_CLIENT_ID").map(|client_id| ProviderCredentials {
            client_id,
            client_secret: optional_var("TEAMS_CLIENT_SECRET"),
            refresh_token: optional_var("TEAMS_REFRESH_TOKEN"),
            tenant: Some(optional_var("TEAMS_TENANT").unwrap_or_else(|| String::from("common"))),
        });

        config.apply_file(Path::new(CALENDAR_CONFIG_PATH));
        config.timezone()?;

        Ok(config)
    }

    /// Merge settings from a TOML file over the current values, if the file exists
    pub fn apply_file(&mut self, path: &Path) {
        let Ok(content) = fs::read_to_string(path) else {
            return;
        };

        match toml::from_str::<FileSettings>(&content) {
            Ok(settings) => {
                if let Some(event_types) = settings.event_types {
                    self.event_types = event_types;
                }
            }
            Err(e) => warn!("Ignoring invalid {}: {}", path.display(), e),
        }
    }

    /// Parsed time zone
    pub fn timezone(&self) -> CalendarResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Invalid timezone: {}", self.timezone)))
    }

    /// Filter the calendar opens with
    pub fn initial_filter(&self) -> TypeFilter {
        self.event_types.iter().copied().collect()
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn numeric_var<T: std::str::FromStr>(name: &str, default: T) -> CalendarResult<T> {
    match optional_var(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| config_error(&format!("Invalid {} format", name))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("http://localhost:3000/api");
        assert_eq!(config.timezone().unwrap(), chrono_tz::UTC);
        assert_eq!(config.initial_filter(), TypeFilter::default());
        assert!(config.google.is_none());
    }

    #[test]
    fn test_invalid_timezone() {
        let mut config = Config::new("http://localhost:3000/api");
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.timezone().is_err());
    }

    #[test]
    fn test_apply_file_overrides_event_types() {
        let dir = std::env::temp_dir().join(format!("estatecal-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("calendar.toml");

        fs::write(&path, "event_types = [\"MEETING\", \"WORK_ORDER\"]\n").unwrap();
        let mut config = Config::new("http://localhost:3000/api");
        config.apply_file(&path);
        assert_eq!(config.event_types, vec![EventType::Meeting, EventType::WorkOrder]);

        // Invalid files are ignored
        fs::write(&path, "event_types = [\"PARTY\"]\n").unwrap();
        config.apply_file(&path);
        assert_eq!(config.event_types, vec![EventType::Meeting, EventType::WorkOrder]);

        // Missing files are ignored
        config.apply_file(&dir.join("missing.toml"));
        assert_eq!(config.event_types.len(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}
