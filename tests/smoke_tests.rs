use estatecal::components::calendar::EventType;
use estatecal::components::event_source::HttpEventSource;
use estatecal::components::meetings::{adapter_from_config, Provider};
use estatecal::config::{Config, ProviderCredentials};
use std::fs;

/// Smoke test to verify the config defaults
#[test]
fn test_config_defaults() {
    let config = Config::new("https://pm.example.com/api");

    assert_eq!(config.api_base_url, "https://pm.example.com/api");
    assert_eq!(config.timezone().unwrap(), chrono_tz::UTC);
    assert_eq!(config.locale, "en");
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.refresh_interval_secs, 0);
    assert!(config.google.is_none());

    let filter = config.initial_filter();
    assert!(!filter.contains(EventType::WorkOrder));
    assert!(filter.contains(EventType::Meeting));
}

/// The calendar file overrides the initial event types
#[test]
fn test_config_file_event_types() {
    let path = std::env::temp_dir().join(format!("estatecal-{}.toml", uuid::Uuid::new_v4()));
    fs::write(&path, "event_types = [\"WORK_ORDER\", \"MEETING\"]\n").unwrap();

    let mut config = Config::new("https://pm.example.com/api");
    config.apply_file(&path);
    fs::remove_file(&path).unwrap();

    let filter = config.initial_filter();
    assert_eq!(filter.to_vec(), vec![EventType::WorkOrder, EventType::Meeting]);
}

/// An invalid API location is a configuration error
#[test]
fn test_event_source_rejects_bad_url() {
    assert!(HttpEventSource::new(&Config::new("not a url")).is_err());
    assert!(HttpEventSource::new(&Config::new("https://pm.example.com/api")).is_ok());
}

/// Providers with credentials are configured but not signed in until they sign in
#[test]
fn test_adapter_from_config() {
    let mut config = Config::new("https://pm.example.com/api");
    config.google = Some(ProviderCredentials {
        client_id: "client".to_string(),
        ..Default::default()
    });

    let adapter = adapter_from_config(&config);
    assert!(adapter.is_configured(Provider::Google));
    assert!(!adapter.is_signed_in(Provider::Google));
    assert!(!adapter.is_configured(Provider::Teams));
}
