use super::models::{into_events, EventsResponse};
use super::EventSource;
use crate::components::calendar::models::{CalendarEvent, EventType};
use crate::config::Config;
use crate::error::{config_error, fetch_error, validation_error, CalendarResult};
use crate::utils::time::to_iso;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Event source backed by the property management REST API
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: Client,
    endpoint: Url,
    api_token: Option<String>,
}

impl HttpEventSource {
    /// Create a client for `{api_base_url}/calendar/events`
    pub fn new(config: &Config) -> CalendarResult<Self> {
        let endpoint_str = format!(
            "{}/calendar/events",
            config.api_base_url.trim_end_matches('/')
        );
        let endpoint = Url::parse(&endpoint_str)
            .map_err(|e| config_error(&format!("Invalid API_BASE_URL: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| config_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_token: config.api_token.clone(),
        })
    }

    /// Request URL for a window and type set
    pub fn events_url(
        &self,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
        types: &[EventType],
    ) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("startDate", &to_iso(start));
            query.append_pair("endDate", &to_iso(end));
            for event_type in types {
                query.append_pair("types", event_type.as_str());
            }
        }
        url
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn get_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        types: &[EventType],
    ) -> CalendarResult<Vec<CalendarEvent>> {
        if start > end {
            return Err(validation_error("startDate must not be after endDate"));
        }

        let url = self.events_url(&start, &end, types);
        debug!("Fetching calendar events: {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| fetch_error(&format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(fetch_error(&format!("HTTP {} - {}", status, error_body)));
        }

        let body: EventsResponse = response
            .json()
            .await
            .map_err(|e| fetch_error(&format!("Failed to parse events response: {}", e)))?;

        Ok(into_events(body))
    }
}
