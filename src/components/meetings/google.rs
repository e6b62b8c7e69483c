use super::models::{MeetingDetails, MeetingRequest, Provider};
use super::provider::MeetingProvider;
use super::token::{OAuthSettings, TokenManager};
use crate::config::ProviderCredentials;
use crate::error::{provider_request_error, CalendarResult, Error};
use crate::utils::time::{parse_instant, to_iso};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Google Meet meetings, created as Calendar events with conference data
#[derive(Clone)]
pub struct GoogleMeetProvider {
    tokens: Option<TokenManager>,
    client: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    summary: Option<String>,
    start: Option<GoogleTime>,
    end: Option<GoogleTime>,
    hangout_link: Option<String>,
    organizer: Option<GoogleOrganizer>,
    conference_data: Option<ConferenceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTime {
    date_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleOrganizer {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConferenceData {
    #[serde(default)]
    entry_points: Vec<EntryPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryPoint {
    entry_point_type: Option<String>,
    uri: Option<String>,
}

impl GoogleEvent {
    fn join_url(&self) -> Option<String> {
        self.hangout_link.clone().or_else(|| {
            self.conference_data.as_ref().and_then(|data| {
                data.entry_points
                    .iter()
                    .find(|entry| entry.entry_point_type.as_deref() == Some("video"))
                    .and_then(|entry| entry.uri.clone())
            })
        })
    }
}

impl GoogleMeetProvider {
    /// Provider from configured credentials; without credentials it reports not configured
    pub fn new(credentials: Option<&ProviderCredentials>, redirect_port: u16) -> Self {
        let tokens = credentials.map(|credentials| {
            TokenManager::new(
                OAuthSettings::google(credentials, redirect_port),
                credentials.refresh_token.clone(),
            )
        });

        Self {
            tokens,
            client: Client::new(),
            api_base: GOOGLE_CALENDAR_API.to_string(),
        }
    }

    pub fn with_token_manager(tokens: TokenManager) -> Self {
        Self {
            tokens: Some(tokens),
            client: Client::new(),
            api_base: GOOGLE_CALENDAR_API.to_string(),
        }
    }

    /// Point at a different Calendar API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn token_manager(&self) -> Option<&TokenManager> {
        self.tokens.as_ref()
    }
}

#[async_trait]
impl MeetingProvider for GoogleMeetProvider {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn is_configured(&self) -> bool {
        self.tokens.is_some()
    }

    fn is_signed_in(&self) -> bool {
        self.tokens.as_ref().is_some_and(|tokens| tokens.is_signed_in())
    }

    async fn sign_in(&self) -> CalendarResult<()> {
        match &self.tokens {
            Some(tokens) => tokens.sign_in().await,
            None => Err(Error::ProviderNotConfigured(Provider::Google)),
        }
    }

    async fn create_meeting(&self, request: &MeetingRequest) -> CalendarResult<MeetingDetails> {
        let tokens = self
            .tokens
            .as_ref()
            .ok_or(Error::ProviderNotConfigured(Provider::Google))?;
        let access_token = tokens.access_token()?;

        let url = format!(
            "{}/calendars/primary/events?conferenceDataVersion=1",
            self.api_base.trim_end_matches('/')
        );

        let attendees: Vec<_> = request
            .attendees
            .iter()
            .map(|email| json!({ "email": email }))
            .collect();

        let body = json!({
            "summary": request.title,
            "description": request.description,
            "start": { "dateTime": to_iso(&request.start_time) },
            "end": { "dateTime": to_iso(&request.end_time) },
            "attendees": attendees,
            "conferenceData": {
                "createRequest": {
                    "requestId": uuid::Uuid::new_v4().to_string(),
                    "conferenceSolutionKey": { "type": "hangoutsMeet" }
                }
            }
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                provider_request_error(Provider::Google, &format!("Failed to create meeting: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(provider_request_error(
                Provider::Google,
                &format!("Failed to create meeting: HTTP {} - {}", status, error_body),
            ));
        }

        let event: GoogleEvent = response.json().await.map_err(|e| {
            provider_request_error(Provider::Google, &format!("Failed to parse meeting response: {}", e))
        })?;

        let join_url = event
            .join_url()
            .ok_or_else(|| provider_request_error(Provider::Google, "No Meet link in response"))?;

        let instant = |time: &Option<GoogleTime>| {
            time.as_ref()
                .and_then(|t| t.date_time.as_deref())
                .and_then(parse_instant)
        };

        let start_time = instant(&event.start).unwrap_or(request.start_time);
        let end_time = instant(&event.end).unwrap_or(request.end_time);
        if end_time < start_time {
            return Err(provider_request_error(
                Provider::Google,
                &format!("Meeting {} ends ({}) before it starts ({})", event.id, end_time, start_time),
            ));
        }

        Ok(MeetingDetails {
            start_time,
            end_time,
            title: event.summary.clone().unwrap_or_else(|| request.title.clone()),
            organizer: event
                .organizer
                .as_ref()
                .and_then(|o| o.email.clone())
                .unwrap_or_default(),
            provider: Provider::Google,
            join_url,
            id: event.id,
        })
    }
}
