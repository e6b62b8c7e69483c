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

pub const GRAPH_API: &str = "https://graph.microsoft.com/v1.0";

/// Microsoft Teams online meetings through Microsoft Graph
#[derive(Clone)]
pub struct TeamsMeetingProvider {
    tokens: Option<TokenManager>,
    client: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OnlineMeeting {
    id: String,
    subject: Option<String>,
    start_date_time: Option<String>,
    end_date_time: Option<String>,
    join_web_url: Option<String>,
    participants: Option<Participants>,
}

#[derive(Debug, Deserialize)]
struct Participants {
    organizer: Option<Participant>,
}

#[derive(Debug, Deserialize)]
struct Participant {
    upn: Option<String>,
}

impl TeamsMeetingProvider {
    /// Provider from configured credentials; without credentials it reports not configured
    pub fn new(credentials: Option<&ProviderCredentials>, redirect_port: u16) -> Self {
        let tokens = credentials.map(|credentials| {
            TokenManager::new(
                OAuthSettings::teams(credentials, redirect_port),
                credentials.refresh_token.clone(),
            )
        });

        Self {
            tokens,
            client: Client::new(),
            api_base: GRAPH_API.to_string(),
        }
    }

    pub fn with_token_manager(tokens: TokenManager) -> Self {
        Self {
            tokens: Some(tokens),
            client: Client::new(),
            api_base: GRAPH_API.to_string(),
        }
    }

    /// Point at a different Graph API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn token_manager(&self) -> Option<&TokenManager> {
        self.tokens.as_ref()
    }
}

#[async_trait]
impl MeetingProvider for TeamsMeetingProvider {
    fn provider(&self) -> Provider {
        Provider::Teams
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
            None => Err(Error::ProviderNotConfigured(Provider::Teams)),
        }
    }

    async fn create_meeting(&self, request: &MeetingRequest) -> CalendarResult<MeetingDetails> {
        let tokens = self
            .tokens
            .as_ref()
            .ok_or(Error::ProviderNotConfigured(Provider::Teams))?;
        let access_token = tokens.access_token()?;

        let url = format!("{}/me/onlineMeetings", self.api_base.trim_end_matches('/'));

        // Graph has no description field for online meetings
        let attendees: Vec<_> = request
            .attendees
            .iter()
            .map(|upn| json!({ "upn": upn, "role": "attendee" }))
            .collect();

        let body = json!({
            "subject": request.title,
            "startDateTime": to_iso(&request.start_time),
            "endDateTime": to_iso(&request.end_time),
            "participants": { "attendees": attendees }
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                provider_request_error(Provider::Teams, &format!("Failed to create meeting: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(provider_request_error(
                Provider::Teams,
                &format!("Failed to create meeting: HTTP {} - {}", status, error_body),
            ));
        }

        let meeting: OnlineMeeting = response.json().await.map_err(|e| {
            provider_request_error(Provider::Teams, &format!("Failed to parse meeting response: {}", e))
        })?;

        let join_url = meeting
            .join_web_url
            .clone()
            .ok_or_else(|| provider_request_error(Provider::Teams, "No join URL in response"))?;

        let start_time = meeting
            .start_date_time
            .as_deref()
            .and_then(parse_instant)
            .unwrap_or(request.start_time);
        let end_time = meeting
            .end_date_time
            .as_deref()
            .and_then(parse_instant)
            .unwrap_or(request.end_time);
        if end_time < start_time {
            return Err(provider_request_error(
                Provider::Teams,
                &format!("Meeting {} ends ({}) before it starts ({})", meeting.id, end_time, start_time),
            ));
        }

        Ok(MeetingDetails {
            start_time,
            end_time,
            title: meeting.subject.clone().unwrap_or_else(|| request.title.clone()),
            organizer: meeting
                .participants
                .as_ref()
                .and_then(|p| p.organizer.as_ref())
                .and_then(|o| o.upn.clone())
                .unwrap_or_default(),
            provider: Provider::Teams,
            join_url,
            id: meeting.id,
        })
    }
}
