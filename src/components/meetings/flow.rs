use super::models::{CreatedMeeting, MeetingDetails, MeetingRequest, Provider};
use super::provider::MeetingProviderAdapter;
use crate::error::{validation_error, CalendarResult, Error};
use crate::utils::time::{meeting_end, meeting_start};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

pub const DEFAULT_DURATION_MINUTES: u32 = 30;
pub const DURATION_STEP_MINUTES: u32 = 15;

/// Receives the meeting once the flow creates it. Closed without a value if the dialog is
/// reset or dropped first.
pub type MeetingReceiver = oneshot::Receiver<CreatedMeeting>;

/// Where the creation dialog currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    NotConfigured(Provider),
    NotSignedIn(Provider),
    Ready(Provider),
    Submitting(Provider),
    Created(MeetingDetails),
}

impl FlowState {
    pub fn provider(&self) -> Option<Provider> {
        match self {
            FlowState::Idle => None,
            FlowState::NotConfigured(p)
            | FlowState::NotSignedIn(p)
            | FlowState::Ready(p)
            | FlowState::Submitting(p) => Some(*p),
            FlowState::Created(details) => Some(details.provider),
        }
    }
}

/// Dialog fields as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingForm {
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub duration_minutes: u32,
    pub description: String,
    /// Comma separated contacts
    pub attendees: String,
}

impl Default for MeetingForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            date: String::new(),
            time: String::new(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            description: String::new(),
            attendees: String::new(),
        }
    }
}

impl MeetingForm {
    /// Validated request; start is read in `tz`
    pub fn to_request(&self, tz: &Tz) -> CalendarResult<MeetingRequest> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.date.trim().is_empty() {
            missing.push("date");
        }
        if self.time.trim().is_empty() {
            missing.push("time");
        }
        if !missing.is_empty() {
            return Err(validation_error(&format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        validate_duration(self.duration_minutes)?;

        let start_time = meeting_start(tz, &self.date, &self.time)?;
        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(MeetingRequest {
            title: self.title.trim().to_string(),
            start_time,
            end_time: meeting_end(start_time, self.duration_minutes),
            description,
            attendees: parse_attendees(&self.attendees),
        })
    }
}

/// Duration must be a positive multiple of 15 minutes
pub fn validate_duration(duration_minutes: u32) -> CalendarResult<()> {
    if duration_minutes == 0 || duration_minutes % DURATION_STEP_MINUTES != 0 {
        return Err(validation_error(&format!(
            "Duration must be a positive multiple of {} minutes, got {}",
            DURATION_STEP_MINUTES, duration_minutes
        )));
    }
    Ok(())
}

/// Split comma separated contacts, trimming and dropping empty entries.
///
/// Order is kept and duplicates stay.
pub fn parse_attendees(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|attendee| !attendee.is_empty())
        .map(str::to_string)
        .collect()
}

/// User-visible text for a flow error
pub fn error_message(error: &Error) -> String {
    match error {
        Error::Validation(message) => t!("meeting_error_validation", error = message).to_string(),
        Error::ProviderNotConfigured(provider) => {
            t!("meeting_error_not_configured", provider = provider.as_str()).to_string()
        }
        Error::ProviderNotSignedIn(provider) => {
            t!("meeting_error_not_signed_in", provider = provider.as_str()).to_string()
        }
        other => t!("meeting_error_request", error = other.to_string()).to_string(),
    }
}

/// Meeting creation dialog
pub struct MeetingFlow {
    adapter: Arc<MeetingProviderAdapter>,
    timezone: Tz,
    state: FlowState,
    form: MeetingForm,
    error: Option<String>,
    result_tx: Option<oneshot::Sender<CreatedMeeting>>,
}

impl MeetingFlow {
    /// Open the dialog. The receiver yields the meeting if one gets created.
    pub fn open(adapter: Arc<MeetingProviderAdapter>, timezone: Tz) -> (Self, MeetingReceiver) {
        let (result_tx, result_rx) = oneshot::channel();
        let flow = Self {
            adapter,
            timezone,
            state: FlowState::Idle,
            form: MeetingForm::default(),
            error: None,
            result_tx: Some(result_tx),
        };
        (flow, result_rx)
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn form(&self) -> &MeetingForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut MeetingForm {
        &mut self.form
    }

    /// Last user-visible error, cleared by the next successful step
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Join link of the created meeting
    pub fn join_url(&self) -> Option<&str> {
        match &self.state {
            FlowState::Created(details) => Some(details.join_url.as_str()),
            _ => None,
        }
    }

    /// Choose a provider and evaluate whether it can be used right away
    pub fn select_provider(&mut self, provider: Provider) -> &FlowState {
        if matches!(self.state, FlowState::Submitting(_) | FlowState::Created(_)) {
            return &self.state;
        }
        self.error = None;
        self.state = self.evaluate(provider);
        &self.state
    }

    fn evaluate(&self, provider: Provider) -> FlowState {
        if !self.adapter.is_configured(provider) {
            FlowState::NotConfigured(provider)
        } else if !self.adapter.is_signed_in(provider) {
            FlowState::NotSignedIn(provider)
        } else {
            FlowState::Ready(provider)
        }
    }

    /// Sign in to the selected provider, then re-evaluate it
    pub async fn sign_in(&mut self) -> CalendarResult<()> {
        let provider = match self.state {
            FlowState::NotSignedIn(p) | FlowState::Ready(p) => p,
            FlowState::NotConfigured(p) => return Err(self.fail(Error::ProviderNotConfigured(p))),
            _ => return Err(validation_error("Select a meeting provider first")),
        };

        let result = self.adapter.sign_in(provider).await;
        self.state = self.evaluate(provider);
        match result {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Sign-in to {} failed: {}", provider, e);
                self.error = Some(error_message(&e));
                Err(e)
            }
        }
    }

    /// Validate the form against the current provider state
    pub fn validate(&self) -> CalendarResult<MeetingRequest> {
        self.form.to_request(&self.timezone)
    }

    /// Create the meeting.
    ///
    /// On success the flow moves to `Created` and the meeting is sent to the receiver.
    /// On failure the flow is back where it was before submitting, with an error message.
    pub async fn submit(&mut self) -> CalendarResult<MeetingDetails> {
        let provider = match self.state {
            FlowState::Ready(p) => p,
            FlowState::NotConfigured(p) => return Err(self.fail(Error::ProviderNotConfigured(p))),
            FlowState::NotSignedIn(p) => return Err(self.fail(Error::ProviderNotSignedIn(p))),
            FlowState::Idle => {
                return Err(self.fail(validation_error("Select a meeting provider first")))
            }
            FlowState::Submitting(_) => {
                return Err(validation_error("Meeting creation already in progress"))
            }
            FlowState::Created(_) => return Err(validation_error("Meeting already created")),
        };

        let request = match self.validate() {
            Ok(request) => request,
            Err(e) => return Err(self.fail(e)),
        };

        self.state = FlowState::Submitting(provider);
        match self.adapter.create_meeting(provider, &request).await {
            Ok(details) => {
                info!("Meeting {} created, join at {}", details.id, details.join_url);
                self.error = None;
                self.state = FlowState::Created(details.clone());

                let created = CreatedMeeting {
                    details: details.clone(),
                    description: request.description,
                    attendees: request.attendees,
                };
                if let Some(tx) = self.result_tx.take() {
                    if tx.send(created).is_err() {
                        warn!("Nobody is waiting for meeting {}", details.id);
                    }
                }
                Ok(details)
            }
            Err(e) => {
                // Lost configuration or sign-in shows up on re-evaluation
                self.state = self.evaluate(provider);
                Err(self.fail(e))
            }
        }
    }

    fn fail(&mut self, error: Error) -> Error {
        self.error = Some(error_message(&error));
        error
    }

    /// Close and reopen the dialog: every field and any created result is discarded.
    ///
    /// Returns the receiver for the next meeting.
    pub fn reset(&mut self) -> MeetingReceiver {
        let (result_tx, result_rx) = oneshot::channel();
        self.state = FlowState::Idle;
        self.form = MeetingForm::default();
        self.error = None;
        self.result_tx = Some(result_tx);
        result_rx
    }
}
