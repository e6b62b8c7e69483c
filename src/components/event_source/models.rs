use crate::components::calendar::models::{
    CalendarEvent, EventMetadata, EventType, MeetingMetadata, RecordMetadata,
};
use crate::components::meetings::models::Provider;
use crate::utils::time::parse_instant;
use serde::Deserialize;
use tracing::warn;

/// Body of `GET /calendar/events`
#[derive(Debug, Clone, Deserialize)]
pub struct EventsResponse {
    pub items: Vec<RawCalendarEvent>,
}

/// Event as the backend sends it, dates still strings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCalendarEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub all_day: bool,
    pub metadata: Option<RawMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    pub meeting_url: Option<String>,
    pub provider: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    pub organizer: Option<String>,
}

impl RawMetadata {
    fn into_metadata(self, event_type: EventType) -> EventMetadata {
        match event_type {
            EventType::Meeting => EventMetadata::Meeting(MeetingMetadata {
                meeting_url: self.meeting_url.filter(|url| !url.trim().is_empty()),
                provider: self.provider.and_then(|p| p.parse::<Provider>().ok()),
                description: self.description,
                attendees: self.attendees,
                organizer: self.organizer,
            }),
            _ => EventMetadata::Record(RecordMetadata {
                description: self.description,
            }),
        }
    }
}

impl RawCalendarEvent {
    /// Typed event, or the reason this item cannot be shown
    pub fn into_event(self) -> Result<CalendarEvent, String> {
        let event_type = self.event_type.parse::<EventType>()?;
        let start = parse_instant(&self.start)
            .ok_or_else(|| format!("unparseable start {:?}", self.start))?;
        let end = parse_instant(&self.end)
            .ok_or_else(|| format!("unparseable end {:?}", self.end))?;

        let event = CalendarEvent::new(self.id, event_type, self.title, start, end)
            .map_err(|e| e.to_string())?
            .with_all_day(self.all_day);

        Ok(match self.metadata {
            Some(metadata) => event.with_metadata(metadata.into_metadata(event_type)),
            None => event,
        })
    }
}

/// Convert a response, skipping items that would break the calendar's invariants
pub fn into_events(response: EventsResponse) -> Vec<CalendarEvent> {
    response
        .items
        .into_iter()
        .filter_map(|raw| {
            let id = raw.id.clone();
            match raw.into_event() {
                Ok(event) => Some(event),
                Err(reason) => {
                    warn!("Skipping calendar event {}: {}", id, reason);
                    None
                }
            }
        })
        .collect()
}
