use super::models::{CalendarEvent, EventMetadata};

/// What the detail panel shows for a selected event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetail {
    pub event: CalendarEvent,
    pub color: &'static str,
    pub description: Option<String>,
    /// Present only for meetings that have a join link
    pub join_url: Option<String>,
    pub attendees: Vec<String>,
}

impl EventDetail {
    pub fn for_event(event: &CalendarEvent) -> Self {
        let attendees = match &event.metadata {
            Some(EventMetadata::Meeting(meeting)) => meeting.attendees.clone(),
            _ => Vec::new(),
        };

        Self {
            color: event.color(),
            description: event
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.description())
                .map(str::to_string),
            join_url: event.meeting_url().map(str::to_string),
            attendees,
            event: event.clone(),
        }
    }

    pub fn can_join(&self) -> bool {
        self.join_url.is_some()
    }
}

/// Find and describe an event in the rendered set
pub fn select_event(events: &[CalendarEvent], id: &str) -> Option<EventDetail> {
    events
        .iter()
        .find(|event| event.id == id)
        .map(EventDetail::for_event)
}
