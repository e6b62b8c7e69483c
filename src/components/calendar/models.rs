use crate::components::meetings::models::{CreatedMeeting, Provider};
use crate::error::{validation_error, CalendarResult, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Color used for anything without a known event type
pub const NEUTRAL_COLOR: &str = "#9e9e9e";

/// Category of a calendar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    LeaseStart,
    LeaseEnd,
    PaymentDue,
    WorkOrder,
    FollowUp,
    Meeting,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::LeaseStart,
        EventType::LeaseEnd,
        EventType::PaymentDue,
        EventType::WorkOrder,
        EventType::FollowUp,
        EventType::Meeting,
    ];

    /// Wire tag used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::LeaseStart => "LEASE_START",
            EventType::LeaseEnd => "LEASE_END",
            EventType::PaymentDue => "PAYMENT_DUE",
            EventType::WorkOrder => "WORK_ORDER",
            EventType::FollowUp => "FOLLOW_UP",
            EventType::Meeting => "MEETING",
        }
    }

    /// Display color for this event type
    pub fn color(&self) -> &'static str {
        match self {
            EventType::LeaseStart => "#4caf50",
            EventType::LeaseEnd => "#f44336",
            EventType::PaymentDue => "#ff9800",
            EventType::WorkOrder => "#2196f3",
            EventType::FollowUp => "#9c27b0",
            EventType::Meeting => "#00bcd4",
        }
    }
}

/// Color for a raw type tag. Unknown tags get the neutral color.
pub fn color_for_tag(tag: &str) -> &'static str {
    tag.parse::<EventType>()
        .map(|event_type| event_type.color())
        .unwrap_or(NEUTRAL_COLOR)
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .find(|event_type| event_type.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown event type: {}", s))
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// Details only meetings carry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingMetadata {
    pub meeting_url: Option<String>,
    pub provider: Option<Provider>,
    pub description: Option<String>,
    pub attendees: Vec<String>,
    pub organizer: Option<String>,
}

/// Details carried by lease, payment, work order and follow-up entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub description: Option<String>,
}

/// Type-specific event metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventMetadata {
    Meeting(MeetingMetadata),
    Record(RecordMetadata),
}

impl EventMetadata {
    pub fn description(&self) -> Option<&str> {
        match self {
            EventMetadata::Meeting(meeting) => meeting.description.as_deref(),
            EventMetadata::Record(record) => record.description.as_deref(),
        }
    }
}

/// A single calendar entry. `start <= end` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub event_type: EventType,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub metadata: Option<EventMetadata>,
}

impl CalendarEvent {
    /// Create an event, rejecting an end before the start
    pub fn new(
        id: impl Into<String>,
        event_type: EventType,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CalendarResult<Self> {
        let id = id.into();
        if end < start {
            return Err(validation_error(&format!(
                "Event {} ends ({}) before it starts ({})",
                id, end, start
            )));
        }

        Ok(Self {
            id,
            event_type,
            title: title.into(),
            start,
            end,
            all_day: false,
            metadata: None,
        })
    }

    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Attach metadata. Meeting metadata on a non-meeting event is reduced to its description.
    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = Some(match (self.event_type, metadata) {
            (EventType::Meeting, metadata) => metadata,
            (_, EventMetadata::Meeting(meeting)) => EventMetadata::Record(RecordMetadata {
                description: meeting.description,
            }),
            (_, record) => record,
        });
        self
    }

    pub fn color(&self) -> &'static str {
        self.event_type.color()
    }

    /// Join link, present only for meetings that carry one
    pub fn meeting_url(&self) -> Option<&str> {
        match (&self.event_type, &self.metadata) {
            (EventType::Meeting, Some(EventMetadata::Meeting(meeting))) => {
                meeting.meeting_url.as_deref()
            }
            _ => None,
        }
    }
}

impl TryFrom<CreatedMeeting> for CalendarEvent {
    type Error = Error;

    fn try_from(created: CreatedMeeting) -> Result<Self, Self::Error> {
        let CreatedMeeting {
            details,
            description,
            attendees,
        } = created;

        let event = Self::new(
            details.id,
            EventType::Meeting,
            details.title,
            details.start_time,
            details.end_time,
        )?;
        Ok(event.with_metadata(EventMetadata::Meeting(MeetingMetadata {
            meeting_url: Some(details.join_url),
            provider: Some(details.provider),
            description,
            attendees,
            organizer: Some(details.organizer),
        })))
    }
}

/// Set of event types that are fetched and rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFilter(BTreeSet<EventType>);

impl Default for TypeFilter {
    fn default() -> Self {
        EventType::ALL
            .iter()
            .copied()
            .filter(|event_type| *event_type != EventType::WorkOrder)
            .collect()
    }
}

impl FromIterator<EventType> for TypeFilter {
    fn from_iter<I: IntoIterator<Item = EventType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl TypeFilter {
    pub fn all() -> Self {
        EventType::ALL.iter().copied().collect()
    }

    pub fn contains(&self, event_type: EventType) -> bool {
        self.0.contains(&event_type)
    }

    /// Flip one type on or off. Returns whether it is active afterwards.
    pub fn toggle(&mut self, event_type: EventType) -> bool {
        if !self.0.remove(&event_type) {
            self.0.insert(event_type);
            true
        } else {
            false
        }
    }

    pub fn set(&mut self, event_type: EventType, active: bool) {
        if active {
            self.0.insert(event_type);
        } else {
            self.0.remove(&event_type);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EventType> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<EventType> {
        self.iter().collect()
    }
}
