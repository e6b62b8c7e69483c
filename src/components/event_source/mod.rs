mod client;
pub mod models;

pub use client::HttpEventSource;

use crate::components::calendar::models::{CalendarEvent, EventType};
use crate::error::CalendarResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of server-persisted calendar events
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events in `[start, end]` restricted to `types`; an empty slice means every type.
    ///
    /// Order is whatever the source returns. Failures are returned, never replaced by empty data.
    async fn get_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        types: &[EventType],
    ) -> CalendarResult<Vec<CalendarEvent>>;
}
