mod actor;
pub mod agenda;
pub mod engine;
mod handle;
pub mod models;
pub mod selection;
pub mod window;

pub use actor::{
    CalendarActor, CalendarActorHandle, CalendarCommand, CalendarSettings, CalendarSnapshot,
    FetchOutcome, Notification, NotificationLevel,
};
pub use handle::CalendarHandle;
pub use models::{CalendarEvent, EventMetadata, EventType, MeetingMetadata, RecordMetadata, TypeFilter};
pub use selection::EventDetail;
pub use window::{CalendarView, Navigation, VisibleWindow};
