pub mod calendar;
pub mod event_source;
pub mod meetings;

pub use calendar::CalendarHandle;
pub use event_source::{EventSource, HttpEventSource};
pub use meetings::MeetingProviderAdapter;
