use super::models::{CalendarEvent, EventType, TypeFilter};
use std::collections::HashSet;

/// Events actually rendered for a view.
///
/// Server events come first in server order, followed by the session-local meetings.
/// Both are restricted to the active types. Nothing is de-duplicated or sorted here.
pub fn merge_events(
    server: &[CalendarEvent],
    local: &[CalendarEvent],
    filter: &TypeFilter,
) -> Vec<CalendarEvent> {
    server
        .iter()
        .chain(local.iter())
        .filter(|event| filter.contains(event.event_type))
        .cloned()
        .collect()
}

/// Drop local meetings the server already returns, matched by id or join link.
///
/// Returns how many local meetings were dropped.
pub fn reconcile_local_meetings(local: &mut Vec<CalendarEvent>, server: &[CalendarEvent]) -> usize {
    let server_meetings: Vec<&CalendarEvent> = server
        .iter()
        .filter(|event| event.event_type == EventType::Meeting)
        .collect();
    if server_meetings.is_empty() {
        return 0;
    }

    let ids: HashSet<&str> = server_meetings.iter().map(|event| event.id.as_str()).collect();
    let urls: HashSet<&str> = server_meetings
        .iter()
        .filter_map(|event| event.meeting_url())
        .collect();

    let before = local.len();
    local.retain(|meeting| {
        let same_id = ids.contains(meeting.id.as_str());
        let same_url = meeting.meeting_url().is_some_and(|url| urls.contains(url));
        !(same_id || same_url)
    });
    before - local.len()
}
