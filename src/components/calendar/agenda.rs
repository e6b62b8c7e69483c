use super::actor::CalendarSnapshot;
use super::models::CalendarEvent;
use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use std::collections::HashSet;

/// Agenda text for a snapshot, grouped by local day
pub fn format_agenda(snapshot: &CalendarSnapshot, tz: &Tz) -> String {
    let first = snapshot.window.start.with_timezone(tz).date_naive();
    let last = (snapshot.window.end - Duration::seconds(1))
        .with_timezone(tz)
        .date_naive();

    let mut message = format!(
        "{}\n",
        t!(
            "agenda_title",
            start = first.format("%d.%m.%Y").to_string(),
            end = last.format("%d.%m.%Y").to_string(),
            timezone = tz.name()
        )
    );

    if snapshot.events.is_empty() {
        message.push_str(&format!("{}\n", t!("agenda_no_events")));
        return message;
    }

    let mut events: Vec<&CalendarEvent> = snapshot.events.iter().collect();
    events.sort_by_key(|event| event.start);

    let mut current_date: Option<NaiveDate> = None;
    for event in events {
        let date = event.start.with_timezone(tz).date_naive();
        if current_date != Some(date) {
            message.push_str(&format!("\n{}:\n", date.format("%A %d.%m.")));
            current_date = Some(date);
        }
        message.push_str(&format_event_line(event, tz));
        message.push('\n');
    }

    message
}

/// One agenda line: time, title, type tag and join link if any
pub fn format_event_line(event: &CalendarEvent, tz: &Tz) -> String {
    let time = if event.all_day {
        t!("agenda_all_day").to_string()
    } else {
        format!(
            "{}-{}",
            event.start.with_timezone(tz).format("%H:%M"),
            event.end.with_timezone(tz).format("%H:%M")
        )
    };

    let mut line = format!("• {} {} [{}]", time, event.title, event.event_type);
    if let Some(url) = event.meeting_url() {
        line.push_str(&format!(" {}: {}", t!("agenda_join"), url));
    }
    line
}

/// Events whose id is not in `seen`, in their rendered order
pub fn new_events<'a>(seen: &HashSet<String>, events: &'a [CalendarEvent]) -> Vec<&'a CalendarEvent> {
    events
        .iter()
        .filter(|event| !seen.contains(&event.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::calendar::models::{EventMetadata, EventType, MeetingMetadata, TypeFilter};
    use crate::components::calendar::window::{CalendarView, VisibleWindow};
    use chrono::{TimeZone, Utc};

    fn snapshot(events: Vec<CalendarEvent>) -> CalendarSnapshot {
        let anchor = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        CalendarSnapshot {
            view: CalendarView::Week,
            anchor,
            window: VisibleWindow::for_view(CalendarView::Week, anchor, &chrono_tz::UTC).unwrap(),
            filter: TypeFilter::all(),
            events,
            loading: false,
            fetching: false,
            last_error: None,
            selected: None,
            revision: 1,
        }
    }

    fn event(id: &str, event_type: EventType, day: u32, hour: u32) -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap();
        CalendarEvent::new(id, event_type, id, start, start + Duration::minutes(30)).unwrap()
    }

    #[test]
    fn test_agenda_groups_by_day_in_time_order() {
        let agenda = format_agenda(
            &snapshot(vec![
                event("late", EventType::FollowUp, 10, 15),
                event("other-day", EventType::LeaseEnd, 8, 9),
                event("early", EventType::PaymentDue, 10, 8),
            ]),
            &chrono_tz::UTC,
        );

        assert!(agenda.contains("06.01.2025"));
        assert!(agenda.contains("12.01.2025"));
        assert!(agenda.contains("Wednesday 08.01."));
        assert!(agenda.contains("Friday 10.01."));

        let other_day = agenda.find("other-day").unwrap();
        let early = agenda.find("early").unwrap();
        let late = agenda.find("late").unwrap();
        assert!(other_day < early && early < late);
        assert!(agenda.contains("• 08:00-08:30 early [PAYMENT_DUE]"));
    }

    #[test]
    fn test_meeting_line_has_join_link() {
        let meeting = event("m1", EventType::Meeting, 10, 10).with_metadata(EventMetadata::Meeting(
            MeetingMetadata {
                meeting_url: Some("https://meet.example/abc".to_string()),
                ..Default::default()
            },
        ));
        let line = format_event_line(&meeting, &chrono_tz::Europe::Helsinki);
        assert!(line.starts_with("• 12:00-12:30 m1 [MEETING]"));
        assert!(line.ends_with("https://meet.example/abc"));
    }

    #[test]
    fn test_new_events_skips_seen() {
        let events = vec![
            event("a", EventType::FollowUp, 10, 9),
            event("b", EventType::FollowUp, 10, 10),
        ];
        let seen: HashSet<String> = ["a".to_string()].into_iter().collect();
        let fresh = new_events(&seen, &events);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, "b");
    }
}
