use crate::error::{validation_error, CalendarResult};
use crate::utils::time::start_of_day;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Calendar layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    #[default]
    Month,
    Week,
    Day,
}

/// User navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    Today,
    GoTo(NaiveDate),
    View(CalendarView),
}

/// Half-open instant range `[start, end)` the calendar needs events for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl VisibleWindow {
    /// Window for `view` around `anchor`.
    ///
    /// Month view covers the displayed month and the following one so that
    /// navigating forward does not wait on a fetch.
    pub fn for_view<Tz: TimeZone>(
        view: CalendarView,
        anchor: NaiveDate,
        tz: &Tz,
    ) -> CalendarResult<Self> {
        let (first, last) = date_range(view, anchor)?;
        Ok(Self {
            start: start_of_day(tz, first)?,
            end: start_of_day(tz, last)?,
        })
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

/// First day shown and the day after the last one fetched
pub fn date_range(view: CalendarView, anchor: NaiveDate) -> CalendarResult<(NaiveDate, NaiveDate)> {
    match view {
        CalendarView::Month => {
            let first = first_of_month(anchor);
            Ok((first, out_of_range(first.checked_add_months(Months::new(2)), anchor)?))
        }
        CalendarView::Week => {
            let offset = Duration::days(i64::from(anchor.weekday().num_days_from_monday()));
            let monday = out_of_range(anchor.checked_sub_signed(offset), anchor)?;
            Ok((monday, shift_days(monday, 7)?))
        }
        CalendarView::Day => Ok((anchor, shift_days(anchor, 1)?)),
    }
}

/// Anchor date after applying one navigation step
pub fn navigate(
    view: CalendarView,
    anchor: NaiveDate,
    step: Navigation,
    today: NaiveDate,
) -> CalendarResult<NaiveDate> {
    match step {
        Navigation::Next => match view {
            CalendarView::Month => {
                out_of_range(first_of_month(anchor).checked_add_months(Months::new(1)), anchor)
            }
            CalendarView::Week => shift_days(anchor, 7),
            CalendarView::Day => shift_days(anchor, 1),
        },
        Navigation::Previous => match view {
            CalendarView::Month => {
                out_of_range(first_of_month(anchor).checked_sub_months(Months::new(1)), anchor)
            }
            CalendarView::Week => shift_days(anchor, -7),
            CalendarView::Day => shift_days(anchor, -1),
        },
        Navigation::Today => Ok(today),
        Navigation::GoTo(date) => Ok(date),
        Navigation::View(_) => Ok(anchor),
    }
}

fn shift_days(date: NaiveDate, days: i64) -> CalendarResult<NaiveDate> {
    out_of_range(date.checked_add_signed(Duration::days(days)), date)
}

fn out_of_range(date: Option<NaiveDate>, anchor: NaiveDate) -> CalendarResult<NaiveDate> {
    date.ok_or_else(|| validation_error(&format!("Date {} is outside the supported calendar range", anchor)))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Helsinki;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_window_prefetches_next_month() {
        let window = VisibleWindow::for_view(CalendarView::Month, date(2025, 1, 17), &Utc).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());

        // Year boundary
        let (first, last) = date_range(CalendarView::Month, date(2024, 12, 31)).unwrap();
        assert_eq!(first, date(2024, 12, 1));
        assert_eq!(last, date(2025, 2, 1));
    }

    #[test]
    fn test_week_and_day_windows() {
        // 2025-01-10 is a Friday
        assert_eq!(
            date_range(CalendarView::Week, date(2025, 1, 10)).unwrap(),
            (date(2025, 1, 6), date(2025, 1, 13))
        );
        assert_eq!(
            date_range(CalendarView::Day, date(2025, 1, 10)).unwrap(),
            (date(2025, 1, 10), date(2025, 1, 11))
        );
    }

    #[test]
    fn test_window_uses_local_midnight() {
        let window = VisibleWindow::for_view(CalendarView::Day, date(2025, 1, 10), &Helsinki).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 1, 9, 22, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 1, 10, 22, 0, 0).unwrap());
        assert!(window.contains(&Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()));
        assert!(!window.contains(&window.end));
    }

    #[test]
    fn test_navigation_round_trip() {
        let today = date(2025, 1, 10);
        let anchor = date(2025, 1, 31);

        let next = navigate(CalendarView::Month, anchor, Navigation::Next, today).unwrap();
        assert_eq!(next, date(2025, 2, 1));
        let back = navigate(CalendarView::Month, next, Navigation::Previous, today).unwrap();
        assert_eq!(
            date_range(CalendarView::Month, back).unwrap(),
            date_range(CalendarView::Month, anchor).unwrap()
        );

        assert_eq!(navigate(CalendarView::Week, anchor, Navigation::Next, today).unwrap(), date(2025, 2, 7));
        assert_eq!(navigate(CalendarView::Day, anchor, Navigation::Previous, today).unwrap(), date(2025, 1, 30));
        assert_eq!(navigate(CalendarView::Day, anchor, Navigation::Today, today).unwrap(), today);
        assert_eq!(
            navigate(CalendarView::Day, anchor, Navigation::GoTo(date(2025, 6, 1)), today).unwrap(),
            date(2025, 6, 1)
        );
    }

    #[test]
    fn test_dates_at_the_calendar_limits_are_rejected() {
        let today = date(2025, 1, 10);

        assert!(date_range(CalendarView::Month, NaiveDate::MAX).is_err());
        assert!(date_range(CalendarView::Week, NaiveDate::MAX).is_err());
        assert!(date_range(CalendarView::Day, NaiveDate::MAX).is_err());
        assert!(VisibleWindow::for_view(CalendarView::Month, NaiveDate::MAX, &Utc).is_err());

        assert!(navigate(CalendarView::Day, NaiveDate::MAX, Navigation::Next, today).is_err());
        assert!(navigate(CalendarView::Week, NaiveDate::MIN, Navigation::Previous, today).is_err());
        assert!(navigate(CalendarView::Month, NaiveDate::MIN, Navigation::Previous, today).is_err());
        assert_eq!(
            navigate(CalendarView::Month, NaiveDate::MAX, Navigation::GoTo(today), today).unwrap(),
            today
        );
    }
}
