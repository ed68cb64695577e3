use crate::week::{WeekConvention, DAYS_IN_WEEK};
use time::OffsetDateTime;

/// A calendar entry as far as aggregation is concerned.  Either bound may be
/// missing, e.g., for all-day events, which carry a date but no time.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) struct CalendarEvent {
    pub(crate) start: Option<OffsetDateTime>,
    pub(crate) end: Option<OffsetDateTime>,
}

impl CalendarEvent {
    pub(crate) fn new(start: Option<OffsetDateTime>, end: Option<OffsetDateTime>) -> Self {
        CalendarEvent { start, end }
    }

    pub(crate) fn bounded(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        CalendarEvent::new(Some(start), Some(end))
    }

    /// Whole minutes between start and end, truncated toward zero.  `None`
    /// if either bound is missing.  Negative if the event ends before it
    /// starts.
    pub(crate) fn minutes(&self) -> Option<i64> {
        Some((self.end? - self.start?).whole_minutes())
    }
}

/// Scheduled versus completed time for one week.  All quantities are in
/// minutes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct WeekAggregate {
    /// Total length of all events having both a start and an end
    pub(crate) planned: i64,

    /// Total length of those events that ended at or before "now"
    pub(crate) done: i64,

    /// `planned`, split by the day (relative to the week convention's first
    /// weekday) on which each event ends
    pub(crate) per_day: [i64; DAYS_IN_WEEK],
}

impl WeekAggregate {
    pub(crate) fn compute(
        events: &[CalendarEvent],
        now: OffsetDateTime,
        convention: &WeekConvention,
    ) -> WeekAggregate {
        let mut agg = WeekAggregate::default();
        for ev in events {
            let (Some(end), Some(minutes)) = (ev.end, ev.minutes()) else {
                continue;
            };
            agg.planned += minutes;
            if end <= now {
                agg.done += minutes;
            }
            let day = convention.day_index(convention.local_date(end).weekday());
            agg.per_day[day] += minutes;
        }
        agg
    }

    /// Share of planned time that is done, as a whole percentage clamped to
    /// 0-100.  Zero when nothing is planned.
    pub(crate) fn progress_percent(&self) -> u16 {
        if self.planned <= 0 {
            return 0;
        }
        let pct = (self.done.saturating_mul(100) / self.planned).clamp(0, 100);
        u16::try_from(pct).unwrap_or(100)
    }
}
