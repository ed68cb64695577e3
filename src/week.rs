use std::iter::successors;
use thiserror::Error;
use time::{macros::time, Date, Duration, OffsetDateTime, Time, UtcOffset, Weekday};

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// Last representable instant of a day, used as the inclusive upper bound of
/// a week window
const END_OF_DAY: Time = time!(23:59:59.999999999);

/// How weeks are laid out: the weekday a week starts on, and the UTC offset
/// in which instants are assigned to calendar dates
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct WeekConvention {
    first_day: Weekday,
    offset: UtcOffset,
}

impl WeekConvention {
    pub(crate) fn new(first_day: Weekday, offset: UtcOffset) -> Self {
        WeekConvention { first_day, offset }
    }

    pub(crate) fn offset(&self) -> UtcOffset {
        self.offset
    }

    /// Position (0-6) of `wd` in a week starting on `first_day`
    pub(crate) fn day_index(&self, wd: Weekday) -> usize {
        usize::from(self.days_since_first(wd))
    }

    fn days_since_first(&self, wd: Weekday) -> u8 {
        (7 + wd.number_days_from_sunday() - self.first_day.number_days_from_sunday()) % 7
    }

    /// The calendar date on which `instant` falls in this convention's offset
    pub(crate) fn local_date(&self, instant: OffsetDateTime) -> Date {
        instant.to_offset(self.offset).date()
    }

    /// Returns the week containing `base`.  Fails if the week would begin or
    /// end outside the range of representable dates.
    pub(crate) fn window_for(&self, base: Date) -> Result<WeekWindow, OutOfTimeError> {
        let back = Duration::days(i64::from(self.days_since_first(base.weekday())));
        let start = base.checked_sub(back).ok_or(OutOfTimeError)?;
        let end = start.checked_add(Duration::days(6)).ok_or(OutOfTimeError)?;
        Ok(WeekWindow {
            start,
            end,
            offset: self.offset,
        })
    }
}

/// Seven consecutive dates, `start` through `end` inclusive
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct WeekWindow {
    start: Date,
    end: Date,
    offset: UtcOffset,
}

impl WeekWindow {
    pub(crate) fn start(&self) -> Date {
        self.start
    }

    pub(crate) fn end(&self) -> Date {
        self.end
    }

    /// Midnight at the start of the first day
    pub(crate) fn time_min(&self) -> OffsetDateTime {
        self.start.with_time(Time::MIDNIGHT).assume_offset(self.offset)
    }

    /// The final instant of the seventh day
    pub(crate) fn time_max(&self) -> OffsetDateTime {
        self.end.with_time(END_OF_DAY).assume_offset(self.offset)
    }

    pub(crate) fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    pub(crate) fn days(&self) -> impl Iterator<Item = Date> {
        successors(Some(self.start), |d| d.next_day()).take(DAYS_IN_WEEK)
    }
}

/// The dashboard's position in time: the base date whose week is displayed,
/// plus the current date used by "jump to current week"
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct WeekCursor {
    convention: WeekConvention,
    today: Date,
    base: Date,
    window: WeekWindow,
}

impl WeekCursor {
    pub(crate) fn new(convention: WeekConvention, today: Date) -> Result<Self, OutOfTimeError> {
        let window = convention.window_for(today)?;
        Ok(WeekCursor {
            convention,
            today,
            base: today,
            window,
        })
    }

    pub(crate) fn convention(&self) -> &WeekConvention {
        &self.convention
    }

    pub(crate) fn today(&self) -> Date {
        self.today
    }

    pub(crate) fn window(&self) -> WeekWindow {
        self.window
    }

    pub(crate) fn set_today(&mut self, today: Date) {
        self.today = today;
    }

    // On failure, the cursor is left unchanged.
    pub(crate) fn jump_to(&mut self, date: Date) -> Result<(), OutOfTimeError> {
        self.window = self.convention.window_for(date)?;
        self.base = date;
        Ok(())
    }

    pub(crate) fn previous(&mut self) -> Result<(), OutOfTimeError> {
        let date = self
            .base
            .checked_sub(Duration::weeks(1))
            .ok_or(OutOfTimeError)?;
        self.jump_to(date)
    }

    pub(crate) fn next(&mut self) -> Result<(), OutOfTimeError> {
        let date = self
            .base
            .checked_add(Duration::weeks(1))
            .ok_or(OutOfTimeError)?;
        self.jump_to(date)
    }

    pub(crate) fn current(&mut self, today: Date) -> Result<(), OutOfTimeError> {
        self.jump_to(today)?;
        self.today = today;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};
    use time::Weekday::*;

    fn sunday_first() -> WeekConvention {
        WeekConvention::new(Sunday, UtcOffset::UTC)
    }

    #[test]
    fn test_day_index() {
        let conv = sunday_first();
        assert_eq!(conv.day_index(Sunday), 0);
        assert_eq!(conv.day_index(Wednesday), 3);
        assert_eq!(conv.day_index(Saturday), 6);
        let conv = WeekConvention::new(Monday, UtcOffset::UTC);
        assert_eq!(conv.day_index(Monday), 0);
        assert_eq!(conv.day_index(Saturday), 5);
        assert_eq!(conv.day_index(Sunday), 6);
    }

    #[test]
    fn test_window_for_midweek() {
        let window = sunday_first().window_for(date!(2023 - 11 - 16)).unwrap();
        assert_eq!(window.start(), date!(2023 - 11 - 12));
        assert_eq!(window.end(), date!(2023 - 11 - 18));
    }

    #[test]
    fn test_window_for_first_and_last_day() {
        let conv = sunday_first();
        let expected = conv.window_for(date!(2023 - 11 - 15)).unwrap();
        assert_eq!(conv.window_for(date!(2023 - 11 - 12)).unwrap(), expected);
        assert_eq!(conv.window_for(date!(2023 - 11 - 18)).unwrap(), expected);
    }

    #[test]
    fn test_window_for_monday_first() {
        let conv = WeekConvention::new(Monday, UtcOffset::UTC);
        let window = conv.window_for(date!(2023 - 11 - 12)).unwrap();
        assert_eq!(window.start(), date!(2023 - 11 - 06));
        assert_eq!(window.end(), date!(2023 - 11 - 12));
    }

    #[test]
    fn test_window_for_is_idempotent() {
        let conv = sunday_first();
        let mut date = date!(2026 - 01 - 01);
        while date < date!(2026 - 03 - 01) {
            let window = conv.window_for(date).unwrap();
            assert_eq!(conv.window_for(window.start()).unwrap(), window);
            assert_eq!(conv.window_for(window.end()).unwrap(), window);
            assert!(window.contains(date));
            date = date.next_day().unwrap();
        }
    }

    #[test]
    fn test_window_bounds() {
        let conv = WeekConvention::new(Sunday, offset!(-4));
        let window = conv.window_for(date!(2026 - 10 - 14)).unwrap();
        assert_eq!(window.time_min(), datetime!(2026-10-11 00:00 -4));
        assert_eq!(
            window.time_max(),
            datetime!(2026-10-17 23:59:59.999999999 -4)
        );
    }

    #[test]
    fn test_window_days() {
        let window = sunday_first().window_for(date!(2025 - 12 - 31)).unwrap();
        let days = window.days().collect::<Vec<_>>();
        assert_eq!(
            days,
            [
                date!(2025 - 12 - 28),
                date!(2025 - 12 - 29),
                date!(2025 - 12 - 30),
                date!(2025 - 12 - 31),
                date!(2026 - 01 - 01),
                date!(2026 - 01 - 02),
                date!(2026 - 01 - 03),
            ]
        );
    }

    #[test]
    fn test_window_across_dst_change() {
        // US clocks moved forward on 2026-03-08
        let window = sunday_first().window_for(date!(2026 - 03 - 10)).unwrap();
        assert_eq!(window.start(), date!(2026 - 03 - 08));
        assert_eq!(window.end(), date!(2026 - 03 - 14));
        assert_eq!(window.days().count(), DAYS_IN_WEEK);
    }

    #[test]
    fn test_local_date() {
        let conv = WeekConvention::new(Sunday, offset!(-5));
        assert_eq!(
            conv.local_date(datetime!(2026-10-18 02:00 UTC)),
            date!(2026 - 10 - 17)
        );
    }

    #[test]
    fn test_next_then_previous() {
        let mut cursor = WeekCursor::new(sunday_first(), date!(2026 - 10 - 14)).unwrap();
        cursor.next().unwrap();
        assert_eq!(cursor.base, date!(2026 - 10 - 21));
        assert_eq!(cursor.window().start(), date!(2026 - 10 - 18));
        cursor.previous().unwrap();
        assert_eq!(cursor.base, date!(2026 - 10 - 14));
        assert_eq!(cursor.window().start(), date!(2026 - 10 - 11));
    }

    #[test]
    fn test_previous_across_year() {
        let mut cursor = WeekCursor::new(sunday_first(), date!(2026 - 01 - 02)).unwrap();
        cursor.previous().unwrap();
        assert_eq!(cursor.base, date!(2025 - 12 - 26));
        assert_eq!(cursor.window().start(), date!(2025 - 12 - 21));
        assert_eq!(cursor.window().end(), date!(2025 - 12 - 27));
    }

    #[test]
    fn test_current() {
        let mut cursor = WeekCursor::new(sunday_first(), date!(2026 - 10 - 14)).unwrap();
        cursor.next().unwrap();
        cursor.next().unwrap();
        cursor.current(date!(2026 - 10 - 18)).unwrap();
        assert_eq!(cursor.base, date!(2026 - 10 - 18));
        assert_eq!(cursor.today(), date!(2026 - 10 - 18));
        assert_eq!(cursor.window().start(), date!(2026 - 10 - 18));
    }

    #[test]
    fn test_next_at_end_of_time() {
        let mut cursor = WeekCursor::new(sunday_first(), date!(9999 - 12 - 20)).unwrap();
        let before = cursor;
        assert_eq!(cursor.next(), Err(OutOfTimeError));
        assert_eq!(cursor, before);
    }

    #[test]
    fn test_window_past_end_of_time() {
        assert_eq!(
            sunday_first().window_for(date!(9999 - 12 - 31)),
            Err(OutOfTimeError)
        );
    }
}
