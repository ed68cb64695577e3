mod file;
mod google;
pub(crate) use self::file::FileSource;
pub(crate) use self::google::{Credentials, GoogleSource};
use crate::aggregate::CalendarEvent;
use crate::week::WeekWindow;
use serde::Deserialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub(crate) const DEFAULT_CALENDAR: &str = "primary";

/// A provider of calendars and their events.  Implementations may block;
/// they are driven from the fetch worker thread.
pub(crate) trait CalendarSource: fmt::Debug + Send {
    fn is_signed_in(&self) -> bool;

    /// (Re)acquire credentials and report whether the source is now signed
    /// in
    fn sign_in(&mut self) -> Result<bool, SourceError>;

    fn list_calendars(&self) -> Result<Vec<CalendarInfo>, SourceError>;

    /// Events overlapping `window` in the given calendar.  Events lacking a
    /// precise start or end are returned with that bound absent.
    fn list_events(
        &self,
        calendar_id: &str,
        window: &WeekWindow,
    ) -> Result<Vec<CalendarEvent>, SourceError>;
}

impl<T: CalendarSource + ?Sized> CalendarSource for Box<T> {
    fn is_signed_in(&self) -> bool {
        (**self).is_signed_in()
    }

    fn sign_in(&mut self) -> Result<bool, SourceError> {
        (**self).sign_in()
    }

    fn list_calendars(&self) -> Result<Vec<CalendarInfo>, SourceError> {
        (**self).list_calendars()
    }

    fn list_events(
        &self,
        calendar_id: &str,
        window: &WeekWindow,
    ) -> Result<Vec<CalendarEvent>, SourceError> {
        (**self).list_events(calendar_id, window)
    }
}

/// An entry in the calendar catalog
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq)]
pub(crate) struct CalendarInfo {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) summary: String,
}

impl CalendarInfo {
    pub(crate) fn new<I: Into<String>, S: Into<String>>(id: I, summary: S) -> Self {
        CalendarInfo {
            id: id.into(),
            summary: summary.into(),
        }
    }

    pub(crate) fn primary() -> Self {
        CalendarInfo::new(DEFAULT_CALENDAR, DEFAULT_CALENDAR)
    }

    pub(crate) fn display_name(&self) -> &str {
        if self.summary.is_empty() {
            &self.id
        } else {
            &self.summary
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SourceError {
    #[error("not signed in")]
    SignedOut,
    #[error("calendar provider rejected the credentials")]
    Unauthorized,
    #[error("request to calendar provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("calendar provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid API base URL {0:?}")]
    BadApiBase(String),
    #[error("failed to format timestamp: {0}")]
    Format(#[from] time::error::Format),
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no such calendar: {0:?}")]
    UnknownCalendar(String),
}

/// Parses an RFC 3339 timestamp as sent by calendar providers.  Unparsable
/// values are logged and treated as absent.
pub(crate) fn parse_instant(s: &str) -> Option<OffsetDateTime> {
    match OffsetDateTime::parse(s, &Rfc3339) {
        Ok(dt) => Some(dt),
        Err(e) => {
            tracing::warn!(value = s, error = %e, "ignoring unparsable event time");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_instant() {
        assert_eq!(
            parse_instant("2026-10-12T09:00:00-04:00"),
            Some(datetime!(2026-10-12 09:00 -4))
        );
        assert_eq!(
            parse_instant("2026-10-12T13:00:00Z"),
            Some(datetime!(2026-10-12 13:00 UTC))
        );
    }

    #[test]
    fn test_parse_instant_rejects_dates() {
        assert_eq!(parse_instant("2026-10-12"), None);
        assert_eq!(parse_instant("soon"), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(CalendarInfo::new("abc", "Work").display_name(), "Work");
        assert_eq!(CalendarInfo::new("abc", "").display_name(), "abc");
    }
}
