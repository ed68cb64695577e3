use super::{parse_instant, CalendarInfo, CalendarSource, SourceError};
use crate::aggregate::CalendarEvent;
use crate::week::WeekWindow;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// A calendar source backed by a local JSON document of the form:
///
/// ```json
/// {
///     "calendars": [{"id": "work", "summary": "Work"}],
///     "events": {
///         "work": [
///             {"start": "2026-10-12T09:00:00-04:00", "end": "2026-10-12T10:00:00-04:00"}
///         ]
///     }
/// }
/// ```
///
/// The file is reread on every request, so edits show up on refresh.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FileSource {
    path: PathBuf,
    loaded: bool,
}

impl FileSource {
    pub(crate) fn new(path: PathBuf) -> Self {
        FileSource {
            path,
            loaded: false,
        }
    }

    fn read(&self) -> Result<Document, SourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SourceError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl CalendarSource for FileSource {
    fn is_signed_in(&self) -> bool {
        self.loaded
    }

    fn sign_in(&mut self) -> Result<bool, SourceError> {
        self.read()?;
        self.loaded = true;
        Ok(true)
    }

    fn list_calendars(&self) -> Result<Vec<CalendarInfo>, SourceError> {
        let doc = self.read()?;
        if doc.calendars.is_empty() {
            Ok(doc
                .events
                .into_keys()
                .map(|id| CalendarInfo::new(id, ""))
                .collect())
        } else {
            Ok(doc.calendars)
        }
    }

    fn list_events(
        &self,
        calendar_id: &str,
        window: &WeekWindow,
    ) -> Result<Vec<CalendarEvent>, SourceError> {
        let mut doc = self.read()?;
        let entries = doc
            .events
            .remove(calendar_id)
            .ok_or_else(|| SourceError::UnknownCalendar(calendar_id.to_owned()))?;
        let (time_min, time_max) = (window.time_min(), window.time_max());
        Ok(entries
            .into_iter()
            .map(Entry::into_event)
            .filter(|ev| match (ev.start, ev.end) {
                (Some(start), Some(end)) => end > time_min && start <= time_max,
                _ => true,
            })
            .collect())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
struct Document {
    #[serde(default)]
    calendars: Vec<CalendarInfo>,
    #[serde(default)]
    events: BTreeMap<String, Vec<Entry>>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
struct Entry {
    start: Option<String>,
    end: Option<String>,
}

impl Entry {
    fn into_event(self) -> CalendarEvent {
        CalendarEvent::new(
            self.start.as_deref().and_then(parse_instant),
            self.end.as_deref().and_then(parse_instant),
        )
    }
}
