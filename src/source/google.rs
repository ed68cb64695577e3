//! Google Calendar API v3, authenticated with a bearer token obtained
//! elsewhere
use super::{parse_instant, CalendarInfo, CalendarSource, SourceError};
use crate::aggregate::CalendarEvent;
use crate::week::WeekWindow;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;

static API_BASE: &str = "https://www.googleapis.com/calendar/v3/";

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const PAGE_SIZE: &str = "250";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where to find the OAuth access token
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Credentials {
    Token(String),
    /// A file containing the token, reread on every sign-in so that an
    /// external helper can refresh it
    TokenFile(PathBuf),
    None,
}

#[derive(Debug)]
pub(crate) struct GoogleSource {
    client: Client,
    api_base: Url,
    credentials: Credentials,
    token: Option<String>,
}

impl GoogleSource {
    pub(crate) fn new(credentials: Credentials) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let api_base =
            Url::parse(API_BASE).map_err(|_| SourceError::BadApiBase(API_BASE.to_owned()))?;
        Ok(GoogleSource {
            client,
            api_base,
            credentials,
            token: None,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| SourceError::BadApiBase(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let token = self.token.as_deref().ok_or(SourceError::SignedOut)?;
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SourceError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json()?)
    }

    /// Fetches every page of a paginated listing
    fn get_all<T, P>(&self, url: &Url, query: &[(&str, String)]) -> Result<Vec<T>, SourceError>
    where
        P: Paginated<Item = T> + DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut page_query = query.to_vec();
            if let Some(pt) = page_token.take() {
                page_query.push(("pageToken", pt));
            }
            let page = self.get_json::<P>(url.clone(), &page_query)?;
            let (batch, next) = page.into_parts();
            items.extend(batch);
            match next {
                Some(pt) => page_token = Some(pt),
                None => return Ok(items),
            }
        }
    }
}

impl CalendarSource for GoogleSource {
    fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    fn sign_in(&mut self) -> Result<bool, SourceError> {
        self.token = match &self.credentials {
            Credentials::Token(token) => Some(token.clone()),
            Credentials::TokenFile(path) => {
                let content = fs::read_to_string(path).map_err(|source| SourceError::Read {
                    path: path.clone(),
                    source,
                })?;
                Some(content.trim().to_owned()).filter(|t| !t.is_empty())
            }
            Credentials::None => None,
        };
        Ok(self.is_signed_in())
    }

    fn list_calendars(&self) -> Result<Vec<CalendarInfo>, SourceError> {
        let url = self.endpoint(&["users", "me", "calendarList"])?;
        let entries = self.get_all::<CalendarListEntry, CalendarListPage>(
            &url,
            &[("maxResults", PAGE_SIZE.into())],
        )?;
        Ok(entries
            .into_iter()
            .map(CalendarListEntry::into_info)
            .collect())
    }

    fn list_events(
        &self,
        calendar_id: &str,
        window: &WeekWindow,
    ) -> Result<Vec<CalendarEvent>, SourceError> {
        let url = self.endpoint(&["calendars", calendar_id, "events"])?;
        let query = [
            ("timeMin", window.time_min().format(&Rfc3339)?),
            ("timeMax", window.time_max().format(&Rfc3339)?),
            ("showDeleted", "false".into()),
            ("singleEvents", "true".into()),
            ("orderBy", "startTime".into()),
            ("maxResults", PAGE_SIZE.into()),
        ];
        let events = self.get_all::<RawEvent, EventsPage>(&url, &query)?;
        tracing::info!(
            calendar_id,
            week = %window.start(),
            count = events.len(),
            "fetched events"
        );
        Ok(events.into_iter().map(RawEvent::into_event).collect())
    }
}

trait Paginated {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<RawEvent>,
    next_page_token: Option<String>,
}

impl Paginated for EventsPage {
    type Item = RawEvent;

    fn into_parts(self) -> (Vec<RawEvent>, Option<String>) {
        (self.items, self.next_page_token)
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    start: Option<RawEventTime>,
    end: Option<RawEventTime>,
}

impl RawEvent {
    fn into_event(self) -> CalendarEvent {
        CalendarEvent::new(
            self.start.and_then(RawEventTime::instant),
            self.end.and_then(RawEventTime::instant),
        )
    }
}

// All-day events have a `date` instead of a `dateTime`; those are treated as
// having no bound.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEventTime {
    date_time: Option<String>,
}

impl RawEventTime {
    fn instant(self) -> Option<time::OffsetDateTime> {
        self.date_time.as_deref().and_then(parse_instant)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListPage {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    next_page_token: Option<String>,
}

impl Paginated for CalendarListPage {
    type Item = CalendarListEntry;

    fn into_parts(self) -> (Vec<CalendarListEntry>, Option<String>) {
        (self.items, self.next_page_token)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListEntry {
    id: String,
    summary: Option<String>,
    summary_override: Option<String>,
}

impl CalendarListEntry {
    fn into_info(self) -> CalendarInfo {
        let summary = self.summary_override.or(self.summary).unwrap_or_default();
        CalendarInfo::new(self.id, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use time::macros::datetime;

    #[test]
    fn test_parse_events_page() {
        let page = serde_json::from_str::<EventsPage>(
            r#"{
                "kind": "calendar#events",
                "items": [
                    {
                        "id": "a1",
                        "summary": "Standup",
                        "start": {"dateTime": "2026-10-12T09:00:00-04:00", "timeZone": "America/New_York"},
                        "end": {"dateTime": "2026-10-12T09:15:00-04:00"}
                    },
                    {
                        "id": "a2",
                        "summary": "Holiday",
                        "start": {"date": "2026-10-12"},
                        "end": {"date": "2026-10-13"}
                    },
                    {
                        "id": "a3"
                    }
                ],
                "nextPageToken": "xyz"
            }"#,
        )
        .unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("xyz"));
        let events = page
            .items
            .into_iter()
            .map(RawEvent::into_event)
            .collect::<Vec<_>>();
        assert_eq!(
            events,
            [
                CalendarEvent::bounded(
                    datetime!(2026-10-12 09:00 -4),
                    datetime!(2026-10-12 09:15 -4)
                ),
                CalendarEvent::new(None, None),
                CalendarEvent::new(None, None),
            ]
        );
    }

    #[test]
    fn test_parse_empty_events_page() {
        let page = serde_json::from_str::<EventsPage>(r#"{"kind": "calendar#events"}"#).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_page_token, None);
    }

    #[test]
    fn test_parse_calendar_list() {
        let page = serde_json::from_str::<CalendarListPage>(
            r#"{
                "items": [
                    {"id": "me@example.com", "summary": "me@example.com", "primary": true},
                    {"id": "team@group.calendar.google.com", "summary": "Team", "summaryOverride": "My Team"},
                    {"id": "nameless"}
                ]
            }"#,
        )
        .unwrap();
        let infos = page
            .items
            .into_iter()
            .map(CalendarListEntry::into_info)
            .collect::<Vec<_>>();
        assert_eq!(
            infos,
            [
                CalendarInfo::new("me@example.com", "me@example.com"),
                CalendarInfo::new("team@group.calendar.google.com", "My Team"),
                CalendarInfo::new("nameless", ""),
            ]
        );
    }

    #[test]
    fn test_endpoint_escapes_calendar_id() {
        let source = GoogleSource::new(Credentials::None).unwrap();
        let url = source
            .endpoint(&["calendars", "en.usa#holiday@group.v.calendar.google.com", "events"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/en.usa%23holiday@group.v.calendar.google.com/events"
        );
    }

    #[test]
    fn test_sign_in_with_token() {
        let mut source = GoogleSource::new(Credentials::Token("abc".into())).unwrap();
        assert!(!source.is_signed_in());
        assert!(source.sign_in().unwrap());
        assert!(source.is_signed_in());
    }

    #[test]
    fn test_sign_in_without_credentials() {
        let mut source = GoogleSource::new(Credentials::None).unwrap();
        assert!(!source.sign_in().unwrap());
        assert!(matches!(
            source.list_calendars(),
            Err(SourceError::SignedOut)
        ));
    }

    #[test]
    fn test_sign_in_with_token_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  ya29.token  ").unwrap();
        let mut source =
            GoogleSource::new(Credentials::TokenFile(file.path().to_path_buf())).unwrap();
        assert!(source.sign_in().unwrap());
        assert_eq!(source.token.as_deref(), Some("ya29.token"));
    }

    #[test]
    fn test_sign_in_with_empty_token_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut source =
            GoogleSource::new(Credentials::TokenFile(file.path().to_path_buf())).unwrap();
        assert!(!source.sign_in().unwrap());
    }

    #[test]
    fn test_sign_in_with_missing_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut source =
            GoogleSource::new(Credentials::TokenFile(dir.path().join("nope"))).unwrap();
        assert!(matches!(source.sign_in(), Err(SourceError::Read { .. })));
    }
}
