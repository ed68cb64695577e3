mod cache;
use self::cache::{CacheKey, WeekCache};
use crate::aggregate::{CalendarEvent, WeekAggregate};
use crate::source::{CalendarInfo, SourceError};
use crate::week::{OutOfTimeError, WeekCursor, WeekWindow};
use std::num::NonZeroUsize;
use time::{Date, OffsetDateTime};

/// Number of fetched weeks to keep around for instant navigation
const CACHED_WEEKS: NonZeroUsize = match NonZeroUsize::new(8) {
    Some(n) => n,
    None => unreachable!(),
};

/// Identifies one fetch request.  A response is only applied if it carries
/// the ticket of the most recently issued request.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct FetchTicket {
    seq: u64,
    calendar_id: String,
    week_start: Date,
}

impl FetchTicket {
    pub(crate) fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.calendar_id.clone(), self.week_start)
    }
}

/// Input to the dashboard: user intents and results reported by the
/// calendar source
#[derive(Debug)]
pub(crate) enum Message {
    SignInChanged(bool),
    /// A sign-in attempt failed; carries the reason
    SignInFailed(String),
    CalendarsLoaded(Result<Vec<CalendarInfo>, SourceError>),
    EventsLoaded {
        ticket: FetchTicket,
        result: Result<Vec<CalendarEvent>, SourceError>,
    },
    Previous,
    Current,
    Next,
    Refresh,
    SelectNextCalendar,
    SelectPreviousCalendar,
    SignIn,
    /// Time has passed; recompute what is done
    Tick,
}

/// Work for the calendar source requested by the dashboard
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Job {
    SignIn,
    ListCalendars,
    ListEvents {
        ticket: FetchTicket,
        window: WeekWindow,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum RefreshState {
    /// Nothing to show or nothing requested
    Idle,
    Loading,
    Loaded,
    /// The last fetch failed; the previous aggregate is still displayed
    Failed(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Dashboard {
    cursor: WeekCursor,
    signed_in: bool,
    sign_in_error: Option<String>,
    calendars: Vec<CalendarInfo>,
    selected: Option<String>,
    aggregate: WeekAggregate,
    state: RefreshState,
    pending: Option<FetchTicket>,
    next_seq: u64,
    cache: WeekCache,
}

impl Dashboard {
    pub(crate) fn new(cursor: WeekCursor, selected: Option<String>) -> Dashboard {
        Dashboard {
            cursor,
            signed_in: false,
            sign_in_error: None,
            calendars: vec![CalendarInfo::primary()],
            selected,
            aggregate: WeekAggregate::default(),
            state: RefreshState::Idle,
            pending: None,
            next_seq: 0,
            cache: WeekCache::new(CACHED_WEEKS),
        }
    }

    /// Jobs to issue when the dashboard first comes up
    pub(crate) fn start(&self) -> Vec<Job> {
        vec![Job::SignIn]
    }

    pub(crate) fn cursor(&self) -> &WeekCursor {
        &self.cursor
    }

    pub(crate) fn window(&self) -> WeekWindow {
        self.cursor.window()
    }

    pub(crate) fn signed_in(&self) -> bool {
        self.signed_in
    }

    /// Why the most recent sign-in attempt failed, until one succeeds
    pub(crate) fn sign_in_error(&self) -> Option<&str> {
        self.sign_in_error.as_deref()
    }

    pub(crate) fn calendars(&self) -> &[CalendarInfo] {
        &self.calendars
    }

    pub(crate) fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The catalog entry for the selected calendar, if the catalog has one
    pub(crate) fn selected_calendar(&self) -> Option<&CalendarInfo> {
        let id = self.selected()?;
        self.calendars.iter().find(|c| c.id == id)
    }

    pub(crate) fn aggregate(&self) -> &WeekAggregate {
        &self.aggregate
    }

    pub(crate) fn state(&self) -> &RefreshState {
        &self.state
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.state == RefreshState::Loading
    }

    /// Apply `message` and return the jobs it gives rise to.  Fails only if
    /// navigation would leave the range of representable dates, in which
    /// case nothing changes.
    pub(crate) fn update(
        &mut self,
        message: Message,
        now: OffsetDateTime,
    ) -> Result<Vec<Job>, OutOfTimeError> {
        let jobs = match message {
            Message::SignInChanged(signed_in) => {
                tracing::info!(signed_in, "sign-in state changed");
                self.signed_in = signed_in;
                if signed_in {
                    self.sign_in_error = None;
                    let mut jobs = vec![Job::ListCalendars];
                    jobs.extend(self.reload(now));
                    jobs
                } else {
                    self.pending = None;
                    self.state = RefreshState::Idle;
                    Vec::new()
                }
            }
            Message::SignInFailed(reason) => {
                self.sign_in_error = Some(reason);
                Vec::new()
            }
            Message::CalendarsLoaded(Ok(calendars)) => {
                tracing::debug!(count = calendars.len(), "calendar catalog loaded");
                self.calendars = calendars;
                Vec::new()
            }
            Message::CalendarsLoaded(Err(e)) => {
                tracing::warn!(error = %e, "failed to list calendars");
                Vec::new()
            }
            Message::EventsLoaded { ticket, result } => {
                self.receive(ticket, result, now);
                Vec::new()
            }
            Message::Previous => {
                self.cursor.previous()?;
                self.reload(now)
            }
            Message::Next => {
                self.cursor.next()?;
                self.reload(now)
            }
            Message::Current => {
                let today = self.cursor.convention().local_date(now);
                self.cursor.current(today)?;
                self.reload(now)
            }
            Message::Refresh => {
                if let Some(key) = self.current_key() {
                    self.cache.invalidate(&key);
                }
                self.reload(now)
            }
            Message::SelectNextCalendar => self.cycle_calendar(true, now),
            Message::SelectPreviousCalendar => self.cycle_calendar(false, now),
            Message::SignIn => {
                if self.signed_in {
                    Vec::new()
                } else {
                    vec![Job::SignIn]
                }
            }
            Message::Tick => {
                self.cursor
                    .set_today(self.cursor.convention().local_date(now));
                self.reaggregate(now);
                Vec::new()
            }
        };
        Ok(jobs)
    }

    fn current_key(&self) -> Option<CacheKey> {
        let id = self.selected.clone()?;
        Some(CacheKey::new(id, self.window().start()))
    }

    /// Start a fetch-then-aggregate cycle for the current calendar and week,
    /// superseding any fetch in flight
    fn reload(&mut self, now: OffsetDateTime) -> Vec<Job> {
        self.pending = None;
        if !self.signed_in {
            self.state = RefreshState::Idle;
            return Vec::new();
        }
        let Some(key) = self.current_key() else {
            self.aggregate = WeekAggregate::default();
            self.state = RefreshState::Idle;
            return Vec::new();
        };
        if let Some(events) = self.cache.get(&key) {
            tracing::debug!(
                calendar_id = %key.calendar_id,
                week = %key.week_start,
                "using cached events"
            );
            self.aggregate = WeekAggregate::compute(events, now, self.cursor.convention());
            self.state = RefreshState::Loaded;
            return Vec::new();
        }
        self.next_seq += 1;
        let ticket = FetchTicket {
            seq: self.next_seq,
            calendar_id: key.calendar_id,
            week_start: key.week_start,
        };
        tracing::debug!(
            seq = ticket.seq,
            calendar_id = %ticket.calendar_id,
            week = %ticket.week_start,
            "requesting events"
        );
        self.pending = Some(ticket.clone());
        self.state = RefreshState::Loading;
        vec![Job::ListEvents {
            ticket,
            window: self.window(),
        }]
    }

    fn receive(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<CalendarEvent>, SourceError>,
        now: OffsetDateTime,
    ) {
        if self.pending.as_ref() != Some(&ticket) {
            tracing::debug!(seq = ticket.seq, "discarding stale fetch result");
            return;
        }
        self.pending = None;
        match result {
            Ok(events) => {
                self.aggregate = WeekAggregate::compute(&events, now, self.cursor.convention());
                self.cache.insert(ticket.cache_key(), events);
                tracing::debug!(
                    planned = self.aggregate.planned,
                    done = self.aggregate.done,
                    cached_weeks = self.cache.len(),
                    "aggregated week"
                );
                self.state = RefreshState::Loaded;
            }
            Err(e) => {
                tracing::warn!(seq = ticket.seq, error = %e, "failed to fetch events");
                self.state = RefreshState::Failed(e.to_string());
            }
        }
    }

    fn reaggregate(&mut self, now: OffsetDateTime) {
        if self.state != RefreshState::Loaded {
            return;
        }
        if let Some(key) = self.current_key() {
            if let Some(events) = self.cache.get(&key) {
                self.aggregate = WeekAggregate::compute(events, now, self.cursor.convention());
            }
        }
    }

    fn cycle_calendar(&mut self, forwards: bool, now: OffsetDateTime) -> Vec<Job> {
        let qty = self.calendars.len();
        if qty == 0 {
            return Vec::new();
        }
        let pos = self
            .selected
            .as_deref()
            .and_then(|id| self.calendars.iter().position(|c| c.id == id));
        let i = match (pos, forwards) {
            (Some(i), true) => (i + 1) % qty,
            (Some(i), false) => (i + qty - 1) % qty,
            (None, _) => 0,
        };
        let id = self.calendars[i].id.clone();
        tracing::info!(calendar_id = %id, "selected calendar");
        self.selected = Some(id);
        self.reload(now)
    }
}
