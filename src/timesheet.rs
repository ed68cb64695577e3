use crate::dashboard::{Dashboard, RefreshState};
use crate::theme::{
    BASE_STYLE, ERROR_STYLE, GAUGE_STYLE, MUTED_STYLE, TITLE_STYLE, TODAY_STYLE, WEEKDAY_STYLE,
};
use crate::week::DAYS_IN_WEEK;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Margin, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Gauge, Widget},
};
use time::{format_description::FormatItem, macros::format_description, Date, Weekday};

static DATE_FMT: &[FormatItem<'_>] = format_description!("[month]/[day]/[year]");

static HINTS: &str = "h prev · 0 current · l next · r refresh · c calendar · ? help · q quit";

/// Number of columns per day of week
const DAY_WIDTH: u16 = 7;

const GRID_WIDTH: u16 = DAY_WIDTH * 7;

/// Number of one-line rows in the signed-in layout
const ROWS: usize = 13;

/// Weekly progress: per-day totals, a progress gauge, and week totals
#[derive(Clone, Copy, Debug)]
pub(crate) struct Timesheet<'a> {
    dashboard: &'a Dashboard,
}

impl<'a> Timesheet<'a> {
    pub(crate) fn new(dashboard: &'a Dashboard) -> Self {
        Timesheet { dashboard }
    }

    fn calendar_line(&self) -> Line<'static> {
        let name = match (self.dashboard.selected_calendar(), self.dashboard.selected()) {
            (Some(info), _) => info.display_name().to_owned(),
            (None, Some(id)) => id.to_owned(),
            (None, None) => String::from("(none)"),
        };
        Line::from(vec![
            Span::styled("Calendar: ", TITLE_STYLE),
            Span::styled(name, BASE_STYLE),
        ])
    }

    fn week_line(&self) -> Line<'static> {
        let window = self.dashboard.window();
        let mut line = Line::styled(
            format!(
                "Week of {} to {}",
                show_date(window.start()),
                show_date(window.end())
            ),
            TITLE_STYLE,
        );
        if window.contains(self.dashboard.cursor().today()) {
            line.push_span(Span::styled(" (this week)", MUTED_STYLE));
        }
        line
    }

    fn weekday_row(&self) -> Line<'static> {
        self.dashboard
            .window()
            .days()
            .map(|d| Span::styled(cell(weekday_abbrev(d.weekday())), WEEKDAY_STYLE))
            .collect()
    }

    fn date_row(&self) -> Line<'static> {
        let today = self.dashboard.cursor().today();
        self.dashboard
            .window()
            .days()
            .map(|d| {
                if d == today {
                    Span::styled(cell(&format!("[{:2}]", d.day())), TODAY_STYLE)
                } else {
                    Span::styled(cell(&format!(" {:2} ", d.day())), BASE_STYLE)
                }
            })
            .collect()
    }

    fn totals_row(&self) -> Line<'static> {
        let per_day: [i64; DAYS_IN_WEEK] = self.dashboard.aggregate().per_day;
        per_day
            .into_iter()
            .map(|minutes| {
                if self.dashboard.is_loading() {
                    Span::styled(cell("-"), MUTED_STYLE)
                } else {
                    Span::styled(cell(&format_clock(minutes)), BASE_STYLE)
                }
            })
            .collect()
    }

    fn total_line(&self, label: &str, minutes: i64) -> Line<'static> {
        let value = if self.dashboard.is_loading() {
            String::from("-")
        } else {
            format_total(minutes)
        };
        Line::styled(format!("{label}: {value}"), BASE_STYLE)
    }

    fn gauge(&self) -> Gauge<'static> {
        let gauge = Gauge::default().gauge_style(GAUGE_STYLE);
        if self.dashboard.is_loading() {
            gauge.percent(0).label("…")
        } else {
            let pct = self.dashboard.aggregate().progress_percent();
            gauge.percent(pct).label(format!("{pct}%"))
        }
    }

    fn status_line(&self) -> Line<'static> {
        match self.dashboard.state() {
            RefreshState::Loading => Line::styled("Loading…", MUTED_STYLE),
            RefreshState::Failed(msg) => Line::styled(
                format!("Refresh failed: {msg} (press r to retry)"),
                ERROR_STYLE,
            ),
            RefreshState::Idle if self.dashboard.selected().is_none() => {
                Line::styled("No calendar selected; press c to choose one", MUTED_STYLE)
            }
            RefreshState::Idle | RefreshState::Loaded => Line::default(),
        }
    }

    fn render_signed_out(&self, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![
            Line::styled("Not signed in.", TITLE_STYLE),
            Line::raw(""),
            Line::styled("Press s to sign in to your calendar.", BASE_STYLE),
        ];
        if let Some(reason) = self.dashboard.sign_in_error() {
            lines.push(Line::raw(""));
            lines.push(Line::styled(format!("Sign-in failed: {reason}"), ERROR_STYLE));
        }
        let text = Text::from(lines).centered();
        let height = u16::try_from(text.height()).unwrap_or(u16::MAX);
        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        text.render(area, buf);
    }
}

impl Widget for Timesheet<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(" Timesheet ")
            .title_alignment(Alignment::Center)
            .style(BASE_STYLE);
        let inner = block.inner(area);
        block.render(area, buf);
        let [body, hints] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);
        Line::styled(HINTS, MUTED_STYLE)
            .centered()
            .render(hints, buf);
        if !self.dashboard.signed_in() {
            self.render_signed_out(body, buf);
            return;
        }
        let rows: [Rect; ROWS] =
            Layout::vertical([Constraint::Length(1); ROWS]).areas(body.inner(Margin::new(1, 0)));
        let [
            calendar,
            week,
            _,
            weekdays,
            dates,
            totals,
            _,
            progress,
            gauge,
            planned,
            done,
            _,
            status,
        ] = rows;
        self.calendar_line().render(calendar, buf);
        self.week_line().render(week, buf);
        for (row, line) in [
            (weekdays, self.weekday_row()),
            (dates, self.date_row()),
            (totals, self.totals_row()),
        ] {
            let [grid] = Layout::horizontal([Constraint::Length(GRID_WIDTH)])
                .flex(Flex::Center)
                .areas(row);
            line.render(grid, buf);
        }
        Line::styled("Progress", TITLE_STYLE).render(progress, buf);
        self.gauge().render(gauge, buf);
        let agg = self.dashboard.aggregate();
        self.total_line("Planned this week", agg.planned)
            .render(planned, buf);
        self.total_line("So far", agg.done).render(done, buf);
        self.status_line().render(status, buf);
    }
}

fn cell(s: &str) -> String {
    format!("{s:^width$}", width = usize::from(DAY_WIDTH))
}

fn show_date(date: Date) -> String {
    date.format(&DATE_FMT).unwrap_or_else(|_| date.to_string())
}

fn weekday_abbrev(wd: Weekday) -> &'static str {
    match wd {
        Weekday::Sunday => "Su",
        Weekday::Monday => "Mo",
        Weekday::Tuesday => "Tu",
        Weekday::Wednesday => "We",
        Weekday::Thursday => "Th",
        Weekday::Friday => "Fr",
        Weekday::Saturday => "Sa",
    }
}

/// Formats a number of minutes as `H:MM`
pub(crate) fn format_clock(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let abs = minutes.unsigned_abs();
    let (hours, mins) = (abs / 60, abs % 60);
    format!("{sign}{hours}:{mins:02}")
}

/// Formats a number of minutes as `Hh MMm`
pub(crate) fn format_total(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let abs = minutes.unsigned_abs();
    let (hours, mins) = (abs / 60, abs % 60);
    format!("{sign}{hours}h {mins:02}m")
}
