use crate::dashboard::{Dashboard, Job, Message};
use crate::help::Help;
use crate::theme::BASE_STYLE;
use crate::timesheet::Timesheet;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::Rect,
    widgets::Widget,
    Terminal,
};
use std::io::{self, Write};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};
use time::OffsetDateTime;

/// How long to wait for a key press before checking for fetch results
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How often to recompute "done" time as events end
const TICK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct App {
    dashboard: Dashboard,
    state: AppState,
    outbox: Vec<Job>,
}

impl App {
    pub(crate) fn new(dashboard: Dashboard) -> App {
        let outbox = dashboard.start();
        App {
            dashboard,
            state: AppState::Dashboard,
            outbox,
        }
    }

    pub(crate) fn run<B: Backend>(
        mut self,
        terminal: &mut Terminal<B>,
        jobs: &Sender<Job>,
        messages: &Receiver<Message>,
    ) -> io::Result<()> {
        let mut last_tick = Instant::now();
        while !self.quitting() {
            self.flush(jobs)?;
            self.draw(terminal)?;
            if event::poll(POLL_INTERVAL)? {
                self.handle_event(&event::read()?)?;
            }
            loop {
                match messages.try_recv() {
                    Ok(msg) => {
                        self.dispatch(msg, self.now());
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        return Err(io::Error::other("calendar fetch worker stopped"))
                    }
                }
            }
            if last_tick.elapsed() >= TICK_INTERVAL {
                self.dispatch(Message::Tick, self.now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.dashboard.cursor().convention().offset())
    }

    fn flush(&mut self, jobs: &Sender<Job>) -> io::Result<()> {
        for job in std::mem::take(&mut self.outbox) {
            jobs.send(job)
                .map_err(|_| io::Error::other("calendar fetch worker stopped"))?;
        }
        Ok(())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(&*self, frame.area()))?;
        Ok(())
    }

    fn handle_event(&mut self, ev: &Event) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = *ev
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code, self.now())
            {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key or tried to move
    // past the end of time
    fn handle_key(&mut self, key: KeyCode, now: OffsetDateTime) -> bool {
        match self.state {
            AppState::Dashboard => match key {
                KeyCode::Char('h') | KeyCode::Left => self.dispatch(Message::Previous, now),
                KeyCode::Char('l') | KeyCode::Right => self.dispatch(Message::Next, now),
                KeyCode::Char('0') | KeyCode::Home => self.dispatch(Message::Current, now),
                KeyCode::Char('r') => self.dispatch(Message::Refresh, now),
                KeyCode::Char('c') | KeyCode::Tab => {
                    self.dispatch(Message::SelectNextCalendar, now)
                }
                KeyCode::Char('C') | KeyCode::BackTab => {
                    self.dispatch(Message::SelectPreviousCalendar, now)
                }
                KeyCode::Char('s') => self.dispatch(Message::SignIn, now),
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Dashboard;
                true
            }
            AppState::Quitting => false,
        }
    }

    fn dispatch(&mut self, msg: Message, now: OffsetDateTime) -> bool {
        match self.dashboard.update(msg, now) {
            Ok(jobs) => {
                self.outbox.extend(jobs);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "navigation refused");
                false
            }
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        Timesheet::new(&self.dashboard).render(area, buf);
        if self.state == AppState::Helping {
            Help(BASE_STYLE).render(area, buf);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Dashboard,
    Helping,
    Quitting,
}
