mod aggregate;
mod app;
mod config;
mod dashboard;
mod help;
mod source;
mod theme;
mod timesheet;
mod week;
mod worker;
use crate::app::App;
use crate::config::{Command, Config, SourceConfig};
use crate::dashboard::Dashboard;
use crate::source::{CalendarSource, FileSource, GoogleSource};
use crate::week::{WeekConvention, WeekCursor};
use anyhow::Context;
use lexopt::Parser;
use ratatui::DefaultTerminal;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{mpsc, Mutex};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    match Command::from_parser(Parser::from_env(), |name| std::env::var_os(name))? {
        Command::Run(config) => run(config),
        Command::Help => {
            println!("Usage: weekpace [OPTIONS] [YYYY-MM-DD]");
            println!();
            println!("Terminal dashboard of planned vs. completed calendar time for a week");
            println!();
            println!("Options:");
            println!("  -c, --calendar <ID>       Calendar to show [default: primary]");
            println!("  -e, --events <FILE>       Read events from a JSON file instead of Google");
            println!("  -t, --token-file <FILE>   Read the Google access token from FILE");
            println!("  -w, --week-start <DAY>    First day of the week [default: sunday]");
            println!("  -l, --log-file <FILE>     Append diagnostic logs to FILE");
            println!("  -h, --help                Display this help message and exit");
            println!("  -V, --version             Show the program version and exit");
            println!();
            println!("Environment:");
            println!("  WEEKPACE_TOKEN            Google access token");
            println!("  WEEKPACE_TOKEN_FILE       File containing the Google access token");
            println!("  WEEKPACE_LOG_FILE         Default for --log-file");
            println!("  RUST_LOG                  Log filter [default: info]");
            Ok(())
        }
        Command::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run(config: Config) -> anyhow::Result<()> {
    // Must happen before any other threads exist
    let now = OffsetDateTime::now_local().context("failed to determine local time")?;
    if let Some(path) = &config.log_file {
        init_logging(path)?;
    }
    let convention = WeekConvention::new(config.first_day, now.offset());
    let mut cursor =
        WeekCursor::new(convention, now.date()).context("current date is out of range")?;
    if let Some(date) = config.start {
        cursor
            .jump_to(date)
            .with_context(|| format!("cannot show the week of {date}"))?;
    }
    let source: Box<dyn CalendarSource> = match config.source {
        SourceConfig::Google(credentials) => Box::new(
            GoogleSource::new(credentials).context("failed to set up Google Calendar client")?,
        ),
        SourceConfig::File(path) => {
            tracing::info!(path = %path.display(), "reading events from file");
            Box::new(FileSource::new(path))
        }
    };
    let (messages, inbox) = mpsc::channel();
    let jobs = worker::spawn(source, messages).context("failed to start fetch worker")?;
    let app = App::new(Dashboard::new(cursor, config.calendar));
    with_terminal(|mut terminal| {
        terminal.hide_cursor().context("failed to hide cursor")?;
        app.run(&mut terminal, &jobs, &inbox)?;
        Ok(())
    })
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}
