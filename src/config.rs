use crate::source::{Credentials, DEFAULT_CALENDAR};
use lexopt::{Arg, Parser, ValueExt};
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, Date, Weekday};

static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

static WEEKDAYS: [Weekday; 7] = [
    Weekday::Sunday,
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
];

/// Everything needed to start the dashboard
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Config {
    /// Date whose week to show first instead of today's
    pub(crate) start: Option<Date>,
    /// `None` means no calendar is selected until the user picks one
    pub(crate) calendar: Option<String>,
    pub(crate) first_day: Weekday,
    pub(crate) source: SourceConfig,
    pub(crate) log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum SourceConfig {
    Google(Credentials),
    /// Offline JSON events file
    File(PathBuf),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Command {
    Run(Config),
    Help,
    Version,
}

impl Command {
    /// Parse command-line arguments, consulting `env` for settings not given
    /// on the command line
    pub(crate) fn from_parser<F>(mut parser: Parser, env: F) -> Result<Command, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut start = None;
        let mut calendar = Some(String::from(DEFAULT_CALENDAR));
        let mut first_day = Weekday::Sunday;
        let mut events = None;
        let mut token_file = None;
        let mut log_file = None;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('c') | Arg::Long("calendar") => {
                    let value = parser.value()?.string()?;
                    calendar = Some(value).filter(|s| !s.is_empty());
                }
                Arg::Short('e') | Arg::Long("events") => {
                    events = Some(PathBuf::from(parser.value()?));
                }
                Arg::Short('t') | Arg::Long("token-file") => {
                    token_file = Some(PathBuf::from(parser.value()?));
                }
                Arg::Short('w') | Arg::Long("week-start") => {
                    first_day = parse_weekday(&parser.value()?.string()?)?;
                }
                Arg::Short('l') | Arg::Long("log-file") => {
                    log_file = Some(PathBuf::from(parser.value()?));
                }
                Arg::Value(value) if start.is_none() => {
                    let value = value.string()?;
                    match Date::parse(&value, &YMD_FMT) {
                        Ok(d) => start = Some(d),
                        Err(e) => {
                            return Err(lexopt::Error::ParsingFailed {
                                value,
                                error: Box::new(e),
                            }
                            .into())
                        }
                    }
                }
                _ => return Err(arg.unexpected().into()),
            }
        }
        let source = if let Some(path) = events {
            SourceConfig::File(path)
        } else if let Some(path) = token_file {
            SourceConfig::Google(Credentials::TokenFile(path))
        } else if let Some(token) = env("WEEKPACE_TOKEN").filter(|s| !s.is_empty()) {
            let token = token
                .into_string()
                .map_err(|_| ConfigError::NonUnicodeEnv("WEEKPACE_TOKEN"))?;
            SourceConfig::Google(Credentials::Token(token))
        } else if let Some(path) = env("WEEKPACE_TOKEN_FILE").filter(|s| !s.is_empty()) {
            SourceConfig::Google(Credentials::TokenFile(PathBuf::from(path)))
        } else {
            SourceConfig::Google(Credentials::None)
        };
        let log_file = log_file.or_else(|| {
            env("WEEKPACE_LOG_FILE")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        });
        Ok(Command::Run(Config {
            start,
            calendar,
            first_day,
            source,
            log_file,
        }))
    }
}

/// Accepts full English weekday names and their three-letter abbreviations,
/// in any case
fn parse_weekday(s: &str) -> Result<Weekday, ConfigError> {
    let lower = s.to_ascii_lowercase();
    WEEKDAYS
        .into_iter()
        .find(|wd| {
            let name = wd.to_string().to_ascii_lowercase();
            lower.len() >= 3 && name.starts_with(&lower) && (lower.len() == 3 || lower == name)
        })
        .ok_or_else(|| ConfigError::UnknownWeekday(s.to_owned()))
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error(transparent)]
    Args(#[from] lexopt::Error),
    #[error("unknown weekday {0:?}; expected a name such as \"sunday\" or \"mon\"")]
    UnknownWeekday(String),
    #[error("environment variable {0} is not valid UTF-8")]
    NonUnicodeEnv(&'static str),
}
