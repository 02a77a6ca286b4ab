use clap::{builder::ValueParser, Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_FORMAT: &str = "log-format";

/// How log lines are rendered on stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Log level and format resolved from `-v`/`GATEHOUSE_LOG_LEVEL` and
/// `--log-format`/`GATEHOUSE_LOG_FORMAT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogSettings {
    /// `None` keeps the quiet default (errors only).
    pub level: Option<Level>,
    pub format: LogFormat,
}

impl LogSettings {
    #[must_use]
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let count = matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0);
        let format = matches
            .get_one::<LogFormat>(ARG_LOG_FORMAT)
            .copied()
            .unwrap_or_default();
        Self {
            level: level_for(count),
            format,
        }
    }
}

const fn level_for(count: u8) -> Option<Level> {
    match count {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

const MAX_VERBOSITY: u8 = 5;

/// Accepts either a repeat count (clamped, so `-vvvvvvv` is still TRACE) or a
/// level name.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        match level.trim().to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            other => other
                .parse::<u8>()
                .map(|count| count.min(MAX_VERBOSITY))
                .map_err(|_| format!("invalid log level: {level}")),
        }
    })
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    match value.trim().to_lowercase().as_str() {
        "text" | "pretty" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        _ => Err(format!("invalid log format: {value} (expected text or json)")),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Log more; repeat up to -vvvv, or set ERROR, WARN, INFO, DEBUG, TRACE")
                .env("GATEHOUSE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .arg(
            Arg::new(ARG_LOG_FORMAT)
                .long(ARG_LOG_FORMAT)
                .help("Log line format on stderr")
                .env("GATEHOUSE_LOG_FORMAT")
                .global(true)
                .value_name("text|json")
                .value_parser(ValueParser::from(parse_log_format)),
        )
}
