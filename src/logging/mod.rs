//! Logger construction for decoding runs.
//!
//! A [`Config`] names up to two sinks: the terminal and a dated log file, each with its own
//! level. It is carried by `DecoderConfig`, which turns it into the logger handed to decoders
//! and tree builders. The default sends nothing anywhere.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use chrono::prelude::*;
pub use slog::FilterLevel as Level;
use slog::{
    Discard, Drain, Duplicate, Fuse, Level as RecordLevel, LevelFilter, Logger, OwnedKV,
    SendSyncRefUnwindSafeKV,
};
use slog_async::Async;
use slog_term::{CompactFormat, Decorator, FullFormat, PlainDecorator, TermDecorator};

use crate::utils;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Parses a level name such as `info` or `warn`; case is ignored.
pub fn parse_level(s: &str) -> Result<Level, Error> {
    let level = match s.trim().to_lowercase().as_str() {
        "off" => Level::Off,
        "critical" | "crit" => Level::Critical,
        "error" => Level::Error,
        "warning" | "warn" => Level::Warning,
        "info" => Level::Info,
        "debug" => Level::Debug,
        "trace" => Level::Trace,
        _ => return Err(Error::InvalidOption(format!("log level `{}`", s))),
    };
    Ok(level)
}

pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::Off => "off",
        Level::Critical => "critical",
        Level::Error => "error",
        Level::Warning => "warning",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

mod level_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{level_name, parse_level, Level};

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(level_name(*level))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let name = String::deserialize(deserializer)?;
        parse_level(&name).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Full,
    Compact,
}

#[derive(Debug)]
enum Stream {
    StdOut,
    StdErr,
    File(File),
}

type FilteredDrain = LevelFilter<Fuse<Async>>;

/// One destination together with the lowest level it accepts.
#[derive(Debug)]
struct Sink {
    stream: Stream,
    level: Level,
    format: Format,
}

impl Sink {
    fn into_drain(self) -> Option<FilteredDrain> {
        if let Level::Off = self.level {
            return None;
        }
        let drain = match self.stream {
            Stream::StdOut => async_drain(TermDecorator::new().stdout().build(), self.format),
            Stream::StdErr => async_drain(TermDecorator::new().stderr().build(), self.format),
            Stream::File(file) => async_drain(PlainDecorator::new(file), self.format),
        };
        let level = RecordLevel::from_usize(self.level.as_usize()).unwrap_or(RecordLevel::Trace);
        Some(LevelFilter::new(drain.fuse(), level))
    }
}

fn async_drain<D: Decorator + Send + 'static>(decorator: D, format: Format) -> Async {
    match format {
        Format::Full => {
            let drain = FullFormat::new(decorator).use_local_timestamp().build();
            Async::new(drain.fuse()).build()
        }
        Format::Compact => {
            let drain = CompactFormat::new(decorator).use_local_timestamp().build();
            Async::new(drain.fuse()).build()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// level of the terminal log
    #[serde(with = "level_serde")]
    pub verbosity: Level,
    /// level of the file log; `off` disables the file
    #[serde(with = "level_serde")]
    pub file_level: Level,
    /// created when missing; `~` is expanded
    pub logdir: String,
    /// `chrono` format string, e.g. `deptree-%Y%m%d.log`
    pub filename: String,
    /// `w` truncates, `a` appends, `n` picks the first unused `-<number>` suffix
    pub filemode: char,
    pub format: Format,
    pub use_stderr: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbosity: Level::Off,
            file_level: Level::Off,
            logdir: "./".to_string(),
            filename: "deptree-%Y%m%d.log".to_string(),
            filemode: 'a',
            format: Format::Full,
            use_stderr: true,
        }
    }
}

impl Config {
    pub fn is_discarded(&self) -> bool {
        match (self.verbosity, self.file_level) {
            (Level::Off, Level::Off) => true,
            _ => false,
        }
    }

    pub fn build(&self) -> Result<Logger, Error> {
        self.build_with_kv(o!())
    }

    pub fn build_with_kv<T>(&self, values: OwnedKV<T>) -> Result<Logger, Error>
    where
        T: SendSyncRefUnwindSafeKV + 'static,
    {
        self.build_at(values, Local::now())
    }

    /// Builds the logger, naming the log file after `time`.
    pub fn build_at<T, Tz: TimeZone>(
        &self,
        values: OwnedKV<T>,
        time: DateTime<Tz>,
    ) -> Result<Logger, Error>
    where
        T: SendSyncRefUnwindSafeKV + 'static,
        Tz::Offset: fmt::Display,
    {
        let terminal = Sink {
            stream: if self.use_stderr {
                Stream::StdErr
            } else {
                Stream::StdOut
            },
            level: self.verbosity,
            format: self.format,
        }
        .into_drain();
        let file = match self.file_level {
            Level::Off => None,
            level => Sink {
                stream: Stream::File(self.open_file(time)?),
                level,
                format: self.format,
            }
            .into_drain(),
        };
        let logger = match (terminal, file) {
            (Some(d1), Some(d2)) => Logger::root(Duplicate::new(d1, d2).fuse(), values),
            (Some(d), None) | (None, Some(d)) => Logger::root(d.fuse(), values),
            (None, None) => Logger::root(Discard, values),
        };
        Ok(logger)
    }

    fn open_file<Tz: TimeZone>(&self, time: DateTime<Tz>) -> Result<File, Error>
    where
        Tz::Offset: fmt::Display,
    {
        let mut options = OpenOptions::new();
        options.create(true).write(true);
        let numbering = match self.filemode {
            'w' => {
                options.truncate(true);
                false
            }
            'a' => {
                options.append(true);
                false
            }
            'n' => {
                options.truncate(true);
                true
            }
            mode => return Err(Error::InvalidOption(format!("file mode `{}`", mode))),
        };
        let path = resolve_filepath(&self.logdir, &self.filename, time, numbering)?;
        Ok(options.open(path)?)
    }
}

pub fn create_logger(config: &Config) -> Result<Logger, Error> {
    config.build()
}

/// Resolves the log file path inside `dir`, creating the directory when missing.
///
/// The stem of `filename` is expanded as a `chrono` format string. With `numbering`, the first
/// `<stem>-<number><ext>` that does not exist yet is returned.
pub fn resolve_filepath<P1: AsRef<Path>, P2: AsRef<Path>, Tz: TimeZone>(
    dir: P1,
    filename: P2,
    time: DateTime<Tz>,
    numbering: bool,
) -> Result<PathBuf, io::Error>
where
    Tz::Offset: fmt::Display,
{
    let dir = utils::path::expandtilde(dir);
    if !dir.is_dir() {
        fs::create_dir_all(&dir)?;
    }

    let filename = filename.as_ref();
    if filename.to_string_lossy().contains(MAIN_SEPARATOR) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "filename must not contain the separator",
        ));
    }
    let stem = filename
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid filename"))?;
    let stem = time.format(stem).to_string();
    let ext = filename
        .extension()
        .map(|s| format!(".{}", s.to_string_lossy()))
        .unwrap_or_default();

    if !numbering {
        return Ok(dir.join(format!("{}{}", stem, ext)));
    }
    let mut number = 0;
    loop {
        let path = dir.join(format!("{}-{}{}", stem, number, ext));
        if !path.exists() {
            return Ok(path);
        }
        number += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_discards() {
        let config = Config::default();
        assert!(config.is_discarded());
        let logger = config.build().unwrap();
        info!(logger, "discarded");
    }

    #[test]
    fn test_invalid_filemode() {
        let mut config = Config::default();
        config.file_level = Level::Info;
        config.filemode = 'x';
        match config.build() {
            Err(Error::InvalidOption(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("WARN").unwrap(), Level::Warning);
        assert_eq!(parse_level(" trace ").unwrap(), Level::Trace);
        assert_eq!(level_name(parse_level("crit").unwrap()), "critical");
        assert!(parse_level("loud").is_err());
    }
}
