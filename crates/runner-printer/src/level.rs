use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Severity of a printed line.
///
/// Variants are ordered from most to least verbose. A printer with
/// threshold `t` emits a line at level `l` only when `l >= t`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Threshold that lets every line through.
    All,
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
    /// Threshold that suppresses every line.
    Off,
}

impl Level {
    const NAMES: [(&'static str, Self); 8] = [
        ("all", Self::All),
        ("trace", Self::Trace),
        ("debug", Self::Debug),
        ("info", Self::Info),
        ("warn", Self::Warn),
        ("error", Self::Error),
        ("fatal", Self::Fatal),
        ("off", Self::Off),
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Level`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown level '{0}' (expected one of: all, trace, debug, info, warn, error, fatal, off)")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, level)| *level)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}
