//! Migration versions, directions and filename parsing.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MigrateResult, MigrationError};

/// Minimum number of digits in a rendered version.
pub const MIN_VERSION_DIGITS: usize = 3;

static LEADING_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3,})").expect("valid version regex"));

/// A migration version.
///
/// Versions are compared as zero-padded strings so that 14-digit timestamps
/// sort correctly and never need to fit an integer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MigrationVersion(String);

impl MigrationVersion {
    /// Parse a run of digits, padding to three places.
    pub fn parse(raw: &str) -> MigrateResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MigrationError::InvalidVersionFormat(raw.to_string()));
        }
        Ok(Self(format!("{:0>width$}", raw, width = MIN_VERSION_DIGITS)))
    }

    /// Pad an integer version read from a tracking table.
    pub fn from_number(value: i64) -> MigrateResult<Self> {
        if value < 0 {
            return Err(MigrationError::InvalidVersionFormat(value.to_string()));
        }
        Ok(Self(format!("{:03}", value)))
    }

    /// Resolve a version from a bare version string or a migration filename.
    ///
    /// Any directory prefix is dropped, and the leading run of three or more
    /// digits in the basename is the version.
    pub fn extract(version_or_filename: &str) -> MigrateResult<Self> {
        let basename = Path::new(version_or_filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(version_or_filename);

        LEADING_VERSION
            .captures(basename)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| MigrationError::InvalidVersionFormat(version_or_filename.to_string()))
    }

    /// The padded version string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MigrationVersion {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MigrationVersion {
    type Error = MigrationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MigrationVersion> for String {
    fn from(version: MigrationVersion) -> Self {
        version.0
    }
}

/// Direction a migration runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply forward.
    Up,
    /// Revert.
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

impl FromStr for Direction {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(MigrationError::InvalidDirection(s.to_string())),
        }
    }
}

/// Builds the pattern matching `<version>_<name>.<ext>` filenames.
pub(crate) fn filename_pattern(extension: &str) -> Regex {
    let pattern = format!(r"^(\d{{3,}})_(.+)\.{}$", regex_lite::escape(extension));
    Regex::new(&pattern).expect("escaped extension forms a valid regex")
}

/// Split a migration filename into its version and name.
///
/// Returns `None` for anything that is not `<version>_<name>.<ext>` with a
/// non-empty name.
pub(crate) fn parse_filename(pattern: &Regex, filename: &str) -> Option<(MigrationVersion, String)> {
    let caps = pattern.captures(filename)?;
    let version = caps.get(1)?.as_str();
    let name = caps.get(2)?.as_str();
    if name.is_empty() {
        return None;
    }
    Some((MigrationVersion(version.to_string()), name.to_string()))
}
