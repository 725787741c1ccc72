//! Time source for the `dcterms:modified` stamp and archive entry times.

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};

/// Source of the packaging instant.
///
/// Packaging reads the clock exactly once, so every timestamp in one archive
/// agrees.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The host's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant, for reproducible output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Parse an RFC 3339 instant such as `2023-02-16T18:35:03Z`.
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        let instant = DateTime::parse_from_rfc3339(rfc3339)?;
        Ok(Self(instant.with_timezone(&Utc)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Format an instant for `dcterms:modified`: UTC, whole seconds, trailing `Z`.
pub fn modified_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert an instant to a zip entry time.
///
/// Zip times cannot represent dates before 1980 or after 2107; those fall
/// back to the zip epoch.
pub(crate) fn zip_timestamp(instant: DateTime<Utc>) -> zip::DateTime {
    let (Ok(year), Ok(month), Ok(day)) = (
        u16::try_from(instant.year()),
        u8::try_from(instant.month()),
        u8::try_from(instant.day()),
    ) else {
        return zip::DateTime::default();
    };
    zip::DateTime::from_date_and_time(
        year,
        month,
        day,
        instant.hour() as u8,
        instant.minute() as u8,
        instant.second() as u8,
    )
    .unwrap_or_default()
}
