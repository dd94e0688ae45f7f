use chrono::{DateTime, FixedOffset, Local, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

use crate::formats::{FormatDefinition, FormatRule, SUPPORTED_FORMATS};
use crate::timezone::{ZoneDefinition, ZoneKind};

/// Last representable second of year 9999 in the accepted range.
pub const MAX_EPOCH_SECONDS: i64 = 253_374_914_595;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unrecognized timestamp '{input}'")]
    Parse { input: String },
    #[error("timestamp {epoch} outside supported range")]
    OutOfRange { epoch: i64 },
}

/// Tries every catalog format in order, then a bare base-10 integer as
/// epoch-seconds. Enforces no bounds of its own; callers layer
/// [`check_epoch_range`] on top. Results are truncated to whole seconds,
/// the precision the shared instant carries.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, ConvertError> {
    let trimmed = text.trim();

    for format in &SUPPORTED_FORMATS {
        let parsed = match format.rule {
            FormatRule::Rfc3339 => DateTime::parse_from_rfc3339(trimmed),
            FormatRule::Pattern(pattern) => DateTime::parse_from_str(trimmed, pattern),
        };
        if let Ok(parsed) = parsed {
            let utc = parsed.with_timezone(&Utc);
            return Ok(DateTime::from_timestamp(utc.timestamp(), 0).unwrap_or(utc));
        }
    }

    if let Ok(epoch) = trimmed.parse::<i64>() {
        if let Some(parsed) = DateTime::from_timestamp(epoch, 0) {
            return Ok(parsed);
        }
    }

    Err(ConvertError::Parse {
        input: trimmed.to_string(),
    })
}

/// Non-negative epoch-seconds up to the end of year 9999. Applied by every
/// store-mutating path, not by the parser itself.
pub fn check_epoch_range(instant: DateTime<Utc>) -> Result<(), ConvertError> {
    let epoch = instant.timestamp();
    if (0..=MAX_EPOCH_SECONDS).contains(&epoch) {
        Ok(())
    } else {
        Err(ConvertError::OutOfRange { epoch })
    }
}

/// Parse plus range check, for the paths that mutate the shared instant.
pub fn parse_checked(text: &str) -> Result<DateTime<Utc>, ConvertError> {
    let instant = parse_timestamp(text)?;
    check_epoch_range(instant)?;
    Ok(instant)
}

/// Renders the instant for one zone. The Unix pseudo-zone always renders
/// decimal epoch-seconds and ignores the format.
pub fn format_in_zone(
    instant: DateTime<Utc>,
    zone: &ZoneDefinition,
    format: &FormatDefinition,
) -> String {
    match zone.kind {
        ZoneKind::UnixEpoch => instant.timestamp().to_string(),
        ZoneKind::Local => render(instant.with_timezone(&Local), format),
        ZoneKind::Named(tz) => render(instant.with_timezone(&tz), format),
        ZoneKind::FixedOffset(seconds) => match FixedOffset::east_opt(seconds) {
            Some(offset) => render(instant.with_timezone(&offset), format),
            None => render(instant, format),
        },
    }
}

fn render<Tz: TimeZone>(instant: DateTime<Tz>, format: &FormatDefinition) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match format.rule {
        FormatRule::Rfc3339 => instant.to_rfc3339_opts(SecondsFormat::Secs, true),
        FormatRule::Pattern(pattern) => instant.format(pattern).to_string(),
    }
}
