/// How a catalog format renders and parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRule {
    /// RFC3339 with `Z` for a zero offset, so a UTC round trip is exact.
    Rfc3339,
    /// A chrono strftime pattern, used for both rendering and parsing.
    Pattern(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FormatDefinition {
    /// Stable id persisted in the `format` preference.
    pub id: &'static str,
    pub label: &'static str,
    pub rule: FormatRule,
}

pub const DEFAULT_FORMAT_ID: &str = "rfc3339";

pub static SUPPORTED_FORMATS: [FormatDefinition; 4] = [
    FormatDefinition {
        id: DEFAULT_FORMAT_ID,
        label: "RFC3339 (2006-01-02T15:04:05+07:00)",
        rule: FormatRule::Rfc3339,
    },
    FormatDefinition {
        id: "ruby-date",
        label: "Ruby date (Mon Jan 2 15:04:05 -0700 2006)",
        rule: FormatRule::Pattern("%a %b %-d %H:%M:%S %z %Y"),
    },
    FormatDefinition {
        id: "rfc822z",
        label: "RFC822Z (02 Jan 06 15:04 -0700)",
        rule: FormatRule::Pattern("%d %b %y %H:%M %z"),
    },
    FormatDefinition {
        id: "rfc1123z",
        label: "RFC1123Z (Mon, 02 Jan 2006 15:04:05 -0700)",
        rule: FormatRule::Pattern("%a, %d %b %Y %H:%M:%S %z"),
    },
];

pub fn format_by_id(format_id: &str) -> Option<&'static FormatDefinition> {
    SUPPORTED_FORMATS
        .iter()
        .find(|format| format.id == format_id)
}

/// Unknown ids (stale preference values) fall back to RFC3339.
pub fn format_or_default(format_id: &str) -> &'static FormatDefinition {
    format_by_id(format_id).unwrap_or(&SUPPORTED_FORMATS[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn format_ids_are_unique() {
        let mut seen = HashSet::new();
        for format in &SUPPORTED_FORMATS {
            assert!(seen.insert(format.id), "duplicate format id {}", format.id);
        }
    }

    #[test]
    fn rfc3339_is_the_default_and_first() {
        assert_eq!(SUPPORTED_FORMATS[0].id, DEFAULT_FORMAT_ID);
        assert_eq!(format_or_default("no-such-format").id, DEFAULT_FORMAT_ID);
        assert_eq!(format_or_default("rfc1123z").id, "rfc1123z");
    }
}
