use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// How a zone turns the shared instant into display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    /// The host machine's local zone.
    Local,
    /// A named IANA location; the zone database ships inside the binary.
    Named(Tz),
    /// A synthetic zone at a fixed offset east of UTC, in seconds.
    FixedOffset(i32),
    /// Pseudo-zone that always renders as decimal epoch-seconds.
    UnixEpoch,
}

#[derive(Debug, Clone, Copy)]
pub struct ZoneDefinition {
    /// Stable across releases; persisted preferences reference these ids.
    pub id: i64,
    pub label: &'static str,
    pub kind: ZoneKind,
}

impl ZoneDefinition {
    /// The local zone keeps its delete control disabled.
    pub fn deletable(&self) -> bool {
        !matches!(self.kind, ZoneKind::Local)
    }
}

pub mod id {
    pub const LOCAL: i64 = 0;
    pub const UNIX: i64 = 1;
    pub const HONOLULU: i64 = 2;
    pub const ANCHORAGE: i64 = 3;
    pub const LOS_ANGELES: i64 = 4;
    pub const PHOENIX: i64 = 5;
    pub const CHICAGO: i64 = 6;
    pub const NEW_YORK: i64 = 7;
    pub const GRENADA: i64 = 8;
    pub const LONDON: i64 = 9;
    pub const PARIS: i64 = 10;
    pub const HELSINKI: i64 = 11;
    pub const MOSCOW: i64 = 12;
    pub const KOLKATA: i64 = 13;
    pub const CHONGQING: i64 = 14;
    pub const SYDNEY: i64 = 15;
    pub const UTC: i64 = 16;
}

static ZONES: [ZoneDefinition; 17] = [
    ZoneDefinition {
        id: id::LOCAL,
        label: "Local",
        kind: ZoneKind::Local,
    },
    ZoneDefinition {
        id: id::UNIX,
        label: "Unix",
        kind: ZoneKind::UnixEpoch,
    },
    ZoneDefinition {
        id: id::HONOLULU,
        label: "HST (Hawaii), US",
        kind: ZoneKind::Named(Tz::Pacific__Honolulu),
    },
    ZoneDefinition {
        id: id::ANCHORAGE,
        label: "AKST/AKDT (Alaska), US",
        kind: ZoneKind::Named(Tz::America__Anchorage),
    },
    ZoneDefinition {
        id: id::LOS_ANGELES,
        label: "PST/PDT (Pacific), US",
        kind: ZoneKind::Named(Tz::America__Los_Angeles),
    },
    ZoneDefinition {
        id: id::PHOENIX,
        label: "MST (Mountain), US",
        kind: ZoneKind::Named(Tz::America__Phoenix),
    },
    ZoneDefinition {
        id: id::CHICAGO,
        label: "CST/CDT (Central), US",
        kind: ZoneKind::Named(Tz::America__Chicago),
    },
    ZoneDefinition {
        id: id::NEW_YORK,
        label: "EST/EDT (Eastern), US",
        kind: ZoneKind::Named(Tz::America__New_York),
    },
    ZoneDefinition {
        id: id::GRENADA,
        label: "AST (Atlantic), GD",
        kind: ZoneKind::Named(Tz::America__Grenada),
    },
    ZoneDefinition {
        id: id::LONDON,
        label: "GMT/BST (Greenwich), UK",
        kind: ZoneKind::Named(Tz::Europe__London),
    },
    ZoneDefinition {
        id: id::PARIS,
        label: "CET/CEST (Central Europe), France",
        kind: ZoneKind::Named(Tz::Europe__Paris),
    },
    ZoneDefinition {
        id: id::HELSINKI,
        label: "EET/EEST (Eastern Europe), Finland",
        kind: ZoneKind::Named(Tz::Europe__Helsinki),
    },
    ZoneDefinition {
        id: id::MOSCOW,
        label: "MSK (Moscow), Russia",
        kind: ZoneKind::Named(Tz::Europe__Moscow),
    },
    ZoneDefinition {
        id: id::KOLKATA,
        label: "IST (India), India",
        kind: ZoneKind::Named(Tz::Asia__Kolkata),
    },
    ZoneDefinition {
        id: id::CHONGQING,
        label: "CST (China), China",
        kind: ZoneKind::Named(Tz::Asia__Chongqing),
    },
    ZoneDefinition {
        id: id::SYDNEY,
        label: "AEST/AEDT (Australia), Australia",
        kind: ZoneKind::Named(Tz::Australia__Sydney),
    },
    ZoneDefinition {
        id: id::UTC,
        label: "UTC",
        kind: ZoneKind::Named(Tz::UTC),
    },
];

/// The full catalog, in display order.
pub fn zones() -> &'static [ZoneDefinition] {
    &ZONES
}

pub fn zone_by_id(zone_id: i64) -> Option<&'static ZoneDefinition> {
    ZONES.iter().find(|zone| zone.id == zone_id)
}

/// A named set of zone ids shown together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(skip)]
    pub id: i64,
    pub label: String,
    pub timezones: Vec<i64>,
}

/// Id 0 is reserved for the "no preset" state.
pub const NONE_PRESET_ID: i64 = 0;
pub const DEVELOPER_PRESET_ID: i64 = 1;
pub const US_PRESET_ID: i64 = 2;
pub const EUROPE_PRESET_ID: i64 = 3;
pub const US_EUROPE_PRESET_ID: i64 = 4;
pub const LAST_BUILTIN_PRESET_ID: i64 = US_EUROPE_PRESET_ID;

pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset {
            id: DEVELOPER_PRESET_ID,
            label: String::from("Developer"),
            timezones: vec![
                id::LOCAL,
                id::UNIX,
                id::UTC,
                id::LOS_ANGELES,
                id::CHICAGO,
                id::PARIS,
            ],
        },
        Preset {
            id: US_PRESET_ID,
            label: String::from("US"),
            timezones: vec![
                id::LOCAL,
                id::HONOLULU,
                id::ANCHORAGE,
                id::LOS_ANGELES,
                id::PHOENIX,
                id::CHICAGO,
                id::NEW_YORK,
                id::GRENADA,
            ],
        },
        Preset {
            id: EUROPE_PRESET_ID,
            label: String::from("Europe"),
            timezones: vec![
                id::LOCAL,
                id::LONDON,
                id::PARIS,
                id::HELSINKI,
                id::MOSCOW,
            ],
        },
        Preset {
            id: US_EUROPE_PRESET_ID,
            label: String::from("US & Europe"),
            timezones: vec![
                id::LOCAL,
                id::HONOLULU,
                id::ANCHORAGE,
                id::LOS_ANGELES,
                id::PHOENIX,
                id::CHICAGO,
                id::NEW_YORK,
                id::LONDON,
                id::PARIS,
                id::HELSINKI,
                id::MOSCOW,
            ],
        },
    ]
}

/// User presets travel through the preference store as a JSON string;
/// ids are reassigned above the built-in range on load.
pub fn serialize_presets(presets: &[Preset]) -> serde_json::Result<String> {
    serde_json::to_string(presets)
}

pub fn deserialize_presets(text: &str) -> serde_json::Result<Vec<Preset>> {
    let mut presets: Vec<Preset> = serde_json::from_str(text)?;
    for (index, preset) in presets.iter_mut().enumerate() {
        preset.id = LAST_BUILTIN_PRESET_ID + 1 + index as i64;
    }
    Ok(presets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_ids_are_unique_and_stable() {
        let mut seen = HashSet::new();
        for zone in zones() {
            assert!(seen.insert(zone.id), "duplicate zone id {}", zone.id);
        }
        // Persisted preferences depend on these values never moving.
        assert_eq!(zones()[0].id, id::LOCAL);
        assert_eq!(zones()[1].id, id::UNIX);
        assert_eq!(zones().last().map(|zone| zone.id), Some(id::UTC));
    }

    #[test]
    fn local_row_is_not_deletable() {
        let local = zone_by_id(id::LOCAL).expect("local zone");
        assert!(!local.deletable());
        let utc = zone_by_id(id::UTC).expect("utc zone");
        assert!(utc.deletable());
    }

    #[test]
    fn builtin_presets_reference_catalog_zones() {
        for preset in builtin_presets() {
            assert!(preset.id > NONE_PRESET_ID);
            assert!(preset.id <= LAST_BUILTIN_PRESET_ID);
            for zone_id in &preset.timezones {
                assert!(
                    zone_by_id(*zone_id).is_some(),
                    "preset '{}' references unknown zone {zone_id}",
                    preset.label
                );
            }
        }
    }

    #[test]
    fn user_presets_round_trip_with_fresh_ids() {
        let presets = vec![
            Preset {
                id: 99,
                label: String::from("Team"),
                timezones: vec![id::LOCAL, id::SYDNEY],
            },
            Preset {
                id: 7,
                label: String::from("Ops"),
                timezones: vec![id::LOCAL, id::UTC],
            },
        ];

        let encoded = serialize_presets(&presets).expect("serialize");
        let decoded = deserialize_presets(&encoded).expect("deserialize");

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].label, "Team");
        assert_eq!(decoded[0].timezones, vec![id::LOCAL, id::SYDNEY]);
        assert_eq!(decoded[0].id, LAST_BUILTIN_PRESET_ID + 1);
        assert_eq!(decoded[1].id, LAST_BUILTIN_PRESET_ID + 2);
    }
}
