use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{DateTime, Local, Utc};

use crate::convert::{self, ConvertError};
use crate::formats;
use crate::observable::Observable;
use crate::timezone::{self, Preset, ZoneDefinition};

/// One catalog zone's bound UI state; rows live for the process lifetime.
pub struct ZoneRow {
    pub zone: &'static ZoneDefinition,
    pub text: Rc<RefCell<String>>,
    pub valid: Rc<Cell<bool>>,
    pub visible: Observable<bool>,
}

/// Shared instant and format cells, one row per catalog zone, and the
/// wiring between them. Cells notify only on a real change and a row only
/// rewrites its text when the rendering differs, so the field-to-store and
/// store-to-field paths never feed back into each other.
pub struct Converter {
    pub instant: Observable<DateTime<Utc>>,
    pub format: Observable<String>,
    pub status: Observable<String>,
    pub visible_zones: Observable<Vec<i64>>,
    pub active_preset: Observable<i64>,
    rows: Vec<ZoneRow>,
}

impl Converter {
    pub fn new(now: DateTime<Utc>) -> Self {
        // whole seconds only
        let seed = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let instant = Observable::new(seed);
        let format = Observable::new(String::from(formats::DEFAULT_FORMAT_ID));
        let status = Observable::new(String::new());
        let visible_zones = Observable::new(Vec::new());
        let active_preset = Observable::new(timezone::NONE_PRESET_ID);

        let rows: Vec<ZoneRow> = timezone::zones()
            .iter()
            .map(|zone| ZoneRow {
                zone,
                text: Rc::new(RefCell::new(String::new())),
                valid: Rc::new(Cell::new(true)),
                visible: Observable::new(false),
            })
            .collect();

        for row in &rows {
            refresh_row_text(row.zone, &row.text, &instant, &format);

            let zone = row.zone;
            let text = Rc::clone(&row.text);
            let instant_cell = instant.clone();
            let format_cell = format.clone();
            let refresh: Rc<dyn Fn()> = Rc::new(move || {
                refresh_row_text(zone, &text, &instant_cell, &format_cell);
            });
            instant.subscribe_rc(Rc::clone(&refresh));
            format.subscribe_rc(refresh);
        }

        let memberships: Vec<(i64, Observable<bool>)> = rows
            .iter()
            .map(|row| (row.zone.id, row.visible.clone()))
            .collect();
        let visible_cell = visible_zones.clone();
        let recompute: Rc<dyn Fn()> = Rc::new(move || {
            let ids: Vec<i64> = memberships
                .iter()
                .filter(|(_, visible)| visible.get())
                .map(|(zone_id, _)| *zone_id)
                .collect();
            visible_cell.set(ids);
        });
        for row in &rows {
            row.visible.subscribe_rc(Rc::clone(&recompute));
        }

        let converter = Self {
            instant,
            format,
            status,
            visible_zones,
            active_preset,
            rows,
        };
        converter.set_status("Ready");
        converter
    }

    pub fn rows(&self) -> &[ZoneRow] {
        &self.rows
    }

    pub fn row(&self, zone_id: i64) -> Option<&ZoneRow> {
        self.rows.iter().find(|row| row.zone.id == zone_id)
    }

    pub fn set_status(&self, message: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        self.status.set(format!("[{stamp}]: {message}"));
    }

    /// Parses the row's current text into the instant cell. Invalid input
    /// never touches the store or the field text; it only clears the row's
    /// valid flag and reports on the status line.
    pub fn handle_edit(&self, zone_id: i64) {
        let Some(row) = self.row(zone_id) else {
            return;
        };
        let text = row.text.borrow().clone();
        match convert::parse_checked(&text) {
            Ok(parsed) => {
                row.valid.set(true);
                if self.instant.set(parsed) {
                    self.set_status("Timestamp updated");
                }
            }
            Err(err) => {
                row.valid.set(false);
                log::debug!("rejected edit in zone {zone_id}: {err}");
                self.set_status(match err {
                    ConvertError::Parse { .. } => "Invalid timestamp",
                    ConvertError::OutOfRange { .. } => "Timestamp out of range",
                });
            }
        }
    }

    pub fn set_now(&self) {
        let now = Utc::now();
        let truncated = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        if self.instant.set(truncated) {
            self.set_status("Updated to now");
        }
    }

    /// Store mutation from outside a field edit; the caller has already
    /// range-checked the value.
    pub fn set_instant_external(&self, instant: DateTime<Utc>, message: &str) {
        if self.instant.set(instant) {
            self.set_status(message);
        }
    }

    pub fn set_format(&self, format_id: &str) {
        self.format.set(format_id.to_string());
    }

    pub fn set_visible(&self, zone_id: i64, visible: bool) {
        if let Some(row) = self.row(zone_id) {
            row.visible.set(visible);
        }
    }

    pub fn apply_preset(&self, preset: &Preset) {
        for row in &self.rows {
            row.visible.set(false);
        }
        for row in &self.rows {
            if preset.timezones.contains(&row.zone.id) {
                row.visible.set(true);
            }
        }
        self.active_preset.set(preset.id);
        self.set_status(&format!("Preset {}", preset.label));
    }

    /// Startup restore. Unknown ids are ignored; when nothing matches, the
    /// local zone is forced on so at least one field is visible.
    pub fn apply_visible_ids(&self, ids: &[i64]) {
        for row in &self.rows {
            row.visible.set(ids.contains(&row.zone.id));
        }
        if !self.rows.iter().any(|row| row.visible.get()) {
            self.set_visible(timezone::id::LOCAL, true);
        }
    }

    pub fn search_hidden(&self, query: &str) -> Vec<&'static ZoneDefinition> {
        let needle = query.to_lowercase();
        self.rows
            .iter()
            .filter(|row| !row.visible.get())
            .filter(|row| row.zone.label.to_lowercase().contains(&needle))
            .map(|row| row.zone)
            .collect()
    }

    pub fn add_zone(&self, zone_id: i64) {
        if let Some(row) = self.row(zone_id) {
            if row.visible.set(true) {
                self.set_status(&format!("Added {}", row.zone.label));
            }
        }
    }
}

fn refresh_row_text(
    zone: &'static ZoneDefinition,
    text: &RefCell<String>,
    instant: &Observable<DateTime<Utc>>,
    format: &Observable<String>,
) {
    let format_def = formats::format_or_default(&format.get());
    let rendered = convert::format_in_zone(instant.get(), zone, format_def);
    let mut current = text.borrow_mut();
    if *current != rendered {
        *current = rendered;
    }
}
