use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use eframe::egui::{self, Align, Layout};
use serde_json::Value;

use crate::clipboard::{self, ClipboardHandle};
use crate::convert;
use crate::converter::Converter;
use crate::formats;
use crate::observable::Observable;
use crate::prefs::{PrefStore, PreferenceSync};
use crate::timezone::{self, Preset};

const THEME_SYSTEM: &str = "system";
const THEME_LIGHT: &str = "light";
const THEME_DARK: &str = "dark";
const USER_PRESETS_KEY: &str = "presets";

pub fn run_gui(prefs_path: PathBuf) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Timestamp converter")
            .with_inner_size([640.0, 420.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Timestamp converter",
        native_options,
        Box::new(move |cc| {
            let app = ConverterApp::new(cc, prefs_path)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch timestamp converter: {err}"))?;

    Ok(())
}

struct ConverterApp {
    converter: Converter,
    store: Rc<PrefStore>,
    theme: Observable<String>,
    applied_theme: Option<String>,
    user_presets: Vec<Preset>,
    preset_name: String,
    add_search: String,
    clipboard: ClipboardHandle,
    clipboard_rx: Receiver<DateTime<Utc>>,
    watch_flag: Arc<AtomicBool>,
    watch_checkbox: bool,
}

impl ConverterApp {
    /// Binds preferences (duplicate keys abort startup), restores the
    /// persisted visibility set, and spawns the clipboard watcher.
    fn new(cc: &eframe::CreationContext<'_>, prefs_path: PathBuf) -> Result<Self> {
        let store = Rc::new(PrefStore::open(prefs_path));
        let converter = Converter::new(Utc::now());
        let theme = Observable::new(String::from(THEME_SYSTEM));

        let sync = PreferenceSync::new(Rc::clone(&store));
        sync.bind_string("format", &converter.format, formats::DEFAULT_FORMAT_ID)?;
        sync.bind_string("theme", &theme, THEME_SYSTEM)?;
        sync.bind_id_list(
            "visibleTimezones",
            &converter.visible_zones,
            vec![timezone::id::LOCAL],
        )?;
        sync.bind_i64("preset", &converter.active_preset, timezone::NONE_PRESET_ID)?;
        sync.reserve(USER_PRESETS_KEY)?;

        converter.apply_visible_ids(&converter.visible_zones.get());

        let user_presets = match store
            .get(USER_PRESETS_KEY)
            .and_then(|value| value.as_str().map(String::from))
        {
            Some(text) => match timezone::deserialize_presets(&text) {
                Ok(presets) => presets,
                Err(err) => {
                    log::warn!("ignoring malformed user presets: {err}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        // epoch mirror read by the watcher thread
        let current_epoch = Arc::new(AtomicI64::new(converter.instant.get().timestamp()));
        {
            let epoch = Arc::clone(&current_epoch);
            let instant = converter.instant.clone();
            converter
                .instant
                .subscribe(move || epoch.store(instant.get().timestamp(), Ordering::Relaxed));
        }

        let watch_flag = Arc::new(AtomicBool::new(false));
        let (sender, clipboard_rx) = mpsc::channel();
        clipboard::spawn_watcher(
            Arc::clone(&watch_flag),
            current_epoch,
            sender,
            cc.egui_ctx.clone(),
        );

        Ok(Self {
            converter,
            store,
            theme,
            applied_theme: None,
            user_presets,
            preset_name: String::new(),
            add_search: String::new(),
            clipboard: ClipboardHandle::new(),
            clipboard_rx,
            watch_flag,
            watch_checkbox: false,
        })
    }

    fn apply_theme(&mut self, ctx: &egui::Context) {
        let theme = self.theme.get();
        if self.applied_theme.as_deref() == Some(theme.as_str()) {
            return;
        }
        let preference = match theme.as_str() {
            THEME_LIGHT => egui::ThemePreference::Light,
            THEME_DARK => egui::ThemePreference::Dark,
            _ => egui::ThemePreference::System,
        };
        ctx.set_theme(preference);
        self.applied_theme = Some(theme);
    }

    fn paste_clipboard(&self) {
        let Some(text) = self.clipboard.read_text() else {
            return;
        };
        match convert::parse_checked(text.trim()) {
            Ok(instant) => self
                .converter
                .set_instant_external(instant, "Updated to clipboard content"),
            Err(_) => self.converter.set_status("Invalid timestamp"),
        }
    }

    fn save_user_preset(&mut self) {
        let label = self.preset_name.trim().to_string();
        if label.is_empty() {
            return;
        }
        let id = timezone::LAST_BUILTIN_PRESET_ID + 1 + self.user_presets.len() as i64;
        self.user_presets.push(Preset {
            id,
            label,
            timezones: self.converter.visible_zones.get(),
        });
        self.preset_name.clear();
        match timezone::serialize_presets(&self.user_presets) {
            Ok(text) => self.store.set(USER_PRESETS_KEY, Value::String(text)),
            Err(err) => log::warn!("unable to serialize user presets: {err}"),
        }
        self.converter.set_status("Preset saved");
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Quit").clicked() {
                        ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Presets", |ui| {
                    let active = self.converter.active_preset.get();
                    for preset in timezone::builtin_presets() {
                        if ui
                            .selectable_label(active == preset.id, &preset.label)
                            .clicked()
                        {
                            self.converter.apply_preset(&preset);
                            ui.close_menu();
                        }
                    }
                    if !self.user_presets.is_empty() {
                        ui.separator();
                        for preset in &self.user_presets {
                            if ui
                                .selectable_label(active == preset.id, &preset.label)
                                .clicked()
                            {
                                self.converter.apply_preset(preset);
                                ui.close_menu();
                            }
                        }
                    }
                    ui.separator();
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.preset_name)
                                .hint_text("Preset name")
                                .desired_width(140.0),
                        );
                        if ui.button("Save current").clicked() {
                            self.save_user_preset();
                            ui.close_menu();
                        }
                    });
                });

                ui.menu_button("Format", |ui| {
                    let current = self.converter.format.get();
                    for format in &formats::SUPPORTED_FORMATS {
                        if ui
                            .selectable_label(current == format.id, format.label)
                            .clicked()
                        {
                            self.converter.set_format(format.id);
                            ui.close_menu();
                        }
                    }
                });

                ui.menu_button("Theme", |ui| {
                    let current = self.theme.get();
                    for (value, label) in [
                        (THEME_SYSTEM, "System"),
                        (THEME_LIGHT, "Light"),
                        (THEME_DARK, "Dark"),
                    ] {
                        if ui.selectable_label(current == value, label).clicked() {
                            self.theme.set(value.to_string());
                            ui.close_menu();
                        }
                    }
                });

                ui.menu_button("Help", |ui| {
                    ui.label(concat!("timestamp-converter v", env!("CARGO_PKG_VERSION")));
                });
            });
        });
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⟳ Now").clicked() {
                    self.converter.set_now();
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("📋 Paste").clicked() {
                        self.paste_clipboard();
                    }
                    if ui
                        .checkbox(&mut self.watch_checkbox, "Watch clipboard")
                        .changed()
                    {
                        self.watch_flag
                            .store(self.watch_checkbox, Ordering::Relaxed);
                    }
                    self.add_zone_entry(ui);
                });
            });
        });
    }

    fn add_zone_entry(&mut self, ui: &mut egui::Ui) {
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.add_search)
                .hint_text("Add timezone")
                .desired_width(180.0),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if submitted {
            if let Some(zone) = self.converter.search_hidden(&self.add_search).first().copied() {
                self.converter.add_zone(zone.id);
            }
            self.add_search.clear();
        }
    }

    fn status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(self.converter.status.get());
        });
    }

    fn zone_rows(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.add_search.is_empty() {
                let matches = self.converter.search_hidden(&self.add_search);
                ui.horizontal_wrapped(|ui| {
                    for zone in matches {
                        if ui.small_button(zone.label).clicked() {
                            self.converter.add_zone(zone.id);
                            self.add_search.clear();
                        }
                    }
                });
                ui.separator();
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    egui::Grid::new("zone_rows")
                        .num_columns(4)
                        .spacing([8.0, 6.0])
                        .show(ui, |ui| {
                            for row in self.converter.rows() {
                                if !row.visible.get() {
                                    continue;
                                }
                                let zone = row.zone;

                                let delete_clicked = ui
                                    .add_enabled(zone.deletable(), egui::Button::new("🗑"))
                                    .clicked();
                                ui.label(zone.label);

                                let changed = {
                                    let mut text = row.text.borrow_mut();
                                    let mut edit = egui::TextEdit::singleline(&mut *text)
                                        .desired_width(320.0);
                                    if !row.valid.get() {
                                        edit = edit.text_color(ui.visuals().error_fg_color);
                                    }
                                    ui.add(edit).changed()
                                };
                                let copy_clicked = ui.button("📋").clicked();
                                ui.end_row();

                                if changed {
                                    self.converter.handle_edit(zone.id);
                                }
                                if delete_clicked {
                                    self.converter.set_visible(zone.id, false);
                                }
                                if copy_clicked {
                                    let text = row.text.borrow().clone();
                                    if self.clipboard.write_text(&text) {
                                        self.converter.set_status("Copied to clipboard");
                                    }
                                }
                            }
                        });
                });
        });
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(candidate) = self.clipboard_rx.try_recv() {
            self.converter
                .set_instant_external(candidate, "Updated from clipboard");
        }

        self.apply_theme(ctx);
        self.menu_bar(ctx);
        self.toolbar(ctx);
        self.status_bar(ctx);
        self.zone_rows(ctx);

        ctx.request_repaint_after(Duration::from_millis(500));
    }
}
