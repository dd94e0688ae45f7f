use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::convert;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Best-effort clipboard for the UI thread's copy and paste buttons.
/// Construction failure (headless session, unsupported platform) disables
/// the feature without crashing.
pub struct ClipboardHandle {
    clipboard: RefCell<Option<arboard::Clipboard>>,
}

impl ClipboardHandle {
    pub fn new() -> Self {
        let clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                log::warn!("clipboard unavailable: {err}");
                None
            }
        };
        Self {
            clipboard: RefCell::new(clipboard),
        }
    }

    pub fn read_text(&self) -> Option<String> {
        let mut clipboard = self.clipboard.borrow_mut();
        clipboard
            .as_mut()?
            .get_text()
            .ok()
            .filter(|text| !text.is_empty())
    }

    pub fn write_text(&self, text: &str) -> bool {
        let mut clipboard = self.clipboard.borrow_mut();
        match clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(text.to_string()).is_ok(),
            None => false,
        }
    }
}

/// Decides whether clipboard content should move the shared instant:
/// parsable, in range, and different from the current value.
pub fn candidate_from_text(text: &str, current: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    let parsed = convert::parse_checked(text).ok()?;
    (parsed != current).then_some(parsed)
}

/// Spawns the watcher thread. Each cycle sleeps, re-checks the watch flag
/// (off makes the cycle a no-op, it never stops the thread), samples the
/// clipboard, and hands any candidate to the UI thread over the channel.
/// Exits when the receiver is dropped.
pub fn spawn_watcher(
    watch: Arc<AtomicBool>,
    current_epoch: Arc<AtomicI64>,
    sender: Sender<DateTime<Utc>>,
    ctx: eframe::egui::Context,
) {
    thread::spawn(move || {
        let mut clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => clipboard,
            Err(err) => {
                log::warn!("clipboard watcher disabled: {err}");
                return;
            }
        };

        loop {
            thread::sleep(POLL_INTERVAL);
            if !watch.load(Ordering::Relaxed) {
                continue;
            }
            let Ok(text) = clipboard.get_text() else {
                continue;
            };
            let Some(current) = DateTime::from_timestamp(current_epoch.load(Ordering::Relaxed), 0)
            else {
                continue;
            };
            if let Some(candidate) = candidate_from_text(&text, current) {
                if sender.send(candidate).is_err() {
                    return;
                }
                ctx.request_repaint();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(epoch: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(epoch, 0).expect("instant")
    }

    #[test]
    fn epoch_text_different_from_current_is_a_candidate() {
        let candidate = candidate_from_text("1700000000", instant(0)).expect("candidate");
        assert_eq!(candidate.timestamp(), 1_700_000_000);
    }

    #[test]
    fn matching_current_value_is_ignored() {
        assert!(candidate_from_text("1700000000", instant(1_700_000_000)).is_none());
    }

    #[test]
    fn garbage_and_empty_content_are_ignored() {
        assert!(candidate_from_text("", instant(0)).is_none());
        assert!(candidate_from_text("shopping list", instant(0)).is_none());
    }

    #[test]
    fn out_of_range_content_is_ignored() {
        assert!(candidate_from_text("-5", instant(0)).is_none());
    }

    #[test]
    fn rfc3339_content_is_accepted() {
        let candidate =
            candidate_from_text("2023-01-01T00:00:00Z", instant(0)).expect("candidate");
        assert_eq!(candidate.timestamp(), 1_672_531_200);
    }
}
