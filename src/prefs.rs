use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::observable::Observable;

#[derive(Debug, Error)]
pub enum PrefError {
    #[error("preference key '{0}' is already registered")]
    DuplicateKey(String),
}

/// JSON key-value preference file. Reads are best-effort: a missing or
/// unreadable file yields defaults. Every mutation writes the whole file.
pub struct PrefStore {
    path: PathBuf,
    values: RefCell<Map<String, Value>>,
}

impl PrefStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => map,
                Err(err) => {
                    log::warn!(
                        "ignoring malformed preferences file {}: {err}",
                        path.display()
                    );
                    Map::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => {
                log::warn!("unable to read preferences file {}: {err}", path.display());
                Map::new()
            }
        };
        Self {
            path,
            values: RefCell::new(values),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
        self.save();
    }

    fn save(&self) {
        let serialized = {
            let values = self.values.borrow();
            serde_json::to_string_pretty(&*values)
        };
        let result = serialized
            .map_err(std::io::Error::other)
            .and_then(|text| fs::write(&self.path, format!("{text}\n")));
        if let Err(err) = result {
            log::warn!(
                "unable to write preferences file {}: {err}",
                self.path.display()
            );
        }
    }
}

/// Binds observable cells to preference keys: the stored value (or the
/// fallback) seeds the cell, then every cell change is written back.
pub struct PreferenceSync {
    store: Rc<PrefStore>,
    keys: RefCell<HashSet<String>>,
}

impl PreferenceSync {
    pub fn new(store: Rc<PrefStore>) -> Self {
        Self {
            store,
            keys: RefCell::new(HashSet::new()),
        }
    }

    /// Claims a key for code that talks to the store directly, no cell.
    pub fn reserve(&self, key: &str) -> Result<(), PrefError> {
        self.claim(key)
    }

    pub fn bind_string(
        &self,
        key: &str,
        cell: &Observable<String>,
        fallback: &str,
    ) -> Result<(), PrefError> {
        self.claim(key)?;
        let initial = self
            .store
            .get(key)
            .and_then(|value| value.as_str().map(String::from))
            .unwrap_or_else(|| fallback.to_string());
        cell.set(initial);
        self.persist_on_change(key, cell, Value::String);
        Ok(())
    }

    pub fn bind_i64(
        &self,
        key: &str,
        cell: &Observable<i64>,
        fallback: i64,
    ) -> Result<(), PrefError> {
        self.claim(key)?;
        let initial = self
            .store
            .get(key)
            .and_then(|value| value.as_i64())
            .unwrap_or(fallback);
        cell.set(initial);
        self.persist_on_change(key, cell, |value| Value::Number(value.into()));
        Ok(())
    }

    pub fn bind_bool(
        &self,
        key: &str,
        cell: &Observable<bool>,
        fallback: bool,
    ) -> Result<(), PrefError> {
        self.claim(key)?;
        let initial = self
            .store
            .get(key)
            .and_then(|value| value.as_bool())
            .unwrap_or(fallback);
        cell.set(initial);
        self.persist_on_change(key, cell, Value::Bool);
        Ok(())
    }

    pub fn bind_id_list(
        &self,
        key: &str,
        cell: &Observable<Vec<i64>>,
        fallback: Vec<i64>,
    ) -> Result<(), PrefError> {
        self.claim(key)?;
        let initial = self
            .store
            .get(key)
            .and_then(|value| {
                value.as_array().map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_i64())
                        .collect::<Vec<i64>>()
                })
            })
            .unwrap_or(fallback);
        cell.set(initial);
        self.persist_on_change(key, cell, |ids| {
            Value::Array(ids.into_iter().map(|id| Value::Number(id.into())).collect())
        });
        Ok(())
    }

    fn claim(&self, key: &str) -> Result<(), PrefError> {
        if !self.keys.borrow_mut().insert(key.to_string()) {
            return Err(PrefError::DuplicateKey(key.to_string()));
        }
        Ok(())
    }

    fn persist_on_change<T: Clone + PartialEq + 'static>(
        &self,
        key: &str,
        cell: &Observable<T>,
        encode: impl Fn(T) -> Value + 'static,
    ) {
        let store = Rc::clone(&self.store);
        let key = key.to_string();
        let watched = cell.clone();
        cell.subscribe(move || store.set(&key, encode(watched.get())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> Rc<PrefStore> {
        Rc::new(PrefStore::open(dir.path().join("preferences.json")))
    }

    #[test]
    fn missing_file_yields_fallbacks() {
        let dir = tempdir().expect("tempdir");
        let sync = PreferenceSync::new(store_in(&dir));

        let format = Observable::new(String::new());
        let visible = Observable::new(Vec::new());
        sync.bind_string("format", &format, "rfc3339").expect("bind");
        sync.bind_id_list("visibleTimezones", &visible, vec![0])
            .expect("bind");

        assert_eq!(format.get(), "rfc3339");
        assert_eq!(visible.get(), vec![0]);
    }

    #[test]
    fn cell_changes_are_persisted_and_reloaded() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");

        {
            let sync = PreferenceSync::new(Rc::new(PrefStore::open(&path)));
            let format = Observable::new(String::new());
            let preset = Observable::new(0i64);
            let visible = Observable::new(Vec::new());
            sync.bind_string("format", &format, "rfc3339").expect("bind");
            sync.bind_i64("preset", &preset, 0).expect("bind");
            sync.bind_id_list("visibleTimezones", &visible, vec![0])
                .expect("bind");

            format.set(String::from("rfc1123z"));
            preset.set(3);
            visible.set(vec![0, 9, 16]);
        }

        let sync = PreferenceSync::new(Rc::new(PrefStore::open(&path)));
        let format = Observable::new(String::new());
        let preset = Observable::new(0i64);
        let visible = Observable::new(Vec::new());
        sync.bind_string("format", &format, "rfc3339").expect("bind");
        sync.bind_i64("preset", &preset, 0).expect("bind");
        sync.bind_id_list("visibleTimezones", &visible, vec![0])
            .expect("bind");

        assert_eq!(format.get(), "rfc1123z");
        assert_eq!(preset.get(), 3);
        assert_eq!(visible.get(), vec![0, 9, 16]);
    }

    #[test]
    fn duplicate_key_fails_without_breaking_the_first_binding() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        let sync = PreferenceSync::new(Rc::clone(&store));

        let first = Observable::new(String::new());
        sync.bind_string("format", &first, "rfc3339").expect("bind");

        let second = Observable::new(String::new());
        let err = sync
            .bind_string("format", &second, "rfc822z")
            .expect_err("duplicate key must fail");
        assert!(matches!(err, PrefError::DuplicateKey(key) if key == "format"));

        first.set(String::from("ruby-date"));
        assert_eq!(
            store.get("format").and_then(|v| v.as_str().map(String::from)),
            Some(String::from("ruby-date"))
        );
    }

    #[test]
    fn reserve_claims_a_key_for_direct_store_access() {
        let dir = tempdir().expect("tempdir");
        let sync = PreferenceSync::new(store_in(&dir));

        sync.reserve("presets").expect("reserve");
        assert!(matches!(
            sync.reserve("presets"),
            Err(PrefError::DuplicateKey(_))
        ));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{ not-valid-json ").expect("write");

        let store = PrefStore::open(&path);
        assert!(store.get("format").is_none());
    }
}
