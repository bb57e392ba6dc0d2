//! Persistent configuration: filters, favorites, extra save folders.
//!
//! The on-disk document is JSON and may have been hand-edited or written by
//! an older release, so loading never trusts it: every field is verified
//! independently and reset to its empty default on violation. Malformed
//! state self-heals; it never aborts startup.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::{strings, TitleId};

pub const CONFIG_VERSION: u64 = 4;

/// Loaded settings document plus the parsed id sets derived from it.
pub struct Settings {
    path: PathBuf,
    raw: Value,
    filter_ids: HashSet<TitleId>,
    favorite_ids: HashSet<TitleId>,
    additional_save_folders: HashMap<TitleId, Vec<PathBuf>>,
}

fn default_document() -> Value {
    json!({
        "version": CONFIG_VERSION,
        "filter": [],
        "favorites": [],
        "additional_save_folders": {},
    })
}

impl Settings {
    /// Load from `path`, seeding a default document if none exists and
    /// healing whatever is found. Always produces a valid store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut settings = Settings {
            path,
            raw: Value::Null,
            filter_ids: HashSet::new(),
            favorite_ids: HashSet::new(),
            additional_save_folders: HashMap::new(),
        };

        if !settings.path.exists() {
            settings.seed();
        }

        settings.raw = match fs::read(&settings.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or(Value::Null),
            Err(e) => {
                tracing::warn!("couldn't read {}: {}", settings.path.display(), e);
                Value::Null
            }
        };

        // Not an object, or predates the version field: treat as corrupt
        if !settings.raw.is_object() || settings.raw.get("version").is_none() {
            settings.seed();
            settings.raw = fs::read(&settings.path)
                .ok()
                .and_then(|b| serde_json::from_slice(&b).ok())
                .unwrap_or_else(default_document);
        }

        settings.validate();
        settings.parse();
        settings
    }

    /// Write the default template over whatever is at `path`.
    fn seed(&mut self) {
        self.raw = default_document();
        if let Err(e) = self.persist() {
            tracing::warn!("couldn't seed {}: {}", self.path.display(), e);
        }
    }

    /// Field-by-field repair. Any field missing or of the wrong type is
    /// reset to its empty default; an old version triggers a bump. The
    /// document is rewritten only if something changed.
    fn validate(&mut self) {
        let mut dirty = false;

        match self.raw.get("version").and_then(Value::as_u64) {
            Some(v) if v >= CONFIG_VERSION => {}
            _ => dirty = true,
        }

        if !self.raw.get("filter").map_or(false, Value::is_array) {
            self.raw["filter"] = json!([]);
            dirty = true;
        }
        if !self.raw.get("favorites").map_or(false, Value::is_array) {
            self.raw["favorites"] = json!([]);
            dirty = true;
        }
        if !self
            .raw
            .get("additional_save_folders")
            .map_or(false, Value::is_object)
        {
            self.raw["additional_save_folders"] = json!({});
            dirty = true;
        }

        // A single wrong-typed element poisons its whole field
        for key in ["filter", "favorites"] {
            let bad = self.raw[key]
                .as_array()
                .map_or(false, |a| a.iter().any(|v| !v.is_string()));
            if bad {
                self.raw[key] = json!([]);
                dirty = true;
            }
        }
        let bad_folders = self.raw["additional_save_folders"]
            .as_object()
            .map_or(false, |m| m.values().any(|v| !v.is_object()));
        if bad_folders {
            self.raw["additional_save_folders"] = json!({});
            dirty = true;
        }

        if dirty {
            self.raw["version"] = json!(CONFIG_VERSION);
            if let Err(e) = self.persist() {
                tracing::warn!("couldn't rewrite {}: {}", self.path.display(), e);
            }
        }
    }

    /// Rebuild the in-memory sets from the raw document. Hex-string ids
    /// that don't parse are skipped.
    pub fn parse(&mut self) {
        self.filter_ids.clear();
        self.favorite_ids.clear();
        self.additional_save_folders.clear();

        for key in ["filter", "favorites"] {
            let ids: Vec<TitleId> = self.raw[key]
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(Value::as_str)
                        .filter_map(parse_hex_id)
                        .collect()
                })
                .unwrap_or_default();
            match key {
                "filter" => self.filter_ids.extend(ids),
                _ => self.favorite_ids.extend(ids),
            }
        }

        if let Some(map) = self.raw["additional_save_folders"].as_object() {
            for (key, value) in map {
                let Some(id) = parse_hex_id(key) else {
                    tracing::debug!("skipping unparseable folder key {:?}", key);
                    continue;
                };
                let folders: Vec<PathBuf> = value
                    .get("folders")
                    .and_then(Value::as_array)
                    .map(|a| {
                        a.iter()
                            .filter_map(Value::as_str)
                            .map(PathBuf::from)
                            .collect()
                    })
                    .unwrap_or_default();
                self.additional_save_folders.insert(id, folders);
            }
        }
    }

    /// Persist the raw document. Mutating accessors do not autosave;
    /// callers decide when state hits the disk.
    pub fn save(&self) -> io::Result<()> {
        self.persist()
    }

    fn persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.raw)?)
    }

    pub fn filter(&self, id: TitleId) -> bool {
        self.filter_ids.contains(&id)
    }

    pub fn favorite(&self, id: TitleId) -> bool {
        self.favorite_ids.contains(&id)
    }

    /// Extra filesystem roots whose subfolders merge into the title's save
    /// list at refresh time. Empty if none are configured.
    pub fn additional_save_folders(&self, id: TitleId) -> &[PathBuf] {
        self.additional_save_folders
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_filtered(&mut self, id: TitleId, filtered: bool) {
        Self::set_membership(&mut self.raw["filter"], id, filtered);
        self.parse();
    }

    pub fn set_favorite(&mut self, id: TitleId, favorite: bool) {
        Self::set_membership(&mut self.raw["favorites"], id, favorite);
        self.parse();
    }

    fn set_membership(field: &mut Value, id: TitleId, present: bool) {
        let hex = strings::hex_id(id);
        let Some(array) = field.as_array_mut() else {
            return;
        };
        array.retain(|v| v.as_str() != Some(hex.as_str()));
        if present {
            array.push(json!(hex));
        }
    }

    pub fn version(&self) -> u64 {
        self.raw["version"].as_u64().unwrap_or(0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Value {
        &self.raw
    }
}

fn parse_hex_id(s: &str) -> Option<TitleId> {
    TitleId::from_str_radix(s.trim_start_matches("0x").trim_start_matches("0X"), 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn path_in(tmp: &TempDir) -> PathBuf {
        tmp.path().join("config.json")
    }

    #[test]
    fn test_missing_file_seeds_default() {
        let tmp = TempDir::new().unwrap();
        let s = Settings::load(path_in(&tmp));
        assert_eq!(s.version(), CONFIG_VERSION);
        assert!(path_in(&tmp).exists());
        assert!(!s.filter(0x1));
    }

    #[test]
    fn test_garbage_document_reseeds() {
        let tmp = TempDir::new().unwrap();
        fs::write(path_in(&tmp), "not json at all").unwrap();
        let s = Settings::load(path_in(&tmp));
        assert_eq!(s.version(), CONFIG_VERSION);
    }

    #[test]
    fn test_wrong_typed_field_resets_that_field_only() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            path_in(&tmp),
            r#"{"version": 4, "filter": "notanarray",
                "favorites": ["0x0000000000000005"],
                "additional_save_folders": {}}"#,
        )
        .unwrap();

        let s = Settings::load(path_in(&tmp));
        assert!(!s.filter(0x5));
        assert!(s.favorite(0x5)); // untouched sibling survives

        // And the persisted document was corrected
        let raw: Value =
            serde_json::from_slice(&fs::read(path_in(&tmp)).unwrap()).unwrap();
        assert!(raw["filter"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_bad_element_type_empties_whole_field() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            path_in(&tmp),
            r#"{"version": 4, "filter": ["0x0000000000000001", 7],
                "favorites": [], "additional_save_folders": {}}"#,
        )
        .unwrap();
        let s = Settings::load(path_in(&tmp));
        assert!(!s.filter(0x1));
    }

    #[test]
    fn test_old_version_is_bumped_without_resetting_data() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            path_in(&tmp),
            r#"{"version": 2, "filter": ["0x0000000000000009"],
                "favorites": [], "additional_save_folders": {}}"#,
        )
        .unwrap();
        let s = Settings::load(path_in(&tmp));
        assert_eq!(s.version(), CONFIG_VERSION);
        assert!(s.filter(0x9));
    }

    #[test]
    fn test_additional_folders_parse() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            path_in(&tmp),
            r#"{"version": 4, "filter": [], "favorites": [],
                "additional_save_folders": {
                    "0x0000000000000042": {"folders": ["/mnt/extra", "/mnt/more"]}
                }}"#,
        )
        .unwrap();
        let s = Settings::load(path_in(&tmp));
        assert_eq!(
            s.additional_save_folders(0x42),
            &[PathBuf::from("/mnt/extra"), PathBuf::from("/mnt/more")]
        );
        assert!(s.additional_save_folders(0x43).is_empty());
    }

    #[test]
    fn test_mutators_round_trip_through_document() {
        let tmp = TempDir::new().unwrap();
        let mut s = Settings::load(path_in(&tmp));
        s.set_filtered(0xAB, true);
        s.set_favorite(0xCD, true);
        s.save().unwrap();

        let reloaded = Settings::load(path_in(&tmp));
        assert!(reloaded.filter(0xAB));
        assert!(reloaded.favorite(0xCD));

        let mut again = reloaded;
        again.set_filtered(0xAB, false);
        assert!(!again.filter(0xAB));
    }
}
