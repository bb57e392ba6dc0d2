//! Title discovery and per-user bookkeeping.
//!
//! The catalog is rebuilt wholesale on every scan; there is no incremental
//! update. Metadata problems are never fatal — an unparseable title folder
//! is logged and skipped, and the scan moves on.

pub mod metadata;
pub mod sort;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::providers::{DirectoryLister, Icon, Providers};
use crate::{AccountId, Title, TitleId, COMMON_SAVE, NEW_SLOT_LABEL};

pub use sort::SortMode;

/// Subfolder name marking a shared/common save under a title's user area.
const COMMON_DIR: &str = "common";

/// Per-user title vectors plus the process-wide icon cache.
pub struct TitleCatalog {
    archive_root: PathBuf,
    titles: HashMap<AccountId, Vec<Title>>,
    icons: HashMap<TitleId, Icon>,
    sort_mode: SortMode,
}

impl TitleCatalog {
    pub fn new(archive_root: impl Into<PathBuf>) -> Self {
        TitleCatalog {
            archive_root: archive_root.into(),
            titles: HashMap::new(),
            icons: HashMap::new(),
            sort_mode: SortMode::default(),
        }
    }

    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    /// Rebuild the full catalog from the given storage roots.
    ///
    /// Each root holds one folder per title, containing `meta/meta.xml`,
    /// `meta/iconTex.tga` and per-user save trees under `user/`. Duplicate
    /// title ids across roots produce independent entries; they are only
    /// grouped by owning user, never merged.
    pub fn scan(&mut self, roots: &[PathBuf], settings: &Settings, providers: &Providers) {
        self.titles.clear();

        for root in roots {
            let entries = match providers.lister.list(root) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("couldn't list storage root {}: {}", root.display(), e);
                    continue;
                }
            };

            for entry in entries.iter().filter(|e| e.is_dir) {
                let title_dir = root.join(&entry.name);
                self.scan_title_folder(&title_dir, settings, providers);
            }
        }

        self.sort_all(settings);
    }

    fn scan_title_folder(&mut self, title_dir: &Path, settings: &Settings, providers: &Providers) {
        let meta_path = title_dir.join("meta").join("meta.xml");
        let meta_bytes = match fs::read(&meta_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("no metadata for save {}: {}", title_dir.display(), e);
                return;
            }
        };
        let meta = match metadata::parse_meta_xml(&meta_bytes) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!("skipping {}: {}", meta_path.display(), e);
                return;
            }
        };

        // The filter decision needs the parsed id, so metadata always
        // parses before the skip check
        if settings.filter(meta.id) {
            return;
        }

        // First writer wins; later folders with the same id reuse the cache
        if !self.icons.contains_key(&meta.id) {
            let icon_path = title_dir.join("meta").join("iconTex.tga");
            if let Ok(bytes) = fs::read(&icon_path) {
                if let Some(icon) = providers.icons.decode(&bytes) {
                    self.icons.insert(meta.id, icon);
                }
            }
        }

        let user_area = title_dir.join("user");
        let users = match providers.lister.list(&user_area) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("couldn't list {}: {}", user_area.display(), e);
                return;
            }
        };

        for user_entry in users.iter().filter(|e| e.is_dir) {
            let user_id = if user_entry.name == COMMON_DIR {
                COMMON_SAVE
            } else {
                match AccountId::from_str_radix(&user_entry.name, 16) {
                    Ok(id) => id,
                    Err(_) => {
                        tracing::debug!("skipping user folder {:?}", user_entry.name);
                        continue;
                    }
                }
            };

            let user_name = if user_id == COMMON_SAVE {
                String::new()
            } else {
                providers.accounts.user_name(user_id).unwrap_or_default()
            };

            let mut title = Title::new(
                meta.id,
                user_id,
                user_name,
                meta.name.clone(),
                meta.publisher.clone(),
                &self.archive_root,
            );
            title.source_path = user_area.join(&user_entry.name);

            // Shared saves carry no per-account statistics
            if user_id != COMMON_SAVE {
                if let Some(stats) = providers.accounts.play_stats(user_id, meta.id) {
                    title.play_time_minutes = stats.play_time_minutes;
                    title.last_played_timestamp = stats.last_played;
                }
            }

            if let Err(e) = fs::create_dir_all(&title.path) {
                tracing::warn!("couldn't create archive dir {}: {}", title.path.display(), e);
            }
            refresh_title(&mut title, settings, providers.lister.as_ref());

            self.titles.entry(user_id).or_default().push(title);
        }
    }

    /// Re-list archive slots for every title instance with this id, across
    /// all owning users.
    pub fn refresh(&mut self, id: TitleId, settings: &Settings, lister: &dyn DirectoryLister) {
        for titles in self.titles.values_mut() {
            for title in titles.iter_mut().filter(|t| t.id == id) {
                refresh_title(title, settings, lister);
            }
        }
    }

    pub fn titles_for(&self, user: AccountId) -> &[Title] {
        self.titles.get(&user).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, user: AccountId) -> usize {
        self.titles.get(&user).map_or(0, Vec::len)
    }

    pub fn get(&self, user: AccountId, index: usize) -> Option<&Title> {
        self.titles.get(&user).and_then(|v| v.get(index))
    }

    /// All user ids present in the catalog, common save last.
    pub fn users(&self) -> Vec<AccountId> {
        let mut out: Vec<AccountId> = self.titles.keys().copied().collect();
        out.sort_by_key(|&u| (u == COMMON_SAVE, u));
        out
    }

    pub fn icon(&self, id: TitleId) -> Option<&Icon> {
        self.icons.get(&id)
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// Re-sort every user's vector under the current mode.
    pub fn sort_all(&mut self, settings: &Settings) {
        for titles in self.titles.values_mut() {
            sort::sort_titles(titles, self.sort_mode, settings);
        }
    }

    /// Cycle the secondary sort key and re-sort immediately.
    pub fn rotate_sort_mode(&mut self, settings: &Settings) -> SortMode {
        self.sort_mode = self.sort_mode.next();
        self.sort_all(settings);
        self.sort_mode
    }

    /// Every discovered (hex id, name) pair, across all users. Handy for
    /// building filter/favorite pickers without walking the per-user map.
    pub fn complete_title_list(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for titles in self.titles.values() {
            for title in titles {
                map.insert(crate::strings::hex_id(title.id), title.name.clone());
            }
        }
        map
    }

    /// Drop all catalog state, releasing cached icons.
    pub fn clear(&mut self) {
        self.titles.clear();
        self.icons.clear();
    }
}

/// Clear and repopulate a title's slot lists.
///
/// Primary archive slots sort reverse-lexicographically so timestamp-named
/// folders read newest-first, then the creation placeholder is prepended.
/// Extra configured folders append afterwards in listing order, never
/// reordered relative to the primary listing.
pub fn refresh_title(title: &mut Title, settings: &Settings, lister: &dyn DirectoryLister) {
    title.saves.clear();
    title.full_save_paths.clear();

    match lister.list(&title.path) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .into_iter()
                .filter(|e| e.is_dir)
                .map(|e| e.name)
                .collect();
            names.sort_by(|a, b| b.cmp(a));

            title.saves.push(NEW_SLOT_LABEL.to_string());
            title.full_save_paths.push(PathBuf::from(NEW_SLOT_LABEL));
            for name in names {
                title.full_save_paths.push(title.path.join(&name));
                title.saves.push(name);
            }
        }
        Err(e) => {
            // Archive may simply not exist yet
            tracing::warn!(
                "couldn't list the archive directory for {}: {}",
                title.name,
                e
            );
        }
    }

    for folder in settings.additional_save_folders(title.id) {
        let entries = match lister.list(folder) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("couldn't list extra folder {}: {}", folder.display(), e);
                continue;
            }
        };
        for entry in entries.into_iter().filter(|e| e.is_dir) {
            title.full_save_paths.push(folder.join(&entry.name));
            title.saves.push(entry.name);
        }
    }
}
