//! Explicitly constructed engine context.
//!
//! One `SaveContext` owns the settings store, the title catalog and the
//! capability providers for the life of the process — single-instance
//! semantics without hidden globals. Construction is cheap; teardown is
//! `Drop`.

use std::path::PathBuf;

use crate::backup;
use crate::catalog::{SortMode, TitleCatalog};
use crate::config::Settings;
use crate::providers::Providers;
use crate::restore;
use crate::{AccountId, OpOutcome, SelectionMode};

pub struct SaveContext {
    pub settings: Settings,
    pub catalog: TitleCatalog,
    pub providers: Providers,
}

impl SaveContext {
    /// `config_path` defaults to `config.json` inside the archive root,
    /// matching where the archive itself lives.
    pub fn new(
        archive_root: PathBuf,
        config_path: Option<PathBuf>,
        providers: Providers,
    ) -> Self {
        let config_path = config_path.unwrap_or_else(|| archive_root.join("config.json"));
        SaveContext {
            settings: Settings::load(config_path),
            catalog: TitleCatalog::new(archive_root),
            providers,
        }
    }

    /// Rebuild the catalog from the given storage roots.
    pub fn scan(&mut self, roots: &[PathBuf]) {
        self.catalog.scan(roots, &self.settings, &self.providers);
    }

    pub fn backup(
        &mut self,
        user: AccountId,
        title_index: usize,
        slot_index: usize,
        mode: SelectionMode,
    ) -> OpOutcome {
        backup::backup(
            &mut self.catalog,
            &self.settings,
            &self.providers,
            user,
            title_index,
            slot_index,
            mode,
        )
    }

    pub fn restore(&self, user: AccountId, title_index: usize, slot_index: usize) -> OpOutcome {
        restore::restore(&self.catalog, &self.providers, user, title_index, slot_index)
    }

    pub fn rotate_sort_mode(&mut self) -> SortMode {
        self.catalog.rotate_sort_mode(&self.settings)
    }
}
