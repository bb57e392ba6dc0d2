use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub mod backup;
pub mod catalog;
pub mod config;
pub mod context;
pub mod providers;
pub mod restore;
pub mod strings;
pub mod trees;

// Re-export the types callers touch on every operation
pub use catalog::{SortMode, TitleCatalog};
pub use config::Settings;
pub use context::SaveContext;
pub use providers::{
    AccountProvider, DirectoryLister, FrameHook, Icon, IconDecoder, PlayStats, Providers,
    StdLister, TextInput, TextInputResult, TransferProgress, VolumeFlusher,
};
pub use trees::TreeError;

/// 64-bit title identifier, stable across scans.
pub type TitleId = u64;

/// Persistent account identifier owning one save instance.
pub type AccountId = u32;

/// Reserved account id for saves not tied to an individual account.
pub const COMMON_SAVE: AccountId = 0xFFFF_FFFF;

/// Name of the reserved "create a new slot" entry at index 0 of every
/// title's save list. Backups against it create rather than overwrite.
pub const NEW_SLOT_LABEL: &str = "New...";

/// One save-data instance: a (title id, owning user) pairing.
///
/// Rebuilt wholesale on every catalog scan. `saves` and `full_save_paths`
/// are parallel arrays whose index 0 is always [`NEW_SLOT_LABEL`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Title {
    pub id: TitleId,
    pub user_id: AccountId,
    pub user_name: String,
    pub name: String,
    pub author: String,
    pub safe_name: String,
    /// (primary title, subtitle) split on a colon or parenthetical suffix.
    pub display_name: (String, String),
    /// Archive root for this title: backups dir + hex id + safe name.
    pub path: PathBuf,
    /// Live save location on the mounted storage root; set once at
    /// discovery time, immutable afterward.
    pub source_path: PathBuf,
    pub saves: Vec<String>,
    pub full_save_paths: Vec<PathBuf>,
    pub play_time_minutes: u32,
    pub last_played_timestamp: u32,
}

impl Title {
    /// Build a title record, deriving safe name, display name and archive
    /// path from the raw metadata name.
    pub fn new(
        id: TitleId,
        user_id: AccountId,
        user_name: String,
        name: String,
        author: String,
        archive_root: &Path,
    ) -> Self {
        let safe_name = strings::safe_name(&name, id);
        let display_name = strings::display_name_parts(&name);
        let path = archive_root.join(format!("{} {}", strings::hex_id(id), safe_name));

        Title {
            id,
            user_id,
            user_name,
            name,
            author,
            safe_name,
            display_name,
            path,
            source_path: PathBuf::new(),
            saves: Vec::new(),
            full_save_paths: Vec::new(),
            play_time_minutes: 0,
            last_played_timestamp: 0,
        }
    }

    /// Whether this is the shared/common save instance.
    pub fn is_common(&self) -> bool {
        self.user_id == COMMON_SAVE
    }

    /// Play time formatted as `H:MM hours`.
    pub fn play_time(&self) -> String {
        format!(
            "{}:{:02} hours",
            self.play_time_minutes / 60,
            self.play_time_minutes % 60
        )
    }
}

/// Whether a backup runs as part of a multi-title batch (suggested slot
/// names are used verbatim) or as a single interactive operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Single,
    Batch,
}

/// Outcome of one backup or restore operation.
///
/// Failures never cross this boundary as `Err`; every path returns a value.
/// User cancellation is a valid non-error outcome, distinct from failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    /// Operation finished cleanly.
    Completed { message: String },
    /// Operation finished, but with a caveat the caller should surface
    /// (e.g. no text-input facility, the suggested slot name was used).
    CompletedWithNote { message: String },
    /// Aborted by the user before any destination mutation.
    Cancelled,
    /// Hard failure with the surfaced I/O code.
    Failed { code: i32, message: String },
}

impl OpOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            OpOutcome::Completed { .. } | OpOutcome::CompletedWithNote { .. }
        )
    }

    pub fn message(&self) -> &str {
        match self {
            OpOutcome::Completed { message } | OpOutcome::CompletedWithNote { message } => message,
            OpOutcome::Cancelled => "Operation aborted by the user.",
            OpOutcome::Failed { message, .. } => message,
        }
    }
}

/// Fallback archive root (`<data dir>/savepoint/saves`) for callers that
/// don't supply one.
pub fn default_archive_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("savepoint")
        .join("saves")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_derives_archive_path() {
        let t = Title::new(
            0x0005000010100000,
            0x1234,
            "mii".into(),
            "Some Game".into(),
            "Some Publisher".into(),
            Path::new("/archive"),
        );
        assert_eq!(
            t.path,
            Path::new("/archive/0x0005000010100000 Some Game")
        );
        assert_eq!(t.display_name, ("Some Game".to_string(), String::new()));
    }

    #[test]
    fn test_unrepresentable_name_falls_back_to_hex_id() {
        let t = Title::new(
            0xABCD,
            COMMON_SAVE,
            String::new(),
            "ゼルダの伝説".into(),
            "任天堂".into(),
            Path::new("/archive"),
        );
        assert_eq!(t.safe_name, "0x000000000000ABCD");
        assert!(t.is_common());
    }

    #[test]
    fn test_play_time_formatting() {
        let mut t = Title::new(1, 2, String::new(), "A".into(), "B".into(), Path::new("/a"));
        t.play_time_minutes = 125;
        assert_eq!(t.play_time(), "2:05 hours");
    }
}
