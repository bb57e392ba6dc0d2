//! Capability contracts consumed by the engine.
//!
//! The core never talks to a UI, keyboard applet, or platform account
//! service directly. Callers hand in implementations of these traits; every
//! one of them has a usable default for headless operation.

use std::fs;
use std::io;
use std::path::Path;

use crate::{AccountId, TitleId};

/// One immediate child of a listed directory.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
}

/// List immediate children of a path, distinguishing files from subfolders.
pub trait DirectoryLister {
    fn list(&self, path: &Path) -> io::Result<Vec<EntryInfo>>;
}

/// Production lister backed by `std::fs`.
pub struct StdLister;

impl DirectoryLister for StdLister {
    fn list(&self, path: &Path) -> io::Result<Vec<EntryInfo>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let is_dir = entry.file_type()?.is_dir();
            out.push(EntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        Ok(out)
    }
}

/// Result of offering a text suggestion for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInputResult {
    Accepted(String),
    Cancelled,
}

/// Suggest/edit a short text string, e.g. a new backup slot name.
pub trait TextInput {
    /// Whether an interactive facility exists at all. When false the
    /// engine uses suggestions as-is and notes the fallback in its result.
    fn is_available(&self) -> bool;
    fn prompt(&self, suggestion: &str) -> TextInputResult;
}

/// The always-unavailable default.
pub struct NoTextInput;

impl TextInput for NoTextInput {
    fn is_available(&self) -> bool {
        false
    }

    fn prompt(&self, suggestion: &str) -> TextInputResult {
        TextInputResult::Accepted(suggestion.to_string())
    }
}

/// A decoded, displayable icon.
#[derive(Debug, Clone)]
pub struct Icon {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decode an image byte buffer into a displayable handle.
pub trait IconDecoder {
    fn decode(&self, bytes: &[u8]) -> Option<Icon>;
}

/// Decoder backed by the `image` crate. Title icons are TGA on disk, so a
/// failed format guess retries as TGA explicitly (TGA carries no magic).
pub struct ImageIconDecoder;

impl IconDecoder for ImageIconDecoder {
    fn decode(&self, bytes: &[u8]) -> Option<Icon> {
        let img = image::load_from_memory(bytes)
            .or_else(|_| image::load_from_memory_with_format(bytes, image::ImageFormat::Tga))
            .ok()?;
        let rgba = img.to_rgba8();
        Some(Icon {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }
}

/// Decoder that declines everything; scans still work, icons stay absent.
pub struct NoIconDecoder;

impl IconDecoder for NoIconDecoder {
    fn decode(&self, _bytes: &[u8]) -> Option<Icon> {
        None
    }
}

/// Per-account play statistics for one title.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayStats {
    pub play_time_minutes: u32,
    pub last_played: u32,
}

/// Map account ids to display names and play statistics.
///
/// `None` means the account slot is unknown; the catalog records zeros.
/// Never queried for the shared-save id.
pub trait AccountProvider {
    fn user_name(&self, id: AccountId) -> Option<String>;
    fn play_stats(&self, id: AccountId, title: TitleId) -> Option<PlayStats>;
}

/// Provider with no account service behind it.
pub struct NoAccounts;

impl AccountProvider for NoAccounts {
    fn user_name(&self, _id: AccountId) -> Option<String> {
        None
    }

    fn play_stats(&self, _id: AccountId, _title: TitleId) -> Option<PlayStats> {
        None
    }
}

/// Live state of the file currently being transferred, handed to the
/// frame hook after every copied chunk.
#[derive(Debug, Clone, Default)]
pub struct TransferProgress {
    pub current_file: String,
    pub in_transfer: bool,
}

/// "Render one frame" — the single cooperative yield point inside the
/// copy loop. Synchronous; copying resumes as soon as it returns.
pub trait FrameHook {
    fn frame(&self, progress: &TransferProgress);
}

/// Hook that draws nothing.
pub struct NoFrameHook;

impl FrameHook for NoFrameHook {
    fn frame(&self, _progress: &TransferProgress) {}
}

/// Best-effort flush of the storage volume containing `path` after a
/// restore. Failures are logged as warnings, never surfaced as errors.
pub trait VolumeFlusher {
    fn flush(&self, path: &Path) -> io::Result<()>;
}

/// No-op flusher for ordinary mounted filesystems, which expose no
/// user-space volume-flush primitive.
pub struct NoFlush;

impl VolumeFlusher for NoFlush {
    fn flush(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Bundle of every capability the engine consumes.
pub struct Providers {
    pub lister: Box<dyn DirectoryLister>,
    pub text_input: Box<dyn TextInput>,
    pub icons: Box<dyn IconDecoder>,
    pub accounts: Box<dyn AccountProvider>,
    pub frame: Box<dyn FrameHook>,
    pub flusher: Box<dyn VolumeFlusher>,
}

impl Default for Providers {
    fn default() -> Self {
        Providers {
            lister: Box::new(StdLister),
            text_input: Box::new(NoTextInput),
            icons: Box::new(ImageIconDecoder),
            accounts: Box::new(NoAccounts),
            frame: Box::new(NoFrameHook),
            flusher: Box::new(NoFlush),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_std_lister_discriminates_files_and_folders() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        File::create(tmp.path().join("file.bin")).unwrap();

        let mut entries = StdLister.list(tmp.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert!(!entries[0].is_dir); // file.bin
        assert!(entries[1].is_dir); // sub
    }

    #[test]
    fn test_std_lister_missing_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(StdLister.list(&tmp.path().join("absent")).is_err());
    }
}
