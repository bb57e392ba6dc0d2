//! Restore: copy an archive slot back onto the live save location.

use std::fs;

use crate::catalog::TitleCatalog;
use crate::providers::Providers;
use crate::trees::{copy_directory, delete_folder_recursively, DestPermissions};
use crate::{strings, AccountId, OpOutcome};

/// File mode forced onto every restored file so the live save area stays
/// writable by the platform.
const LIVE_SAVE_FILE_MODE: u32 = 0o666;

/// Restore slot `slot_index` of the title at `title_index` in `user`'s
/// vector onto its live save path.
///
/// The live contents are fully deleted first; restore replaces, never
/// merges. A failure mid-copy leaves the partially written live area in
/// place (no compensating cleanup — the previous contents are already
/// gone, so the slot remains the only complete copy).
pub fn restore(
    catalog: &TitleCatalog,
    providers: &Providers,
    user: AccountId,
    title_index: usize,
    slot_index: usize,
) -> OpOutcome {
    let Some(title) = catalog.get(user, title_index) else {
        return OpOutcome::Failed {
            code: -1,
            message: "No such title.".to_string(),
        };
    };
    // Slot 0 is the creation placeholder, not a restorable archive
    if slot_index == 0 || slot_index >= title.saves.len() {
        return OpOutcome::Failed {
            code: -1,
            message: "No such backup slot.".to_string(),
        };
    }

    tracing::info!(
        "started restore of {}. title id: {}; user id: {:#x}",
        title.name,
        strings::hex_id(title.id),
        title.user_id
    );

    let src = &title.full_save_paths[slot_index];
    let dst = &title.source_path;

    if let Err(e) = delete_folder_recursively(providers.lister.as_ref(), dst) {
        tracing::error!("couldn't clear the live save {}: {}", dst.display(), e);
        return OpOutcome::Failed {
            code: e.code(),
            message: "Failed to delete save.".to_string(),
        };
    }

    if let Err(e) = fs::create_dir_all(dst) {
        tracing::error!("couldn't recreate {}: {}", dst.display(), e);
        return OpOutcome::Failed {
            code: e.raw_os_error().unwrap_or(-1),
            message: "Failed to recreate the save directory.".to_string(),
        };
    }

    if let Err(e) = copy_directory(
        providers.lister.as_ref(),
        providers.frame.as_ref(),
        src,
        dst,
        DestPermissions::Fixed(LIVE_SAVE_FILE_MODE),
    ) {
        tracing::error!(
            "restore copy {} -> {} failed: {}",
            src.display(),
            dst.display(),
            e
        );
        return OpOutcome::Failed {
            code: e.code(),
            message: "Failed to restore save.".to_string(),
        };
    }

    // Durability is best-effort; the copied bytes are already on disk
    if let Err(e) = providers.flusher.flush(dst) {
        tracing::warn!("volume flush after restore failed: {}", e);
    }

    tracing::info!("restore succeeded");
    OpOutcome::Completed {
        message: format!("{} has been restored successfully.", title.saves[slot_index]),
    }
}
