//! Backup: copy a title's live save tree into a new or existing archive slot.

use std::fs;

use chrono::Local;

use crate::catalog::TitleCatalog;
use crate::config::Settings;
use crate::providers::{Providers, TextInputResult};
use crate::trees::{copy_directory, delete_folder_recursively, DestPermissions};
use crate::{strings, AccountId, OpOutcome, SelectionMode};

/// Back up the save at `title_index` in `user`'s vector into slot
/// `slot_index`. Slot 0 creates a new archive slot; any other index
/// overwrites the existing one.
///
/// A failed copy never leaves a half-written slot behind: the partial
/// destination is deleted before the failure is returned.
pub fn backup(
    catalog: &mut TitleCatalog,
    settings: &Settings,
    providers: &Providers,
    user: AccountId,
    title_index: usize,
    slot_index: usize,
    mode: SelectionMode,
) -> OpOutcome {
    let Some(title) = catalog.get(user, title_index).cloned() else {
        return OpOutcome::Failed {
            code: -1,
            message: "No such title.".to_string(),
        };
    };
    if slot_index >= title.saves.len() {
        return OpOutcome::Failed {
            code: -1,
            message: "No such backup slot.".to_string(),
        };
    }

    let is_new_slot = slot_index == 0;
    tracing::info!(
        "started backup of {}. title id: {}; user id: {:#x}",
        title.name,
        strings::hex_id(title.id),
        title.user_id
    );

    let suggestion = suggest_slot_name(providers, title.user_id);

    let mut keyboard_fallback = false;
    let chosen_name = match mode {
        SelectionMode::Batch => {
            if is_new_slot {
                suggestion
            } else {
                String::new()
            }
        }
        SelectionMode::Single => {
            if is_new_slot {
                if providers.text_input.is_available() {
                    match providers.text_input.prompt(&suggestion) {
                        TextInputResult::Accepted(text) => {
                            strings::remove_forbidden_characters(&text)
                        }
                        TextInputResult::Cancelled => {
                            tracing::info!("backup aborted by the user at the naming step");
                            return OpOutcome::Cancelled;
                        }
                    }
                } else {
                    keyboard_fallback = true;
                    suggestion
                }
            } else {
                String::new()
            }
        }
    };

    let dst = if is_new_slot {
        title.path.join(&chosen_name)
    } else {
        title.full_save_paths[slot_index].clone()
    };

    // Overwrites, and name collisions on creation, fully clear the
    // destination first
    if !is_new_slot || dst.exists() {
        if let Err(e) = delete_folder_recursively(providers.lister.as_ref(), &dst) {
            tracing::error!("couldn't clear {}: {}", dst.display(), e);
            return OpOutcome::Failed {
                code: e.code(),
                message: "Failed to delete the existing backup directory.".to_string(),
            };
        }
    }

    if let Err(e) = fs::create_dir_all(&dst) {
        tracing::error!("couldn't create {}: {}", dst.display(), e);
        return OpOutcome::Failed {
            code: e.raw_os_error().unwrap_or(-1),
            message: "Failed to create the backup directory.".to_string(),
        };
    }

    if let Err(e) = copy_directory(
        providers.lister.as_ref(),
        providers.frame.as_ref(),
        &title.source_path,
        &dst,
        DestPermissions::Inherit,
    ) {
        tracing::error!("backup copy into {} failed: {}", dst.display(), e);
        // Compensating delete of the partial slot
        if let Err(cleanup) = delete_folder_recursively(providers.lister.as_ref(), &dst) {
            tracing::error!("couldn't clean up partial backup: {}", cleanup);
        }
        return OpOutcome::Failed {
            code: e.code(),
            message: "Failed to backup save.".to_string(),
        };
    }

    // Every instance of this id sees the new slot immediately
    catalog.refresh(title.id, settings, providers.lister.as_ref());

    tracing::info!("backup succeeded");
    if keyboard_fallback {
        OpOutcome::CompletedWithNote {
            message: "Progress correctly saved to disk. No text-input facility was \
                      accessible; the suggested destination folder was used instead."
                .to_string(),
        }
    } else {
        OpOutcome::Completed {
            message: "Progress correctly saved to disk.".to_string(),
        }
    }
}

/// Suggested slot name: local date-time, plus the sanitized account name
/// when it can be represented at all.
fn suggest_slot_name(providers: &Providers, user_id: AccountId) -> String {
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let user_name = providers.accounts.user_name(user_id).unwrap_or_default();

    if user_name.is_empty() || strings::contains_invalid_char(&user_name) {
        stamp
    } else {
        format!(
            "{} {}",
            stamp,
            strings::remove_not_ascii(&strings::remove_accents(&user_name))
        )
    }
}
