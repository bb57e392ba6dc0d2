//! Directory tree copy/delete primitives shared by backup and restore.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::providers::{DirectoryLister, FrameHook, TransferProgress};

/// Chunk size for buffered file transfers. The frame hook runs once per
/// chunk so the presentation layer can redraw mid-copy.
pub const COPY_BUFFER_SIZE: usize = 512 * 1024;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("failed to list {path}: {source}")]
    List { path: PathBuf, source: io::Error },
    #[error("failed to create {path}: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to remove {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

impl TreeError {
    /// The surfaced numeric code: the OS errno when one exists, -1
    /// otherwise. Callers report it alongside the human-readable message.
    pub fn code(&self) -> i32 {
        self.io().raw_os_error().unwrap_or(-1)
    }

    fn io(&self) -> &io::Error {
        match self {
            TreeError::List { source, .. }
            | TreeError::Create { source, .. }
            | TreeError::Open { source, .. }
            | TreeError::Read { source, .. }
            | TreeError::Write { source, .. }
            | TreeError::Remove { source, .. } => source,
        }
    }
}

/// Permission handling for copied files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestPermissions {
    /// Whatever file creation yields (backup targets the archive area).
    Inherit,
    /// Force a fixed mode on every copied file (restore targets the live
    /// save area, which must stay writable by the platform).
    Fixed(u32),
}

/// Copy the entire tree under `src` into `dst`, depth-first, stopping at
/// the first error. `dst` must already exist. The frame hook fires after
/// every copied chunk with the current file name.
pub fn copy_directory(
    lister: &dyn DirectoryLister,
    frame: &dyn FrameHook,
    src: &Path,
    dst: &Path,
    perms: DestPermissions,
) -> Result<(), TreeError> {
    let entries = lister.list(src).map_err(|source| TreeError::List {
        path: src.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let new_src = src.join(&entry.name);
        let new_dst = dst.join(&entry.name);

        if entry.is_dir {
            fs::create_dir_all(&new_dst).map_err(|source| TreeError::Create {
                path: new_dst.clone(),
                source,
            })?;
            copy_directory(lister, frame, &new_src, &new_dst, perms)?;
        } else {
            copy_file(frame, &new_src, &new_dst, perms)?;
        }
    }

    Ok(())
}

/// Byte-for-byte buffered copy of a single file, yielding to the frame
/// hook between chunks. Not cancellable once started.
pub fn copy_file(
    frame: &dyn FrameHook,
    src: &Path,
    dst: &Path,
    perms: DestPermissions,
) -> Result<(), TreeError> {
    let mut reader = File::open(src).map_err(|source| TreeError::Open {
        path: src.to_path_buf(),
        source,
    })?;
    let mut writer = File::create(dst).map_err(|source| TreeError::Create {
        path: dst.to_path_buf(),
        source,
    })?;

    let mut progress = TransferProgress {
        current_file: src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        in_transfer: true,
    };

    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let count = reader.read(&mut buf).map_err(|source| TreeError::Read {
            path: src.to_path_buf(),
            source,
        })?;
        if count == 0 {
            break;
        }
        writer
            .write_all(&buf[..count])
            .map_err(|source| TreeError::Write {
                path: dst.to_path_buf(),
                source,
            })?;

        // let the presentation layer redraw between chunks
        frame.frame(&progress);
    }

    if let DestPermissions::Fixed(mode) = perms {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(dst, fs::Permissions::from_mode(mode));
        }
        #[cfg(not(unix))]
        let _ = mode;
    }

    progress.in_transfer = false;
    frame.frame(&progress);

    Ok(())
}

/// Depth-first recursive removal: subfolders first, leaf files, then the
/// now-empty folder itself. A path that is already gone is success; a path
/// that exists but cannot be listed is an error.
pub fn delete_folder_recursively(
    lister: &dyn DirectoryLister,
    path: &Path,
) -> Result<(), TreeError> {
    if !path.exists() {
        return Ok(());
    }

    let entries = lister.list(path).map_err(|source| TreeError::List {
        path: path.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let child = path.join(&entry.name);
        if entry.is_dir {
            delete_folder_recursively(lister, &child)?;
        } else {
            fs::remove_file(&child).map_err(|source| TreeError::Remove {
                path: child.clone(),
                source,
            })?;
        }
    }

    fs::remove_dir(path).map_err(|source| TreeError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{NoFrameHook, StdLister};
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_copy_directory_preserves_tree_and_bytes() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src.join("a.bin"), "alpha");
        write(&src.join("nested/deep/b.bin"), "beta");
        fs::create_dir_all(&dst).unwrap();

        copy_directory(&StdLister, &NoFrameHook, &src, &dst, DestPermissions::Inherit).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.bin")).unwrap(), "alpha");
        assert_eq!(
            fs::read_to_string(dst.join("nested/deep/b.bin")).unwrap(),
            "beta"
        );
    }

    #[test]
    fn test_copy_directory_missing_source_errors() {
        let tmp = TempDir::new().unwrap();
        let err = copy_directory(
            &StdLister,
            &NoFrameHook,
            &tmp.path().join("absent"),
            tmp.path(),
            DestPermissions::Inherit,
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::List { .. }));
        assert_ne!(err.code(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_fixed_permissions_applied_to_copies() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src.join("save.dat"), "data");
        fs::create_dir_all(&dst).unwrap();

        copy_directory(
            &StdLister,
            &NoFrameHook,
            &src,
            &dst,
            DestPermissions::Fixed(0o666),
        )
        .unwrap();

        let mode = fs::metadata(dst.join("save.dat")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
    }

    #[test]
    fn test_delete_folder_recursively() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("victim");
        write(&target.join("f1"), "x");
        write(&target.join("sub/f2"), "y");

        delete_folder_recursively(&StdLister, &target).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_delete_missing_path_is_success() {
        let tmp = TempDir::new().unwrap();
        assert!(delete_folder_recursively(&StdLister, &tmp.path().join("gone")).is_ok());
    }
}
