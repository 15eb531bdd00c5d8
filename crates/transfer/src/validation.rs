use std::path::{Component, Path};

use crate::TransferError;

/// Validates a stored file name before it is joined onto a local directory.
///
/// Rejects:
/// - Empty names
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Parent directory traversal (`..`)
/// - Windows prefix components (`C:`, `\\server`)
/// - Anything with more than one path component
pub fn validate_file_name(file_name: &str) -> Result<(), TransferError> {
    if file_name.is_empty() {
        return Err(TransferError::InvalidPath("empty file name".into()));
    }

    let path = Path::new(file_name);

    if path.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {file_name}"
        )));
    }

    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(TransferError::InvalidPath(format!(
                    "parent directory traversal not allowed: {file_name}"
                )));
            }
            Component::Prefix(_) => {
                return Err(TransferError::InvalidPath(format!(
                    "path prefix not allowed: {file_name}"
                )));
            }
            Component::RootDir => {
                return Err(TransferError::InvalidPath(format!(
                    "absolute path not allowed: {file_name}"
                )));
            }
            Component::CurDir => {}
            Component::Normal(_) => normal += 1,
        }
    }

    if normal != 1 {
        return Err(TransferError::InvalidPath(format!(
            "expected a bare file name: {file_name}"
        )));
    }

    Ok(())
}

/// Returns the basename of `path`, the key a file is stored under.
pub fn file_name_of(path: &Path) -> Result<String, TransferError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| TransferError::NotFound(path.display().to_string()))
}
