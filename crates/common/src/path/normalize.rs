// Working-copy path canonicalization: NFKC, traversal rejection, no git metadata.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum allowed path length in characters.
const MAX_PATH_CHARS: usize = 512;

/// Directory holding version-control metadata; never writable through notes.
const GIT_DIR: &str = ".git";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path exceeds maximum length of {MAX_PATH_CHARS} characters")]
    TooLong,

    #[error("path contains directory traversal component: {0}")]
    Traversal(String),

    #[error("path contains null byte")]
    NullByte,

    #[error("path points into repository metadata")]
    GitMetadata,

    #[error("path contains invalid component: {0}")]
    InvalidComponent(String),
}

/// Normalize a path relative to the working-copy root.
///
/// Rules:
/// - Apply Unicode NFKC normalization
/// - Convert all separators to `/` and collapse repeats
/// - Strip leading and trailing `/`
/// - Reject `.` and `..` components, null bytes and empty paths
/// - Reject any `.git` component
/// - Enforce max 512 character limit (after normalization)
pub fn normalize_path(input: &str) -> Result<String, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }

    if input.contains('\0') {
        return Err(PathError::NullByte);
    }

    let normalized: String = input.nfkc().collect();
    let unified = normalized.replace('\\', "/");
    let components: Vec<&str> = unified.split('/').filter(|s| !s.is_empty()).collect();

    if components.is_empty() {
        return Err(PathError::Empty);
    }

    for component in &components {
        match *component {
            "." | ".." => return Err(PathError::Traversal((*component).to_string())),
            GIT_DIR => return Err(PathError::GitMetadata),
            _ => {}
        }
        if component.trim().is_empty() {
            return Err(PathError::InvalidComponent("(whitespace-only component)".to_string()));
        }
    }

    let result = components.join("/");
    if result.chars().count() > MAX_PATH_CHARS {
        return Err(PathError::TooLong);
    }

    Ok(result)
}

/// Reduce a file extension to lower-case ASCII alphanumerics, at most 10 chars.
/// Returns `None` when nothing usable is left.
pub fn sanitize_extension(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('.')
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(10)
        .collect::<String>()
        .to_ascii_lowercase();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
