use std::fmt;
use std::path::{Component, Path};

//===============
// Path Handling
//===============
#[derive(Debug, PartialEq, Eq)]
pub enum NameValidationError {
    Empty,
    NullByte,
    ContainsParentDir,
    AbsolutePath,
    NotSingleComponent,
    InvalidComponent,
}

impl fmt::Display for NameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameValidationError::Empty => write!(f, "name is empty"),
            NameValidationError::NullByte => write!(f, "name contains null byte"),
            NameValidationError::ContainsParentDir => {
                write!(f, "name contains parent directory (..)")
            }
            NameValidationError::AbsolutePath => write!(f, "name is an absolute path"),
            NameValidationError::NotSingleComponent => {
                write!(f, "name contains a path separator")
            }
            NameValidationError::InvalidComponent => write!(f, "name is not a plain file name"),
        }
    }
}

impl std::error::Error for NameValidationError {}

// Backslash is an ordinary character in Unix file names.
#[cfg(windows)]
const SEPARATORS: &[char] = &['/', '\\'];
#[cfg(not(windows))]
const SEPARATORS: &[char] = &['/'];

/// Validate a received file name before it touches the filesystem.
///
/// The receiver writes into one directory, so the name must be exactly one
/// normal path component.
pub fn validate_filename(name: &str) -> Result<(), NameValidationError> {
    if name.is_empty() {
        return Err(NameValidationError::Empty);
    }

    // rust uses C-style APIs so \0 can end str early
    if name.contains('\0') {
        return Err(NameValidationError::NullByte);
    }

    let mut components = Path::new(name).components();
    let first = components.next();
    let rest = components.next();

    match (first, rest) {
        (Some(Component::Normal(_)), None) if !name.contains(SEPARATORS) => Ok(()),
        (Some(Component::ParentDir), _) => Err(NameValidationError::ContainsParentDir),
        (Some(Component::RootDir), _) | (Some(Component::Prefix(_)), _) => {
            Err(NameValidationError::AbsolutePath)
        }
        (Some(Component::Normal(_)), _) => {
            if Path::new(name)
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                Err(NameValidationError::ContainsParentDir)
            } else {
                Err(NameValidationError::NotSingleComponent)
            }
        }
        _ => Err(NameValidationError::InvalidComponent),
    }
}
