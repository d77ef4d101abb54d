//! Application-level error type returned by every fallible library function.
//!
//! `AppError` groups failures by kind so the binary can report a diagnostic
//! and exit with a code that identifies what went wrong.

use std::path::PathBuf;

/// Top-level error for a conversion run.
///
/// None of these are recovered: the run stops at the first one and no output
/// file is written.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or conflicting selections, or an invalid management mode.
    #[error("{0}")]
    Validation(String),

    /// The directory-service query tool failed; the inner message carries its
    /// diagnostic output.
    #[error("{0}")]
    ExternalTool(String),

    /// Property-list bytes were malformed or did not have the expected shape.
    #[error("{0}")]
    Decode(String),

    /// A referenced input path does not exist on disk.
    #[error("no such file: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A generic I/O error; the inner [`std::io::Error`] is converted to a
    /// string at the boundary.
    #[error("{0}")]
    Io(String),

    /// The profile document could not be encoded or written.
    #[error("{0}")]
    Encode(String),
}

impl AppError {
    /// Process exit code for this error kind.
    ///
    /// `2` matches the code clap uses for usage errors, so every validation
    /// failure exits the same way regardless of where it was detected.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::ExternalTool(_) => 3,
            Self::Decode(_) => 4,
            Self::FileNotFound(_) | Self::Io(_) => 5,
            Self::Encode(_) => 6,
        }
    }
}

impl From<std::io::Error> for AppError {
    /// Convert an [`std::io::Error`] into an [`AppError::Io`].
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display_names_the_path() {
        let err = AppError::FileNotFound(PathBuf::from("/tmp/missing.plist"));
        assert_eq!(err.to_string(), "no such file: /tmp/missing.plist");
    }

    #[test]
    fn message_variants_display_their_message() {
        assert_eq!(
            AppError::Validation("bad mode".to_string()).to_string(),
            "bad mode"
        );
        assert_eq!(
            AppError::ExternalTool("dscl error: eDSRecordNotFound".to_string()).to_string(),
            "dscl error: eDSRecordNotFound"
        );
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let app_err = AppError::from(io_err);
        assert!(matches!(app_err, AppError::Io(_)));
        assert_eq!(app_err.exit_code(), 5);
    }

    #[test]
    fn exit_codes_are_non_zero_and_distinct_per_kind() {
        let codes = [
            AppError::Validation(String::new()).exit_code(),
            AppError::ExternalTool(String::new()).exit_code(),
            AppError::Decode(String::new()).exit_code(),
            AppError::FileNotFound(PathBuf::new()).exit_code(),
            AppError::Encode(String::new()).exit_code(),
        ];
        assert!(codes.iter().all(|&c| c != 0));
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
