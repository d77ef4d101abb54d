//! Atomic save and validated load for `.mobileconfig` profile documents.
//!
//! # Save
//! 1. Encode the [`ProfileDocument`] as an XML or binary property list into
//!    `<target>.tmp` (same directory → same filesystem as the final path).
//! 2. Atomically rename the temp file over the target.
//! On any failure the temp file is deleted and the original is left intact.
//!
//! # Load
//! Both encodings are accepted. [`read_profile_identity`] only needs the two
//! identity keys of an existing profile, so it tolerates documents this crate
//! did not write.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Deserialize;

use super::types::ProfileDocument;
use crate::error::AppError;

/// Property-list encoding of the written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Xml,
    Binary,
}

/// Identity of an existing profile, used to re-target it in place.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileIdentity {
    #[serde(rename = "PayloadIdentifier")]
    pub identifier: String,
    #[serde(rename = "PayloadUUID")]
    pub uuid: String,
}

/// Save `document` to `path` using an atomic write.
pub fn save(document: &ProfileDocument, path: &Path, format: OutputFormat) -> Result<(), AppError> {
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    if let Err(e) = write_document(document, &tmp_path, format) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        AppError::Encode(format!("rename to {} failed: {e}", path.display()))
    })?;

    tracing::info!(path = %path.display(), payloads = document.payload_content.len(), "profile written");
    Ok(())
}

/// Load a profile document written by [`save`].
pub fn load(path: &Path) -> Result<ProfileDocument, AppError> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.to_path_buf()));
    }
    plist::from_file(path)
        .map_err(|e| AppError::Decode(format!("cannot parse profile {}: {e}", path.display())))
}

/// Read `PayloadIdentifier` and `PayloadUUID` from the profile at `path`.
pub fn read_profile_identity(path: &Path) -> Result<ProfileIdentity, AppError> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.to_path_buf()));
    }
    plist::from_file(path).map_err(|e| {
        AppError::Decode(format!(
            "can't find a PayloadIdentifier and PayloadUUID in the profile at {}: {e}",
            path.display()
        ))
    })
}

/// Encode into `path` (the temp file location).
///
/// Separated from [`save`] so that cleanup on error is handled entirely by
/// the caller.
fn write_document(
    document: &ProfileDocument,
    path: &Path,
    format: OutputFormat,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Encode(format!("cannot create {}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);

    let encoded = match format {
        OutputFormat::Xml => plist::to_writer_xml(&mut writer, document),
        OutputFormat::Binary => plist::to_writer_binary(&mut writer, document),
    };
    encoded.map_err(|e| AppError::Encode(format!("cannot encode profile: {e}")))?;

    writer
        .flush()
        .map_err(|e| AppError::Encode(format!("cannot write {}: {e}", path.display())))
}
