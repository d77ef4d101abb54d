//! One conversion run: resolve identity, read the selected input source, build
//! the profile and write it.
//!
//! Input and identity selection are resolved by the caller into
//! [`InputSource`] and [`IdentitySource`] before [`run`] starts, so the
//! builder never needs to know where its payloads came from.
//!
//! # Error contract
//! Every failure is returned as an [`AppError`] before anything is written;
//! the output file only appears once all inputs were processed.

use std::path::{Path, PathBuf};

use plist::Value;

use crate::directory::{DirectoryObject, DirectoryReader};
use crate::domain::infer_domain;
use crate::error::AppError;
use crate::mcx::flatten_mcx_settings;
use crate::profile::serialization::read_profile_identity;
use crate::profile::{ManageMode, OutputFormat, ProfileBuilder, ProfileOptions};

/// Where payloads come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// The MCX settings of one directory object; each MCX item becomes one
    /// payload.
    Directory(DirectoryObject),
    /// One payload per plist file, all managed with the same mode.
    Plists { paths: Vec<PathBuf>, mode: ManageMode },
}

/// How the profile's identifier (and possibly UUID) is chosen.
#[derive(Debug, Clone)]
pub enum IdentitySource {
    /// A new profile with this identifier and a fresh UUID.
    Explicit(String),
    /// Copy identifier and UUID from an existing profile so the new document
    /// replaces it when installed.
    FromProfile(PathBuf),
}

/// Fully validated inputs of one run.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub source: InputSource,
    pub identity: IdentitySource,
    pub removal_allowed: bool,
    pub organization: String,
    pub display_name: Option<String>,
    /// Explicit output path; `<output_dir>/<identifier>.mobileconfig` if `None`.
    pub output: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    /// Revision quoted in the description; wins over `source_root`.
    pub revision: Option<String>,
    /// Source tree whose git revision is quoted in the description.
    pub source_root: Option<PathBuf>,
}

/// Execute `request` and return the path of the written profile.
pub fn run(request: &ConvertRequest, reader: &dyn DirectoryReader) -> Result<PathBuf, AppError> {
    let (identifier, uuid) = match &request.identity {
        IdentitySource::Explicit(identifier) => (identifier.clone(), None),
        IdentitySource::FromProfile(path) => {
            let identity = read_profile_identity(path)?;
            tracing::info!(
                identifier = %identity.identifier,
                uuid = %identity.uuid,
                "re-targeting existing profile"
            );
            (identity.identifier, Some(identity.uuid))
        }
    };

    if identifier.is_empty() {
        return Err(AppError::Validation(
            "profile identifier must not be empty".to_string(),
        ));
    }

    let output = request
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&request.output_dir, &identifier));

    let mut builder = ProfileBuilder::new(ProfileOptions {
        identifier,
        uuid,
        removal_allowed: request.removal_allowed,
        organization: request.organization.clone(),
        display_name: request.display_name.clone(),
        revision: request.revision.clone(),
        source_root: request.source_root.clone(),
    });

    match &request.source {
        InputSource::Plists { paths, mode } => {
            for path in paths {
                let tree = read_plist(path)?;
                let domain = infer_domain(&path.to_string_lossy());
                tracing::info!(
                    path = %path.display(),
                    domain = %domain.name,
                    byhost = domain.is_byhost,
                    "adding plist payload"
                );
                builder.add_preferences(tree, &domain.name, *mode, domain.is_byhost);
            }
        }
        InputSource::Directory(object) => {
            let attribute = reader.read_mcx_settings(object)?;
            let bodies = flatten_mcx_settings(&attribute)?;
            tracing::info!(object = %object, payloads = bodies.len(), "adding MCX payloads");
            for body in bodies {
                builder.add_mcx_payload(body);
            }
        }
    }

    builder.finalize_and_save(&output, request.format)?;
    Ok(output)
}

/// `<dir>/<identifier>.mobileconfig`.
pub fn default_output_path(dir: &Path, identifier: &str) -> PathBuf {
    dir.join(format!("{identifier}.mobileconfig"))
}

/// Decode a preference plist in either encoding.
fn read_plist(path: &Path) -> Result<Value, AppError> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.to_path_buf()));
    }
    Value::from_file(path).map_err(|e| {
        AppError::Decode(format!(
            "error decoding plist data in file {}: {e}",
            path.display()
        ))
    })
}
