//! Assembly of a [`ProfileDocument`] from preference trees and MCX payloads.
//!
//! [`ProfileBuilder`] owns the document being built and is its only mutation
//! surface. Finalizing consumes the builder, so nothing can be appended after
//! the document has been rendered.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use plist::Value;

use super::serialization::{self, OutputFormat};
use super::types::{
    management_record, ManageMode, PayloadContentBody, PayloadEntry, ProfileDocument,
    SettingsWrapper, PREFERENCES_PAYLOAD_TYPE, PROFILE_PAYLOAD_SCOPE, PROFILE_PAYLOAD_TYPE,
};
use crate::error::AppError;

/// Header line of every rendered `PayloadDescription`.
const DESCRIPTION_HEADER: &str = "Included custom settings:";

/// Prefix of the display name used when the caller supplies none.
const DISPLAY_NAME_PREFIX: &str = "MCXToProfile: ";

/// Number of revision characters quoted in the description.
const REVISION_CHARS: usize = 10;

/// Inputs for [`ProfileBuilder::new`].
#[derive(Debug, Clone, Default)]
pub struct ProfileOptions {
    /// Stable `PayloadIdentifier` of the document.
    pub identifier: String,
    /// Existing `PayloadUUID` to re-target; a fresh v4 UUID when `None`.
    pub uuid: Option<String>,
    pub removal_allowed: bool,
    pub organization: String,
    /// Explicit display name; defaulted from the first domain when `None`
    /// or empty.
    pub display_name: Option<String>,
    /// Revision to quote in the description, e.g. one captured when the
    /// binary was built. Takes precedence over `source_root`.
    pub revision: Option<String>,
    /// Source tree whose current git revision is quoted in the description.
    pub source_root: Option<PathBuf>,
}

/// Accumulates payload entries for one Configuration Profile.
#[derive(Debug)]
pub struct ProfileBuilder {
    identifier: String,
    uuid: String,
    removal_allowed: bool,
    organization: String,
    display_name: Option<String>,
    /// Contributing domains in append order; rendered into the description
    /// only when the document is finished.
    domains: Vec<String>,
    payloads: Vec<PayloadEntry>,
    revision: Option<String>,
}

impl ProfileBuilder {
    /// Start a new document.
    ///
    /// Unless `options.revision` is given, the git revision of
    /// `options.source_root` is looked up here; any failure just leaves it
    /// out of the description.
    pub fn new(options: ProfileOptions) -> Self {
        let uuid = options.uuid.unwrap_or_else(new_uuid);
        let revision = options
            .revision
            .filter(|revision| !revision.is_empty())
            .or_else(|| options.source_root.as_deref().and_then(discover_revision));
        let display_name = options.display_name.filter(|name| !name.is_empty());

        tracing::debug!(
            identifier = %options.identifier,
            uuid = %uuid,
            revision = ?revision,
            "profile builder created"
        );

        Self {
            identifier: options.identifier,
            uuid,
            removal_allowed: options.removal_allowed,
            organization: options.organization,
            display_name,
            domains: Vec::new(),
            payloads: Vec::new(),
            revision,
        }
    }

    /// The document's `PayloadUUID`.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Payload entries added so far.
    pub fn payloads(&self) -> &[PayloadEntry] {
        &self.payloads
    }

    /// Add one payload built from a decoded preference tree.
    ///
    /// `Always` maps to a "Forced" record, `Once` and `Often` to "Set-Once";
    /// only `Once` is stamped with the current time. A ByHost domain gets the
    /// `.ByHost` suffix.
    pub fn add_preferences(&mut self, tree: Value, domain: &str, mode: ManageMode, is_byhost: bool) {
        let domain = if is_byhost {
            format!("{domain}.ByHost")
        } else {
            domain.to_string()
        };

        let timestamp = match mode {
            ManageMode::Once => Some(plist::Date::from(SystemTime::from(chrono::Utc::now()))),
            ManageMode::Often | ManageMode::Always => None,
        };

        let mut body = PayloadContentBody::new();
        body.insert(
            domain,
            management_record(
                mode,
                SettingsWrapper {
                    settings: tree,
                    timestamp,
                },
            ),
        );
        self.append(body);
    }

    /// Add an already-shaped payload body, such as one flattened from an MCX
    /// attribute, without transforming it.
    pub fn add_mcx_payload(&mut self, body: PayloadContentBody) {
        self.append(body);
    }

    fn append(&mut self, body: PayloadContentBody) {
        let entry_uuid = new_uuid();
        let domains: Vec<String> = body.keys().cloned().collect();

        if self.display_name.is_none() {
            if let Some(first) = domains.first() {
                self.display_name = Some(format!("{DISPLAY_NAME_PREFIX}{first}"));
            }
        }

        tracing::debug!(domains = ?domains, entry_uuid = %entry_uuid, "adding payload");

        self.payloads.push(PayloadEntry {
            payload_version: 1,
            payload_identifier: payload_identifier(&self.identifier, &self.uuid, &entry_uuid),
            payload_uuid: entry_uuid,
            payload_enabled: true,
            payload_type: PREFERENCES_PAYLOAD_TYPE.to_string(),
            payload_content: body,
        });
        self.domains.extend(domains);
    }

    /// Render the description and return the finished document.
    pub fn finish(self) -> ProfileDocument {
        let description = render_description(&self.domains, self.revision.as_deref());
        ProfileDocument {
            payload_version: 1,
            payload_organization: self.organization,
            payload_uuid: self.uuid,
            payload_removal_disallowed: !self.removal_allowed,
            payload_type: PROFILE_PAYLOAD_TYPE.to_string(),
            payload_scope: PROFILE_PAYLOAD_SCOPE.to_string(),
            payload_description: description,
            payload_display_name: self.display_name.unwrap_or_default(),
            payload_identifier: self.identifier,
            payload_content: self.payloads,
        }
    }

    /// Finish the document and write it to `path`.
    pub fn finalize_and_save(self, path: &Path, format: OutputFormat) -> Result<(), AppError> {
        let document = self.finish();
        serialization::save(&document, path, format)
    }
}

/// `PayloadIdentifier` of a payload entry.
///
/// Embedding both UUIDs makes the identifier unique within the document and
/// across documents without keeping a registry.
pub fn payload_identifier(identifier: &str, document_uuid: &str, entry_uuid: &str) -> String {
    format!("{identifier}.{document_uuid}.alacarte.customsettings.{entry_uuid}")
}

/// Render `PayloadDescription`: a header, one line per domain and an
/// optional revision line separated by a blank line.
pub fn render_description(domains: &[String], revision: Option<&str>) -> String {
    let mut description = format!("{DESCRIPTION_HEADER}\n");
    for domain in domains {
        description.push_str(domain);
        description.push('\n');
    }
    if let Some(revision) = revision {
        let short: String = revision.chars().take(REVISION_CHARS).collect();
        description.push_str(&format!("\nGit revision: {short}"));
    }
    description
}

fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `git rev-parse HEAD` in `root`, if `root` is a git checkout.
fn discover_revision(root: &Path) -> Option<String> {
    if !root.join(".git").exists() {
        return None;
    }
    let output = match Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(root)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(error = %e, "git unavailable; omitting revision");
            return None;
        }
    };
    if !output.status.success() {
        tracing::debug!(status = %output.status, "git rev-parse failed; omitting revision");
        return None;
    }
    let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!revision.is_empty()).then_some(revision)
}
