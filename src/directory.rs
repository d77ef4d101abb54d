//! Directory Services access for MCX attribute data.
//!
//! [`DirectoryReader`] is the seam between the conversion pipeline and the
//! directory service; [`DsclReader`] implements it by running `dscl`.

use std::io::Cursor;
use std::process::Command;

use plist::Value;

use crate::error::AppError;

/// Path to the Directory Services command-line utility.
pub const DSCL_PATH: &str = "/usr/bin/dscl";

/// Attribute holding an object's MCX settings.
pub const MCX_SETTINGS_ATTRIBUTE: &str = "dsAttrTypeStandard:MCXSettings";

/// A fully qualified directory object, split into the node that hosts it and
/// its path within that node.
///
/// `/LDAPv3/ldap.example.com/ComputerGroups/lab` has node
/// `/LDAPv3/ldap.example.com` and object path `/ComputerGroups/lab`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryObject {
    pub node: String,
    pub object_path: String,
}

impl DirectoryObject {
    /// Split a fully qualified directory object path.
    pub fn parse(path: &str) -> Result<Self, AppError> {
        let invalid = || {
            AppError::Validation(format!(
                "invalid directory object '{path}'; expected /<node type>/<node name>/<record type>/<record name>"
            ))
        };

        if !path.starts_with('/') {
            return Err(invalid());
        }
        // splitn keeps the leading empty piece, so the node is the first two
        // named segments and everything after them is the object path.
        let mut parts = path.splitn(4, '/');
        let (_, node_type, node_name, rest) =
            (parts.next(), parts.next(), parts.next(), parts.next());
        match (node_type, node_name, rest) {
            (Some(node_type), Some(node_name), Some(rest))
                if !node_type.is_empty() && !node_name.is_empty() && !rest.is_empty() =>
            {
                Ok(Self {
                    node: format!("/{node_type}/{node_name}"),
                    object_path: format!("/{rest}"),
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl std::fmt::Display for DirectoryObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.node, self.object_path)
    }
}

/// Source of raw MCX attribute values.
pub trait DirectoryReader {
    /// Return the object's `MCXSettings` attribute, decoded one level: an
    /// array whose items are still individually encoded property lists.
    fn read_mcx_settings(&self, object: &DirectoryObject) -> Result<Value, AppError>;
}

/// [`DirectoryReader`] backed by the `dscl` utility.
#[derive(Debug, Clone)]
pub struct DsclReader {
    program: String,
}

impl Default for DsclReader {
    fn default() -> Self {
        Self {
            program: DSCL_PATH.to_string(),
        }
    }
}

impl DsclReader {
    /// Use a different `dscl` executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DirectoryReader for DsclReader {
    fn read_mcx_settings(&self, object: &DirectoryObject) -> Result<Value, AppError> {
        tracing::info!(node = %object.node, path = %object.object_path, "reading MCX settings");

        let output = Command::new(&self.program)
            .args([
                "-plist",
                object.node.as_str(),
                "read",
                object.object_path.as_str(),
                MCX_SETTINGS_ATTRIBUTE,
            ])
            .output()
            .map_err(|e| AppError::ExternalTool(format!("cannot run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(AppError::ExternalTool(format!(
                "dscl error: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        extract_mcx_attribute(object, &output.stdout)
    }
}

/// Pull the `MCXSettings` attribute out of `dscl -plist read` output.
pub fn extract_mcx_attribute(object: &DirectoryObject, stdout: &[u8]) -> Result<Value, AppError> {
    let decoded = Value::from_reader(Cursor::new(stdout)).map_err(|e| {
        AppError::Decode(format!(
            "could not decode plist data from dscl: {e}\n{}",
            String::from_utf8_lossy(stdout)
        ))
    })?;

    let attribute = match decoded {
        Value::Dictionary(mut dict) => dict.remove(MCX_SETTINGS_ATTRIBUTE),
        _ => None,
    };
    attribute.ok_or_else(|| {
        AppError::Decode(format!(
            "no MCX settings in {object}:\n{}",
            String::from_utf8_lossy(stdout)
        ))
    })
}
