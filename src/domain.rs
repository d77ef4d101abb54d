//! Preference-domain inference from plist file names.
//!
//! A preference file is named after its domain (`com.apple.finder.plist`).
//! Per-machine ("ByHost") preferences carry an extra trailing component: the
//! literal `ByHost`, the Ethernet MAC address as 12 hex digits, or the
//! hardware UUID.

use std::path::Path;

/// Domain name and ByHost scoping derived from a plist file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfo {
    /// Preference domain with any ByHost component removed.
    pub name: String,
    /// `true` when the file name carried a ByHost component.
    pub is_byhost: bool,
}

/// Infer the preference domain from a plist path or bare file name.
///
/// Directory components and a single trailing `.plist` are stripped. If the
/// last dot-separated component of what remains marks a ByHost file, it is
/// removed and `is_byhost` is set.
pub fn infer_domain(path_or_name: &str) -> DomainInfo {
    let file_name = Path::new(path_or_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_or_name.to_string());
    let stem = file_name
        .strip_suffix(".plist")
        .unwrap_or(&file_name)
        .to_string();

    match stem.rsplit_once('.') {
        Some((domain, suffix)) if is_byhost_component(suffix) => DomainInfo {
            name: domain.to_string(),
            is_byhost: true,
        },
        _ => DomainInfo {
            name: stem,
            is_byhost: false,
        },
    }
}

/// `ByHost`, a 12-hex-digit MAC address, or a hyphenated hardware UUID.
fn is_byhost_component(component: &str) -> bool {
    component == "ByHost" || is_mac_address(component) || is_hardware_uuid(component)
}

fn is_mac_address(component: &str) -> bool {
    component.len() == 12 && component.chars().all(|c| c.is_ascii_hexdigit())
}

// A 36-character string only parses in the hyphenated 8-4-4-4-12 form.
fn is_hardware_uuid(component: &str) -> bool {
    component.len() == 36 && uuid::Uuid::try_parse(component).is_ok()
}
