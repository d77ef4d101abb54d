use mcxtoprofile_lib::convert::{self, ConvertRequest, IdentitySource, InputSource};
use mcxtoprofile_lib::directory::{DirectoryObject, DirectoryReader};
use mcxtoprofile_lib::error::AppError;
use mcxtoprofile_lib::profile::{ManageMode, OutputFormat};
use plist::{Dictionary, Value};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "mcxtoprofile_golden_{}_{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("create {dir:?}: {e}"));
    dir
}

/// Directory reader that must never be consulted.
struct NoDirectory;

impl DirectoryReader for NoDirectory {
    fn read_mcx_settings(&self, object: &DirectoryObject) -> Result<Value, AppError> {
        panic!("unexpected directory read of {object}");
    }
}

/// Directory reader serving one fixed attribute.
struct StaticDirectory(Value);

impl DirectoryReader for StaticDirectory {
    fn read_mcx_settings(&self, _object: &DirectoryObject) -> Result<Value, AppError> {
        Ok(self.0.clone())
    }
}

fn plist_request(paths: Vec<PathBuf>, mode: ManageMode, out_dir: &Path) -> ConvertRequest {
    ConvertRequest {
        source: InputSource::Plists { paths, mode },
        identity: IdentitySource::Explicit("com.example.test".to_string()),
        removal_allowed: false,
        organization: "Example Org".to_string(),
        display_name: None,
        output: None,
        output_dir: out_dir.to_path_buf(),
        format: OutputFormat::Xml,
        revision: None,
        source_root: None,
    }
}

fn dict(value: &Value) -> &Dictionary {
    value
        .as_dictionary()
        .unwrap_or_else(|| panic!("expected dictionary, got {value:?}"))
}

#[test]
fn dock_plist_forced_profile_matches_expected_shape() {
    let out_dir = scratch_dir("dock");
    let request = plist_request(
        vec![fixture("com.apple.dock.plist")],
        ManageMode::Always,
        &out_dir,
    );

    let written = convert::run(&request, &NoDirectory).expect("convert");
    let profile = Value::from_file(&written).expect("decode output");
    let _ = std::fs::remove_dir_all(&out_dir);

    let top = dict(&profile);
    assert_eq!(top.get("PayloadIdentifier"), Some(&Value::from("com.example.test")));
    assert_eq!(top.get("PayloadType"), Some(&Value::from("Configuration")));
    assert_eq!(top.get("PayloadScope"), Some(&Value::from("System")));
    assert_eq!(top.get("PayloadOrganization"), Some(&Value::from("Example Org")));
    assert_eq!(top.get("PayloadRemovalDisallowed"), Some(&Value::Boolean(true)));
    assert_eq!(
        top.get("PayloadDisplayName"),
        Some(&Value::from("MCXToProfile: com.apple.dock"))
    );

    let description = top
        .get("PayloadDescription")
        .and_then(Value::as_string)
        .expect("description");
    assert!(description.lines().any(|line| line == "com.apple.dock"));

    let entries = top
        .get("PayloadContent")
        .and_then(Value::as_array)
        .expect("payload array");
    assert_eq!(entries.len(), 1);

    let entry = dict(&entries[0]);
    assert_eq!(
        entry.get("PayloadType"),
        Some(&Value::from("com.apple.ManagedClient.preferences"))
    );
    assert_eq!(entry.get("PayloadEnabled"), Some(&Value::Boolean(true)));

    let mut settings = Dictionary::new();
    settings.insert("tilesize".to_string(), Value::from(48_i64));
    let mut wrapper = Dictionary::new();
    wrapper.insert(
        "mcx_preference_settings".to_string(),
        Value::Dictionary(settings),
    );
    let mut record = Dictionary::new();
    record.insert(
        "Forced".to_string(),
        Value::Array(vec![Value::Dictionary(wrapper)]),
    );
    let mut expected = Dictionary::new();
    expected.insert("com.apple.dock".to_string(), Value::Dictionary(record));

    assert_eq!(entry.get("PayloadContent"), Some(&Value::Dictionary(expected)));
}

#[test]
fn once_mode_stamps_every_payload_and_byhost_is_detected() {
    let out_dir = scratch_dir("once");
    let request = plist_request(
        vec![
            fixture("com.apple.dock.plist"),
            fixture("com.apple.screensaver.AA11BB22CC33.plist"),
        ],
        ManageMode::Once,
        &out_dir,
    );

    let written = convert::run(&request, &NoDirectory).expect("convert");
    let document = Value::from_file(&written).expect("decode output");
    let _ = std::fs::remove_dir_all(&out_dir);

    let top = dict(&document);
    let entries = top
        .get("PayloadContent")
        .and_then(Value::as_array)
        .expect("payload array");
    let domains: Vec<&String> = entries
        .iter()
        .flat_map(|entry| dict(entry).get("PayloadContent").map(dict))
        .flat_map(|body| body.keys())
        .collect();
    assert_eq!(domains, vec!["com.apple.dock", "com.apple.screensaver.ByHost"]);

    for entry in entries {
        let body = dict(dict(entry).get("PayloadContent").expect("content"));
        for record in body.values() {
            let wrappers = dict(record)
                .get("Set-Once")
                .and_then(Value::as_array)
                .expect("Set-Once record");
            assert!(matches!(
                dict(&wrappers[0]).get("mcx_data_timestamp"),
                Some(Value::Date(_))
            ));
        }
    }

    assert_eq!(
        top.get("PayloadDescription").and_then(Value::as_string),
        Some("Included custom settings:\ncom.apple.dock\ncom.apple.screensaver.ByHost\n")
    );
}

#[test]
fn retargeted_mcx_profile_keeps_deployed_identity() {
    let mut body = Dictionary::new();
    body.insert(
        "com.apple.loginwindow".to_string(),
        Value::Dictionary(Dictionary::new()),
    );
    let mut item = Dictionary::new();
    item.insert("mcx_application_data".to_string(), Value::Dictionary(body));
    let mut encoded = Vec::new();
    Value::Dictionary(item)
        .to_writer_xml(&mut encoded)
        .expect("encode MCX item");
    let reader = StaticDirectory(Value::Array(vec![Value::String(
        String::from_utf8(encoded).expect("utf8"),
    )]));

    let out_dir = scratch_dir("retarget");
    let request = ConvertRequest {
        source: InputSource::Directory(
            DirectoryObject::parse("/Local/Default/ComputerGroups/lab").expect("parse"),
        ),
        identity: IdentitySource::FromProfile(fixture("deployed.mobileconfig")),
        removal_allowed: true,
        organization: String::new(),
        display_name: Some("Lab Login Window".to_string()),
        output: None,
        output_dir: out_dir.clone(),
        format: OutputFormat::Binary,
        revision: None,
        source_root: None,
    };

    let written = convert::run(&request, &reader).expect("convert");
    let bytes = std::fs::read(&written).expect("read output");
    let document = Value::from_file(&written).expect("decode output");
    let _ = std::fs::remove_dir_all(&out_dir);

    assert_eq!(written.file_name().unwrap(), "com.example.lab.dock.mobileconfig");
    assert!(bytes.starts_with(b"bplist00"));

    let top = dict(&document);
    assert_eq!(
        top.get("PayloadUUID"),
        Some(&Value::from("5A6B7C8D-9E0F-4A1B-8C2D-3E4F5A6B7C8D"))
    );
    assert_eq!(
        top.get("PayloadIdentifier"),
        Some(&Value::from("com.example.lab.dock"))
    );
    assert_eq!(
        top.get("PayloadDisplayName"),
        Some(&Value::from("Lab Login Window"))
    );
    assert_eq!(top.get("PayloadRemovalDisallowed"), Some(&Value::Boolean(false)));

    let entries = top
        .get("PayloadContent")
        .and_then(Value::as_array)
        .expect("payload array");
    let entry_id = dict(&entries[0])
        .get("PayloadIdentifier")
        .and_then(Value::as_string)
        .expect("entry identifier");
    assert!(entry_id.starts_with(
        "com.example.lab.dock.5A6B7C8D-9E0F-4A1B-8C2D-3E4F5A6B7C8D.alacarte.customsettings."
    ));
}
