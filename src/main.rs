//! `mcxtoprofile` — thin command-line wrapper around [`mcxtoprofile_lib`].
//!
//! Flags are parsed and merged with configuration-file defaults here; all
//! conversion logic lives in the library.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser};

use mcxtoprofile_lib::config::{self, Settings};
use mcxtoprofile_lib::convert::{self, ConvertRequest, IdentitySource, InputSource};
use mcxtoprofile_lib::directory::{DirectoryObject, DsclReader};
use mcxtoprofile_lib::error::AppError;
use mcxtoprofile_lib::profile::{ManageMode, OutputFormat};

/// Create Custom Settings Configuration Profiles from plist files and
/// Directory Services nodes.
#[derive(Parser, Debug)]
#[command(name = "mcxtoprofile", version)]
#[command(group(ArgGroup::new("source").required(true).args(["dsobject", "plist"])))]
#[command(group(
    ArgGroup::new("identity").required(true).args(["identifier", "identifier_from_profile"])
))]
struct Cli {
    /// Directory Services object from which to convert MCX data, e.g.
    /// /Local/Default/Computers/foo or /LDAPv3/some_ldap_server/ComputerGroups/bar.
    #[arg(short = 'd', long, value_name = "DSOBJECT")]
    dsobject: Option<String>,

    /// Path to a plist to be added as a profile payload. Can be specified
    /// multiple times.
    #[arg(short = 'p', long, value_name = "PLIST_FILE")]
    plist: Vec<PathBuf>,

    /// Top-level payload identifier, used to uniquely identify (and later
    /// remove) the profile.
    #[arg(short = 'i', long)]
    identifier: Option<String>,

    /// Existing .mobileconfig file from which to copy the identifier and UUID.
    #[arg(short = 'f', long, value_name = "PATH")]
    identifier_from_profile: Option<PathBuf>,

    /// Allow the profile to be removed.
    #[arg(short = 'r', long, overrides_with = "no_removal_allowed")]
    removal_allowed: bool,

    /// Disallow removal even if the configuration file allows it.
    #[arg(long, overrides_with = "removal_allowed")]
    no_removal_allowed: bool,

    /// Cosmetic name for the organization deploying the profile.
    #[arg(short = 'g', long)]
    organization: Option<String>,

    /// Output path. Defaults to '<identifier>.mobileconfig' in the current
    /// working directory.
    #[arg(short = 'o', long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Display name for the profile. Defaults to 'MCXToProfile: <first domain>'.
    #[arg(long)]
    displayname: Option<String>,

    /// Management frequency for plist payloads: Once, Often or Always.
    /// Defaults to Always.
    #[arg(short = 'm', long, value_name = "MODE", conflicts_with = "dsobject")]
    manage: Option<ManageMode>,

    /// Property-list encoding of the output file. Defaults to xml.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file with defaults for the options above.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _tracing_guard = mcxtoprofile_lib::init_tracing();

    match run(cli) {
        Ok(path) => {
            tracing::info!(path = %path.display(), "done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(error = ?err, "conversion failed");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<PathBuf, AppError> {
    let settings = config::load(cli.config.as_deref())?;
    let working_dir = std::env::current_dir()?;
    let request = build_request(cli, &settings, &working_dir)?;
    convert::run(&request, &DsclReader::default())
}

/// Merge flags over configuration defaults into a [`ConvertRequest`].
fn build_request(cli: Cli, settings: &Settings, working_dir: &Path) -> Result<ConvertRequest, AppError> {
    let source = match (cli.dsobject, cli.plist.is_empty()) {
        (Some(object), true) => InputSource::Directory(DirectoryObject::parse(&object)?),
        (None, false) => InputSource::Plists {
            paths: cli.plist,
            mode: match cli.manage {
                Some(mode) => mode,
                None => settings.manage_mode()?.unwrap_or_default(),
            },
        },
        _ => {
            return Err(AppError::Validation(
                "exactly one of '--dsobject' or '--plist' must be specified".to_string(),
            ))
        }
    };

    let identity = match (cli.identifier, cli.identifier_from_profile) {
        (Some(identifier), None) => IdentitySource::Explicit(identifier),
        (None, Some(path)) => IdentitySource::FromProfile(path),
        _ => {
            return Err(AppError::Validation(
                "exactly one of '--identifier' or '--identifier-from-profile' must be specified"
                    .to_string(),
            ))
        }
    };

    Ok(ConvertRequest {
        source,
        identity,
        removal_allowed: match (cli.removal_allowed, cli.no_removal_allowed) {
            (true, _) => true,
            (false, true) => false,
            (false, false) => settings.removal_allowed.unwrap_or(false),
        },
        organization: cli
            .organization
            .or_else(|| settings.organization.clone())
            .unwrap_or_default(),
        display_name: cli.displayname,
        output: cli.output,
        output_dir: settings
            .output_dir
            .clone()
            .unwrap_or_else(|| working_dir.to_path_buf()),
        format: cli.format.or(settings.format).unwrap_or_default(),
        revision: option_env!("MCXTOPROFILE_GIT_REVISION").map(str::to_string),
        source_root: None,
    })
}
