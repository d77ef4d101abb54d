use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap());
    let git_dir = manifest_dir.join(".git");

    // Revision of the checkout the binary is built from. Outside a git
    // checkout nothing is emitted and profiles carry no revision line.
    if let Some(revision) = head_revision(&manifest_dir) {
        println!("cargo:rustc-env=MCXTOPROFILE_GIT_REVISION={revision}");
    }

    // Incremental rebuild triggers.
    println!("cargo:rerun-if-changed=build.rs");
    if git_dir.is_dir() {
        println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
        if let Some(head_ref) = current_ref(&git_dir) {
            println!("cargo:rerun-if-changed={}", git_dir.join(head_ref).display());
        }
    }
}

fn head_revision(root: &Path) -> Option<String> {
    if !root.join(".git").exists() {
        return None;
    }
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(root)
        .output()
        .ok()?;
    if !output.status.success() {
        println!("cargo:warning=git rev-parse HEAD failed; building without a revision");
        return None;
    }
    let revision = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!revision.is_empty()).then_some(revision)
}

/// `refs/heads/<branch>` when HEAD is a symbolic ref.
fn current_ref(git_dir: &Path) -> Option<String> {
    let head = std::fs::read_to_string(git_dir.join("HEAD")).ok()?;
    head.strip_prefix("ref: ").map(|r| r.trim().to_string())
}
