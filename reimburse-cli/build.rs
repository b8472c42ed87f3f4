//! Stamps the git revision into `reimburse --version` long output.

use std::process::Command;

fn git_revision(repo_root: &str) -> Option<String> {
    let out = Command::new("git")
        .args(["-C", repo_root, "describe", "--always", "--dirty"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!rev.is_empty()).then_some(rev)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let repo_root = format!("{}/..", manifest_dir);
    let rev = git_revision(&repo_root).unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=REIMBURSE_BUILD_REV={}", rev);
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
