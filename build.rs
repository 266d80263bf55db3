//! Embeds the release version into the `apipush` binary.
use std::process::Command;

fn main() {
    // Tagged release builds export APIPUSH_VERSION so `apipush --version` and
    // the log file header name the release; other builds use git describe.
    if let Ok(version) = std::env::var("APIPUSH_VERSION") {
        println!("cargo:rustc-env=APIPUSH_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=APIPUSH_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=APIPUSH_VERSION");
}
