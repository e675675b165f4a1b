// build.rs — Inject version + timestamp.
//
// On every compile:
// 1. Reads the package version cargo hands us (major.minor.patch)
// 2. Folds in RCICON_BUILD_NUMBER when CI provides one
// 3. Emits cargo:rustc-env directives so src/ can use env!() macros
//
// Env vars injected:
//   RCICON_VERSION_STRING  e.g. "0.1.42"
//   RCICON_VERSION_YEAR    e.g. "2026"
//   RCICON_BUILD_TIMESTAMP e.g. "Feb  9 2026 14:30"

use std::env;
use chrono::Local;





////////////////////////////////////////////////////////////////////////////////

struct Version {
    major: u32,
    minor: u32,
    build: u32,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl Display for Version
//
//  Formats the version as "major.minor.build".
//
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  read_version
//
//  Reads major, minor, and patch from the CARGO_PKG_VERSION_* variables.
//  A CI-supplied RCICON_BUILD_NUMBER replaces the patch number.
//
////////////////////////////////////////////////////////////////////////////////

fn read_version() -> Version {
    let number = |name: &str| -> u32 {
        env::var(name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    };



    let build = match env::var("RCICON_BUILD_NUMBER") {
        Ok(v) => v.trim().parse().unwrap_or(0),
        Err(_) => number("CARGO_PKG_VERSION_PATCH"),
    };

    Version {
        major: number("CARGO_PKG_VERSION_MAJOR"),
        minor: number("CARGO_PKG_VERSION_MINOR"),
        build,
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  build_timestamp
//
//  Returns the current local time formatted as a build timestamp string.
//
////////////////////////////////////////////////////////////////////////////////

fn build_timestamp() -> String {
    Local::now().format("%b %e %Y %H:%M").to_string()
}





////////////////////////////////////////////////////////////////////////////////
//
//  current_year
//
//  Returns the current year as a four-digit string.
//
////////////////////////////////////////////////////////////////////////////////

fn current_year() -> String {
    Local::now().format("%Y").to_string()
}





////////////////////////////////////////////////////////////////////////////////
//
//  emit_env_vars
//
//  Emits cargo:rustc-env directives for version, timestamp, and year.
//
////////////////////////////////////////////////////////////////////////////////

fn emit_env_vars(version: &Version, timestamp: &str, year: &str) {
    println!("cargo:rustc-env=RCICON_VERSION_STRING={version}");
    println!("cargo:rustc-env=RCICON_VERSION_YEAR={year}");
    println!("cargo:rustc-env=RCICON_BUILD_TIMESTAMP={timestamp}");
}





////////////////////////////////////////////////////////////////////////////////
//
//  main
//
//  Entry point: reads version and emits env vars.
//
////////////////////////////////////////////////////////////////////////////////

fn main() {
    let version   = read_version();
    let timestamp = build_timestamp();
    let year      = current_year();



    println!("cargo:rerun-if-env-changed=RCICON_BUILD_NUMBER");

    emit_env_vars(&version, &timestamp, &year);
}
