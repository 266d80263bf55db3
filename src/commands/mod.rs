//! Top-level command orchestration.
pub mod run;

pub use run::run;

/// Version string embedded at build time, falling back to the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("APIPUSH_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}
