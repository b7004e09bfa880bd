//! Process-wide logging setup shared by the binaries.

pub mod tracing;

pub use self::tracing::LogFormat;

/// Initialize JSON logging for the process.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::Json);
}

/// Initialize logging in the format named by `PIESTAND_LOG_FORMAT`
/// (`json` by default, `pretty` for local runs).
pub fn init_from_env() {
    let format = std::env::var("PIESTAND_LOG_FORMAT")
        .map(|value| LogFormat::parse(&value))
        .unwrap_or_default();
    tracing::init(format);
}
