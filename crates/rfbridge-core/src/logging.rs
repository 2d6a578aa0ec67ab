//! Tracing subscriber setup for binaries.

use crate::config::env_vars;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `rfbridge` crates log at info, or
/// debug when `verbose`. Set `RFBRIDGE_LOG_JSON=true` for JSON output.
/// Logs go to stderr so stdout stays machine readable. Calling this twice
/// is harmless: the second install is ignored.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "rfbridge={lvl},rfbridge_core={lvl},rfbridge_devices={lvl},warn",
            lvl = default_level
        ))
    });

    let result = if env_vars::log_json() {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .compact()
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }
}
