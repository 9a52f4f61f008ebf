//! Diagnostic logging to standard error.

use std::io;

use fsimage_error::{FsImageError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber with `filter` (`EnvFilter` syntax).
///
/// Returns an error for an unparsable filter. A subscriber that is already
/// installed is left in place.
pub fn init(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter).map_err(|err| {
        FsImageError::invalid_argument(format!("invalid log filter `{filter}`: {err}"))
    })?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}
