//! Tracing initialisation for runs.
//!
//! Console output is env-filtered (`RUST_LOG` wins); when a log directory is
//! given, the run also appends to a timestamped `run-<stamp>.log` so long
//! overnight audits leave something to read in the morning.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::result::{CartprobeError, CartprobeResult};

/// Install the global subscriber. Errors if a subscriber is already set.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> CartprobeResult<()> {
    let default_directives = if verbose { "cartprobe=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let console_layer = tracing_subscriber::fmt::layer().with_target(false);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let stamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S");
            let file = std::fs::File::create(dir.join(format!("run-{stamp}.log")))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CartprobeError::Logging {
            message: e.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_file_and_rejects_double_init() {
        let dir = tempfile::tempdir().unwrap();
        let first = init_logging(true, Some(dir.path()));
        if first.is_ok() {
            // exactly one run log was created
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        }
        // a second subscriber can never be installed
        assert!(init_logging(false, None).is_err());
    }
}
