#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` wins when set; otherwise
/// `--verbose` turns on debug output for this crate. Safe to call twice.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "tubegrab=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialisation_is_harmless() {
        init_logging(false);
        init_logging(true);
        tracing::debug!("still running");
    }
}
