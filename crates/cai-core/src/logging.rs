use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a tracing subscriber that writes compact logs to stderr.
///
/// `RUST_LOG` selects the level when set; otherwise `default_level` is used.
pub fn init(default_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, info, warn};

    #[test]
    fn init_is_safe_to_repeat() {
        let _ = init("debug");
        assert!(init("info").is_err());

        debug!(kind = "google_storage_bucket", "Converted resource");
        info!("Conversion finished");
        warn!("duplicate asset");
    }
}
