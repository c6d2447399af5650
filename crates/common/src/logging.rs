use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Filtering comes from `RUST_LOG` (default `info`). Safe to call more
/// than once; a second call is a no-op instead of a panic, which matters
/// for tests that share a process.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }
}
