use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `TATAMI_LOG` selects the filter (default `info`), e.g.
/// `TATAMI_LOG=tatami_wm::reactor=debug`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("TATAMI_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
