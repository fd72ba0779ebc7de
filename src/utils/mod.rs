pub mod build_info;
pub mod fs;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "bankviz=info";

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    init_tracing_with(None);
}

/// Initializes tracing, adding `directive` (e.g. `bankviz::storage=debug`) on top of `RUST_LOG`.
///
/// Only the first call installs a subscriber; later calls are no-ops.
pub fn init_tracing_with(directive: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        for raw in [Some(DEFAULT_DIRECTIVE), directive].into_iter().flatten() {
            match raw.parse() {
                Ok(parsed) => filter = filter.add_directive(parsed),
                Err(err) => eprintln!("ignoring log directive `{raw}`: {err}"),
            }
        }

        let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
    });
}
