//! Tracing setup shared by the delivery nodes and tools.
//!
//! Dora installs its own global subscriber, so nodes install theirs as the
//! thread default instead of fighting over the global slot.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Install a thread-local subscriber filtered by `RUST_LOG` (default `info`).
///
/// Keep the returned guard alive for as long as logging is needed,
/// usually for the whole of `main`.
///
/// ```no_run
/// use delivery_lib::init_tracing;
///
/// fn main() {
///     let _guard = init_tracing();
/// }
/// ```
pub fn init_tracing() -> DefaultGuard {
    init_tracing_with_default("info")
}

/// Same as [`init_tracing`], with a different fallback directive when
/// `RUST_LOG` is unset or unparsable.
pub fn init_tracing_with_default(default_directive: &str) -> DefaultGuard {
    use tracing_subscriber::layer::SubscriberExt;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(fmt_layer);

    tracing::subscriber::set_default(subscriber)
}
