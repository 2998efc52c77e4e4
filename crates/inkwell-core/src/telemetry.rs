use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::LogFormat;

/// Initialize tracing for a binary.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Calling this
/// twice is harmless (the second install is ignored).
pub fn init_tracing(default_filter: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(Format::default().compact().with_target(false)),
            )
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(format = ?format, "Tracing initialized");
    }
}
