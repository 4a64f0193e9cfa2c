use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber based on environment variables.
///
/// `LOG_LEVEL` selects the default directive (`info` when unset) and
/// `LOG_FORMAT=json` switches to JSON output. Diagnostics go to stderr so the
/// CLI's report output on stdout stays clean.
pub fn init_subscriber() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "human".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log_level))
        .add_directive("hyper=warn".parse().expect("static directive"))
        .add_directive("reqwest=warn".parse().expect("static directive"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let subscriber = tracing_subscriber::registry().with(env_filter);

    if log_format == "json" {
        subscriber.with(fmt_layer.json()).init();
    } else {
        subscriber.with(fmt_layer).init();
    }
}
