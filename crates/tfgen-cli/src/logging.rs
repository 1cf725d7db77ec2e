use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes `tracing` logging with options from the environment variable
/// given in the `env` parameter, for example `TFGEN_LOG=debug`.
///
/// If the variable is not set, the maximum log level is set to INFO. Logs are
/// written to stderr, stdout is reserved for command output.
pub fn initialize_logging(env: &str) {
    let filter = match EnvFilter::try_from_env(env) {
        Ok(env_filter) => env_filter,
        _ => EnvFilter::new(tracing::Level::INFO.to_string()),
    };

    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    Registry::default().with(filter).with(fmt).init();
}
