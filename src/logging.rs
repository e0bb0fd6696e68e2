use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `RUST_LOG`, when set, wins over `log_level`.
///
/// While the dashboard owns the terminal nothing is logged at all, since any
/// write to stderr would land on top of the frame.
pub fn setup_logging(log_level: Option<&str>, dashboard: bool) {
    let filter = if dashboard {
        EnvFilter::new(filter_directives(log_level, true))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level, false)))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn filter_directives(log_level: Option<&str>, dashboard: bool) -> String {
    if dashboard {
        return "off".to_string();
    }

    let level = match log_level.unwrap_or("info").to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    format!("reqwest=warn,{}", level)
}
