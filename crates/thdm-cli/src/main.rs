use tracing_subscriber::EnvFilter;

mod cli;

fn main() {
    init_logging();
    std::process::exit(cli::run_from_env());
}

/// Logs go to stderr so stdout stays parseable (summaries, point listings).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
