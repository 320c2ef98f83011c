use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins over the built-in directives.
fn bench_filter(verbose: bool) -> EnvFilter {
    let directives = if verbose {
        "tabbench=debug,info"
    } else {
        "tabbench=info,warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

/// Compact human output. Verbose runs also show module targets and the
/// thread a line came from, which separates extraction workers from the
/// runtime.
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(bench_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_thread_names(verbose)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON lines, for runs whose logs are collected next to the CSV outputs.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(bench_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
