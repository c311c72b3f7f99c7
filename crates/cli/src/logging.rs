use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `RUST_LOG` wins over the flags.
pub fn init(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{default_level},hyper=warn,reqwest=warn,html5ever=warn,selectors=warn"
        ))
    });

    // Ignore an already-installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
