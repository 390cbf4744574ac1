use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "A3LAUNCH_LOG";

/// Installs the stderr subscriber. `A3LAUNCH_LOG` overrides the level.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_keeps_first_subscriber() {
        init(false);
        init(true);
        tracing::info!("still logging");
    }
}
