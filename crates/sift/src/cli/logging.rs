//! Tracing subscriber setup.
//!
//! `SIFT_LOG` takes directives in `EnvFilter` syntax (`sift_index=debug`).
//! Without it the level comes from `-v`: warnings by default, `-v` for info,
//! `-vv` for debug. Logs go to stderr so command output stays parseable.

use std::{env, io};

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding log directives.
pub const LOG_ENV: &str = "SIFT_LOG";

/// Maps the `-v` count to a default level.
fn level_for(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// Builds the filter: `SIFT_LOG` when set and valid, else the `-v` level.
fn env_filter(verbose: u8) -> EnvFilter {
    if let Ok(directives) = env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }
    EnvFilter::new(level_for(verbose).as_str().to_lowercase())
}

/// Installs the global subscriber. Call once, before loading configuration.
pub fn init(verbose: u8) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .without_time()
                .with_target(verbose > 1)
                .compact(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(1), Level::INFO);
        assert_eq!(level_for(5), Level::DEBUG);
    }
}
