//! Tracing setup with optional span timing.
//!
//! Functions annotated with `#[instrument]` log their duration when their span
//! closes and `--timing` is on. Library crates log through `log`; those
//! records reach the same subscriber through the `tracing-log` bridge that
//! `init()` installs.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

fn default_level(verbose: bool, timing: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else if timing {
        // Span close events are logged at INFO level, so we need at least INFO
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Initialize tracing subscriber with optional timing output.
///
/// `RUST_LOG` still wins over the level picked from the flags.
pub fn init_tracing(verbose: bool, timing: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, timing).into())
        .from_env_lossy();

    let span_events = if timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_level(true)
                .with_span_events(span_events)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    // The subscriber is global, so only the level choice is tested here.
    #[test]
    fn verbose_wins_over_timing() {
        assert_eq!(default_level(true, true), LevelFilter::DEBUG);
        assert_eq!(default_level(false, true), LevelFilter::INFO);
        assert_eq!(default_level(false, false), LevelFilter::WARN);
    }
}
