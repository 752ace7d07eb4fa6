//! Tracing subscriber setup.
//!
//! The filter comes from `SHOTLIST_LOG`, then `RUST_LOG`, then the verbosity
//! flag. Output goes to stderr so `--json` reports stay clean on stdout.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count when no env filter is set
fn directive_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "shotlist=debug,info",
        _ => "debug",
    }
}

fn filter(verbosity: u8) -> EnvFilter {
    let from_env = std::env::var(crate::config::ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|s| EnvFilter::try_new(s).ok());
    from_env.unwrap_or_else(|| EnvFilter::new(directive_for(verbosity)))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity))
        .with_target(verbosity > 0)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_for_verbosity() {
        assert_eq!(directive_for(0), "info");
        assert_eq!(directive_for(1), "shotlist=debug,info");
        assert_eq!(directive_for(5), "debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(0);
        init(2);
    }
}
