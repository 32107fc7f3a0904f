use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE: &str = "dining_nutrition";

/// Per-module defaults used when `RUST_LOG` is unset. Parser and fetcher
/// detail (strategy misses, request pacing) shows only with `--verbose`;
/// pipeline retries and give-ups are warnings either way.
fn default_directives(verbose: bool) -> String {
    if verbose {
        format!("{CRATE}=debug,{CRATE}::core::parser=trace,info")
    } else {
        format!(
            "{CRATE}=info,{CRATE}::core::parser=warn,{CRATE}::core::fetcher=warn,\
             {CRATE}::core::pipeline=info,warn"
        )
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Human output on stderr so stdout stays clean for JSON reports.
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// One JSON object per event, with the module target kept for filtering
/// by pipeline component downstream.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .json()
                .flatten_event(true),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for verbose in [false, true] {
            let directives = default_directives(verbose);
            assert!(EnvFilter::try_new(&directives).is_ok(), "{}", directives);
        }
        assert!(default_directives(false).contains("dining_nutrition::core::fetcher=warn"));
        assert!(default_directives(true).starts_with("dining_nutrition=debug"));
    }
}
