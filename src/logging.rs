use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset. Other crates stay at `warn`.
pub fn default_directives(enable_debug: bool) -> String {
    let level = if enable_debug { "debug" } else { "info" };
    format!("warn,{}={}", env!("CARGO_CRATE_NAME"), level)
}

/// Installs the fmt subscriber and routes `log` records into `tracing`.
/// Repeated calls are ignored.
pub fn init_tracing(enable_debug: bool) {
    let _ = tracing_log::LogTracer::init();

    // --debug beats RUST_LOG
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) if !enable_debug => filter,
        _ => EnvFilter::new(default_directives(enable_debug)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(enable_debug)
        .with_thread_names(true)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_name_the_crate() {
        assert_eq!(default_directives(false), "warn,picframe=info");
        assert_eq!(default_directives(true), "warn,picframe=debug");
    }

    #[test]
    fn test_init_tracing_is_repeatable() {
        init_tracing(false);
        init_tracing(true);
        tracing::debug!("still alive after double init");
    }
}
