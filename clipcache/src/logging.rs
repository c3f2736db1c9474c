//! Logging configuration and initialization.
//!
//! Both binaries log to stderr through `tracing`. The filter comes from, in order:
//! - `CLIPCACHE_LOG` (any `EnvFilter` directive string)
//! - `RUST_LOG`
//! - a preset chosen by `CLIPCACHE_DEBUG`

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Startup, shutdown, warnings
    #[default]
    Normal,
    /// Every capture decision
    Debug,
    /// Warnings and errors only
    Quiet,
}

/// Logging configuration built from the environment or CLI flags.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Explicit filter directives; take precedence over the preset
    pub directives: Option<String>,
}

impl LogConfig {
    /// Read `CLIPCACHE_DEBUG` / `CLIPCACHE_LOG`.
    pub fn from_env() -> Self {
        let preset = if std::env::var("CLIPCACHE_DEBUG")
            .map(|v| crate::daemon::config::parse_bool(&v).unwrap_or(false))
            .unwrap_or(false)
        {
            LogPreset::Debug
        } else {
            LogPreset::Normal
        };

        let directives = std::env::var("CLIPCACHE_LOG")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self { preset, directives }
    }

    /// Build an EnvFilter from this configuration.
    pub fn build_filter(&self) -> EnvFilter {
        if let Some(directives) = &self.directives {
            if let Ok(filter) = EnvFilter::try_new(directives) {
                return filter;
            }
        }

        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        let directive = match self.preset {
            LogPreset::Normal => "clipcache=info,clipcached=info,clipctl=info",
            LogPreset::Debug => "clipcache=debug,clipcached=debug,clipctl=debug",
            LogPreset::Quiet => "clipcache=warn,clipcached=warn,clipctl=warn",
        };
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize the tracing subscriber with the given configuration.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    // try_init: tests and repeated calls must not panic on an installed subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_directives_win() {
        let config = LogConfig {
            preset: LogPreset::Quiet,
            directives: Some("clipcache::daemon=trace".into()),
        };
        let filter = config.build_filter();
        assert!(filter.to_string().contains("clipcache::daemon=trace"));
    }

    #[test]
    fn test_invalid_directives_fall_back_to_preset() {
        let config = LogConfig {
            preset: LogPreset::Debug,
            directives: Some("clipcache=notalevel".into()),
        };
        // Falls through; with RUST_LOG unset this is the debug preset
        if std::env::var("RUST_LOG").is_err() {
            let filter = config.build_filter();
            assert!(filter.to_string().contains("clipcache=debug"));
        }
    }
}
