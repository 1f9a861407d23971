use crate::config::Config;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Dependencies silenced below TRACE: the database driver, the HTTP stack that
/// talks to providers, and the provider mock used in tests.
const FILTERED_MODULES: &[&str] = &[
    "sqlx",
    "sea_orm",
    "hyper",
    "hyper_util",
    "reqwest",
    "rustls",
    "mockito",
];

pub struct Logger {}

impl Logger {
    /// Installs the terminal logger at the configured level.
    ///
    /// `social-auth` logs through `tracing`, whose `log` feature forwards its
    /// events here.
    pub fn init_logger(config: &Config) -> Result<(), log::SetLoggerError> {
        TermLogger::init(
            config.log_level_filter,
            Self::build_log_config(config.log_level_filter),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )
    }

    fn ignored_modules(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            FILTERED_MODULES
        }
    }

    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        for module in Self::ignored_modules(level) {
            builder.add_filter_ignore_str(module);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_http_stack_is_filtered() {
        let ignored = Logger::ignored_modules(LevelFilter::Info);
        for module in ["sqlx", "sea_orm", "hyper", "reqwest", "rustls"] {
            assert!(ignored.contains(&module), "{module} should be filtered");
        }
    }

    #[test]
    fn test_sign_in_events_are_never_filtered() {
        for level in [LevelFilter::Error, LevelFilter::Debug, LevelFilter::Trace] {
            let ignored = Logger::ignored_modules(level);
            assert!(!ignored.contains(&"social_auth"));
            assert!(!ignored.contains(&"domain"));
            assert!(!ignored.contains(&"tracing"));
        }
    }

    #[test]
    fn test_trace_shows_every_dependency() {
        assert!(Logger::ignored_modules(LevelFilter::Trace).is_empty());
    }

    #[test]
    fn test_levels_below_trace_filter_dependencies() {
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            assert_eq!(Logger::ignored_modules(level), FILTERED_MODULES);
        }
    }
}
