use gmrconfig::Config;
use tracing::{Level, info, warn};
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Runtime handle on the global log level filter.
pub struct LogControl {
    reload_handle: reload::Handle<LevelFilter, Registry>,
}

impl LogControl {
    pub fn new(reload_handle: reload::Handle<LevelFilter, Registry>) -> Self {
        Self { reload_handle }
    }

    /// Changes the minimum level, `level` being one of ERROR, WARN, INFO,
    /// DEBUG or TRACE (case insensitive).
    pub fn set_max_level(&self, level: &str) -> bool {
        let Some(level) = string_to_level(level) else {
            warn!("Unknown log level '{}'", level);
            return false;
        };

        match self.reload_handle.reload(level_to_levelfilter(level)) {
            Ok(()) => {
                info!("Log level set to {}", level);
                true
            }
            Err(e) => {
                warn!("Failed to reload log level filter: {}", e);
                false
            }
        }
    }

    pub fn max_level(&self) -> Option<LevelFilter> {
        self.reload_handle.clone_current()
    }
}

/// Installs the global subscriber: a reloadable level filter set from the
/// configuration, then the console output when enabled.
pub fn init_logging(config: &Config) -> LogControl {
    let log_level = match config.get_log_min_level() {
        Ok(l) => match string_to_level(&l) {
            Some(lev) => level_to_levelfilter(lev),
            None => LevelFilter::INFO,
        },
        Err(_) => LevelFilter::INFO,
    };

    let (filter, reload_handle) = reload::Layer::new(log_level);
    let subscriber = Registry::default().with(filter);

    let enable_console = config.get_log_enable_console().unwrap_or(true);

    // stdout is left to the renderer side of the pipe
    if enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .init();
    } else {
        subscriber.init();
    }

    LogControl::new(reload_handle)
}

fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

fn level_to_levelfilter(level: Level) -> LevelFilter {
    match level {
        Level::ERROR => LevelFilter::ERROR,
        Level::WARN => LevelFilter::WARN,
        Level::INFO => LevelFilter::INFO,
        Level::DEBUG => LevelFilter::DEBUG,
        Level::TRACE => LevelFilter::TRACE,
    }
}
