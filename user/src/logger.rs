use log::{Level, LevelFilter, Metadata, Record};
use crate::println;

const LOG_LEVEL: LevelFilter = if cfg!(feature = "trace") {
    LevelFilter::Trace
} else if cfg!(feature = "debug") {
    LevelFilter::Debug
} else if cfg!(feature = "info") {
    LevelFilter::Info
} else if cfg!(feature = "warn") {
    LevelFilter::Warn
} else {
    LevelFilter::Error
};

struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= LOG_LEVEL
    }
    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!(
                "\x1b[{}m[{}] {}\x1b[0m",
                level_color(record.level()),
                record.level(),
                record.args()
            );
        }
    }
    fn flush(&self) {}
}

static LOGGER: SimpleLogger = SimpleLogger;

/// Installs the console logger. A second call keeps the first logger.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LOG_LEVEL);
    }
}

fn level_color(level: Level) -> u8 {
    match level {
        Level::Error => 31,
        Level::Warn => 93,
        Level::Info => 34,
        Level::Debug => 32,
        Level::Trace => 90,
    }
}
