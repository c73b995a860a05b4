//! Console log format: a bracketed timestamp followed by a level-tinted message.
use chrono::{Local, NaiveDateTime};
use colored::Colorize;
use env_logger::Env;
use log::Level;
use std::io::Write;

/// Log target for milestone lines, rendered green at info level.
pub const MILESTONE_TARGET: &str = "idlepace::milestone";

/// Info-level log line marking a milestone (an unlock, a finished session).
#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        ::log::info!(target: $crate::logging::MILESTONE_TARGET, $($arg)+)
    };
}

/// Install the process logger. `RUST_LOG` overrides the default `info` filter.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let line = format_line(
                Local::now().naive_local(),
                record.level(),
                record.target(),
                &record.args().to_string(),
            );
            writeln!(buf, "{line}")
        })
        .init();
}

#[must_use]
pub fn format_line(at: NaiveDateTime, level: Level, target: &str, message: &str) -> String {
    let stamp = at.format("%d/%m/%y %H:%M:%S%.3f");
    let message = match level {
        Level::Error => message.red(),
        Level::Warn => message.cyan(),
        Level::Info if target == MILESTONE_TARGET => message.green(),
        Level::Info => message.yellow(),
        Level::Debug | Level::Trace => message.dimmed(),
    };
    format!("[{stamp}] {message}")
}
