//! Logger setup.
//!
//! Output goes to stderr through `env_logger`, one line per record with a
//! coloured level tag. `RUST_LOG` wins over `--debug`; without either the
//! action logs at `info`.

use env_logger::fmt::style::{AnsiColor, Style};
use log::LevelFilter;
use std::io::Write;

/// Filter directive used when `RUST_LOG` is not set.
#[must_use]
pub fn default_filter(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Resolve the filter spec from an explicit `RUST_LOG` value and the debug
/// flag.
#[must_use]
pub fn filter_spec(rust_log: Option<&str>, debug: bool) -> String {
    rust_log
        .map(str::trim)
        .filter(|spec| !spec.is_empty())
        .map_or_else(
            || default_filter(debug).to_string().to_ascii_lowercase(),
            str::to_owned,
        )
}

/// Install the global logger.
///
/// # Errors
///
/// Returns an error if a logger has already been installed.
pub fn init(debug: bool) -> Result<(), log::SetLoggerError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&filter_spec(rust_log.as_deref(), debug));
    builder.format(|buf, record| {
        let level_style = buf.default_level_style(record.level());
        let target_style = Style::new().fg_color(Some(AnsiColor::Cyan.into()));
        if record.level() <= log::Level::Info {
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                record.level(),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {target_style}{}{target_style:#} {}",
                record.level(),
                record.target(),
                record.args()
            )
        }
    });
    builder.try_init()
}
