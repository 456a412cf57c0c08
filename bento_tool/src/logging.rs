//! Console logging setup.
//!
//! Everything goes to stderr so that stdout only carries command output.

use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config::LogConfig;

fn pattern(time: bool) -> &'static str {
    if time {
        "[{d(%Y-%m-%d %H:%M:%S)(utc)} {h({l:<5})} {t}] {m}{n}"
    } else {
        "[{h({l:<5})} {t}] {m}{n}"
    }
}

/// Installs the global logger.
///
/// # Errors
///
/// Returns an error if a logger is already installed.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern(config.time))))
        .build();

    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(Root::builder().appender("console").build(config.level))?;

    log4rs::init_config(config)?;
    Ok(())
}
