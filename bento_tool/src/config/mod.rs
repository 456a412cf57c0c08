use std::path::Path;

use log::LevelFilter;
use serde::Deserialize;

pub mod setup;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub log: LogConfig,
    pub text: TextConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// Whether log lines start with a UTC timestamp.
    pub time: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            time: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Spaces per nesting level when writing the text format.
    pub indent: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// Loads the configuration.
///
/// Layers, from lowest to highest precedence: `bento_tool.toml` in the
/// working directory, the file passed on the command line, `BENTO_`
/// environment variables, and finally `overrides`. Missing keys keep their
/// defaults.
///
/// # Errors
///
/// Returns an error if the explicit file is missing or any layer is invalid.
pub fn load(explicit: Option<&Path>, overrides: Vec<setup::Set>) -> anyhow::Result<ToolConfig> {
    use setup::{Builder, Env, File};

    Builder::new()
        .add_layer(File::optional("bento_tool.toml"))
        .add_layer(explicit.map(File::required))
        .add_layer(Env::prefixed("BENTO_"))
        .add_layer(overrides)
        .build()
}

#[cfg(test)]
mod tests {
    use toml::Table;

    use super::setup::{Builder, Set};
    use super::*;

    #[test]
    fn empty_uses_defaults() {
        let config: ToolConfig = Builder::new()
            .add_layer(Table::new())
            .build()
            .expect("defaults must be valid");

        assert_eq!(config.log.level, LevelFilter::Info, "default level");
        assert!(config.log.time, "timestamps on by default");
        assert_eq!(config.text.indent, 2, "default indent");
    }

    #[test]
    fn overrides_apply() {
        let file: Table = toml::from_str("[log]\nlevel = \"warn\"\ntime = false\n")
            .expect("test toml must be valid");

        let config: ToolConfig = Builder::new()
            .add_layer(file)
            .add_layer(Set::new("text.indent", 0i64))
            .build()
            .expect("overrides must be valid");

        assert_eq!(config.log.level, LevelFilter::Warn, "level overridden");
        assert!(!config.log.time, "timestamps overridden");
        assert_eq!(config.text.indent, 0, "indent overridden");
    }

    #[test]
    fn level_is_case_insensitive() {
        let config: ToolConfig = Builder::new()
            .add_layer(Set::new("log.level", "DEBUG"))
            .build()
            .expect("level must parse");

        assert_eq!(config.log.level, LevelFilter::Debug, "upper case level");
    }
}
