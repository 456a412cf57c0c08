//! Layered configuration loading.
//!
//! Every layer is merged into one TOML table, which is then deserialized.
//! Tables merge key by key; any other value is replaced outright.

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use toml::map::Entry;
use toml::{Table, Value};

type Segments<'a> = SmallVec<[&'a str; 8]>;

#[must_use]
pub struct Builder {
    table: Result<Table>,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            table: Ok(Table::new()),
        }
    }

    /// Adds a layer. Later layers take precedence.
    pub fn add_layer<L: Layer>(mut self, layer: L) -> Self {
        self.table = self.table.and_then(|mut t| {
            layer.extend_table(&mut t)?;
            Ok(t)
        });
        self
    }

    /// Deserializes the merged layers.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a layer, or an error if the merged
    /// table doesn't match `T`.
    pub fn build<T>(self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let table = self.table?;
        T::deserialize(table).context("cannot deserialize config")
    }
}

pub trait Layer {
    /// Merges this layer into the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer's source can't be loaded.
    fn extend_table(&self, table: &mut Table) -> Result<()>;
}

impl<L: Layer> Layer for Option<L> {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        match self {
            Some(layer) => layer.extend_table(table),
            None => Ok(()),
        }
    }
}

impl<L: Layer> Layer for Vec<L> {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        self.iter().try_for_each(|layer| layer.extend_table(table))
    }
}

impl Layer for Table {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        merge_tables(table, self.clone());
        Ok(())
    }
}

/// A TOML file.
#[must_use]
pub struct File {
    path: PathBuf,
    required: bool,
}

impl File {
    /// A file that must exist.
    pub fn required<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required: true,
        }
    }

    /// A file that is treated as empty if it doesn't exist.
    pub fn optional<P: AsRef<Path>>(path: P) -> Self {
        Self {
            required: false,
            ..Self::required(path)
        }
    }
}

impl Layer for File {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(why) if !self.required && why.kind() == io::ErrorKind::NotFound => {
                log::trace!("Optional config {:?} not found.", self.path);
                return Ok(());
            },
            Err(why) => {
                return Err(why).with_context(|| format!("cannot read config {:?}", self.path));
            },
        };

        let file: Table =
            toml::from_str(&text).with_context(|| format!("config {:?} is invalid", self.path))?;

        merge_tables(table, file);
        Ok(())
    }
}

/// One value at a dotted key, such as `log.level`.
///
/// Used for command line flags that override the configuration.
#[must_use]
pub struct Set {
    key: &'static str,
    value: Value,
}

impl Set {
    pub fn new(key: &'static str, value: impl Into<Value>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

impl Layer for Set {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        let segments: Segments<'_> = self.key.split('.').collect();
        insert_at(table, &segments, self.value.clone());
        Ok(())
    }
}

/// Environment variables starting with a prefix.
///
/// The prefix is removed and the rest of the name is lowercased. Nested keys
/// are separated by `__` (two underscores), so with the prefix `BENTO_`,
/// `BENTO_TEXT__INDENT` sets `text.indent`.
///
/// Values that parse as integers or booleans are loaded as such. Everything
/// else is a string.
#[must_use]
pub struct Env {
    prefix: &'static str,
}

impl Env {
    pub fn prefixed(prefix: &'static str) -> Self {
        Self { prefix }
    }

    fn extend_from<I>(&self, table: &mut Table, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(key) = key.strip_prefix(self.prefix) else {
                continue;
            };

            let key = key.to_ascii_lowercase();
            let segments: Segments<'_> = key.split("__").collect();
            insert_at(table, &segments, env_value(value));
        }
    }
}

impl Layer for Env {
    fn extend_table(&self, table: &mut Table) -> Result<()> {
        // names that aren't utf-8 can't carry the prefix. values are
        // converted lossily so bad ones at least show up in errors.
        let vars = env::vars_os().filter_map(|(key, value)| {
            let key = key.into_string().ok()?;
            let value = value
                .into_string()
                .unwrap_or_else(|o| o.to_string_lossy().into_owned());
            Some((key, value))
        });

        self.extend_from(table, vars);
        Ok(())
    }
}

fn env_value(value: String) -> Value {
    if let Ok(int) = value.parse::<i64>() {
        Value::Integer(int)
    } else if let Ok(b) = value.parse::<bool>() {
        Value::Boolean(b)
    } else {
        Value::String(value)
    }
}

fn merge_tables(target: &mut Table, consume: Table) {
    for (key, value) in consume {
        match target.entry(key) {
            Entry::Vacant(entry) => _ = entry.insert(value),
            Entry::Occupied(mut entry) => match (entry.get_mut(), value) {
                (Value::Table(a), Value::Table(b)) => merge_tables(a, b),
                (a, b) => *a = b,
            },
        }
    }
}

fn insert_at(table: &mut Table, path: &[&str], value: Value) {
    let [first, rest @ ..] = path else {
        return;
    };

    match table.entry((*first).to_owned()) {
        Entry::Vacant(entry) => _ = entry.insert(nested_value(rest, value)),
        Entry::Occupied(mut entry) => match entry.get_mut() {
            Value::Table(inner) if !rest.is_empty() => insert_at(inner, rest, value),
            slot => *slot = nested_value(rest, value),
        },
    }
}

/// Wraps `value` in one table per path segment.
fn nested_value(path: &[&str], value: Value) -> Value {
    path.iter().rev().fold(value, |inner, &segment| {
        let mut table = Table::new();
        table.insert(segment.to_owned(), inner);
        Value::Table(table)
    })
}
