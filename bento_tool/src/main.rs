use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bento::Node;
use clap::{Parser, Subcommand};

mod config;
mod logging;
mod outline;

/// Inspects, converts, and merges Bento trees.
///
/// The format of each file is picked from its extension: `.btf` and `.txt`
/// are read and written as text, anything else as binary.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// An extra configuration file, applied over `bento_tool.toml`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Logs everything down to the trace level.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Converts a tree to another file, changing its format as needed.
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Overrides the configured text indent. 0 writes a single line.
        #[arg(long)]
        indent: Option<usize>,
    },
    /// Prints node and attribute names without decoding any values.
    Dump { input: PathBuf },
    /// Updates the target tree with the attributes and children of the
    /// source tree.
    ///
    /// Matching attributes are overwritten and matching children are merged
    /// recursively. Everything else in the source is appended.
    Merge {
        target: PathBuf,
        source: PathBuf,

        /// Where to write the result. Defaults to overwriting the target.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Prints a tree as XML.
    Xml {
        input: PathBuf,

        /// Only prints the node at this `/`-separated path below the root.
        #[arg(long)]
        path: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Binary,
    Text,
}

impl Format {
    fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("btf") || ext.eq_ignore_ascii_case("txt") => {
                Self::Text
            },
            _ => Self::Binary,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut overrides = Vec::new();
    if cli.verbose {
        overrides.push(config::setup::Set::new("log.level", "trace"));
    }

    let config = config::load(cli.config.as_deref(), overrides)?;

    logging::init(&config.log)?;

    let res = run(cli.command, &config);
    if let Err(why) = &res {
        log::error!("Exiting due to error: {why:?}");
    }

    log::logger().flush();
    res
}

fn run(command: Command, config: &config::ToolConfig) -> anyhow::Result<()> {
    match command {
        Command::Convert {
            input,
            output,
            indent,
        } => {
            let tree = read_tree(&input)?;
            write_tree(&output, &tree, indent.unwrap_or(config.text.indent))?;
            log::info!("Converted {input:?} to {output:?}.");
        },
        Command::Dump { input } => {
            let out = io::stdout().lock();
            match Format::detect(&input) {
                Format::Binary => outline::binary(&read_file(&input)?, out)?,
                Format::Text => outline::text(&read_text(&input)?, out)?,
            }
        },
        Command::Merge {
            target,
            source,
            out,
        } => {
            let mut tree = read_tree(&target)?;
            let update = read_tree(&source)?;
            tree.update_from(&update);

            let out = out.as_deref().unwrap_or(&target);
            write_tree(out, &tree, config.text.indent)?;
            log::info!("Merged {source:?} into {out:?}.");
        },
        Command::Xml { input, path } => {
            let tree = read_tree(&input)?;
            let node = match path.as_deref() {
                Some(path) => tree
                    .at_path(path)
                    .with_context(|| format!("no node at `{path}` in {input:?}"))?,
                None => &tree,
            };

            let xml = bento::xml::to_string(node)?;
            io::stdout().lock().write_all(xml.as_bytes())?;
        },
    }

    Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("cannot read {path:?}"))
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {path:?}"))
}

fn read_tree(path: &Path) -> anyhow::Result<Node> {
    let format = Format::detect(path);
    log::debug!("Reading {path:?} as {format:?}.");

    let tree = match format {
        Format::Binary => bento::from_slice(&read_file(path)?),
        Format::Text => bento::text::from_str(&read_text(path)?),
    };

    tree.with_context(|| format!("invalid tree in {path:?}"))
}

fn write_tree(path: &Path, tree: &Node, indent: usize) -> anyhow::Result<()> {
    let format = Format::detect(path);
    log::debug!("Writing {path:?} as {format:?}.");

    let file = fs::File::create(path).with_context(|| format!("cannot create {path:?}"))?;
    let mut file = io::BufWriter::new(file);

    match format {
        Format::Binary => bento::to_writer(&mut file, tree)?,
        Format::Text => bento::text::Writer::new()
            .indent(indent)
            .to_writer(&mut file, tree)?,
    }

    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::detect(Path::new("a.btf")), Format::Text, "btf is text");
        assert_eq!(Format::detect(Path::new("a.TXT")), Format::Text, "case is ignored");
        assert_eq!(Format::detect(Path::new("a.bento")), Format::Binary, "other is binary");
        assert_eq!(Format::detect(Path::new("noext")), Format::Binary, "no extension is binary");
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from(["bento_tool", "-v", "convert", "in.bin", "out.btf", "--indent", "0"])
            .expect("arguments must parse");

        assert!(cli.verbose, "verbose flag");
        assert!(
            matches!(
                cli.command,
                Command::Convert { indent: Some(0), .. }
            ),
            "convert with indent"
        );
    }
}
