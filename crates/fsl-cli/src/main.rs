//! `fsl` — merge, link and canonicalize FSL schema files.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use fsl_encoder::Encoder;
use fsl_parser::ast::{DeclarationKind, Document};

#[derive(Parser)]
#[command(name = "fsl", about = "FSL schema toolchain", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge schema files and print the canonical form.
    Canonical {
        /// Input schema files, merged in argument order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Sort declarations by kind and name before printing.
        #[arg(long)]
        sort: bool,
        /// Record a source map for this output file name and append it
        /// inline.
        #[arg(long, value_name = "FILE")]
        source_map: Option<String>,
        /// JSON file mapping original to mangled UDF names, used for source
        /// map symbols.
        #[arg(long, value_name = "FILE")]
        mangled_names: Option<PathBuf>,
    },
    /// Mangle UDF names and print the {original: mangled} JSON map.
    Link {
        /// Input schema files, merged in argument order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Also write the linked schema to this file.
        #[arg(long, value_name = "FILE")]
        schema_out: Option<PathBuf>,
    },
    /// Consolidate same-named roles and print the canonical result.
    MergeRoles {
        /// Input schema files, merged in argument order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Keep only declarations of one kind.
    Filter {
        /// One of access_provider, collection, function, role.
        #[arg(long)]
        kind: String,
        /// Input schema files, merged in argument order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List declarations as JSON.
    List {
        /// Input schema files, merged in argument order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Emit TypeScript declarations for the collections.
    Typescript {
        /// Input schema files, merged in argument order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Canonical {
            files,
            sort,
            source_map,
            mangled_names,
        } => {
            let (mut document, sources) = load(&files)?;
            if sort {
                document.sort();
            }
            let mut encoder = match source_map {
                Some(output_file) => {
                    let mut encoder = Encoder::with_source_map(output_file);
                    encoder.sources(&serde_json::to_string(&sources)?)?;
                    encoder
                }
                None => Encoder::new(),
            };
            if let Some(path) = mangled_names {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                if let Err(err) = encoder.mangled_names(&json) {
                    warn!("{err}; continuing without source map symbols");
                }
            }
            print!("{}", encoder.encode(&document));
        }
        Command::Link { files, schema_out } => {
            let (mut document, _) = load(&files)?;
            let mangled = fsl_linker::link(&mut document);
            if let Some(path) = schema_out {
                fs::write(&path, fsl_encoder::encode(&document))
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            println!("{}", serde_json::to_string_pretty(&mangled)?);
        }
        Command::MergeRoles { files } => {
            let (document, _) = load(&files)?;
            let merged = fsl_linker::merge_roles(document)?;
            print!("{}", fsl_encoder::encode(&merged));
        }
        Command::Filter { kind, files } => {
            let kind: DeclarationKind = kind.parse()?;
            let (document, _) = load(&files)?;
            print!("{}", fsl_encoder::encode(&document.filter(kind)));
        }
        Command::List { files } => {
            let (document, _) = load(&files)?;
            println!("{}", serde_json::to_string_pretty(&document.summaries())?);
        }
        Command::Typescript { files } => {
            let (document, _) = load(&files)?;
            print!("{}", fsl_encoder::typescript::typescript_definitions(&document));
        }
    }
    Ok(())
}

/// Parse every file and merge the trees in argument order; also returns the
/// raw file contents for source map embedding.
fn load(files: &[PathBuf]) -> Result<(Document, HashMap<String, String>)> {
    let mut document = Document::default();
    let mut sources = HashMap::new();
    for path in files {
        let input = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let filename = path.display().to_string();
        let parsed = fsl_parser::Parser::new(&input)
            .filename(filename.clone())
            .parse()?;
        debug!(file = %filename, declarations = parsed.len(), "parsed schema");
        sources.insert(filename, input);
        document = document.merge(parsed);
    }
    Ok((document, sources))
}
