//! domtool - inspect markup from the command line
//!
//! Thin host over `markup-dom`: reads a document, runs one operation,
//! prints the result. Set `RUST_LOG=markup_dom=debug` to see parser and
//! cache diagnostics on stderr.

use std::collections::BTreeMap;
use std::io::Read;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use markup_dom::{Document, NodeId};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "domtool")]
#[command(version, about = "Parse markup and query the resulting tree", long_about = None)]
#[command(after_help = "EXAMPLES:
    domtool page.html serialize         Normalized markup
    domtool page.html tree              Indented outline
    domtool page.html query 'p .note'   Elements matching a selector
    cat page.html | domtool - id main   Element with id=\"main\"")]
struct Cli {
    /// Input file; `-` or nothing reads stdin
    #[arg(value_name = "INPUT")]
    input: Option<String>,

    /// Print query results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Deepest nesting at which elements may hold children
    #[arg(long, value_name = "N")]
    max_nesting: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the document's normalized markup
    Serialize,
    /// Print an indented outline of the tree
    Tree {
        /// Level order instead of document order
        #[arg(long)]
        breadth_first: bool,
        /// Leave out nodes deeper than this (breadth-first only)
        #[arg(long, requires = "breadth_first")]
        max_depth: Option<usize>,
    },
    /// Elements matching a compound selector, in document order
    Query { selector: String },
    /// Element with the given id (index cache)
    Id { id: String },
    /// Elements with the given tag name (index cache)
    Tag { name: String },
    /// Elements carrying the given class token (index cache)
    Class { name: String },
    /// Text content of the whole document
    Text,
}

#[derive(Serialize)]
struct MatchSummary<'a> {
    node_id: NodeId,
    tag: &'a str,
    attributes: &'a BTreeMap<String, String>,
    markup: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let markup = read_input(cli.input.as_deref())?;

    let mut config = markup_dom::DocumentConfig::default();
    if let Some(depth) = cli.max_nesting {
        config.parser.max_depth = depth;
    }
    let mut doc = Document::parse_with_config(&markup, config);
    tracing::info!(document = %doc.id(), nodes = doc.arena().len(), "document loaded");

    match &cli.command {
        Command::Serialize => println!("{}", doc.serialize()?),
        Command::Tree {
            breadth_first,
            max_depth,
        } => {
            let outline = if *breadth_first {
                doc.dump_breadth_first(doc.root(), *max_depth)?
            } else {
                doc.dump_depth_first(doc.root())?
            };
            print!("{}", outline);
        }
        Command::Query { selector } => {
            let matches = doc.query_selector_all(selector);
            print_matches(&doc, &matches, cli.json)?;
        }
        Command::Id { id } => {
            doc.build_cache()?;
            let matches: Vec<_> = doc.get_element_by_id_fast(id).into_iter().collect();
            print_matches(&doc, &matches, cli.json)?;
        }
        Command::Tag { name } => {
            doc.build_cache()?;
            let matches = doc.get_elements_by_tag_name_fast(name);
            print_matches(&doc, &matches, cli.json)?;
        }
        Command::Class { name } => {
            doc.build_cache()?;
            let matches = doc.get_elements_by_class_name_fast(name);
            print_matches(&doc, &matches, cli.json)?;
        }
        Command::Text => println!("{}", doc.text_content(doc.root())?),
    }

    Ok(())
}

fn read_input(path: Option<&str>) -> std::io::Result<String> {
    match path {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => std::fs::read_to_string(path),
    }
}

fn print_matches(
    doc: &Document,
    matches: &[NodeId],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let mut summaries = Vec::with_capacity(matches.len());
        for &id in matches {
            let Some(element) = doc.node(id)?.as_element() else {
                continue;
            };
            summaries.push(MatchSummary {
                node_id: id,
                tag: &element.tag_name,
                attributes: &element.attributes,
                markup: doc.serialize_node(id)?,
            });
        }
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if matches.is_empty() {
        eprintln!("no matches");
    }
    for &id in matches {
        println!("{}", doc.serialize_node(id)?);
    }
    Ok(())
}
