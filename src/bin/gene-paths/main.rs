//! Command-line front end: paths between two regions of a GFA graph.
#![forbid(unsafe_code)]

mod config;

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use gene_paths::{read_graph, GfaOptions, Graph, Result, Role, SearchEngine, Target};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::CliConfig;

const AFTER_HELP: &str = "\
FROM and TO are written CTG[:BEG[:END]]+ or CTG[:BEG[:END]]-. BEG and END
are forward (GFA2) positions between bases, 0 to the left of the sequence
and $ to the right. When END is omitted it defaults to BEG, a zero-length
position. When both are omitted the region is the whole contig.";

#[derive(Parser, Debug)]
#[command(
    name = "gene-paths",
    version,
    about = "Find paths between regions of a genome assembly graph",
    after_help = AFTER_HELP
)]
struct Cli {
    #[arg(value_name = "GFA", help = "GFA1 or GFA2 file")]
    gfa: PathBuf,

    #[arg(value_name = "FROM", help = "Region the path starts from")]
    from: String,

    #[arg(value_name = "TO", help = "Region the path ends in")]
    to: Option<String>,

    #[arg(short = 'f', long, value_name = "FILE", help = "Read segment sequences from FILE")]
    fasta: Option<PathBuf>,

    #[arg(short = 'b', long, help = "Also search for a path from TO to FROM")]
    both: bool,

    #[arg(
        long,
        value_enum,
        help = "Search mode [default: shortest, or furthest when TO is omitted]"
    )]
    mode: Option<Mode>,

    #[arg(long, value_enum, help = "Output format [default: text]")]
    format: Option<OutputFormat>,

    #[arg(short = 'w', long, value_name = "N", help = "Wrap sequences at N columns (0 = no wrap)")]
    wrap: Option<usize>,

    #[arg(long, help = "Fail on containment lines instead of skipping them")]
    strict: bool,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, help = "More logging on stderr (repeatable)")]
    verbose: u8,

    #[arg(long, value_name = "FILE", env = "GENE_PATHS_CONFIG", help = "Configuration file")]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Shortest,
    Furthest,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct FoundPath {
    label: &'static str,
    route: String,
    length: u64,
    sequence: String,
}

impl FoundPath {
    fn from_engine(label: &'static str, engine: &SearchEngine<'_>) -> Self {
        FoundPath {
            label,
            route: engine.route(),
            length: engine.length(),
            sequence: engine.sequence(),
        }
    }
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("No path was found");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("gene-paths: error: {err}");
            std::process::exit(1);
        }
    }
}

fn run() -> std::result::Result<bool, Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;
    init_logging(cli.verbose, config.log());
    if let Some(path) = config.path() {
        info!(path = %path.display(), "gene_paths.config.loaded");
    }

    let default_mode = if cli.to.is_some() {
        Mode::Shortest
    } else {
        Mode::Furthest
    };
    let mode = cli.mode.or(config.mode()?).unwrap_or(default_mode);
    let format = cli.format.or(config.format()?).unwrap_or(OutputFormat::Text);
    let wrap = cli.wrap.or(config.wrap()).unwrap_or(0);
    let both = cli.both || config.both().unwrap_or(false);

    let options = GfaOptions {
        reject_containments: cli.strict,
        ..GfaOptions::default()
    };
    let mut graph = read_graph(&cli.gfa, cli.fasta.as_deref(), &options)?;

    let mut start = Target::new(Role::Start);
    let mut end = Target::new(Role::End);
    let mut found = Vec::new();

    match mode {
        Mode::Furthest => {
            if cli.to.is_some() {
                warn!("gene_paths.furthest.to_ignored");
            }
            let arc = start.set(&mut graph, &cli.from)?;
            info!(from = %cli.from, "gene_paths.search.furthest");
            let mut engine = SearchEngine::new(&graph);
            if engine.furthest_path(arc)? {
                found.push(FoundPath::from_engine("FURTHEST", &engine));
            }
        }
        Mode::Shortest => {
            let to = cli
                .to
                .as_deref()
                .ok_or("TO is required for a shortest path search")?;
            let fwd = shortest(&mut graph, &mut start, &mut end, &cli.from, to, "PATH")?;
            found.extend(fwd);
            if both {
                let rev = shortest(&mut graph, &mut start, &mut end, to, &cli.from, "PATH_REV")?;
                found.extend(rev);
            }
        }
    }

    emit(format, wrap, &found)?;
    Ok(!found.is_empty())
}

fn shortest(
    graph: &mut Graph,
    start: &mut Target,
    end: &mut Target,
    from: &str,
    to: &str,
    label: &'static str,
) -> Result<Option<FoundPath>> {
    let s = start.set(graph, from)?;
    let e = end.set(graph, to)?;
    info!(from, to, "gene_paths.search.shortest");
    let mut engine = SearchEngine::new(graph);
    if engine.shortest_path(s, e)? {
        Ok(Some(FoundPath::from_engine(label, &engine)))
    } else {
        Ok(None)
    }
}

fn init_logging(verbose: u8, configured: Option<&str>) {
    let level = match verbose {
        0 => configured.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn emit(format: OutputFormat, wrap: usize, found: &[FoundPath]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for path in found {
        match format {
            OutputFormat::Text => {
                writeln!(out, ">{} {} (length {})", path.label, path.route, path.length)?;
                write_wrapped(&mut out, &path.sequence, wrap)?;
            }
            OutputFormat::Json => {
                let line = serde_json::to_string(path).map_err(io::Error::other)?;
                writeln!(out, "{line}")?;
            }
        }
    }
    out.flush()
}

fn write_wrapped(out: &mut impl Write, seq: &str, wrap: usize) -> io::Result<()> {
    if wrap == 0 || seq.is_empty() {
        return writeln!(out, "{seq}");
    }
    for chunk in seq.as_bytes().chunks(wrap) {
        out.write_all(chunk)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
