//! Deputados CLI
//!
//! Batch pipeline over the Chamber of Deputies open-data listing:
//! - `extract`: API pages → `raw/deputados_legisl_{term}.csv`
//! - `transform`: CSV → RDF graph → `processed/deputados_legisl_{term}.nt`
//! - `load`: N-Triples → embedded graph store (additive)
//! - `query`: SPARQL text or a preset → table
//! - `viz`: one legislator's subgraph → DOT/JSON under `img/`
//! - `preview`, `run`

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use deputados_graph::ntriples;
use deputados_graph::{filter_subgraph, GraphBuilder, RdfGraph};
use deputados_ingest::{fetch_all, CamaraApiSource, FetchCompletion, RecordTable};
use deputados_store::{CannedQuery, GraphStore, QueryTable};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod viz;

use config::PipelineConfig;

#[derive(Parser)]
#[command(name = "deputados")]
#[command(
    author,
    version,
    about = "Chamber of Deputies legislators as an RDF graph"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// JSON pipeline configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dataset root (holds raw/, processed/, img/, store/).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Legislative term (idLegislatura).
    #[arg(long = "legislatura", global = true)]
    legislature: Option<u32>,
    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every page of the legislator listing and write the raw CSV.
    Extract(ExtractArgs),

    /// Build the RDF graph from the raw CSV and write N-Triples.
    Transform(TransformArgs),

    /// Load an N-Triples file into the graph store (additive).
    Load(LoadArgs),

    /// Run a read-only SPARQL query against the graph store.
    Query(QueryArgs),

    /// Render one legislator's subgraph.
    Viz(VizArgs),

    /// Show the head of the CSV or the N-Triples file.
    Preview {
        #[command(subcommand)]
        command: PreviewCommands,
    },

    /// extract → transform → load.
    Run {
        #[command(flatten)]
        extract: ExtractArgs,
        /// Fail if any row is rejected.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct ExtractArgs {
    /// Write the CSV even if a page failed or the page cap was hit.
    #[arg(long)]
    allow_incomplete: bool,
    /// Safety cap on pages requested.
    #[arg(long)]
    max_pages: Option<u32>,
    /// API base URL (default: the public v2 endpoint).
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct TransformArgs {
    /// Input CSV (default: raw/deputados_legisl_{term}.csv).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output N-Triples (default: processed/deputados_legisl_{term}.nt).
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Fail if any row is rejected.
    #[arg(long)]
    strict: bool,
    /// Write the build report (counts + rejected rows) as JSON.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct LoadArgs {
    /// Input N-Triples (default: processed/deputados_legisl_{term}.nt).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Store directory (default: <data-dir>/store).
    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct QueryArgs {
    /// SPARQL query text.
    #[arg(conflicts_with_all = ["file", "preset"])]
    text: Option<String>,
    /// Read the query from a file.
    #[arg(long, conflicts_with = "preset")]
    file: Option<PathBuf>,
    /// by-region:<UF> | party-sizes | profile:<id>
    #[arg(long)]
    preset: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Store directory (default: <data-dir>/store).
    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Args, Debug, Clone)]
struct VizArgs {
    /// Legislator id.
    #[arg(long)]
    deputado: u64,
    /// dot | json
    #[arg(long, default_value = "dot")]
    format: String,
    /// Output file (default: img/deputado_{id}_graph.{ext}).
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Read triples from the graph store instead of the N-Triples file.
    #[arg(long)]
    from_store: bool,
    /// Input N-Triples (default: processed/deputados_legisl_{term}.nt).
    #[arg(long, conflicts_with = "from_store")]
    input: Option<PathBuf>,
    /// Store directory for --from-store (default: <data-dir>/store).
    #[arg(long, requires = "from_store")]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum PreviewCommands {
    /// First rows of the raw CSV.
    Csv {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        rows: Option<usize>,
    },
    /// First bytes of the N-Triples file, cut at a line boundary.
    Nt {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        bytes: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.global.verbose, cli.global.quiet);
    let cfg = resolve_config(&cli.global)?;

    match cli.command {
        Commands::Extract(args) => {
            cmd_extract(&cfg, &args)?;
        }
        Commands::Transform(args) => {
            cmd_transform(&cfg, &args)?;
        }
        Commands::Load(args) => cmd_load(&cfg, &args)?,
        Commands::Query(args) => cmd_query(&cfg, &args)?,
        Commands::Viz(args) => cmd_viz(&cfg, &args)?,
        Commands::Preview { command } => match command {
            PreviewCommands::Csv { input, rows } => {
                let path = input.unwrap_or_else(|| cfg.layout().csv_path(cfg.legislature));
                let table = RecordTable::read_csv(&path)?;
                print!("{}", table.render_text(rows.unwrap_or(cfg.preview_rows), 40));
            }
            PreviewCommands::Nt { input, bytes } => {
                let path = input.unwrap_or_else(|| cfg.layout().ntriples_path(cfg.legislature));
                print!(
                    "{}",
                    ntriples::preview_file(&path, bytes.unwrap_or(cfg.preview_bytes))?
                );
            }
        },
        Commands::Run { extract, strict } => cmd_run(&cfg, &extract, strict)?,
    }
    Ok(())
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn resolve_config(global: &GlobalArgs) -> Result<PipelineConfig> {
    let mut cfg = PipelineConfig::load(global.config.as_deref())?;
    if let Some(dir) = &global.data_dir {
        cfg.data_dir = dir.clone();
    }
    if let Some(term) = global.legislature {
        cfg.legislature = term;
    }
    Ok(cfg)
}

// ============================================================================
// Stages
// ============================================================================

fn cmd_extract(cfg: &PipelineConfig, args: &ExtractArgs) -> Result<PathBuf> {
    let mut api = cfg.api();
    if let Some(url) = &args.base_url {
        api.base_url = url.clone();
    }
    let max_pages = args.max_pages.unwrap_or(api.max_pages);
    println!(
        "{} legislators for term {} from {}",
        "Extracting".green().bold(),
        api.legislature,
        api.base_url
    );

    let source = CamaraApiSource::new(api)?;
    let outcome = fetch_all(&source, max_pages);
    match &outcome.completion {
        FetchCompletion::Complete => {}
        FetchCompletion::Incomplete { failed_page, error } => {
            let msg = format!("page {failed_page} failed after {} rows: {error}", outcome.rows.len());
            if !args.allow_incomplete {
                bail!("incomplete fetch, CSV not written ({msg}); pass --allow-incomplete to keep partial data");
            }
            eprintln!("{} {msg}", "warning:".yellow().bold());
        }
        FetchCompletion::Truncated { max_pages } => {
            let msg = format!("stopped at the {max_pages}-page cap with {} rows", outcome.rows.len());
            if !args.allow_incomplete {
                bail!("incomplete fetch, CSV not written ({msg}); raise --max-pages or pass --allow-incomplete");
            }
            eprintln!("{} {msg}", "warning:".yellow().bold());
        }
    }

    let table = RecordTable::from_json_rows(&outcome.rows)?;
    let out = cfg.layout().csv_path(cfg.legislature);
    table.write_csv(&out)?;
    println!(
        "  {} {} (rows={}, pages={})",
        "→".cyan(),
        out.display(),
        table.len(),
        outcome.pages
    );
    Ok(out)
}

fn cmd_transform(cfg: &PipelineConfig, args: &TransformArgs) -> Result<PathBuf> {
    let layout = cfg.layout();
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| layout.csv_path(cfg.legislature));
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| layout.ntriples_path(cfg.legislature));
    println!("{} {}", "Transforming".green().bold(), input.display());

    let table = RecordTable::read_csv(&input)?;
    let built = GraphBuilder::new(cfg.identity()).build_rows(table.records());
    let report = &built.report;

    if let Some(path) = &args.report {
        write_file(path, serde_json::to_string_pretty(report)?.as_bytes())?;
        println!("  {} {}", "→".cyan(), path.display());
    }

    if !report.skipped.is_empty() {
        for skipped in &report.skipped {
            eprintln!("  {} {skipped}", "skipped".yellow());
        }
        if args.strict {
            bail!(
                "{} of {} rows rejected (--strict); N-Triples not written",
                report.skipped.len(),
                report.records_seen
            );
        }
    }

    ntriples::write_ntriples_file(&built.graph, &out)?;
    println!(
        "  {} {} (triples={}, persons={}, parties={}, regions={}, skipped={})",
        "→".cyan(),
        out.display(),
        report.triples,
        report.persons,
        report.organizations,
        report.places,
        report.skipped.len()
    );
    Ok(out)
}

fn cmd_load(cfg: &PipelineConfig, args: &LoadArgs) -> Result<()> {
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| cfg.layout().ntriples_path(cfg.legislature));
    println!("{} {}", "Loading".green().bold(), input.display());

    let graph = ntriples::read_ntriples_file(&input)?;
    let store = store_config(cfg, args.store.as_deref()).open()?;
    let report = store.bulk_load(&graph)?;
    let total = store.triple_count()?;
    info!(inserted = report.inserted, total, "store updated");
    println!(
        "  {} {} new, {} already present ({} triples in store)",
        "ok".green().bold(),
        report.inserted,
        report.already_present,
        total
    );
    Ok(())
}

fn cmd_query(cfg: &PipelineConfig, args: &QueryArgs) -> Result<()> {
    let text = match (&args.text, &args.file, &args.preset) {
        (Some(text), _, _) => text.clone(),
        (None, Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("failed to read query file {}", path.display()))?,
        (None, None, Some(preset)) => CannedQuery::parse(preset)
            .map_err(|e| anyhow!(e))?
            .to_sparql(&cfg.identity()),
        (None, None, None) => bail!("give a query, --file or --preset"),
    };

    let store = store_config(cfg, args.store.as_deref()).open_existing()?;
    let table = store.query(&text)?;
    print_table(&table, args.format)
}

fn cmd_viz(cfg: &PipelineConfig, args: &VizArgs) -> Result<()> {
    let format = viz::VizFormat::parse(&args.format)?;
    let person = cfg.identity().person(args.deputado);

    let subgraph: RdfGraph = if args.from_store {
        store_config(cfg, args.store.as_deref())
            .open_existing()?
            .subject_triples(&person)?
    } else {
        let input = args
            .input
            .clone()
            .unwrap_or_else(|| cfg.layout().ntriples_path(cfg.legislature));
        let graph = ntriples::read_ntriples_file(&input)?;
        filter_subgraph(&graph, &person)
    };
    if subgraph.is_empty() {
        bail!("no triples for deputado {} ({person})", args.deputado);
    }

    let view = viz::subject_view(&subgraph, &person);
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| cfg.layout().viz_path(args.deputado, format.extension()));
    write_file(&out, viz::render(&view, format)?.as_bytes())?;
    eprintln!(
        "{} {} (nodes={}, edges={})",
        "wrote".green().bold(),
        out.display().to_string().bold(),
        view.nodes.len(),
        view.edges.len()
    );
    Ok(())
}

fn cmd_run(cfg: &PipelineConfig, extract: &ExtractArgs, strict: bool) -> Result<()> {
    println!("{}", "== 1/3 extract ==".bold());
    let csv = cmd_extract(cfg, extract)?;
    let table = RecordTable::read_csv(&csv)?;
    print!("{}", table.render_text(cfg.preview_rows, 40));

    println!("{}", "== 2/3 transform ==".bold());
    let nt = cmd_transform(
        cfg,
        &TransformArgs {
            input: Some(csv),
            out: None,
            strict,
            report: None,
        },
    )?;
    print!("{}", ntriples::preview_file(&nt, cfg.preview_bytes)?);

    println!("{}", "== 3/3 load ==".bold());
    cmd_load(
        cfg,
        &LoadArgs {
            input: Some(nt),
            store: None,
        },
    )
}

// ============================================================================
// Helpers
// ============================================================================

fn store_config(cfg: &PipelineConfig, path: Option<&Path>) -> deputados_store::StoreConfig {
    match path {
        Some(p) => deputados_store::StoreConfig::at(p),
        None => cfg.store_config(),
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn print_table(table: &QueryTable, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            print!("{}", table.render_text());
            eprintln!("({} rows)", table.len());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&table.to_json())?);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout().lock());
            wtr.write_record(&table.columns)?;
            for row in &table.rows {
                wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}
