use std::fs;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pdb_scout::app::{App, Session};
use pdb_scout::archive::ArchiveReport;
use pdb_scout::config::{ConfigLoader, ResolvedConfig};
use pdb_scout::data::RcsbDataHttpClient;
use pdb_scout::domain::{Concurrency, EntryId, EntryRecord, MethodFilter, Query, ResolutionCeiling};
use pdb_scout::error::ScoutError;
use pdb_scout::files::{FileClient, RcsbFilesHttpClient};
use pdb_scout::filter::FilterOptions;
use pdb_scout::output::{JsonOutput, OutputMode, TextProgress, render_table};
use pdb_scout::search::RcsbSearchHttpClient;

#[derive(Parser)]
#[command(name = "pdb-scout")]
#[command(about = "Find, filter and export protein structures from the RCSB PDB")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Search by protein or gene name, enrich and filter the results")]
    Search(SearchArgs),
    #[command(about = "Download one raw structure file")]
    Fetch(FetchArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Protein or gene name, e.g. EGFR, BRCA1, TP53
    query: String,

    #[arg(long)]
    config: Option<String>,

    /// Keep only entries whose organisms include Homo sapiens
    #[arg(long)]
    only_human: bool,

    /// Keep only entries with exactly one distinct chain
    #[arg(long)]
    monomer_only: bool,

    /// Resolution ceiling in angstroms (1.0-5.0)
    #[arg(long)]
    max_resolution: Option<f64>,

    /// Experimental method filter
    #[arg(long, value_enum)]
    method: Option<MethodFilter>,

    /// Metadata fetch workers (1-20)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Write a zip of every filtered structure to this path
    #[arg(long)]
    archive: Option<String>,

    /// Write a zip of the top-3 X-ray structures to this path
    #[arg(long)]
    top_archive: Option<String>,
}

#[derive(Args)]
struct FetchArgs {
    /// Entry identifier, e.g. 6LU7
    id: String,

    /// Destination file; stdout when omitted
    #[arg(long)]
    out: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(scout) = report.downcast_ref::<ScoutError>() {
            return ExitCode::from(map_exit_code(scout));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ScoutError) -> u8 {
    match error {
        ScoutError::NoEntriesFound(_) => 2,
        ScoutError::SearchHttp(_)
        | ScoutError::SearchStatus { .. }
        | ScoutError::DataHttp(_)
        | ScoutError::DataStatus { .. }
        | ScoutError::FileHttp(_)
        | ScoutError::FileStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Search(args) => run_search(args, output_mode),
        Commands::Fetch(args) => run_fetch(args),
    }
}

fn run_search(args: SearchArgs, output_mode: OutputMode) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;

    let query: Query = args.query.parse().into_diagnostic()?;
    let filters = build_filters(&args, &config).into_diagnostic()?;
    let concurrency = args
        .concurrency
        .map(Concurrency::new)
        .transpose()
        .into_diagnostic()?
        .unwrap_or(config.concurrency);

    let search = RcsbSearchHttpClient::new().into_diagnostic()?;
    let data = RcsbDataHttpClient::new().into_diagnostic()?;
    let files = RcsbFilesHttpClient::new().into_diagnostic()?;
    let app = App::new(search, data, files, &config);

    let session = match output_mode {
        OutputMode::NonInteractive => app
            .run_search(&query, &filters, concurrency, &JsonOutput)
            .into_diagnostic()?,
        OutputMode::Interactive => app
            .run_search(&query, &filters, concurrency, &TextProgress)
            .into_diagnostic()?,
    };

    let top = app.rank(&session);

    if let Some(path) = &args.archive {
        let report = app.build_filtered_archive(&session).into_diagnostic()?;
        write_archive(&report, path).into_diagnostic()?;
        print_archive_note(&report, path, output_mode);
    }
    if let Some(path) = &args.top_archive {
        let report = app.build_top_archive(&session).into_diagnostic()?;
        write_archive(&report, path).into_diagnostic()?;
        print_archive_note(&report, path, output_mode);
    }

    match output_mode {
        OutputMode::NonInteractive => {
            JsonOutput::print_session(&session).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            print_session_summary(&session, &top);
        }
    }
    Ok(())
}

fn build_filters(args: &SearchArgs, config: &ResolvedConfig) -> Result<FilterOptions, ScoutError> {
    Ok(FilterOptions {
        only_human: args.only_human || config.only_human,
        monomer_only: args.monomer_only || config.monomer_only,
        max_resolution: args
            .max_resolution
            .map(ResolutionCeiling::new)
            .transpose()?
            .unwrap_or(config.max_resolution),
        method: args.method.unwrap_or(config.method),
    })
}

fn run_fetch(args: FetchArgs) -> miette::Result<()> {
    let id: EntryId = args.id.parse().into_diagnostic()?;
    let files = RcsbFilesHttpClient::new().into_diagnostic()?;
    let text = files.fetch_structure(&id).into_diagnostic()?;

    match args.out {
        Some(path) => {
            fs::write(&path, text)
                .map_err(|err| ScoutError::Filesystem(err.to_string()))
                .into_diagnostic()?;
            eprintln!("wrote {path}");
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn write_archive(report: &ArchiveReport, path: &str) -> Result<(), ScoutError> {
    fs::write(path, &report.bytes).map_err(|err| ScoutError::Filesystem(err.to_string()))
}

fn print_archive_note(report: &ArchiveReport, path: &str, output_mode: OutputMode) {
    if matches!(output_mode, OutputMode::NonInteractive) {
        return;
    }
    println!(
        "archive {path}: {} structures, {} skipped",
        report.entries.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        println!("   skipped {}: {}", failure.id, failure.reason);
    }
}

fn print_session_summary(session: &Session, top: &[EntryRecord]) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}pdb-scout results for \"{}\"{reset}", session.query);
    println!("{green}total entries: {}{reset}", session.raw_count);
    println!("{green}filtered entries: {}{reset}", session.filtered_count);
    if !session.dropped.is_empty() {
        println!(
            "{yellow}dropped during enrichment: {}{reset}",
            session.dropped.len()
        );
        for failure in &session.dropped {
            println!("{yellow}   {}: {}{reset}", failure.id, failure.reason);
        }
    }

    if session.records.is_empty() {
        println!("{yellow}no structures matched your filters{reset}");
        return;
    }

    println!();
    print!("{}", render_table(&session.records));

    if top.is_empty() {
        println!("{yellow}no X-ray structures in the filtered results{reset}");
    } else {
        println!();
        println!("{cyan}top {} X-ray structures{reset}", top.len());
        print!("{}", render_table(top));
    }
}
