use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_idmerge::app::{App, MeltRequest, ProcessRequest, RunResult, ScrubRequest};
use kira_idmerge::config::ConfigLoader;
use kira_idmerge::domain::OrganismPrefix;
use kira_idmerge::error::IdMergeError;
use kira_idmerge::output::{JsonOutput, OutputMode};
use kira_idmerge::pipeline::{PipelineOptions, RunMode};

#[derive(Parser)]
#[command(name = "kira-idm")]
#[command(about = "Gene identifier resolution and deduplication for network database builds")]
#[command(version, author)]
struct Cli {
    /// Config file (defaults to ./kira-idm.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Resolve a wide identifier export into a processed triplet file")]
    Process(ProcessArgs),
    #[command(about = "Re-process existing triplet files")]
    Scrub(ScrubArgs),
    #[command(about = "Convert a wide export to triplets and descriptions, cleaning only")]
    Melt(MeltArgs),
    #[command(about = "Write a starter kira-idm.json")]
    Init(InitArgs),
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Biotype to keep; repeat for several (replaces the configured list)
    #[arg(long = "biotype")]
    biotypes: Vec<String>,

    /// Skip the entity biotype filter (reference rows are still filtered)
    #[arg(long, conflicts_with = "biotypes")]
    all_biotypes: bool,

    /// Source to drop during cleaning; repeat for several
    #[arg(long = "ignore-source")]
    ignore_sources: Vec<String>,
}

#[derive(Args, Clone)]
struct ProcessArgs {
    /// Wide multi-source identifier export (.gz accepted)
    #[arg(long)]
    raw: Utf8PathBuf,

    /// Reverse cross-reference file with GeneID/Symbol/dbXrefs/type_of_gene columns
    #[arg(long)]
    reverse: Option<Utf8PathBuf>,

    #[arg(long, short)]
    output: Utf8PathBuf,

    /// Audit report file
    #[arg(long)]
    report: Option<Utf8PathBuf>,

    /// Prefix for the entity field of the output, e.g. "Hs"
    #[arg(long)]
    organism: Option<String>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Do not fold entities that share a gene name
    #[arg(long)]
    no_merge: bool,
}

#[derive(Args, Clone)]
struct ScrubArgs {
    /// Triplet files (id, symbol, source; no header)
    #[arg(required = true)]
    inputs: Vec<Utf8PathBuf>,

    #[arg(long, short)]
    output: Utf8PathBuf,

    #[arg(long)]
    report: Option<Utf8PathBuf>,

    #[arg(long)]
    organism: Option<String>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Fold entities that share a gene name
    #[arg(long)]
    merge_names: bool,
}

#[derive(Args, Clone)]
struct MeltArgs {
    #[arg(long)]
    raw: Utf8PathBuf,

    /// Triplet output
    #[arg(long)]
    symbols: Utf8PathBuf,

    /// Description output
    #[arg(long)]
    descriptions: Utf8PathBuf,

    #[arg(long)]
    report: Option<Utf8PathBuf>,

    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Args, Clone)]
struct InitArgs {
    /// Destination (defaults to ./kira-idm.json)
    path: Option<Utf8PathBuf>,

    #[arg(long)]
    force: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<IdMergeError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &IdMergeError) -> u8 {
    if error.is_validation() {
        return 4;
    }
    if error.is_malformed_input() {
        return 3;
    }
    match error {
        IdMergeError::ConfigRead(_)
        | IdMergeError::ConfigParse(_)
        | IdMergeError::InvalidOrganismPrefix(_) => 2,
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
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match cli.command {
        Commands::Init(args) => {
            let result = App::init(args.path.as_deref(), args.force)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_init(&result).into_diagnostic()?,
                OutputMode::Human => println!("wrote {}", result.path),
            }
            Ok(())
        }
        Commands::Process(args) => {
            let mut options = resolve_options(cli.config.as_deref(), RunMode::Process)?;
            apply_filters(&mut options, &args.filters);
            apply_organism(&mut options, args.organism.as_deref())?;
            if args.no_merge {
                options.merge_names = false;
            }
            let request = ProcessRequest {
                raw: args.raw,
                reverse: args.reverse,
                output: args.output,
                report: args.report,
            };
            let result = App::new(options).process(&request)?;
            print_run(&result, output_mode)
        }
        Commands::Scrub(args) => {
            let mut options = resolve_options(cli.config.as_deref(), RunMode::Scrub)?;
            apply_filters(&mut options, &args.filters);
            apply_organism(&mut options, args.organism.as_deref())?;
            if args.merge_names {
                options.merge_names = true;
            }
            let request = ScrubRequest {
                inputs: args.inputs,
                output: args.output,
                report: args.report,
            };
            let result = App::new(options).scrub(&request)?;
            print_run(&result, output_mode)
        }
        Commands::Melt(args) => {
            let mut options = resolve_options(cli.config.as_deref(), RunMode::Melt)?;
            apply_filters(&mut options, &args.filters);
            let request = MeltRequest {
                raw: args.raw,
                symbols: args.symbols,
                descriptions: args.descriptions,
                report: args.report,
            };
            let result = App::new(options).melt(&request)?;
            print_run(&result, output_mode)
        }
    }
}

fn resolve_options(path: Option<&str>, mode: RunMode) -> Result<PipelineOptions, IdMergeError> {
    Ok(ConfigLoader::resolve(path)?.options(mode))
}

fn apply_filters(options: &mut PipelineOptions, filters: &FilterArgs) {
    if filters.all_biotypes {
        options.biotypes = None;
    } else if !filters.biotypes.is_empty() {
        options.biotypes = Some(filters.biotypes.clone());
    }
    if !filters.ignore_sources.is_empty() {
        options.clean.sources_to_remove = filters.ignore_sources.clone();
    }
}

fn apply_organism(
    options: &mut PipelineOptions,
    organism: Option<&str>,
) -> Result<(), IdMergeError> {
    if let Some(organism) = organism {
        options.organism_prefix = Some(organism.parse::<OrganismPrefix>()?);
    }
    Ok(())
}

fn print_run(result: &RunResult, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => JsonOutput::print_run(result).into_diagnostic(),
        OutputMode::Human => {
            print_run_summary(result);
            Ok(())
        }
    }
}

fn print_run_summary(result: &RunResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}KIRA-IDM summary ({:?}){reset}", result.mode);
    for input in &result.inputs {
        println!(
            "{yellow}  loaded {}: {} records, {} rows{reset}",
            input.path, input.records, input.rows
        );
    }
    for stage in &result.summary.stages {
        println!(
            "  {:<14} symbols: {:>8}  entities: {:>8}",
            format!("{:?}", stage.stage),
            stage.symbols,
            stage.entities
        );
    }
    for output in &result.outputs {
        println!("{green}  wrote {} ({} lines){reset}", output.path, output.lines);
    }
    if let Some(report) = &result.report {
        println!("{yellow}  report: {report}{reset}");
    }
}
