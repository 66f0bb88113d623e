mod graph;
mod logging;
mod model;

use clap::{Parser, Subcommand, ValueEnum};
use flatcvt_core::{
    AcceptanceProfile, ConversionReport, ConvertError, Converter, ConverterOptions,
    FlatModelRecorder, FlatModelSummary,
};
use model::ModelError;
use serde::Serialize;
use std::path::PathBuf;

const EXIT_FAILURE: i32 = 1;
const EXIT_INFEASIBLE: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Flatten optimization models for a target backend")]
struct Cli {
    /// Log filter, overrides FLATCVT_TRACE
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a JSON model against an acceptance profile
    Convert(ConvertArgs),
    /// Summarize a link graph export
    Graph(GraphArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// JSON model description
    #[arg(long)]
    model: PathBuf,

    /// Constraint kinds the target accepts
    #[arg(long, value_enum, default_value = "mip")]
    profile: Profile,

    /// Converter option as name=value, repeatable (for example acc:max=0)
    #[arg(long = "option", value_name = "NAME=VALUE")]
    options: Vec<String>,

    /// Push every variable as continuous
    #[arg(long)]
    relax: bool,

    /// Write the link graph as JSON lines to this path
    #[arg(long)]
    writegraph: Option<PathBuf>,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct GraphArgs {
    /// JSON-lines link graph export
    #[arg(long)]
    input: PathBuf,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum Profile {
    Lp,
    Mip,
    Full,
}

impl From<Profile> for AcceptanceProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Lp => AcceptanceProfile::Lp,
            Profile::Mip => AcceptanceProfile::Mip,
            Profile::Full => AcceptanceProfile::Full,
        }
    }
}

#[derive(Debug, Serialize)]
struct ConvertOutput {
    report: ConversionReport,
    model: FlatModelSummary,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = logging::init(cli.log.clone()) {
        eprintln!("{err}");
        std::process::exit(EXIT_FAILURE);
    }
    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(exit_code(err.as_ref()));
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Convert(args) => convert_command(args),
        Command::Graph(args) => graph_command(args),
    }
}

fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    let infeasible = err
        .downcast_ref::<ModelError>()
        .is_some_and(ModelError::is_infeasible)
        || err
            .downcast_ref::<ConvertError>()
            .is_some_and(ConvertError::is_infeasible);
    if infeasible {
        EXIT_INFEASIBLE
    } else {
        EXIT_FAILURE
    }
}

fn build_options(args: &ConvertArgs) -> Result<ConverterOptions, Box<dyn std::error::Error>> {
    let mut options = ConverterOptions::new();
    for pair in &args.options {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(boxed_input_error(&format!(
                "option '{pair}' is not of the form name=value"
            )));
        };
        options.set(name.trim(), value)?;
    }
    if args.relax {
        options = options.with_relax(true);
    }
    if let Some(path) = &args.writegraph {
        options = options.with_write_graph(path.clone());
    }
    Ok(options)
}

fn convert_command(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(&args)?;
    let text = std::fs::read_to_string(&args.model)?;
    let description = model::parse_model(&text)?;

    let backend = FlatModelRecorder::new(args.profile.into());
    let mut cvt = Converter::new(backend, options);
    cvt.start_model_input().map_err(ModelError::from)?;
    model::load_model(&mut cvt, &description)?;
    let report = cvt.finish_model_input().map_err(ModelError::from)?;
    for warning in &report.warnings {
        tracing::warn!(
            component = "cli",
            operation = "convert",
            status = "fallback",
            warning = %warning,
            "Constraint kept in fallback form"
        );
    }

    let output = ConvertOutput {
        report,
        model: cvt.backend().summary(),
    };
    match args.format {
        OutputFormat::Table => print_convert_table(&output),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }
    Ok(())
}

fn graph_command(args: GraphArgs) -> Result<(), Box<dyn std::error::Error>> {
    let links = graph::load_links(&args.input)?;
    let summary = graph::summarize(&links);
    match args.format {
        OutputFormat::Table => graph::print_summary_table(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn print_convert_table(output: &ConvertOutput) {
    let report = &output.report;
    let model = &output.model;
    println!("backend: {}", model.backend);
    println!(
        "passes: {}  rewrites: {}  created: {} vars, {} cons",
        report.passes, report.rewrites, report.variables_created, report.constraints_created
    );
    println!(
        "variables: {} ({} integer)  objectives: {}",
        model.num_variables,
        model.num_integer,
        model.objectives.len()
    );
    println!("{:<32} {:>8}", "constraint", "count");
    for (kind, count) in &model.constraints {
        println!("{:<32} {:>8}", kind, count);
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
}

fn boxed_input_error(message: &str) -> Box<dyn std::error::Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}
