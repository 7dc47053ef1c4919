//! Binary entry point for the tabq CLI.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tabq_core::driver::{parse_schema, run, QueryRequest};
use tabq_core::output::OutputFormat;
use tabq_core::read::InputType;
use tabq_core::Error;

mod logging;

#[derive(Parser, Debug)]
#[command(
    name = "tabq",
    version,
    about = "Query CSV and NDJSON files with a pipe-delimited query language"
)]
struct Cli {
    #[arg(
        long = "input",
        value_name = "[NAME=]PATH",
        required = true,
        help = "Input file path or name=path (repeatable)"
    )]
    inputs: Vec<String>,

    #[arg(long, value_name = "QUERY", help = "Query string")]
    query: String,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "csv",
        help = "Output format: csv|json|table"
    )]
    format: String,

    #[arg(
        long = "type",
        value_name = "TYPE",
        default_value = "csv",
        help = "Input file type: csv|json"
    )]
    input_type: String,

    #[arg(
        long,
        value_name = "COL:TYPE,...",
        help = "Explicit schema override; skips inference"
    )]
    schema: Option<String>,

    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log level filter (RUST_LOG overrides)"
    )]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::LogConfig::new(&cli.log_level).init();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tabq: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> tabq_core::Result<()> {
    let input_type = cli
        .input_type
        .parse::<InputType>()
        .map_err(|e| Error::Usage(e.to_string()))?;
    let format = cli
        .format
        .parse::<OutputFormat>()
        .map_err(|e| Error::Usage(e.to_string()))?;
    let schema = cli.schema.as_deref().map(parse_schema).transpose()?;

    let request = QueryRequest {
        inputs: cli.inputs.clone(),
        input_type,
        schema,
        query: cli.query.clone(),
        format,
    };
    let stdout = io::stdout();
    run(&request, stdout.lock())
}
