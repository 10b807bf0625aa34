use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use csv_to_opd::{
    sniff, ConversionJob, ConversionResult, Converter, ConverterError, Delimiter, OnRowError,
    RowPolicy, JOB_TEMPLATE,
};
use prompt::PromptHandler;
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::{info, Level};

mod prompt;

/// CSV to OPD Converter
/// Converts each row of a CSV file into its own OpenProdoc OPD document
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output for detailed processing information
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a CSV file into one OPD file per row
    Convert {
        /// Path to the CSV file to convert
        #[arg(short, long, value_name = "PATH TO CSV")]
        source: PathBuf,

        /// Output directory for generated OPD files
        #[arg(short, long, value_name = "OUTPUT DIRECTORY PATH")]
        output: PathBuf,

        /// Column delimiter used by the CSV file (tab, comma, semicolon, colon, space, pipe)
        #[arg(short, long, default_value = "tab")]
        delimiter: Delimiter,

        /// What to do with a row that cannot be converted
        #[arg(long, value_enum, default_value_t = RowErrorArg::Prompt)]
        on_row_error: RowErrorArg,

        /// Print the conversion result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a conversion described by a job file
    Run {
        /// Path to the job file
        #[arg(
            short,
            long,
            default_value = "job.jsonc",
            value_name = "PATH TO JOB"
        )]
        job: PathBuf,

        /// Print the conversion result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a job file template
    GenerateJob {
        /// Output path for the generated job file
        #[arg(short, long, default_value = "job.jsonc", value_name = "OUTPUT PATH")]
        output: PathBuf,
    },
    /// Print the delimiter a CSV file appears to use
    Detect {
        /// Path to the CSV file to inspect
        #[arg(short, long, value_name = "PATH TO CSV")]
        source: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RowErrorArg {
    Prompt,
    Continue,
    Abort,
}

impl From<RowErrorArg> for OnRowError {
    fn from(arg: RowErrorArg) -> Self {
        match arg {
            RowErrorArg::Prompt => OnRowError::Prompt,
            RowErrorArg::Continue => OnRowError::Continue,
            RowErrorArg::Abort => OnRowError::Abort,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging with appropriate level
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    info!("CSV to OPD Converter starting up...");

    match &cli.command {
        Commands::Convert {
            source,
            output,
            delimiter,
            on_row_error,
            json,
        } => {
            let converter = Converter::new(source, output, *delimiter);
            convert_command(&converter, (*on_row_error).into(), *json)
        }
        Commands::Run { job, json } => run_command(job, *json),
        Commands::GenerateJob { output } => {
            generate_job_command(output).map(|()| ExitCode::SUCCESS)
        }
        Commands::Detect { source } => detect_command(source).map(|()| ExitCode::SUCCESS),
    }
}

/// An interrupted run exits with a failure code once its summary is printed.
fn convert_command(
    converter: &Converter,
    on_row_error: OnRowError,
    json: bool,
) -> Result<ExitCode> {
    // Verify source file exists
    if !converter.source().exists() {
        anyhow::bail!("Source file not found: {}", converter.source().display());
    }

    info!(
        "Converting {} with delimiter '{}'",
        converter.source().display(),
        converter.delimiter().name()
    );

    let outcome = match on_row_error {
        OnRowError::Prompt => converter.convert(&mut PromptHandler::stdin()),
        OnRowError::Continue => converter.convert(&mut RowPolicy::Continue),
        OnRowError::Abort => converter.convert(&mut RowPolicy::Abort),
    };

    let result = match outcome {
        Ok(result) => result,
        Err(ConverterError::DelimiterMismatch { expected, got }) => {
            eprintln!("Separator \"{}\" expected, got \"{}\".", expected, got);
            anyhow::bail!(
                "Delimiter mismatch. Re-run with --delimiter {}",
                expected.name()
            );
        }
        Err(e) => return Err(e).context("Failed to convert CSV file"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", summary(&result));
    }

    if result.is_aborted() {
        return Ok(ExitCode::FAILURE);
    }

    info!("Conversion completed successfully");
    Ok(ExitCode::SUCCESS)
}

fn run_command(job_path: &PathBuf, json: bool) -> Result<ExitCode> {
    // Verify job file exists
    if !job_path.exists() {
        anyhow::bail!(
            "Job file not found: {}. Try using --job <PATH TO JOB>",
            job_path.display()
        );
    }

    let job = ConversionJob::from_file(job_path)
        .context("Failed to load job. See errors for additional details:")?;

    job.validate().context("Failed to validate job")?;
    info!("Job loaded: {} -> {}", job.source.display(), job.output.display());

    convert_command(&job.converter(), job.on_row_error, json)
}

fn generate_job_command(output: &Path) -> Result<()> {
    info!("Generating job template...");

    // if output is a directory, append the default file name
    let full_file_output_path = if output.is_dir() {
        output.join("job.jsonc")
    } else {
        output.into()
    };

    fs::write(&full_file_output_path, JOB_TEMPLATE)
        .context(format!("Failed to write job to: {}", output.display()))?;

    info!(
        "Successfully generated job template at: {}",
        full_file_output_path.display()
    );
    Ok(())
}

fn detect_command(source: &Path) -> Result<()> {
    let content =
        fs::read(source).context(format!("Failed to read source file: {}", source.display()))?;
    let content = String::from_utf8_lossy(&content);
    let first_line = content.lines().next().unwrap_or_default();

    match sniff(first_line).context("Failed to detect delimiter")? {
        Some(delimiter) => println!("{}", delimiter.name()),
        None => println!("none (single column)"),
    }
    Ok(())
}

/// Human readable one-line outcome of a run.
fn summary(result: &ConversionResult) -> String {
    if let Some(row) = result.aborted_at_row {
        return format!("Conversion interrupted at row {}.", row);
    }
    match result.rows_failed {
        0 => "Conversion completed!".to_string(),
        1 => "Conversion completed with 1 error.".to_string(),
        errors => format!("Conversion completed with {} errors.", errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_wording() {
        let mut result = ConversionResult::default();
        assert_eq!(summary(&result), "Conversion completed!");
        result.rows_failed = 1;
        assert_eq!(summary(&result), "Conversion completed with 1 error.");
        result.rows_failed = 4;
        assert_eq!(summary(&result), "Conversion completed with 4 errors.");
        result.aborted_at_row = Some(7);
        assert_eq!(summary(&result), "Conversion interrupted at row 7.");
    }

    #[test]
    fn test_cli_parses_delimiter_names() {
        let cli = Cli::try_parse_from([
            "csv-to-opd",
            "convert",
            "--source",
            "in.csv",
            "--output",
            "out",
            "--delimiter",
            "semicolon",
            "--on-row-error",
            "continue",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                delimiter,
                on_row_error,
                ..
            } => {
                assert_eq!(delimiter, Delimiter::Semicolon);
                assert!(matches!(on_row_error, RowErrorArg::Continue));
            }
            _ => panic!("expected convert command"),
        }
    }
}
