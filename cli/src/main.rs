//! pdfword CLI - PDF to DOCX conversion tool

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfword::convert::paths::{
    collect_pdf_files, format_file_size, output_path_for, validate_pdf_path,
};
use pdfword::render::{flow_to_json, report_to_json};
use pdfword::{
    build_flow_document, convert, convert_batch, ConversionResult, ConvertOptions, ImageQuality,
    JsonFormat, LayoutConfig, PageSelection, PdfParser, TableDetectionMode,
};

/// Exit status for invalid arguments or options.
const EXIT_USAGE: u8 = 2;
/// Exit status when a conversion failed.
const EXIT_FAILURE: u8 = 1;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pdfword")]
#[command(version)]
#[command(about = "Convert PDF files to editable Word documents", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output DOCX file (defaults to the input name with .docx)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    flags: ConvertFlags,

    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one PDF to DOCX
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output DOCX file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        flags: ConvertFlags,

        /// Write the fidelity report as JSON ("-" for stdout)
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Write the reconstructed flow document as JSON
        #[arg(long, value_name = "FILE")]
        dump_flow: Option<PathBuf>,
    },

    /// Convert many PDFs into one directory
    Batch {
        /// Input PDF files, or a single directory to scan
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Files converted concurrently
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,

        #[command(flatten)]
        flags: ConvertFlags,

        /// Write a JSON summary of every file
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone, Default)]
struct ConvertFlags {
    /// Drop images from the output
    #[arg(long)]
    no_images: bool,

    /// Table finders to run
    #[arg(long, value_enum, default_value = "both")]
    tables: TableMode,

    /// Read multi-column pages top to bottom instead of column by column
    #[arg(long)]
    no_columns: bool,

    /// Size cap of embedded images
    #[arg(long, value_enum, default_value = "medium")]
    quality: Quality,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Do not start each source page on a new page
    #[arg(long)]
    no_page_breaks: bool,

    /// JSON file with layout thresholds
    #[arg(long, value_name = "FILE", env = "PDFWORD_LAYOUT_CONFIG")]
    layout_config: Option<PathBuf>,

    /// Fail on the first undecodable page
    #[arg(long)]
    strict: bool,
}

#[derive(Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
enum TableMode {
    /// Ruling-line tables only
    RulesOnly,
    /// Whitespace-aligned tables only
    Heuristic,
    /// Both finders
    #[default]
    Both,
}

impl From<TableMode> for TableDetectionMode {
    fn from(mode: TableMode) -> Self {
        match mode {
            TableMode::RulesOnly => TableDetectionMode::RulesOnly,
            TableMode::Heuristic => TableDetectionMode::Heuristic,
            TableMode::Both => TableDetectionMode::Both,
        }
    }
}

#[derive(Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl From<Quality> for ImageQuality {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Low => ImageQuality::Low,
            Quality::Medium => ImageQuality::Medium,
            Quality::High => ImageQuality::High,
        }
    }
}

/// Failure of a command, split by exit status.
#[derive(Debug)]
enum CliError {
    /// Bad arguments, paths or option files
    Usage(String),
    /// The conversion itself failed
    Failed(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) | CliError::Failed(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<pdfword::Error> for CliError {
    fn from(err: pdfword::Error) -> Self {
        match err {
            pdfword::Error::InvalidArgument(_)
            | pdfword::Error::InvalidPageRange(_)
            | pdfword::Error::PageOutOfRange(..) => CliError::Usage(err.to_string()),
            other => CliError::Failed(other.to_string()),
        }
    }
}

fn exit_code(err: &(dyn std::error::Error + 'static)) -> u8 {
    match err.downcast_ref::<CliError>() {
        Some(CliError::Usage(_)) => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}

/// Input of the `pdfword <FILE> [OUTPUT]` shorthand; a bare invocation is a usage error.
fn shorthand_input(input: Option<PathBuf>) -> CliResult<PathBuf> {
    input.ok_or_else(|| {
        CliError::Usage(
            "no input file given\nUsage: pdfword <FILE> [OUTPUT]\n       pdfword --help for more information"
                .to_string(),
        )
        .into()
    })
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Help and version go to stdout with status 0, usage errors with 2.
        Err(e) => e.exit(),
    };
    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            flags,
            report,
            dump_flow,
        }) => cmd_convert(
            &input,
            output.as_deref(),
            &flags,
            report.as_deref(),
            dump_flow.as_deref(),
        ),
        Some(Commands::Batch {
            inputs,
            output,
            jobs,
            flags,
            summary,
        }) => cmd_batch(&inputs, &output, jobs, &flags, summary.as_deref()),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => shorthand_input(cli.input).and_then(|input| {
            cmd_convert(&input, cli.output.as_deref(), &cli.flags, None, None)
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(exit_code(e.as_ref()))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn build_options(flags: &ConvertFlags) -> Result<ConvertOptions, CliError> {
    let mut options = ConvertOptions::new()
        .with_images(!flags.no_images)
        .with_table_detection(flags.tables.into())
        .with_column_detection(!flags.no_columns)
        .with_image_quality(flags.quality.into())
        .with_page_breaks(!flags.no_page_breaks);

    if let Some(pages) = &flags.pages {
        options = options.with_pages(PageSelection::parse(pages)?);
    }
    if let Some(path) = &flags.layout_config {
        options = options.with_layout(LayoutConfig::from_json_file(path)?);
    }
    if flags.strict {
        options = options.strict();
    }
    Ok(options)
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    flags: &ConvertFlags,
    report: Option<&Path>,
    dump_flow: Option<&Path>,
) -> CliResult<()> {
    validate_pdf_path(input).map_err(CliError::from)?;
    let options = build_options(flags)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_path_for(input, None));

    let pb = spinner(&format!("Converting {}", input.display()));
    let converted = convert(input, &output, &options);
    pb.finish_and_clear();
    let result = converted.map_err(CliError::from)?;

    print_result(&result);

    if let Some(path) = report {
        let json = report_to_json(&result.report, JsonFormat::Pretty)?;
        if path == Path::new("-") {
            println!("{}", json);
        } else {
            fs::write(path, &json)?;
            println!("{} {}", "Report saved to".green(), path.display());
        }
    }

    if let Some(path) = dump_flow {
        // convert() does not hand back the flow, so lay the file out again.
        let doc = build_flow_document(input, &options).map_err(CliError::from)?;
        fs::write(path, flow_to_json(&doc, JsonFormat::Pretty)?)?;
        println!("{} {}", "Flow saved to".green(), path.display());
    }

    Ok(())
}

fn print_result(result: &ConversionResult) {
    let stats = &result.stats;
    println!(
        "{} {} ({})",
        "Saved to".green(),
        result.output.display(),
        format_file_size(stats.output_bytes)
    );
    println!(
        "  {} {} pages, {} paragraphs, {} tables, {} images",
        "├─".dimmed(),
        stats.page_count,
        stats.paragraph_count,
        stats.table_count,
        stats.image_count
    );
    for warning in &result.warnings {
        println!("  {} {}", "├─".dimmed(), warning.yellow());
    }
    if result.report.is_empty() {
        println!("  {} no fidelity losses", "└─".dimmed());
    } else {
        println!(
            "  {} {} fidelity notes",
            "└─".dimmed(),
            result.report.len().to_string().yellow()
        );
        for entry in &result.report.entries {
            log::info!("page {}: {}", entry.page, entry.reason);
        }
    }
}

/// Expand a single directory argument into the PDFs it contains.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CliError> {
    if let [dir] = inputs {
        if dir.is_dir() {
            let files = collect_pdf_files(dir)
                .map_err(|e| CliError::Usage(format!("cannot read {}: {}", dir.display(), e)))?;
            if files.is_empty() {
                return Err(CliError::Usage(format!(
                    "no PDF files found in {}",
                    dir.display()
                )));
            }
            return Ok(files);
        }
    }
    for input in inputs {
        validate_pdf_path(input)?;
    }
    Ok(inputs.to_vec())
}

fn cmd_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    jobs: Option<usize>,
    flags: &ConvertFlags,
    summary: Option<&Path>,
) -> CliResult<()> {
    let files = collect_inputs(inputs)?;
    let mut options = build_options(flags)?;
    if let Some(jobs) = jobs {
        if jobs == 0 {
            return Err(CliError::Usage("--jobs must be at least 1".to_string()).into());
        }
        options = options.with_workers(jobs);
    }
    fs::create_dir_all(output_dir)?;

    let pb = spinner(&format!("Converting {} files", files.len()));
    let results = convert_batch(&files, output_dir, &options);
    pb.finish_and_clear();

    let mut failed = 0;
    for result in &results {
        match &result.error {
            None => println!(
                "{} {} -> {} ({} notes)",
                "✓".green(),
                result.input.display(),
                result.output.display(),
                result.report.len()
            ),
            Some(e) => {
                failed += 1;
                println!("{} {}: {}", "✗".red(), result.input.display(), e);
            }
        }
    }

    if let Some(path) = summary {
        let summaries: Vec<_> = results.iter().map(ConversionResult::summary).collect();
        fs::write(path, serde_json::to_string_pretty(&summaries)?)?;
    }

    println!(
        "\n{} {} converted, {} failed",
        "Done!".green().bold(),
        results.len() - failed,
        failed
    );
    if failed > 0 {
        return Err(CliError::Failed(format!("{} of {} files failed", failed, results.len())).into());
    }
    Ok(())
}

fn cmd_info(input: &Path) -> CliResult<()> {
    validate_pdf_path(input).map_err(CliError::from)?;
    let parser = PdfParser::open(input).map_err(CliError::from)?;
    let metadata = parser.metadata();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), parser.version());
    println!("{}: {}", "Pages".bold(), parser.page_count());

    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    if let Ok(geometry) = parser.page_geometry(1) {
        println!(
            "{}: {:.0} x {:.0} pt",
            "Page size".bold(),
            geometry.width(),
            geometry.height()
        );
    }

    for warning in parser.warnings() {
        println!("{}: {}", "Warning".yellow().bold(), warning);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfword".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF to DOCX conversion tool");
    println!();
    println!("License: MIT");
}
