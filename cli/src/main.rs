//! doclayer CLI - convert between hierarchical and layered document JSON

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use doclayer::infer::Predictors;
use doclayer::model::SourceDocument;
use doclayer::render;
use doclayer::{detect_format, ConvertOptions, Doclayer, Format, JsonFormat};

#[derive(Parser)]
#[command(name = "doclayer")]
#[command(version)]
#[command(about = "Convert between hierarchical and layered document JSON", long_about = None)]
struct Cli {
    /// Input JSON file (converted to the other model)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by the converting commands.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Input JSON file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output compact JSON
    #[arg(long)]
    compact: bool,

    /// Conversion options as a JSON file
    #[arg(long, value_name = "JSON", env = "DOCLAYER_OPTIONS")]
    options: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a hierarchical document to the layered model
    Forward {
        #[command(flatten)]
        args: ConvertArgs,

        /// Do not infer structure for pages with raw lines only
        #[arg(long)]
        no_infer: bool,

        /// Add reordered display text to RTL entities
        #[arg(long)]
        display_reordering: bool,
    },

    /// Convert a layered document back to the hierarchical model
    Reverse {
        #[command(flatten)]
        args: ConvertArgs,
    },

    /// Show the structure inferred from each page's raw lines
    Infer {
        /// Input hierarchical JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Conversion options as a JSON file
        #[arg(long, value_name = "JSON")]
        options: Option<PathBuf>,
    },

    /// Check a document against its model's schema
    Validate {
        /// Input JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show document information
    Info {
        /// Input JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Forward {
            args,
            no_infer,
            display_reordering,
        }) => cmd_forward(&args, no_infer, display_reordering),
        Some(Commands::Reverse { args }) => cmd_reverse(&args),
        Some(Commands::Infer { input, options }) => cmd_infer(&input, options.as_deref()),
        Some(Commands::Validate { input }) => cmd_validate(&input),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert to the other model if input is provided
            if let Some(input) = cli.input {
                cmd_auto(&input, cli.output.as_deref())
            } else {
                println!("{}", "Usage: doclayer <FILE> [-o OUTPUT]".yellow());
                println!("       doclayer --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_options(path: Option<&Path>) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(ConvertOptions::from_json_str(&fs::read_to_string(path)?)?),
        None => Ok(ConvertOptions::default()),
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_auto(input: &Path, output: Option<&Path>) -> CliResult {
    let json = doclayer::convert_file(input, JsonFormat::Pretty)?;
    write_output(output, &json)
}

fn cmd_forward(args: &ConvertArgs, no_infer: bool, display_reordering: bool) -> CliResult {
    let mut options = load_options(args.options.as_deref())?;
    if no_infer {
        options = options.without_inference();
    }
    if display_reordering {
        options = options.with_display_reordering(true);
    }

    let source = render::source_from_json_str(&fs::read_to_string(&args.input)?)?;
    let result = Doclayer::new().with_options(options).forward(&source)?;

    let stats = &result.report.stats;
    log::info!(
        "{} pages, {} items, {} inferred pages",
        stats.page_count,
        stats.item_count,
        stats.inferred_page_count
    );
    write_output(args.output.as_deref(), &result.to_json(json_format(args.compact))?)
}

fn cmd_reverse(args: &ConvertArgs) -> CliResult {
    let options = load_options(args.options.as_deref())?;
    let doc = render::from_json_str(&fs::read_to_string(&args.input)?)?;
    let converted = Doclayer::new().with_options(options).reverse(&doc)?;

    for warning in &converted.report.warnings {
        eprintln!("{}: {}", "Skipped".yellow(), warning);
    }
    let json = render::source_to_json(&converted.output, json_format(args.compact))?;
    write_output(args.output.as_deref(), &json)
}

fn cmd_infer(input: &Path, options: Option<&Path>) -> CliResult {
    let options = load_options(options)?;
    let source: SourceDocument = render::source_from_json_str(&fs::read_to_string(input)?)?;
    let predictors = Predictors::heuristic(&options.inference);

    for (index, page) in source.pages.iter().enumerate() {
        let (width, height) = page.dimensions(options.default_page_width, options.default_page_height);
        println!("{} {}", "Page".cyan().bold(), index + 1);
        println!("{}", "─".repeat(40).dimmed());
        if page.lines.is_empty() {
            println!("  {}", "no raw lines".dimmed());
            continue;
        }

        let structure = predictors.infer_page(&page.lines, width, height);
        for title in &structure.titles {
            println!("  {} [{}] {}", "title".bold(), title.kind.as_str(), title.text);
        }
        for heading in &structure.headings {
            println!("  {} [h{}] {}", "heading".bold(), heading.level, heading.text);
        }
        println!("  {}: {}", "paragraphs".bold(), structure.paragraphs.len());
        for table in &structure.tables {
            println!(
                "  {} {}x{} {}",
                "table".bold(),
                table.num_rows,
                table.num_cols,
                table.caption.as_deref().unwrap_or("").dimmed()
            );
        }
    }
    Ok(())
}

fn cmd_validate(input: &Path) -> CliResult {
    let json = fs::read_to_string(input)?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    let format = detect_format(&value)?;
    match format {
        Format::Layered => {
            render::from_json_str(&json)?;
        }
        Format::Hierarchical => {
            render::source_from_json_str(&json)?;
        }
    }
    println!("{} {} document", "Valid".green().bold(), format);
    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let json = fs::read_to_string(input)?;
    let value: serde_json::Value = serde_json::from_str(&json)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());

    match detect_format(&value)? {
        Format::Layered => {
            let doc = render::from_json_str(&json)?;
            println!("{}: layered", "Model".bold());
            println!("{}: {}", "Id".bold(), doc.id);
            println!("{}: {}", "Pages".bold(), doc.page_count());
            println!("{}: {}", "Characters".bold(), doc.symbol_count());
            println!();
            println!("{}", "Layers".cyan().bold());
            println!("{}", "─".repeat(40).dimmed());
            for (name, entities) in doc.layers() {
                println!("{}: {}", name.bold(), entities.len());
            }
        }
        Format::Hierarchical => {
            let source = render::source_from_json_str(&json)?;
            let items = source.items().count();
            let lines: usize = source.pages.iter().map(|p| p.lines.len()).sum();
            println!("{}: hierarchical", "Model".bold());
            println!("{}: {}", "Id".bold(), source.id);
            println!("{}: {}", "Pages".bold(), source.page_count());
            println!("{}: {}", "Items".bold(), items);
            println!("{}: {}", "Raw lines".bold(), lines);
        }
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "doclayer".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Hierarchical <-> layered document conversion tool");
    println!();
    println!("License: MIT");
}
