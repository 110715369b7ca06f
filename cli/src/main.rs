//! relayout CLI - page layout reconstruction tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

use relayout::{FootnoteNumbering, JsonPageSource, LayoutOptions, Orchestrator, PageSource};

#[derive(Parser)]
#[command(name = "relayout")]
#[command(version)]
#[command(about = "Rebuild reading-order HTML fragments from print-layout page dumps", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a page manifest to HTML
    Convert {
        /// Page manifest (JSON)
        #[arg(value_name = "PAGES")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Option overrides (JSON)
        #[arg(short, long, value_name = "FILE", env = "RELAYOUT_CONFIG")]
        config: Option<PathBuf>,

        /// Skip failing pages instead of aborting
        #[arg(long)]
        lenient: bool,

        /// Process pages on one thread
        #[arg(long)]
        sequential: bool,

        /// Keep printed footnote numbers (document numbers them continuously)
        #[arg(long)]
        continuous_footnotes: bool,

        /// Pixels per page unit when rendering
        #[arg(long, value_name = "SCALE")]
        scale: Option<f32>,
    },

    /// Dump the zones of one page as JSON
    Zones {
        /// Page manifest (JSON)
        #[arg(value_name = "PAGES")]
        input: PathBuf,

        /// Zero-based page index
        #[arg(short, long, default_value = "0")]
        page: usize,

        /// Option overrides (JSON)
        #[arg(short, long, value_name = "FILE", env = "RELAYOUT_CONFIG")]
        config: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show manifest information
    Info {
        /// Page manifest (JSON)
        #[arg(value_name = "PAGES")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            lenient,
            sequential,
            continuous_footnotes,
            scale,
        } => load_options(config.as_deref()).and_then(|mut options| {
            if lenient {
                options = options.lenient();
            }
            if sequential {
                options = options.sequential();
            }
            if continuous_footnotes {
                options = options.with_footnote_numbering(FootnoteNumbering::Continuous);
            }
            if let Some(scale) = scale {
                options = options.with_render_scale(scale);
            }
            cmd_convert(&input, output.as_deref(), options)
        }),
        Commands::Zones {
            input,
            page,
            config,
            output,
        } => load_options(config.as_deref())
            .and_then(|options| cmd_zones(&input, page, output.as_deref(), options)),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_options(config: Option<&Path>) -> Result<LayoutOptions, Box<dyn std::error::Error>> {
    match config {
        Some(path) => Ok(LayoutOptions::from_json_file(path)?),
        None => Ok(LayoutOptions::default()),
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    options: LayoutOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = JsonPageSource::open(input)?;

    let pb = ProgressBar::new(source.page_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message("Segmenting pages...");

    let progress = pb.clone();
    let orchestrator = Orchestrator::new(options)?.on_progress(move |done, _| {
        progress.set_position(done as u64);
    });
    let document = orchestrator.run(&source)?;
    pb.finish_with_message("Done!");

    let html = document.to_html();
    if let Some(path) = output {
        fs::write(path, &html)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", html);
    }

    let stats = &document.stats;
    eprintln!();
    eprintln!("{}", "Assembly Statistics".cyan().bold());
    eprintln!("{}", "─".repeat(40).dimmed());
    eprintln!("{}: {}", "Pages".bold(), stats.page_count);
    eprintln!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    eprintln!("{}: {}", "Headings".bold(), stats.heading_count);
    eprintln!("{}: {}", "Captions".bold(), stats.caption_count);
    eprintln!("{}: {}", "Tables".bold(), stats.table_count);
    eprintln!(
        "{}: {} resolved, {} unresolved, {} unreferenced",
        "Footnotes".bold(),
        stats.footnotes_resolved,
        stats.footnotes_unresolved,
        stats.footnotes_unreferenced
    );
    if !document.skipped_pages.is_empty() {
        eprintln!(
            "{}: {:?}",
            "Skipped pages".yellow().bold(),
            document.skipped_pages
        );
    }

    Ok(())
}

fn cmd_zones(
    input: &Path,
    page: usize,
    output: Option<&Path>,
    options: LayoutOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = JsonPageSource::open(input)?;
    let zones = Orchestrator::new(options)?.page_zones(&source, page)?;
    let json = serde_json::to_string_pretty(&zones)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = JsonPageSource::open(input)?;

    println!("{}", "Manifest Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), source.page_count());

    let manifest = source.manifest();
    let runs: usize = manifest.pages.iter().map(|p| p.page.runs.len()).sum();
    let operators: usize = manifest.pages.iter().map(|p| p.page.operators.len()).sum();
    let missing = manifest.pages.iter().filter(|p| p.image.is_none()).count();
    println!("{}: {}", "Text runs".bold(), runs);
    println!("{}: {}", "Drawing operators".bold(), operators);
    if missing > 0 {
        println!("{}: {}", "Pages without image".yellow().bold(), missing);
    }

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for entry in &manifest.pages {
        let vp = entry.page.viewport;
        println!(
            "  {} {:>4}  {:.1} x {:.1}  {} runs",
            "├─".dimmed(),
            entry.page.index,
            vp.width,
            vp.height,
            entry.page.runs.len()
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "relayout".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Page layout reconstruction tool");
    println!();
    println!("License: MIT");
}
