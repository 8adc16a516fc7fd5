//! CLI entry point for `mhtml-extract`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mhtml_extract::config;
use mhtml_extract::extractor::{ExtractOptions, Extractor};
use mhtml_extract::model::part::PartCategory;
use mhtml_extract::model::stats::ExtractionStats;

#[derive(Parser)]
#[command(
    name = "mhtml-extract",
    version,
    about = "Extract the bundled resources of an MHTML archive into standalone files"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// MHTML archive to extract
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output directory for the extracted files (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Read chunk size in bytes (clamped to a supported range; auto-tuned by default)
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// Clear the output directory before extraction
    #[arg(long)]
    clear: bool,

    /// Skip CSS parts and leave their references untouched
    #[arg(long)]
    no_css: bool,

    /// Skip image parts and leave their references untouched
    #[arg(long)]
    no_images: bool,

    /// Extract only the listed categories (html, css, image, javascript, other)
    #[arg(long, value_name = "CATEGORY", value_delimiter = ',')]
    only: Vec<String>,

    /// Extract only HTML parts and skip the link-rewrite pass
    #[arg(long)]
    html_only: bool,

    /// Parse and classify the archive without writing any files
    #[arg(long)]
    dry_run: bool,

    /// Print the run statistics as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Some(Commands::Completions { shell }) => return cmd_completions(shell),
        Some(Commands::Manpage) => return cmd_manpage(),
        None => {}
    }

    let Some(file) = cli.file else {
        anyhow::bail!("missing archive path (see --help)");
    };

    let output_dir = cli
        .output_dir
        .or_else(|| config.extract.default_output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let options = ExtractOptions {
        output_dir: output_dir.clone(),
        chunk_size: cli.chunk_size.or(config.performance.chunk_size),
        clear_output_dir: cli.clear,
        no_css: cli.no_css || config.extract.no_css,
        no_images: cli.no_images || config.extract.no_images,
        html_only: cli.html_only,
        dry_run: cli.dry_run,
        allow: parse_allow_list(&cli.only)?,
    };

    let extractor = Extractor::new(&file, options)?;

    let pb = ProgressBar::new(extractor.file_size());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")?
            .progress_chars("=>-"),
    );
    let progress = |read: u64, _total: u64| pb.set_position(read);
    let stats = extractor.run(Some(&progress))?;
    pb.finish_and_clear();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats, &output_dir, cli.dry_run);
    }

    Ok(())
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &config::Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mhtml-extract.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Parse `--only` category names into an allow-list.
fn parse_allow_list(names: &[String]) -> anyhow::Result<Option<Vec<PartCategory>>> {
    if names.is_empty() {
        return Ok(None);
    }
    let mut allow = Vec::with_capacity(names.len());
    for name in names {
        match PartCategory::from_name(name) {
            Some(category) => allow.push(category),
            None => anyhow::bail!(
                "unknown category '{name}' (expected html, css, image, javascript or other)"
            ),
        }
    }
    Ok(Some(allow))
}

/// Print a human-readable run summary.
fn print_summary(stats: &ExtractionStats, output_dir: &Path, dry_run: bool) {
    use humansize::{format_size, DECIMAL};

    let verb = if dry_run { "Would extract" } else { "Extracted" };
    println!(
        "{verb} {} of {} parts into {} ({}) in {:.2?}",
        stats.extracted_count(),
        stats.parts_seen,
        output_dir.display(),
        format_size(stats.total_bytes, DECIMAL),
        stats.elapsed,
    );
    println!(
        "  html: {}  css: {}  images: {}  other: {}  skipped: {}",
        stats.html_count, stats.css_count, stats.image_count, stats.other_count, stats.skipped_count,
    );
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mhtml-extract", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
