//! pagemark CLI - PDF, Word and image to embedding-friendly Markdown

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagemark::{
    enrich_file, CaptionConfig, ConvertConfig, DocumentConverter, DocxConverter, ImageConverter,
    OpenAiCaptioner, PageDriver,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pagemark")]
#[command(version)]
#[command(about = "Convert PDFs to Markdown and caption their images for embedding", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(long, value_name = "FILE")]
    pdf: Option<PathBuf>,

    /// Markdown written by the PDF step
    #[arg(long, value_name = "FILE", default_value = "raw.md")]
    raw: PathBuf,

    /// Markdown written by the captioning step
    #[arg(long, value_name = "FILE", default_value = "emb.md")]
    emb: PathBuf,

    /// Deepest heading level to assign
    #[arg(long, default_value_t = pagemark::DEFAULT_MAX_HEADING_LEVEL)]
    max_heading: u8,

    /// Table extraction strategy
    #[arg(long, value_enum, default_value = "lattice")]
    table_mode: TableModeArg,

    /// Directory for extracted images
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    image_dir: PathBuf,

    /// Skip the PDF step and caption an existing raw Markdown file
    #[arg(long)]
    skip_pdf: bool,

    /// Stop after the PDF step
    #[arg(long)]
    skip_emb: bool,

    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,

    /// API key for the captioning service [env: OPENAI_API_KEY]
    #[arg(long)]
    api_key: Option<String>,

    /// Captioning API base URL [env: BASE_URL]
    #[arg(long)]
    base_url: Option<String>,

    /// Vision model name [env: MODEL]
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature [env: TEMPERATURE]
    #[arg(long)]
    temperature: Option<f32>,

    /// Completion token limit [env: MAX_TOKENS]
    #[arg(long)]
    max_tokens: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a Word document to Markdown with pandoc
    Docx {
        /// Input .docx file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render an image, or a directory of images, as Markdown
    Image {
        /// Image file or directory
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TableModeArg {
    /// Tables delimited by ruling lines
    Lattice,
    /// Tables inferred from whitespace alignment
    Stream,
}

impl From<TableModeArg> for pagemark::TableMode {
    fn from(mode: TableModeArg) -> Self {
        match mode {
            TableModeArg::Lattice => pagemark::TableMode::Lattice,
            TableModeArg::Stream => pagemark::TableMode::Stream,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Docx { input, output }) => cmd_docx(input, output.as_deref(), &cli.image_dir),
        Some(Commands::Image { input, output }) => cmd_image(input, output.as_deref()),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => cmd_pipeline(&cli),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_pipeline(cli: &Cli) -> CliResult<()> {
    if cli.skip_pdf && cli.skip_emb {
        println!("{}", "Both steps skipped, nothing to do.".yellow());
        return Ok(());
    }

    if !cli.skip_pdf {
        let pdf = cli
            .pdf
            .as_deref()
            .ok_or("no PDF given; pass --pdf <FILE> or --skip-pdf")?;
        convert_pdf(cli, pdf)?;
    }

    if !cli.skip_emb {
        caption_images(cli)?;
    }

    println!("{}", "Done!".green().bold());
    Ok(())
}

fn convert_pdf(cli: &Cli, pdf: &Path) -> CliResult<()> {
    println!(
        "{} {} -> {}",
        "Converting".cyan(),
        pdf.display(),
        cli.raw.display()
    );

    let config = ConvertConfig::new()
        .with_max_heading_level(cli.max_heading)
        .with_table_mode(cli.table_mode.into())
        .with_image_dir(&cli.image_dir)
        .with_parallel(!cli.sequential);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pages")?
            .progress_chars("#>-"),
    );

    let result = PageDriver::new(&config).convert_file_with_progress(pdf, &cli.raw, |_, total| {
        pb.set_length(u64::from(total));
        pb.inc(1);
    });
    pb.finish_and_clear();
    let document = result?;

    let stats = &document.stats;
    println!(
        "  {} pages, {} headings, {} tables, {} images",
        stats.page_count, stats.heading_count, stats.table_count, stats.image_count
    );
    if stats.warning_count > 0 {
        println!(
            "  {} {} warnings (run with RUST_LOG=warn for details)",
            "!".yellow(),
            stats.warning_count
        );
    }
    Ok(())
}

fn caption_images(cli: &Cli) -> CliResult<()> {
    println!(
        "{} {} -> {}",
        "Captioning".cyan(),
        cli.raw.display(),
        cli.emb.display()
    );

    let config = caption_config(cli)?;
    log::debug!("Captioning with {} at {}", config.model, config.endpoint());
    let captioner = OpenAiCaptioner::new(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Waiting for the vision model...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = enrich_file(&cli.raw, &cli.emb, &captioner);
    spinner.finish_and_clear();
    let report = report?;

    println!(
        "  {} captioned, {} failed, {} missing",
        report.captioned, report.failed, report.missing
    );
    Ok(())
}

/// Environment settings, then command-line flags on top.
fn caption_config(cli: &Cli) -> CliResult<CaptionConfig> {
    let mut config = CaptionConfig::from_env()?;
    if let Some(key) = &cli.api_key {
        config = config.with_api_key(key);
    }
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url);
    }
    if let Some(model) = &cli.model {
        config = config.with_model(model);
    }
    if let Some(temperature) = cli.temperature {
        config = config.with_temperature(temperature);
    }
    if let Some(max_tokens) = cli.max_tokens {
        config = config.with_max_tokens(max_tokens);
    }
    Ok(config)
}

fn cmd_docx(input: &Path, output: Option<&Path>, image_dir: &Path) -> CliResult<()> {
    let config = ConvertConfig::new().with_image_dir(image_dir);
    let result = DocxConverter::new().convert(input, &config)?;
    emit(&result.content, output)
}

fn cmd_image(input: &Path, output: Option<&Path>) -> CliResult<()> {
    let result = ImageConverter::new().convert(input, &ConvertConfig::default())?;
    emit(&result.content, output)
}

fn emit(content: &str, output: Option<&Path>) -> CliResult<()> {
    if let Some(path) = output {
        create_parent(path)?;
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn create_parent(path: &Path) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagemark".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF, Word and image to embedding-friendly Markdown");
    println!();
    println!("License: MIT");
}
