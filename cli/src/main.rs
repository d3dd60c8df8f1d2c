//! folio CLI - rich-text document rendering tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use folio::render::{self, ContentStats};
use folio::{
    parse_file_with_options, Document, JsonFormat, PageGeometry, PageSelection,
    PaginationOptions, Paginator, ParseOptions, PhysicalPage, RenderOptions, TextPage,
    TextPaginator,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Render rich-text JSON documents to HTML, text and page layouts", long_about = None)]
struct Cli {
    /// Input document (JSON)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Reject malformed nodes instead of recovering
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to all formats (HTML, text, JSON)
    Convert {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Render a document to HTML
    Html {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit a complete HTML page
        #[arg(short, long)]
        standalone: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Render a document to plain text
    Text {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Precede each page with a "Page N" line
        #[arg(long)]
        headers: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Normalize a document to JSON
    Json {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Lay out rendered page heights onto physical pages
    Plan {
        /// Rendered height of each logical page, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        heights: Vec<f64>,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Lay out a document's text onto physical pages
    Layout {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args, Debug, Clone, Copy)]
struct GeometryArgs {
    /// Page width
    #[arg(long, env = "FOLIO_PAGE_WIDTH", default_value_t = 210.0)]
    page_width: f64,

    /// Page height
    #[arg(long, env = "FOLIO_PAGE_HEIGHT", default_value_t = 297.0)]
    page_height: f64,

    /// Margin on all sides
    #[arg(long, env = "FOLIO_PAGE_MARGIN", default_value_t = 20.0)]
    margin: f64,

    /// Space reserved for the footer
    #[arg(long, env = "FOLIO_FOOTER_RESERVE", default_value_t = 20.0)]
    footer_reserve: f64,
}

impl GeometryArgs {
    fn text_paginator(&self) -> folio::Result<TextPaginator> {
        let geometry = PageGeometry::new(self.page_width, self.page_height, self.margin)?;
        TextPaginator::with_geometry(geometry)
    }

    fn paginator(&self) -> folio::Result<Paginator> {
        let geometry = PageGeometry::new(self.page_width, self.page_height, self.margin)?;
        Paginator::new(
            geometry,
            PaginationOptions::new().with_footer_reserve(self.footer_reserve),
        )
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let parse_options = if cli.strict {
        ParseOptions::new().strict()
    } else {
        ParseOptions::new()
    };

    let result = match cli.command {
        Some(Commands::Convert { input, output }) => {
            cmd_convert(&input, output.as_deref(), &parse_options)
        }
        Some(Commands::Html {
            input,
            output,
            standalone,
            pages,
        }) => cmd_html(
            &input,
            output.as_deref(),
            standalone,
            pages.as_deref(),
            &parse_options,
        ),
        Some(Commands::Text {
            input,
            output,
            headers,
            pages,
        }) => cmd_text(
            &input,
            output.as_deref(),
            headers,
            pages.as_deref(),
            &parse_options,
        ),
        Some(Commands::Json {
            input,
            output,
            compact,
        }) => cmd_json(&input, output.as_deref(), compact, &parse_options),
        Some(Commands::Info { input }) => cmd_info(&input, &parse_options),
        Some(Commands::Plan {
            heights,
            json,
            geometry,
        }) => cmd_plan(&heights, json, &geometry),
        Some(Commands::Layout {
            input,
            json,
            geometry,
        }) => cmd_layout(&input, json, &geometry, &parse_options),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), &parse_options)
            } else {
                println!("{}", "Usage: folio <FILE> [OUTPUT]".yellow());
                println!("       folio --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn page_selection(pages: Option<&str>) -> CliResult<PageSelection> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?),
        None => Ok(PageSelection::All),
    }
}

fn emit(output: Option<&Path>, content: &str) -> CliResult<()> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_convert(input: &Path, output: Option<&Path>, options: &ParseOptions) -> CliResult<()> {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    log::debug!("Writing outputs to {}", output_dir.display());
    pb.set_message("Parsing document...");
    let doc = parse_file_with_options(input, options)?;
    pb.inc(1);

    let written = write_all_formats(&doc, &output_dir, |step| {
        pb.set_message(format!("Generating {}...", step));
        pb.inc(1);
    })?;

    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    for (i, name) in written.iter().enumerate() {
        let branch = if i + 1 == written.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), name);
    }

    Ok(())
}

/// Write `document.html`, `document.txt` and `document.json` into `dir`.
fn write_all_formats(
    doc: &Document,
    dir: &Path,
    mut on_step: impl FnMut(&str),
) -> CliResult<Vec<&'static str>> {
    fs::create_dir_all(dir)?;

    let html = render::document_to_html(doc, &RenderOptions::new().with_standalone(true));
    fs::write(dir.join("document.html"), html)?;
    on_step("HTML");

    let text = render::document_to_text(doc, &RenderOptions::new().with_page_headers(true));
    fs::write(dir.join("document.txt"), text)?;
    on_step("text");

    let json = render::to_json(doc, JsonFormat::Pretty)?;
    fs::write(dir.join("document.json"), json)?;
    on_step("JSON");

    Ok(vec!["document.html", "document.txt", "document.json"])
}

fn cmd_html(
    input: &Path,
    output: Option<&Path>,
    standalone: bool,
    pages: Option<&str>,
    options: &ParseOptions,
) -> CliResult<()> {
    let doc = parse_file_with_options(input, options)?;
    let render_options = RenderOptions::new()
        .with_standalone(standalone)
        .with_pages(page_selection(pages)?);

    emit(output, &render::document_to_html(&doc, &render_options))
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    headers: bool,
    pages: Option<&str>,
    options: &ParseOptions,
) -> CliResult<()> {
    let doc = parse_file_with_options(input, options)?;
    let render_options = RenderOptions::new()
        .with_page_headers(headers)
        .with_pages(page_selection(pages)?);

    emit(output, &render::document_to_text(&doc, &render_options))
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    options: &ParseOptions,
) -> CliResult<()> {
    let doc = parse_file_with_options(input, options)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    emit(output, &render::to_json(&doc, format)?)
}

fn cmd_info(input: &Path, options: &ParseOptions) -> CliResult<()> {
    let doc = parse_file_with_options(input, options)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Title".bold(), doc.title);
    if !doc.id.is_empty() {
        println!("{}: {}", "Id".bold(), doc.id);
    }
    println!("{}: {}", "Pages".bold(), doc.page_count());
    if let Some(created) = doc.created_at {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(updated) = doc.updated_at {
        println!("{}: {}", "Updated".bold(), updated);
    }

    let stats = ContentStats::collect(&doc, &RenderOptions::default());

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Words".bold(), stats.word_count);
    println!("{}: {}", "Characters".bold(), stats.char_count);
    println!("{}: {}", "Headings".bold(), stats.heading_count);
    println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    println!("{}: {}", "Tables".bold(), stats.table_count);
    println!("{}: {}", "Images".bold(), stats.image_count);

    Ok(())
}

/// Paginate each height as one logical page, after a title page at index 0.
fn plan(heights: &[f64], paginator: &Paginator) -> folio::Result<Vec<PhysicalPage>> {
    let mut pages = Vec::new();
    for (index, &height) in heights.iter().enumerate() {
        let source = folio::paginate::SliceSource {
            image_id: format!("page-{}", index + 1),
            height,
            logical_index: index,
            logical_count: heights.len(),
        };
        let first = pages.len() + 1;
        pages.extend(paginator.paginate(&source, first)?);
    }
    Ok(pages)
}

fn cmd_plan(heights: &[f64], json: bool, geometry: &GeometryArgs) -> CliResult<()> {
    let paginator = geometry.paginator()?;
    let pages = plan(heights, &paginator)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pages)?);
        return Ok(());
    }

    println!(
        "{} {:.1} per page",
        "Slice limit:".cyan().bold(),
        paginator.slice_height_limit()
    );
    println!("{}", "─".repeat(40).dimmed());
    println!("{:>4}  {}", 0, "title page".dimmed());
    for page in &pages {
        for placement in &page.placements {
            println!(
                "{:>4}  {}  [{:.1} .. {:.1}]",
                page.index,
                page.footer,
                placement.source_y_offset,
                placement.source_y_offset + placement.slice_height
            );
        }
    }
    println!(
        "\n{} {} physical pages",
        "Total:".green().bold(),
        pages.len() + 1
    );

    Ok(())
}

fn cmd_layout(
    input: &Path,
    json: bool,
    geometry: &GeometryArgs,
    options: &ParseOptions,
) -> CliResult<()> {
    let doc = parse_file_with_options(input, options)?;
    let paginator = geometry.text_paginator()?;
    let pages = paginator.layout_document(&doc);

    if json {
        println!("{}", serde_json::to_string_pretty(&pages)?);
        return Ok(());
    }

    println!(
        "{} {} characters per line",
        "Line width:".cyan().bold(),
        paginator.max_chars()
    );
    println!("{}", "─".repeat(40).dimmed());
    println!("{:>4}  {}", 0, "title page".dimmed());
    for page in &pages {
        print_text_page(page);
    }
    println!(
        "\n{} {} physical pages",
        "Total:".green().bold(),
        pages.len() + 1
    );

    Ok(())
}

fn print_text_page(page: &TextPage) {
    let footer = page.footer().map(|l| l.text.as_str()).unwrap_or("");
    println!(
        "{:>4}  {} lines  {}",
        page.index,
        page.body().count(),
        footer.dimmed()
    );
}

fn cmd_version() {
    println!("{} {}", "folio".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Rich-text document rendering tool");
    println!();
    println!("License: MIT");
}
