//! docweave CLI - PDF text reconstruction and OOXML package merging

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docweave::{
    detect_format_from_path, BodyTags, ExtractionStats, GlyphRunSource, InputFormat, JsonFormat,
    LayoutOptions, LopdfGlyphSource, MergeJob, MergeOptions, Package, PageSelection,
    ParagraphPolicy, Reconstructor, RenderOptions, SanitizeRules, YAxis,
};

#[derive(Parser)]
#[command(name = "docweave")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Reconstruct PDF text and merge OOXML packages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct the text of a PDF
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Paragraph policy
        #[arg(long, value_enum, default_value = "gap")]
        policy: Policy,

        /// Maximum vertical distance between runs on one line
        #[arg(long, default_value_t = 5.0)]
        y_threshold: f32,

        /// Vertical gap that starts a new paragraph
        #[arg(long, default_value_t = 15.0)]
        paragraph_gap: f32,

        /// Source y axis grows downward
        #[arg(long)]
        y_down: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Decode pages in parallel
        #[arg(long)]
        parallel: bool,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long, requires = "json")]
        compact: bool,
    },

    /// Append the body content of packages to a master package
    Merge {
        /// Master package
        #[arg(value_name = "MASTER")]
        master: PathBuf,

        /// Packages to append, in order
        #[arg(value_name = "ADDITIONS", required = true)]
        additions: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Merge preset (detected from the master if not specified)
        #[arg(long, value_enum)]
        preset: Option<Preset>,

        /// Part to merge, overriding the preset
        #[arg(long, value_name = "PATH")]
        part: Option<String>,

        /// Body element qualified name, overriding the preset (e.g., "w:body")
        #[arg(long, value_name = "QNAME")]
        element: Option<String>,

        /// Markup inserted before each appended body, overriding the preset
        #[arg(long, value_name = "XML")]
        separator: Option<String>,

        /// Keep images and relationship references (may produce invalid files)
        #[arg(long)]
        no_sanitize: bool,

        /// Print the merge report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show file information
    Info {
        /// Input PDF or package
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Every line is a paragraph
    Line,
    /// Vertical gaps separate paragraphs
    Gap,
}

impl From<Policy> for ParagraphPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Line => ParagraphPolicy::LineIsParagraph,
            Policy::Gap => ParagraphPolicy::GapIsBoundary,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Word-processing documents (word/document.xml, w:body)
    Docx,
    /// Presentations (ppt/slides/slide1.xml, p:spTree)
    Pptx,
}

impl From<Preset> for MergeOptions {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Docx => MergeOptions::wordprocessing(),
            Preset::Pptx => MergeOptions::presentation(),
        }
    }
}

struct TextArgs {
    policy: Policy,
    y_threshold: f32,
    paragraph_gap: f32,
    y_down: bool,
    pages: Option<String>,
    parallel: bool,
}

struct MergeArgs {
    preset: Option<Preset>,
    part: Option<String>,
    element: Option<String>,
    separator: Option<String>,
    no_sanitize: bool,
    json: bool,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Text {
            input,
            output,
            policy,
            y_threshold,
            paragraph_gap,
            y_down,
            pages,
            parallel,
            json,
            compact,
        } => {
            let args = TextArgs {
                policy,
                y_threshold,
                paragraph_gap,
                y_down,
                pages,
                parallel,
            };
            let format = json.then_some(if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            });
            cmd_text(&input, output.as_deref(), &args, format)
        }
        Commands::Merge {
            master,
            additions,
            output,
            preset,
            part,
            element,
            separator,
            no_sanitize,
            json,
        } => {
            let args = MergeArgs {
                preset,
                part,
                element,
                separator,
                no_sanitize,
                json,
            };
            cmd_merge(&master, &additions, &output, &args)
        }
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

fn layout_options(args: &TextArgs) -> CliResult<LayoutOptions> {
    let pages = match args.pages.as_deref() {
        Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?,
        None => PageSelection::All,
    };

    Ok(LayoutOptions::new()
        .with_policy(args.policy.into())
        .with_y_threshold(args.y_threshold)
        .with_paragraph_gap(args.paragraph_gap)
        .with_y_axis(if args.y_down { YAxis::Down } else { YAxis::Up })
        .with_pages(pages)
        .with_parallel(args.parallel))
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    args: &TextArgs,
    json: Option<JsonFormat>,
) -> CliResult<()> {
    let reconstructor = Reconstructor::new(layout_options(args)?)?;
    let source = LopdfGlyphSource::load_file(input)?;
    let doc = reconstructor.reconstruct(&source)?;

    for skipped in &doc.skipped {
        eprintln!("{} {}", "Skipped".yellow(), skipped);
    }

    let rendered = match json {
        Some(format) => docweave::render::to_json(&doc, format)?,
        None => docweave::render::to_text(&doc, &RenderOptions::default()),
    };

    if let Some(path) = output {
        fs::write(path, &rendered)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", rendered);
    }

    Ok(())
}

fn merge_options(master: &[u8], args: &MergeArgs) -> CliResult<MergeOptions> {
    let mut options: MergeOptions = match args.preset {
        Some(preset) => preset.into(),
        None => {
            let kind = Package::open(master)?.kind();
            kind.merge_options()
                .ok_or_else(|| format!("Cannot merge a {}; pass --preset", kind))?
        }
    };

    if let Some(part) = &args.part {
        options = options.with_part_path(part.as_str());
    }
    if let Some(element) = &args.element {
        options = options.with_tags(BodyTags::element(element));
    }
    if let Some(separator) = &args.separator {
        options = options.with_separator(separator.as_str());
    }
    if args.no_sanitize {
        options = options.with_sanitize_rules(SanitizeRules::none());
    }

    Ok(options)
}

fn cmd_merge(master: &Path, additions: &[PathBuf], output: &Path, args: &MergeArgs) -> CliResult<()> {
    let master_bytes = fs::read(master)?;
    let options = merge_options(&master_bytes, args)?;
    let mut job = MergeJob::open(master_bytes, options)?;

    let pb = ProgressBar::new(additions.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    for path in additions {
        pb.set_message(path.display().to_string());
        job.add_file(path);
        pb.inc(1);
    }

    pb.set_message("Splicing...");
    let result = job.finish()?;
    pb.finish_with_message("Done!");

    fs::write(output, &result.bytes)?;

    if args.json {
        let report = serde_json::json!({
            "output": output.display().to_string(),
            "merged": result.merged,
            "skipped": result.skipped,
            "stripped_elements": result.stripped_elements,
            "stripped_attributes": result.stripped_attributes,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{} {}", "Saved to".green(), output.display());
    println!("  {} {} merged", "├─".dimmed(), result.merged.len());
    println!(
        "  {} {} elements, {} attributes stripped",
        "├─".dimmed(),
        result.stripped_elements,
        result.stripped_attributes
    );
    println!("  {} {} skipped", "└─".dimmed(), result.skipped.len());

    for skipped in &result.skipped {
        eprintln!("{} {}", "Skipped".yellow(), skipped);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> CliResult<()> {
    let format = detect_format_from_path(input)?;

    println!("{}", "File Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);

    match format {
        InputFormat::Pdf(_) => {
            let source = LopdfGlyphSource::load_file(input)?;
            println!("{}: {}", "Pages".bold(), source.page_count());

            let doc = Reconstructor::default().reconstruct(&source)?;
            let stats = ExtractionStats::from_document(&doc);

            println!();
            println!("{}", "Content Statistics".cyan().bold());
            println!("{}", "─".repeat(40).dimmed());
            println!("{}: {}", "Lines".bold(), stats.line_count);
            println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
            println!("{}: {}", "Words".bold(), stats.word_count);
            println!("{}: {}", "Characters".bold(), stats.char_count);
            if stats.skipped_page_count > 0 {
                println!(
                    "{}: {}",
                    "Undecodable pages".bold(),
                    stats.skipped_page_count.to_string().yellow()
                );
            }
        }
        InputFormat::Package => {
            let package = Package::open_file(input)?;
            let kind = package.kind();
            println!("{}: {}", "Kind".bold(), kind);
            println!("{}: {}", "Parts".bold(), package.part_count());

            if let Some(options) = kind.merge_options() {
                let present = if package.contains(&options.part_path) {
                    "present".green()
                } else {
                    "missing".red()
                };
                println!("{}: {} ({})", "Body part".bold(), options.part_path, present);
            }
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docweave".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF text reconstruction and OOXML package merging");
    println!();
    println!("License: MIT");
}
