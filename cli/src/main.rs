//! versepage CLI - tokenize and typeset verse-structured markup

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use versepage::render::to_json;
use versepage::{
    CrossReferenceTable, FontBook, JsonFormat, LayoutConfig, LexerOptions, TypesetOutput,
    Versepage,
};

#[derive(Parser)]
#[command(name = "versepage")]
#[command(version)]
#[command(about = "Typeset verse-structured markup into pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a markup file
    Tokens {
        /// Input markup file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON instead of one token per line
        #[arg(long)]
        json: bool,

        /// Lex citations (reference mode)
        #[arg(long)]
        references: bool,

        /// Maximum number of tokens
        #[arg(long, env = "VERSEPAGE_MAX_TOKENS")]
        max_tokens: Option<usize>,
    },

    /// Typeset a markup file into pages
    Typeset {
        /// Input markup file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Layout configuration (JSON)
        #[arg(short, long, value_name = "FILE", env = "VERSEPAGE_CONFIG")]
        config: Option<PathBuf>,

        /// Cross-reference table (JSON object of citation -> entries)
        #[arg(long, value_name = "FILE")]
        crossrefs: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Lex citations (reference mode)
        #[arg(long)]
        references: bool,

        /// Draw vertical-space debug bars
        #[arg(long)]
        debug_vspace: bool,
    },

    /// Show layout statistics for a markup file
    Info {
        /// Input markup file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Layout configuration (JSON)
        #[arg(short, long, value_name = "FILE", env = "VERSEPAGE_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Plain text, pages separated by form feeds
    Text,
    /// Drawn lines with page and position
    Lines,
    /// One summary per page
    Pages,
    /// Pages, drawing operations and statistics as JSON
    Json,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tokens {
            input,
            json,
            references,
            max_tokens,
        } => cmd_tokens(&input, json, references, max_tokens),
        Commands::Typeset {
            input,
            output,
            config,
            crossrefs,
            format,
            compact,
            references,
            debug_vspace,
        } => cmd_typeset(
            &input,
            output.as_deref(),
            config.as_deref(),
            crossrefs.as_deref(),
            format,
            compact,
            references,
            debug_vspace,
        ),
        Commands::Info { input, config } => cmd_info(&input, config.as_deref()),
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

fn load_config(path: Option<&Path>) -> Result<LayoutConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(LayoutConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(LayoutConfig::default()),
    }
}

fn cmd_tokens(
    input: &Path,
    json: bool,
    references: bool,
    max_tokens: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = LexerOptions::new();
    if references {
        options = options.references();
    }
    if let Some(limit) = max_tokens {
        options = options.with_max_tokens(limit);
    }

    let tokens = versepage::lexer::tokenize_file(input, &options)?;
    if json {
        println!("{}", to_json(&tokens, JsonFormat::Pretty)?);
    } else {
        for token in &tokens {
            println!("{:>6}  {}", token.line.to_string().dimmed(), token);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_typeset(
    input: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    crossrefs: Option<&Path>,
    format: OutputFormat,
    compact: bool,
    references: bool,
    debug_vspace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let crossref_line_height = FontBook::with_defaults(config.body_font_size)
        .get("crossref")?
        .line_gap;

    let mut vp = Versepage::new().with_config(config);
    if references {
        vp = vp.references();
    }
    if debug_vspace {
        vp = vp.debug_vspace();
    }
    if let Some(path) = crossrefs {
        let table = CrossReferenceTable::from_json(&fs::read_to_string(path)?, crossref_line_height)?;
        vp = vp.with_crossrefs(table);
    }

    let result = vp.typeset_file(input)?;
    let rendered = match format {
        OutputFormat::Text => result.to_text(),
        OutputFormat::Lines => render_lines(&result),
        OutputFormat::Pages => render_pages(&result),
        OutputFormat::Json => {
            let format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            result.to_json(format)?
        }
    };

    if let Some(path) = output {
        fs::write(path, &rendered)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        print!("{}", rendered);
    }
    Ok(())
}

fn render_lines(result: &TypesetOutput) -> String {
    let mut out = String::new();
    for page in &result.drawing {
        out.push_str(&format!("--- page {} ---\n", page.number));
        for (i, line) in page.lines().iter().enumerate() {
            out.push_str(&format!("{:>4}  {}\n", i + 1, line));
        }
    }
    out
}

fn render_pages(result: &TypesetOutput) -> String {
    let mut out = String::new();
    for page in &result.pages {
        let verse = match (page.last_chapter, page.last_verse) {
            (Some(c), Some(v)) => format!("{}:{}", c, v),
            (None, Some(v)) => v.to_string(),
            (Some(c), None) => c.to_string(),
            (None, None) => "-".to_string(),
        };
        out.push_str(&format!(
            "page {:>4}  lines {:>3}  through {:<8} footnotes {:>6.1}pt  xrefs {:>2}  penalty {:.0}\n",
            page.number,
            page.line_count,
            verse,
            page.footnote_height,
            page.crossref_count,
            page.penalty
        ));
    }
    out
}

fn cmd_info(input: &Path, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let result = Versepage::new().with_config(config).typeset_file(input)?;
    let stats = &result.stats;

    println!("{}", "Layout Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Tokens".bold(), stats.token_count);
    println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    println!("{}: {}", "Lines".bold(), stats.line_count);
    println!("{}: {}", "Pieces".bold(), stats.piece_count);
    println!("{}: {}", "Footnotes".bold(), stats.footnote_count);
    println!("{}: {}", "Cross-references".bold(), stats.crossref_count);
    println!("{}: {}", "Pages".bold(), stats.page_count);
    println!("{}: {:.0}", "Total penalty".bold(), stats.total_penalty);

    let overfull: Vec<u32> = result
        .pages
        .iter()
        .filter(|p| p.penalty > 0.0)
        .map(|p| p.number)
        .collect();
    if !overfull.is_empty() {
        println!();
        println!(
            "{}: {:?}",
            "Pages with penalties".yellow().bold(),
            overfull
        );
    }
    Ok(())
}

fn cmd_version() {
    println!(
        "{} {}",
        "versepage".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("Line and page breaking for verse-structured books");
}
