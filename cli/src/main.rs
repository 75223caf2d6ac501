mod config;
mod error;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use serde::Serialize;

use poemdown::library::{FacetCount, facet_min_count};
use poemdown::parser::ParseDiagnostic;
use poemdown::ruby::HanziCell;
use poemdown::worksheet::normalize_document;
use poemdown::{Poem, PoemFilter, PoemLibrary, WorksheetPage, convert_syllables, hanzi_cells};

use config::CliConfig;
use error::CliError;

#[derive(Parser)]
#[command(name = "poemdown", version, about = "Poem markdown parser")]
struct Cli {
    /// Disable colored diagnostic output
    #[arg(long, global = true)]
    no_color: bool,

    /// Config file (defaults to poemdown.toml next to the input file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a poem collection and print its poems
    Parse(ParseArgs),

    /// Print the ruby HTML of each poem
    Html(HtmlArgs),

    /// Convert numbered pinyin to tone marks
    Pinyin(PinyinArgs),

    /// Print tag and author counts
    Facets(FacetsArgs),

    /// Print worksheet cells for each poem as JSON
    Cells(CellsArgs),

    /// Normalize a JSON worksheet document
    Worksheet(WorksheetArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Json,
    List,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Markdown poem collection
    file: PathBuf,

    /// Keep attribute list items in poem content
    #[arg(long)]
    keep_attr_items: bool,

    /// Disable GFM tables and strikethrough
    #[arg(long)]
    no_gfm: bool,
}

#[derive(clap::Args)]
struct ParseArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: Format,

    /// Keep only poems carrying this tag. Repeatable.
    #[arg(short, long)]
    tag: Vec<String>,

    /// Keep only poems by this author. Repeatable.
    #[arg(short, long)]
    author: Vec<String>,

    /// Parse only and report diagnostics
    #[arg(long)]
    check: bool,
}

impl ParseArgs {
    fn filter(&self) -> PoemFilter {
        PoemFilter::selecting(&self.tag, &self.author)
    }
}

#[derive(clap::Args)]
struct HtmlArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Render tone digits as diacritics
    #[arg(long)]
    tones: bool,
}

#[derive(clap::Args)]
struct PinyinArgs {
    /// Numbered syllables, e.g. `ni3 hao3`
    #[arg(required = true)]
    syllables: Vec<String>,
}

#[derive(clap::Args)]
struct FacetsArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Hide values seen fewer times than this
    #[arg(long)]
    min_count: Option<usize>,
}

#[derive(clap::Args)]
struct CellsArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Only the poem with this index
    #[arg(short, long)]
    index: Option<f64>,
}

#[derive(clap::Args)]
struct WorksheetArgs {
    /// JSON array of worksheet pages
    file: PathBuf,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    let reporter = Reporter::new(cli.no_color);
    let config = cli.config.as_deref();

    match cli.command {
        Command::Parse(args) => do_parse(args, config, &reporter),
        Command::Html(args) => do_html(args, config, &reporter),
        Command::Pinyin(args) => {
            println!("{}", convert_syllables(&args.syllables.join(" ")));
            Ok(0)
        }
        Command::Facets(args) => do_facets(args, config, &reporter),
        Command::Cells(args) => do_cells(args, config, &reporter),
        Command::Worksheet(args) => do_worksheet(args),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                return Ok(0);
            }
            Ok(test_runner::run_tests(
                &args.path,
                cli.no_color,
                &args.category,
            ))
        }
    }
}

/// Renders parse diagnostics against the source they came from.
struct Reporter {
    writer: StandardStream,
    config: term::Config,
}

impl Reporter {
    fn new(no_color: bool) -> Self {
        let color_choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Reporter {
            writer: StandardStream::stderr(color_choice),
            config: term::Config::default(),
        }
    }

    fn emit(&self, files: &SimpleFiles<String, String>, diagnostics: &[ParseDiagnostic]) {
        for diagnostic in diagnostics {
            let _ = term::emit_to_write_style(
                &mut self.writer.lock(),
                &self.config,
                files,
                &diagnostic.to_diagnostic(),
            );
        }
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the collection named by `args`, reporting its diagnostics.
fn load_library(
    args: &SourceArgs,
    config: &CliConfig,
    reporter: &Reporter,
) -> Result<PoemLibrary, CliError> {
    let source = read_file(&args.file)?;

    let mut options = config.parse.clone();
    options.keep_attr_items |= args.keep_attr_items;
    if args.no_gfm {
        options.gfm = false;
    }

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.display().to_string(), source.clone());

    let parser = poemdown::Parser::new(source, file_id).with_options(options);
    let library = PoemLibrary::from_parser(&parser);
    reporter.emit(&files, library.diagnostics());

    log::info!("{}: {} poem(s)", args.file.display(), library.len());
    Ok(library)
}

fn do_parse(args: ParseArgs, config: Option<&Path>, reporter: &Reporter) -> Result<i32, CliError> {
    let config = CliConfig::resolve(config, Some(&args.source.file))?;
    let library = load_library(&args.source, &config, reporter)?;

    if args.check {
        println!("ok: {} ({} poems)", args.source.file.display(), library.len());
        return Ok(0);
    }

    let filter = args.filter();
    let poems: Vec<&Poem> = library.filter(&filter).collect();

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&poems)?),
        Format::List => {
            for poem in poems {
                print_list_entry(poem);
            }
        }
    }
    Ok(0)
}

fn print_list_entry(poem: &Poem) {
    let mut line = format!("{}. {}", poem.index, poem.title);
    if !poem.author.is_empty() {
        line.push_str(" - ");
        line.push_str(&poem.author);
    }
    if !poem.tags.is_empty() {
        line.push_str(&format!(" [{}]", poem.tags.join(", ")));
    }
    println!("{}", line);
}

fn do_html(args: HtmlArgs, config: Option<&Path>, reporter: &Reporter) -> Result<i32, CliError> {
    let config = CliConfig::resolve(config, Some(&args.source.file))?;
    let library = load_library(&args.source, &config, reporter)?;
    let tones = args.tones || config.html.tones;

    for poem in &library {
        if tones {
            println!("{}\n", poem.html_with(convert_syllables));
        } else {
            println!("{}\n", poem.html);
        }
    }
    Ok(0)
}

fn do_facets(args: FacetsArgs, config: Option<&Path>, reporter: &Reporter) -> Result<i32, CliError> {
    let config = CliConfig::resolve(config, Some(&args.source.file))?;
    let library = load_library(&args.source, &config, reporter)?;
    let min_count = args.min_count.unwrap_or(config.facets.min_count);

    print_facets("tags", facet_min_count(library.tag_counts(), min_count));
    print_facets("authors", facet_min_count(library.author_counts(), min_count));
    Ok(0)
}

fn print_facets(label: &str, facets: Vec<FacetCount>) {
    println!("{}:", label);
    if facets.is_empty() {
        println!("  (none)");
    }
    for facet in facets {
        println!("  {} ({})", facet.value, facet.count);
    }
}

#[derive(Serialize)]
struct PoemCells<'a> {
    title: &'a str,
    author: &'a str,
    cells: Vec<HanziCell>,
}

impl<'a> PoemCells<'a> {
    fn new(poem: &'a Poem) -> Self {
        PoemCells {
            title: &poem.title,
            author: &poem.author,
            cells: hanzi_cells(&poem.content),
        }
    }
}

fn do_cells(args: CellsArgs, config: Option<&Path>, reporter: &Reporter) -> Result<i32, CliError> {
    let config = CliConfig::resolve(config, Some(&args.source.file))?;
    let library = load_library(&args.source, &config, reporter)?;

    let cells: Vec<PoemCells> = match args.index {
        Some(index) => {
            let poem = library.by_index(index).ok_or(CliError::NoSuchPoem(index))?;
            vec![PoemCells::new(poem)]
        }
        None => library.iter().map(PoemCells::new).collect(),
    };

    println!("{}", serde_json::to_string_pretty(&cells)?);
    Ok(0)
}

fn do_worksheet(args: WorksheetArgs) -> Result<i32, CliError> {
    let content = read_file(&args.file)?;
    let pages: Vec<WorksheetPage> =
        serde_json::from_str(&content).map_err(|source| CliError::Worksheet {
            path: args.file.clone(),
            source,
        })?;

    println!("{}", serde_json::to_string_pretty(&normalize_document(&pages))?);
    Ok(0)
}
