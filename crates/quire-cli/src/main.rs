use miette::{IntoDiagnostic, Result};
use quire_common::QuireError;
use quire_common::config::{self, Config};
use quire_common::telemetry::{self, TelemetryConfig};
use quire_editor_core::{
    BoxMetrics, EditorError, EditorSurface, MathRenderer, MonospaceMeasurer, complete, highlight,
    match_suggestions, translate,
};
use quire_renderer::{MathMlRenderer, Palette, generate_highlight_css, highlight_html};
use std::path::PathBuf;
use web_time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(version, about = "quire - LaTeX-aware editing engine tools", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to config file (created with defaults if missing)
    #[arg(long, global = true, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Html,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the highlight runs of a document
    Highlight {
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// List math regions
    Regions {
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Open a document in the engine and list its math spans
    Spans {
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
        /// Type this text into the document, then let the debounce fire
        #[arg(long)]
        insert: Option<String>,
        /// Char offset for --insert (end of document if omitted)
        #[arg(long, requires = "insert")]
        at: Option<usize>,
    },
    /// Suggest completions for the command token before the cursor
    Complete {
        text: String,
        /// Char offset of the cursor (end of text if omitted)
        #[arg(long)]
        cursor: Option<usize>,
        /// Accept the suggestion at this index and print the result
        #[arg(long)]
        accept: Option<usize>,
    },
    /// Typeset LaTeX to MathML
    Render {
        latex: String,
        #[arg(long)]
        display: bool,
    },
    /// Translate a char offset to pixel coordinates
    Position {
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
        #[arg(long)]
        offset: usize,
        /// Content width in pixels (config value if omitted)
        #[arg(long)]
        width: Option<f64>,
    },
    /// Print the highlight stylesheet
    Css {
        /// Use the dark palette regardless of config
        #[arg(long)]
        dark: bool,
    },
    /// Show the config file path and contents
    Config,
}

fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => None,
        1 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    };
    let mut telemetry_config = TelemetryConfig::from_env("quire-cli");
    if let Some(level) = level {
        telemetry_config = telemetry_config.with_level(level);
    }
    telemetry::init_tracing(telemetry_config);

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_path()?,
    };
    let config = Config::load_or_create(&config_path)?;

    match cli.command {
        Commands::Highlight { file, format } => print_highlight(&read_input(file)?, format),
        Commands::Regions { file, json } => print_regions(&read_input(file)?, json),
        Commands::Spans { file, insert, at } => {
            print_spans(&read_input(file)?, insert.as_deref(), at, &config)?
        }
        Commands::Complete {
            text,
            cursor,
            accept,
        } => print_completions(&text, cursor, accept, &config)?,
        Commands::Render { latex, display } => {
            let mathml = MathMlRenderer.render(&latex, display).into_diagnostic()?;
            println!("{mathml}");
        }
        Commands::Position {
            file,
            offset,
            width,
        } => print_position(&read_input(file)?, offset, width, &config)?,
        Commands::Css { dark } => {
            let palette = if dark || config.display.dark {
                Palette::dark()
            } else {
                Palette::light()
            };
            print!("{}", generate_highlight_css(&palette));
        }
        Commands::Config => {
            println!("# {}", config_path.display());
            println!("{config:#?}");
        }
    }

    Ok(())
}

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .into_diagnostic()
            .map_err(|e| e.wrap_err(format!("reading {}", path.display()))),
        None => std::io::read_to_string(std::io::stdin()).into_diagnostic(),
    }
}

fn print_highlight(text: &str, format: Format) {
    let highlighted = highlight(text);
    match format {
        Format::Text => {
            for run in &highlighted.runs {
                let category = if run.category.is_plain() {
                    "plain"
                } else {
                    run.category.as_str()
                };
                println!(
                    "{:>5}..{:<5} {:<18} {:?}",
                    run.char_range.start, run.char_range.end, category, run.text
                );
            }
        }
        Format::Html => println!("{}", highlight_html(&highlighted)),
        Format::Json => {
            let runs: Vec<_> = highlighted
                .runs
                .iter()
                .map(|run| {
                    serde_json::json!({
                        "start": run.char_range.start,
                        "end": run.char_range.end,
                        "category": run.category.as_str(),
                        "text": run.text.as_str(),
                    })
                })
                .collect();
            println!("{}", serde_json::Value::Array(runs));
        }
    }
}

fn print_regions(text: &str, json: bool) {
    let regions = highlight(text).regions;
    let chars: Vec<char> = text.chars().collect();
    for region in &regions {
        let latex: String = chars[region.content_range()].iter().collect();
        let mode = if region.display { "display" } else { "inline" };
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "start": region.range.start,
                    "end": region.range.end,
                    "mode": mode,
                    "latex": latex,
                })
            );
        } else {
            println!(
                "{:>5}..{:<5} {:<7} {latex}",
                region.range.start, region.range.end, mode
            );
        }
    }
}

fn print_spans(text: &str, insert: Option<&str>, at: Option<usize>, config: &Config) -> Result<()> {
    let mut surface =
        EditorSurface::with_text(text, MathMlRenderer, config.editor.to_editor_config());

    if let Some(insert) = insert {
        let at = at.unwrap_or(surface.len_chars());
        let now = Instant::now();
        surface.replace(at..at, insert, now).map_err(QuireError::from)?;
        // The clock is simulated: jump straight to the debounce deadline.
        if let Some(deadline) = surface.next_deadline() {
            tracing::debug!(
                delay_ms = deadline.duration_since(now).as_millis() as u64,
                cursor = surface.cursor(),
                "firing debounce"
            );
            surface.tick(deadline);
        }
    }

    for span in surface.spans() {
        println!(
            "{:>5}..{:<5} {:<9} {}",
            span.range.start,
            span.range.end,
            span.state.as_str(),
            span.source
        );
        if let Some(error) = &span.error {
            println!("             {error}");
        }
    }
    Ok(())
}

fn print_completions(
    text: &str,
    cursor: Option<usize>,
    accept: Option<usize>,
    config: &Config,
) -> Result<()> {
    let len = text.chars().count();
    let cursor = cursor.unwrap_or(len);
    if cursor > len {
        return Err(QuireError::from(EditorError::InvalidOffset { offset: cursor, len }).into());
    }
    let before: String = text.chars().take(cursor).collect();
    let mut suggestions = match_suggestions(&before);
    suggestions.truncate(config.editor.max_suggestions);

    let Some(index) = accept else {
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!(
                "{i:>2}  {:<24} {:<9} {}",
                suggestion.entry.trigger,
                suggestion.entry.category.as_str(),
                suggestion.entry.description
            );
        }
        return Ok(());
    };

    let suggestion = suggestions
        .get(index)
        .ok_or_else(|| miette::miette!("no suggestion at index {index} ({} found)", suggestions.len()))?;
    let completion = complete(text, cursor, suggestion);
    let mut result: String = text.chars().take(completion.replace.start).collect();
    result.push_str(&completion.insert);
    result.extend(text.chars().skip(completion.replace.end));
    println!("{result}");
    println!("cursor: {}", completion.cursor);
    Ok(())
}

fn print_position(text: &str, offset: usize, width: Option<f64>, config: &Config) -> Result<()> {
    let len = text.chars().count();
    if offset > len {
        return Err(QuireError::from(EditorError::InvalidOffset { offset, len }).into());
    }
    let display = &config.display;
    let metrics = BoxMetrics::new(
        width.unwrap_or(display.content_width),
        display.font_size,
        display.line_height,
    )
    .with_char_width_factor(config.editor.char_width_factor);
    let measurer = MonospaceMeasurer::for_metrics(&metrics);
    let point = translate(text, offset, &metrics, &measurer);
    println!("x: {:.1}", point.x);
    println!("y: {:.1}", point.y);
    Ok(())
}

fn init_miette() {
    let hook = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(3)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    if hook.is_err() {
        eprintln!("miette hook already installed");
    }
    miette::set_panic_hook();
}
