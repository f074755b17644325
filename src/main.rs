//! CLI entry point for the code-intelligence cache.
//!
//! Thin layer over the library: loads settings, sets up logging, opens the
//! cache and prints results (JSON where the output is structured).

use anyhow::{Context, Result, anyhow};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use codesense::indexing::FileSystemWatcher;
use codesense::{CodeIndexer, Language, RelationKind, SearchOptions, Settings};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::Level;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Local code-intelligence cache
#[derive(Parser)]
#[command(
    name = "codesense",
    version = env!("CARGO_PKG_VERSION"),
    about = "Local code-intelligence cache",
    long_about = "Extract structure from source files, embed them, and query similar code, relationships and recurring patterns.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Set up .codesense directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Analyze and cache every source file under a directory")]
    Index {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of worker threads (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Maximum number of files to scan (overrides config)
        #[arg(long)]
        max_files: Option<usize>,

        /// Show a progress bar
        #[arg(short, long)]
        progress: bool,

        /// List the files that would be indexed and stop
        #[arg(long)]
        dry_run: bool,
    },

    #[command(about = "Analyze one file and print its cached record as JSON")]
    Analyze {
        file: PathBuf,
    },

    #[command(
        about = "Find cached files similar to a snippet or a file",
        after_help = "Examples:\n  codesense similar \"class Cache extends Store\"\n  codesense similar --file src/cache.ts --limit 10"
    )]
    Similar {
        /// Query text
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        text: Option<String>,

        /// Use this file's content as the query
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Boost files in this language (defaults to the query file's language)
        #[arg(long)]
        language: Option<String>,

        /// Boost files carrying this code-pattern tag (repeatable)
        #[arg(long = "pattern")]
        patterns: Vec<String>,

        /// Boost files defining this function (repeatable)
        #[arg(long = "function")]
        functions: Vec<String>,
    },

    #[command(about = "Show recurring architectural patterns, or search the code-pattern index")]
    Patterns {
        /// Substring to look for in the code-pattern index
        #[arg(short, long)]
        search: Option<String>,

        /// Restrict the search to one pattern type (design-pattern, function, class)
        #[arg(short = 't', long = "type")]
        pattern_type: Option<String>,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    #[command(about = "List inheritance, implementation and import edges touching a file")]
    Related {
        file: PathBuf,

        /// Relationship types to include (defaults to search.related_types)
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,
    },

    #[command(about = "Summarize the cache contents")]
    Stats,

    #[command(about = "Evict a file from the cache")]
    Forget {
        file: PathBuf,
    },

    #[command(about = "Evict cached files as they change on disk")]
    Watch {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    #[command(about = "Display active settings")]
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .map_err(|e| anyhow!("Configuration error loading from {}: {e}", path.display()))?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };

    let level = if cli.debug || settings.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(".", *force).map_err(|e| anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            return Ok(());
        }
        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
            return Ok(());
        }
        Commands::Index {
            threads, max_files, ..
        } => {
            if let Some(t) = threads {
                settings.indexing.parallel_threads = *t;
            }
            if let Some(m) = max_files {
                settings.indexing.max_files = *m;
            }
        }
        _ => {}
    }

    if settings.workspace_root.is_none() {
        settings.workspace_root = Some(std::env::current_dir()?);
    }
    let settings = Arc::new(settings);

    if let Commands::Index {
        path,
        dry_run: true,
        ..
    } = &cli.command
    {
        let files = codesense::indexing::FileWalker::new(Arc::clone(&settings)).walk(path);
        for file in &files {
            println!("{}", file.display());
        }
        eprintln!("{} files would be indexed", files.len());
        return Ok(());
    }

    let indexer = CodeIndexer::new(Arc::clone(&settings)).context("Failed to open the cache")?;

    match cli.command {
        Commands::Index { path, progress, .. } => {
            let root = absolute(&path)?;
            let cancel = AtomicBool::new(false);
            let stats = if progress {
                let bar = progress_bar();
                let stats = indexer.index_directory_with_progress(&root, &cancel, |done, total| {
                    bar.set_length(total as u64);
                    bar.set_position(done as u64);
                })?;
                bar.finish_and_clear();
                stats
            } else {
                indexer.index_directory(&root, &cancel)?
            };
            stats.display();
        }

        Commands::Analyze { file } => {
            let analyzed = indexer.index_file(absolute(&file)?)?;
            if analyzed.cached {
                eprintln!("Cache hit: content unchanged");
            }
            print_json(&analyzed.record)?;
        }

        Commands::Similar {
            text,
            file,
            limit,
            language,
            patterns,
            functions,
        } => {
            let (query, file_language) = match (text, file) {
                (_, Some(file)) => {
                    let content = std::fs::read_to_string(&file)
                        .with_context(|| format!("Failed to read {}", file.display()))?;
                    // Unknown extensions still work as queries, just without a language boost
                    let language = Language::classify(&file);
                    let boost = (language != Language::Generic).then(|| language.tag().to_string());
                    (content, boost)
                }
                (Some(text), None) => (text, None),
                (None, None) => return Err(anyhow!("Provide query text or --file")),
            };

            let mut options = SearchOptions::default()
                .with_patterns(patterns)
                .with_functions(functions);
            if let Some(language) = language.or(file_language) {
                options = options.with_language(language);
            }

            let hits = indexer.find_similar_code(&query, limit, &options)?;
            let rows: Vec<SimilarRow> = hits
                .into_iter()
                .map(|hit| SimilarRow {
                    path: hit.item.path,
                    language: hit.item.language,
                    similarity: hit.similarity,
                    cosine: hit.cosine,
                    functions: hit.item.metadata.functions,
                    patterns: hit.item.metadata.patterns,
                })
                .collect();
            print_json(&rows)?;
        }

        Commands::Patterns {
            search: Some(needle),
            pattern_type,
            limit,
        } => {
            let found = indexer
                .store()
                .find_patterns(pattern_type.as_deref(), &needle, limit)?;
            print_json(&found)?;
        }

        Commands::Patterns { search: None, .. } => {
            print_json(&indexer.architectural_overview()?)?;
        }

        Commands::Related { file, types } => {
            let kinds = types
                .iter()
                .map(|t| RelationKind::from_str(t).map_err(|e| anyhow!("{e}: '{t}'")))
                .collect::<Result<Vec<_>>>()?;
            let path = absolute(&file)?;
            let related = if kinds.is_empty() {
                indexer.related_files(&path, None)?
            } else {
                indexer.related_files(&path, Some(&kinds))?
            };
            print_json(&related)?;
        }

        Commands::Stats => {
            print_json(&indexer.stats()?)?;
        }

        Commands::Forget { file } => {
            if indexer.forget(&absolute(&file)?)? {
                println!("Removed {} from the cache", file.display());
            } else {
                println!("{} was not cached", file.display());
            }
        }

        Commands::Watch { path } => {
            if !settings.file_watch.enabled {
                return Err(anyhow!(
                    "File watching is disabled (file_watch.enabled = false)"
                ));
            }
            let root = absolute(&path)?;
            let watcher =
                FileSystemWatcher::new(Arc::new(indexer), settings.file_watch.debounce_ms)?;
            // Runs until the process is interrupted
            let stop = AtomicBool::new(false);
            watcher.watch(&root, &stop)?;
        }

        Commands::Init { .. } | Commands::Config => {}
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct SimilarRow {
    path: String,
    language: String,
    similarity: f32,
    cosine: f32,
    functions: Vec<String>,
    patterns: Vec<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid path {}", path.display()))
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
