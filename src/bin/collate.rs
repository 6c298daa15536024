//! Collate CLI - Assemble one text document from directories and files.

use std::fs;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use collate::archive::read_archive;
use collate::errors::{exit_code, CollateError};
use collate::filter::FilterCriteria;
use collate::output::{format_document, format_view, OutputFormat, OutputOptions};
use collate::session::Session;
use collate::walker::{list_directory, list_file};
use collate::Entry;
use glob::Pattern;
use log::{info, warn};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "collate")]
#[command(about = "Assemble one text document from directories and files")]
#[command(version)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the filtered file tree
    Tree {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve selected files into one document
    Generate {
        #[command(flatten)]
        sources: SourceArgs,

        /// Glob patterns choosing files (default: every visible file)
        #[arg(long)]
        select: Vec<String>,

        /// Write the document to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Omit the directory structure section
        #[arg(long)]
        no_tree: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Directory to collate (default: current directory when no other source is given)
    dir: Option<PathBuf>,

    /// Zip archive to collate alongside the directory
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Add an individual file (repeatable)
    #[arg(long = "file")]
    files: Vec<PathBuf>,

    /// Drop files nested this many levels deep or more
    #[arg(long)]
    max_depth: Option<usize>,

    /// Drop paths containing any of these substrings
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,
}

impl SourceArgs {
    fn criteria(&self) -> FilterCriteria {
        let criteria = FilterCriteria::new().excluding(self.exclude.iter().cloned());
        match self.max_depth {
            Some(depth) => criteria.with_max_depth(depth),
            None => criteria,
        }
    }

    fn load(&self) -> Result<Session, CollateError> {
        let mut session = Session::new();

        let dir = match (&self.dir, self.archive.is_none() && self.files.is_empty()) {
            (Some(dir), _) => Some(dir.clone()),
            (None, true) => Some(PathBuf::from(".")),
            (None, false) => None,
        };

        if let Some(dir) = dir {
            if !dir.exists() {
                return Err(CollateError::PathNotFound(dir));
            }
            let listed = session.select_directory(list_directory(&dir)?).len();
            info!("{}: {} files", dir.display(), listed);
        }

        if let Some(archive) = &self.archive {
            if !archive.exists() {
                return Err(CollateError::PathNotFound(archive.clone()));
            }
            let listed = session.select_archive(read_archive(archive)?).len();
            info!("{}: {} files", archive.display(), listed);
        }

        for file in &self.files {
            if !file.exists() {
                return Err(CollateError::PathNotFound(file.clone()));
            }
            let listed = list_file(file)?;
            session.add_file(&listed.relative_path, listed.resource);
        }

        Ok(session)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_output = json_flag(&cli.command);

    let result = match cli.command {
        Commands::Tree { sources, json } => run_tree(sources, json),
        Commands::Generate {
            sources,
            select,
            output,
            no_tree,
            json,
        } => run_generate(sources, select, output, no_tree, json),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "collate", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn json_flag(cmd: &Commands) -> bool {
    match cmd {
        Commands::Tree { json, .. } => *json,
        Commands::Generate { json, .. } => *json,
        Commands::Completions { .. } => false,
    }
}

fn format_for(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Plain
    }
}

// --- Tree command ---

fn run_tree(sources: SourceArgs, json: bool) -> Result<(), CollateError> {
    let session = sources.load()?;
    let view = session.view(&sources.criteria());

    print!("{}", format_view(&view, format_for(json))?);
    if json {
        println!();
    }
    Ok(())
}

// --- Generate command ---

fn run_generate(
    sources: SourceArgs,
    select: Vec<String>,
    output: Option<PathBuf>,
    no_tree: bool,
    json: bool,
) -> Result<(), CollateError> {
    let session = sources.load()?;
    let view = session.view(&sources.criteria());

    let paths = matching_paths(&view, &select);
    let selected = Session::select(&view, &paths)?;
    info!("{} of {} files selected", selected.len(), view.len());

    let files = session.resolve(&selected)?;

    let options = OutputOptions {
        format: format_for(json),
        include_tree: !no_tree,
    };
    let document = format_document(&files, &options)?;

    match output {
        Some(path) => {
            fs::write(&path, &document)?;
            info!("wrote {}", path.display());
        }
        None => {
            print!("{}", document);
            if json {
                println!();
            }
        }
    }
    Ok(())
}

/// Paths in `view` matching any of `patterns`, or every path when there are none.
fn matching_paths<'a>(view: &'a [Entry], patterns: &[String]) -> Vec<&'a str> {
    let compiled: Vec<Pattern> = patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("skipping select pattern {:?}: {}", p, e);
                None
            }
        })
        .collect();

    view.iter()
        .filter(|e| patterns.is_empty() || compiled.iter().any(|p| p.matches(&e.path)))
        .map(|e| e.path.as_str())
        .collect()
}
