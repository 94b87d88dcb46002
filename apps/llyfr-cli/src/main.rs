//! llyfr - personal BibTeX library from the command line
//!
//! Lists and searches the bibliography, adds local documents with their
//! BibTeX, and pulls records and full texts from NASA ADS.

mod render;

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use llyfr_core::ads::{add_from_ads, AdsClient};
use llyfr_core::{LibraryEntry, LibraryStore, LlyfrConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "llyfr")]
#[command(version, about = "Personal BibTeX library manager", long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/llyfr/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Library directory holding attached documents
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Bibliography (.bib) file
    #[arg(long, global = true)]
    bibfile: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List library entries, optionally filtered
    List {
        /// Search terms; every term must match title, author, year or journal
        query: Vec<String>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show full details of matching entries
    Show {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Add a local document with its BibTeX record
    Add {
        /// Document to copy into the library
        #[arg(short, long)]
        document: PathBuf,

        /// File holding the BibTeX record (default: read stdin)
        #[arg(short, long)]
        bibtex: Option<PathBuf>,
    },

    /// Query NASA ADS
    Ads {
        #[command(subcommand)]
        command: AdsCommands,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum AdsCommands {
    /// Search ADS
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show one ADS record
    Show { bibcode: String },

    /// Add an ADS record and its full text to the library
    Add { bibcode: String },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = LlyfrConfig::load(cli.config.as_deref())?;
    if let Some(library) = cli.library {
        config.library.path = Some(library);
    }
    if let Some(bibfile) = cli.bibfile {
        config.library.bibfile = Some(bibfile);
    }
    debug!(library = ?config.library, "effective library settings");

    match cli.command {
        Commands::List { query, json } => list(&config, &query.join(" "), json),
        Commands::Show { query } => show(&config, &query.join(" ")),
        Commands::Add { document, bibtex } => add(&config, document, bibtex),
        Commands::Ads { command } => ads(&config, command).await,
        Commands::Config => {
            print!("{}", config.redacted().to_toml()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn open_store(config: &LlyfrConfig) -> CliResult<LibraryStore> {
    let (library, bibfile) = config.validate_library()?;
    Ok(LibraryStore::new(library, bibfile))
}

fn matching(config: &LlyfrConfig, query: &str) -> CliResult<(LibraryStore, Vec<LibraryEntry>)> {
    let store = open_store(config)?;
    let entries = store
        .load()?
        .into_iter()
        .filter(|entry| entry.matches(query))
        .collect();
    Ok((store, entries))
}

fn list(config: &LlyfrConfig, query: &str, json: bool) -> CliResult<()> {
    let (_, entries) = matching(config, query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{}", render::list_line(entry));
        }
    }
    Ok(())
}

fn show(config: &LlyfrConfig, query: &str) -> CliResult<()> {
    let (store, entries) = matching(config, query)?;
    if entries.is_empty() {
        return Err(format!("No entries match \"{query}\"").into());
    }
    for entry in &entries {
        println!("{}", render::details(entry, store.library_dir()));
    }
    Ok(())
}

fn add(config: &LlyfrConfig, document: PathBuf, bibtex: Option<PathBuf>) -> CliResult<()> {
    let store = open_store(config)?;
    let raw = match bibtex {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut raw = String::new();
            io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };

    let outcome = store.ingest(&document, &raw)?;
    println!("{}", outcome.filename);
    Ok(())
}

async fn ads(config: &LlyfrConfig, command: AdsCommands) -> CliResult<()> {
    let client = AdsClient::from_config(config)?;

    match command {
        AdsCommands::Search { query } => {
            for doc in client.search(&query.join(" ")).await? {
                println!("{}", render::search_line(&doc));
            }
        }
        AdsCommands::Show { bibcode } => {
            let record = client.fetch_record(&bibcode).await?;
            println!("{}", render::ads_details(&record));
        }
        AdsCommands::Add { bibcode } => {
            let store = open_store(config)?;
            let outcome = add_from_ads(&client, &store, &bibcode).await?;
            println!("{}", outcome.filename);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["llyfr", "list", "plasma", "--bibfile", "refs.bib", "-vv"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.bibfile, Some(PathBuf::from("refs.bib")));
        assert!(matches!(cli.command, Commands::List { ref query, json: false } if query == &["plasma"]));
    }

    #[test]
    fn test_show_requires_query() {
        assert!(Cli::try_parse_from(["llyfr", "show"]).is_err());
    }

    #[test]
    fn test_ads_add() {
        let cli = Cli::try_parse_from(["llyfr", "ads", "add", "2020PhRvL.124a5101S"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Ads { command: AdsCommands::Add { ref bibcode } } if bibcode == "2020PhRvL.124a5101S"
        ));
    }
}
