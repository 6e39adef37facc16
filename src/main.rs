use clap::{Parser as ClapParser, Subcommand};
use lucene_query::cli::{self, CheckOptions, CliError, InvertOptions};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "lq")]
#[command(about = "lq - rewrite, check and invert Lucene-style queries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a query in canonical form
    Format {
        /// The query (reads from stdin if not provided)
        query: Option<String>,
    },

    /// Resolve fields and includes, then validate a query
    Check {
        /// The query (reads from stdin if not provided)
        query: Option<String>,

        /// JSON object mapping fields to replacements
        #[arg(long)]
        field_map: Option<PathBuf>,

        /// JSON alias map
        #[arg(long)]
        aliases: Option<PathBuf>,

        /// JSON object mapping include names to query fragments
        #[arg(long)]
        includes: Option<PathBuf>,

        /// JSON validation policy
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the complement of a query
    Invert {
        /// The query (reads from stdin if not provided)
        query: Option<String>,

        /// Fields that must not be negated
        #[arg(long, value_delimiter = ',')]
        non_inverted: Vec<String>,

        /// Criteria OR-ed into every inverted clause
        #[arg(long)]
        alternate: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Format { query } => {
            read_query(query).and_then(|query| cli::execute_format(&query)).map(|formatted| {
                println!("{}", formatted);
                true
            })
        }
        Commands::Check {
            query,
            field_map,
            aliases,
            includes,
            policy,
            pretty,
        } => read_query(query).and_then(|query| {
            run_check(CheckOptions {
                query,
                field_map,
                aliases,
                includes,
                policy,
                pretty,
            })
        }),
        Commands::Invert {
            query,
            non_inverted,
            alternate,
        } => read_query(query)
            .and_then(|query| {
                cli::execute_invert(&InvertOptions {
                    query,
                    non_inverted_fields: non_inverted,
                    alternate_criteria: alternate,
                })
            })
            .map(|inverted| {
                println!("{}", inverted);
                true
            }),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn read_query(query: Option<String>) -> Result<String, CliError> {
    match query {
        Some(query) => Ok(query),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim().to_string())
        }
        None => Err(CliError::NoInput),
    }
}

/// Prints the check output; `Ok(false)` when the query is invalid.
fn run_check(options: CheckOptions) -> Result<bool, CliError> {
    let output = cli::execute_check(&options)?;
    let json = if options.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .map_err(|e| CliError::Query(e.into()))?;
    println!("{}", json);
    Ok(output.validation.is_valid)
}
