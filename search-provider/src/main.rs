//! Search Provider CLI
//!
//! Runs queries, lookups, indexing and deletes against an embedded core or a
//! remote Solr server. Connection settings come from the environment (and a
//! `.env` file); flags override them.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info};

use search_provider::{Dependencies, ProviderError, ProviderSettings};
use search_provider_repository::SearchProvider;
use search_provider_shared::Document;

#[derive(Parser)]
#[command(name = "search-provider")]
#[command(about = "Query and index documents in an embedded or remote Solr core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Solr core URL (overrides SOLR_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Server port applied when the URL has none (overrides SOLR_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Run an in-process core instead of connecting to a server
    #[arg(long, global = true, conflicts_with = "remote")]
    embedded: bool,

    /// Connect to a server even when SOLR_EMBEDDED is set
    #[arg(long, global = true)]
    remote: bool,

    /// Directory of the embedded core (overrides SOLR_CORE_PATH)
    #[arg(long, global = true)]
    core_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one field of a document
    Doc {
        /// Document identifier
        id: String,
        /// Field to print
        #[arg(long, default_value = "text")]
        field: String,
    },
    /// Run a query and print the matching documents
    Query {
        /// Query text
        text: String,
        /// Maximum number of documents to return
        #[arg(long, default_value = "10")]
        rows: usize,
        /// Comma-separated field list (default: all fields plus score)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Index documents from a JSON file holding an object or an array of objects
    Index {
        file: PathBuf,
        /// Commit after indexing
        #[arg(long)]
        commit: bool,
    },
    /// Delete every document matching a query
    Delete {
        query: String,
        /// Commit after deleting
        #[arg(long)]
        commit: bool,
    },
    /// Commit pending changes
    Commit,
    /// Check that the core is reachable
    Ping,
}

impl Cli {
    /// Environment settings with command line overrides applied.
    fn settings(&self) -> Result<ProviderSettings, ProviderError> {
        Ok(self.apply(ProviderSettings::from_env()?))
    }

    fn apply(&self, mut settings: ProviderSettings) -> ProviderSettings {
        if let Some(url) = &self.url {
            settings.server_url = Some(url.clone());
        }
        if let Some(port) = self.port {
            settings.server_port = Some(port);
        }
        if self.embedded {
            settings.embedded = true;
        }
        if self.remote {
            settings.embedded = false;
        }
        if let Some(core_path) = &self.core_path {
            settings.core_path = Some(core_path.clone());
        }
        settings
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);

            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("  Caused by: {}", err);
                source = err.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ProviderError> {
    let settings = cli.settings()?;
    let Dependencies { provider } = Dependencies::from_settings(&settings).await?;

    let result = execute(&provider, cli.command).await;

    // Release the core even when the command failed.
    let shutdown = provider.shutdown().await;
    result?;
    shutdown?;
    Ok(())
}

async fn execute(provider: &SearchProvider, command: Commands) -> Result<(), ProviderError> {
    match command {
        Commands::Doc { id, field } => match provider.get_field_value(&id, &field).await? {
            Some(Value::String(text)) => println!("{}", text),
            Some(value) => println!("{}", value),
            None => info!(id = %id, field = %field, "No value found"),
        },
        Commands::Query { text, rows, fields } => {
            let results = if fields.is_empty() {
                provider.run_query(&text, rows).await?
            } else {
                let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
                provider.run_query_with_fields(&text, rows, &fields).await?
            };

            info!(num_found = results.num_found, returned = results.len(), "Query completed");
            for document in results.iter() {
                println!("{}", serde_json::to_string(document)?);
            }
        }
        Commands::Index { file, commit } => {
            let raw = tokio::fs::read_to_string(&file).await?;
            let documents = parse_documents(&raw)?;
            provider.index_documents(&documents).await?;
            info!(count = documents.len(), file = %file.display(), "Documents submitted");

            if commit {
                provider.commit().await?;
                info!("Committed");
            }
        }
        Commands::Delete { query, commit } => {
            provider.delete_by_query(&query).await?;
            info!(query = %query, "Delete submitted");

            if commit {
                provider.commit().await?;
                info!("Committed");
            }
        }
        Commands::Commit => {
            provider.commit().await?;
            info!("Committed");
        }
        Commands::Ping => {
            provider.ping().await?;
            println!("OK");
        }
    }
    Ok(())
}

/// Decode a JSON object or array of objects into documents.
fn parse_documents(raw: &str) -> Result<Vec<Document>, ProviderError> {
    let value: Value = serde_json::from_str(raw)?;
    let documents = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(map) => vec![Document::from_map(map)],
        _ => {
            return Err(ProviderError::config(
                "Document file must hold a JSON object or array of objects",
            ))
        }
    };
    Ok(documents)
}
