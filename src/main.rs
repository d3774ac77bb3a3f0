use clap::Parser;
use ragstore::cli::commands::{load_chunks, Cli, Commands};
use ragstore::config::RagConfig;
use ragstore::domain::entities::source_document::SourceDocument;
use ragstore::telemetry::init_tracing;
use ragstore::RagStore;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = match RagConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };
    tracing::debug!(chroma = %config.chroma_url, tenant = %config.tenant, database = %config.database, "starting");

    let result = run_command(RagStore::new(config), cli.command).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(rag: RagStore, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Health => {
            let report = rag.health().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.reachable {
                return Err("vector store unreachable".into());
            }
        }
        Commands::Ensure { collection } => {
            let id = rag.provisioning().ensure_collection(&collection).await?;
            println!("{collection}: {id}");
        }
        Commands::Ingest { collection, file } => {
            let mut chunks = load_chunks(&file)?;
            rag.provisioning().ensure_collection(&collection).await?;
            let report = rag.ingest_detailed(&collection, &mut chunks).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Search {
            collection,
            query,
            limit,
            sources,
        } => {
            let chunks = rag.search_detailed(&collection, &query, limit).await?;
            if sources {
                let docs: Vec<_> = chunks
                    .iter()
                    .map(SourceDocument::from)
                    .collect();
                println!("{}", serde_json::to_string_pretty(&docs)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            }
        }
        Commands::Delete { collection } => {
            rag.provisioning().delete_collection(&collection).await?;
            println!("Deleted {collection}");
        }
        Commands::Count { collection } => {
            let count = rag.count(&collection).await?;
            println!("{count}");
        }
    }
    Ok(())
}
