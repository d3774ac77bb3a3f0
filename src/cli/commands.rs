use crate::domain::entities::document_chunk::DocumentChunk;
use crate::domain::error::DomainError;
use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Parser)]
#[command(name = "ragstore", about = "Document store for retrieval-augmented chat")]
pub struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the vector store is reachable
    Health,
    /// Create tenant, database and collection if missing
    Ensure {
        collection: String,
    },
    /// Embed and store documents from a JSON file
    Ingest {
        collection: String,
        /// JSON array of {id?, content, metadata?}
        file: String,
    },
    /// Similarity search, one result per title
    Search {
        collection: String,
        query: String,
        #[arg(long, default_value = "5")]
        limit: usize,
        /// Print citation summaries instead of full chunks
        #[arg(long)]
        sources: bool,
    },
    /// Delete a collection
    Delete {
        collection: String,
    },
    /// Count records in a collection
    Count {
        collection: String,
    },
}

/// Reads a JSON array of chunks. Chunks without an id get a fresh one.
pub fn load_chunks(path: impl AsRef<Path>) -> Result<Vec<DocumentChunk>, DomainError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        DomainError::InvalidInput(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        DomainError::InvalidInput(format!("{} is not a chunk array: {e}", path.display()))
    })
}
