pub mod chroma;
pub mod directory;
pub mod embeddings;
