pub mod collection_directory;
pub mod embedding_port;
pub mod vector_store;
