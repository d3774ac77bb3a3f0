pub mod document_chunk;
pub mod namespace;
pub mod records;
pub mod server;
pub mod source_document;
