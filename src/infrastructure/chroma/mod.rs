pub mod client;
pub mod error_body;
pub mod transport;

pub use client::ChromaClient;
